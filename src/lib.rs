pub mod app;
pub mod availability;
pub mod calendar;
pub mod config;
pub mod date_key;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod session;
pub mod state;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::router;
pub use availability::{Availability, Classification, Endpoints};
pub use config::Config;
pub use date_key::DateKey;
pub use fetcher::{HttpSource, JsonSource, RetryPolicy};
pub use session::{CalendarSession, SessionPhase};
pub use state::AppState;
