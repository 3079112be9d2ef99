use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/:id/init", post(handlers::init_session))
        .route("/api/sessions/:id/reset", post(handlers::reset_session))
        .route("/api/sessions/:id/calendar", get(handlers::month_calendar))
        .route("/api/sessions/:id/days/:date", get(handlers::classify_day))
        .with_state(state)
}
