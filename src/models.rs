use crate::availability::Classification;
use crate::date_key::DateKey;
use crate::session::SessionSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: u64,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: DateKey,
    pub classification: Classification,
    pub css_class: Option<&'static str>,
}

impl DayResponse {
    pub fn new(date: DateKey, classification: Classification) -> Self {
        Self {
            date,
            classification,
            css_class: classification.css_class(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub month: Option<String>,
}
