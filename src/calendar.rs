use crate::availability::Classification;
use crate::date_key::DateKey;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    first: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct InvalidMonth(pub String);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: DateKey) -> Self {
        let date = date.date();
        Self {
            first: date - chrono::Duration::days(i64::from(date.day0())),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let month = self.first.month();
        std::iter::successors(Some(self.first), |day| day.succ_opt())
            .take_while(move |day| day.month() == month)
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(raw.to_string());
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: DateKey,
    /// ISO weekday, 1 = Monday.
    pub weekday: u8,
    pub classification: Classification,
    pub css_class: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub none: u32,
    pub has_applications: u32,
    pub has_open_window: u32,
    pub has_both: u32,
}

impl MonthSummary {
    fn record(&mut self, classification: Classification) {
        let slot = match classification {
            Classification::None => &mut self.none,
            Classification::HasApplications => &mut self.has_applications,
            Classification::HasOpenWindow => &mut self.has_open_window,
            Classification::HasBoth => &mut self.has_both,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub month: String,
    /// Empty cells before the first day in a Monday-first grid.
    pub leading_blanks: u8,
    pub days: Vec<DayCell>,
    pub summary: MonthSummary,
}

/// Lays out a month, asking `classify` about each day in order.
pub fn month_view(month: Month, mut classify: impl FnMut(DateKey) -> Classification) -> MonthView {
    let mut summary = MonthSummary::default();
    let days = month
        .days()
        .map(|day| {
            let date = DateKey::new(day);
            let classification = classify(date);
            summary.record(classification);
            DayCell {
                date,
                weekday: day.weekday().number_from_monday() as u8,
                classification,
                css_class: classification.css_class(),
            }
        })
        .collect();

    MonthView {
        month: month.to_string(),
        leading_blanks: month.first_day().weekday().num_days_from_monday() as u8,
        days,
        summary,
    }
}
