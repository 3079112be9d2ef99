use crate::date_key::DateKey;
use crate::errors::InitializationFailure;
use crate::fetcher::{JsonSource, RetryPolicy, fetch_with_retry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeSet, fmt};
use tracing::{debug, warn};

/// The two remote listings a calendar is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    ApplicationDates,
    OpenWindows,
}

impl Feed {
    /// Record field holding the day.
    pub fn date_field(self) -> &'static str {
        match self {
            Feed::ApplicationDates => "date",
            Feed::OpenWindows => "game_date",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feed::ApplicationDates => "application dates",
            Feed::OpenWindows => "open windows",
        })
    }
}

/// Highlight state of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    None,
    HasApplications,
    HasOpenWindow,
    HasBoth,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::None,
        Classification::HasApplications,
        Classification::HasOpenWindow,
        Classification::HasBoth,
    ];

    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Classification::None => None,
            Classification::HasApplications => Some("has-applications"),
            Classification::HasOpenWindow => Some("has-window"),
            Classification::HasBoth => Some("has-both"),
        }
    }
}

/// Record counts for one loaded feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub records: usize,
    pub skipped: usize,
}

/// Dates pulled out of one feed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedLoad {
    pub dates: BTreeSet<DateKey>,
    pub stats: FeedStats,
}

/// Collects the days named by a feed payload.
///
/// Records without a usable date are skipped and counted. A payload that is
/// not a list yields no dates at all.
pub fn extract_dates(feed: Feed, payload: &Value) -> FeedLoad {
    let Some(records) = payload.as_array() else {
        if !payload.is_null() {
            warn!("{feed} payload is not a list, treating it as empty");
        }
        return FeedLoad::default();
    };

    let mut load = FeedLoad {
        dates: BTreeSet::new(),
        stats: FeedStats {
            records: records.len(),
            skipped: 0,
        },
    };

    for record in records {
        let key = record
            .get(feed.date_field())
            .and_then(Value::as_str)
            .and_then(DateKey::parse_lenient);

        match key {
            Some(key) => {
                load.dates.insert(key);
            }
            None => load.stats.skipped += 1,
        }
    }

    if load.stats.skipped > 0 {
        warn!(
            "{feed}: skipped {} of {} records without a usable '{}' field",
            load.stats.skipped,
            load.stats.records,
            feed.date_field()
        );
    }

    load
}

/// Where the two feeds live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub application_dates: String,
    pub open_windows: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityCounts {
    pub application_dates: usize,
    pub open_window_dates: usize,
    pub both: usize,
    pub skipped_records: usize,
}

/// Immutable day sets for one calendar session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    applications: BTreeSet<DateKey>,
    open_windows: BTreeSet<DateKey>,
    both: BTreeSet<DateKey>,
    application_stats: FeedStats,
    window_stats: FeedStats,
}

impl Availability {
    pub fn new(applications: BTreeSet<DateKey>, open_windows: BTreeSet<DateKey>) -> Self {
        Self::from_loads(
            FeedLoad {
                dates: applications,
                stats: FeedStats::default(),
            },
            FeedLoad {
                dates: open_windows,
                stats: FeedStats::default(),
            },
        )
    }

    pub fn from_loads(applications: FeedLoad, open_windows: FeedLoad) -> Self {
        let both = applications
            .dates
            .intersection(&open_windows.dates)
            .copied()
            .collect();

        Self {
            applications: applications.dates,
            open_windows: open_windows.dates,
            both,
            application_stats: applications.stats,
            window_stats: open_windows.stats,
        }
    }

    pub fn classify(&self, date: DateKey) -> Classification {
        if self.both.contains(&date) {
            Classification::HasBoth
        } else if self.open_windows.contains(&date) {
            Classification::HasOpenWindow
        } else if self.applications.contains(&date) {
            Classification::HasApplications
        } else {
            Classification::None
        }
    }

    pub fn application_dates(&self) -> &BTreeSet<DateKey> {
        &self.applications
    }

    pub fn open_window_dates(&self) -> &BTreeSet<DateKey> {
        &self.open_windows
    }

    pub fn intersection(&self) -> &BTreeSet<DateKey> {
        &self.both
    }

    pub fn counts(&self) -> AvailabilityCounts {
        AvailabilityCounts {
            application_dates: self.applications.len(),
            open_window_dates: self.open_windows.len(),
            both: self.both.len(),
            skipped_records: self.application_stats.skipped + self.window_stats.skipped,
        }
    }
}

/// Fetches both feeds at once and builds the day sets.
///
/// Fails as a whole as soon as either feed exhausts its retries.
pub async fn load_availability<S: JsonSource>(
    source: &S,
    endpoints: &Endpoints,
    policy: RetryPolicy,
) -> Result<Availability, InitializationFailure> {
    let applications = async {
        fetch_with_retry(source, &endpoints.application_dates, policy)
            .await
            .map_err(|failure| InitializationFailure {
                feed: Feed::ApplicationDates,
                failure,
            })
    };
    let open_windows = async {
        fetch_with_retry(source, &endpoints.open_windows, policy)
            .await
            .map_err(|failure| InitializationFailure {
                feed: Feed::OpenWindows,
                failure,
            })
    };

    let (applications, open_windows) = tokio::try_join!(applications, open_windows)?;

    let availability = Availability::from_loads(
        extract_dates(Feed::ApplicationDates, &applications),
        extract_dates(Feed::OpenWindows, &open_windows),
    );
    debug!("availability loaded: {:?}", availability.counts());

    Ok(availability)
}
