//! Time window for analytics queries.

use chrono::{DateTime, SecondsFormat, TimeDelta, Timelike, Utc};

/// Right-open time range `[since, until)` of an analytics query.
///
/// The window is one minute long, aligned to a minute boundary and offset into the past
/// by the scrape delay, so that upstream aggregation has settled by the time it's queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    since: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl QueryWindow {
    /// Window length.
    pub const LENGTH: TimeDelta = TimeDelta::minutes(1);

    /// Computes the window for the current time `now`.
    pub fn new(now: DateTime<Utc>, scrape_delay: TimeDelta) -> Self {
        let shifted = now - scrape_delay;
        let until = shifted
            - TimeDelta::seconds(i64::from(shifted.second()))
            - TimeDelta::nanoseconds(i64::from(shifted.nanosecond()));
        Self {
            since: until - Self::LENGTH,
            until,
        }
    }

    /// Returns the inclusive start of the window.
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Returns the exclusive end of the window.
    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }

    /// Formats the start of the window as an RFC 3339 timestamp.
    pub fn since_rfc3339(&self) -> String {
        self.since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Formats the end of the window as an RFC 3339 timestamp.
    pub fn until_rfc3339(&self) -> String {
        self.until.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
