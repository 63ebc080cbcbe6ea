use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Serialize, Serializer};

/// How often the external scheduler starts a new run of a pipeline.
///
/// Definitions accept both the bare word (`"daily"`) and the scheduler's
/// shorthand (`"@daily"`); the wire form sent at registration is always the
/// shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// The scheduler's wire form for this cadence.
    pub fn as_engine_str(&self) -> &'static str {
        match self {
            Cadence::Hourly => "@hourly",
            Cadence::Daily => "@daily",
            Cadence::Weekly => "@weekly",
            Cadence::Monthly => "@monthly",
        }
    }

    /// The start instant of the period following the one that starts at
    /// `instant`.
    ///
    /// Months advance calendar-wise (Jan 31 + 1 month = Feb 28/29), matching
    /// how the scheduler lays out monthly runs.
    pub fn advance(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Cadence::Hourly => instant + Duration::hours(1),
            Cadence::Daily => instant + Duration::days(1),
            Cadence::Weekly => instant + Duration::weeks(1),
            Cadence::Monthly => instant + Months::new(1),
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::Daily
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('@').to_lowercase().as_str() {
            "hourly" => Ok(Cadence::Hourly),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(format!(
                "invalid cadence: {other} (expected \"hourly\", \"daily\", \"weekly\" or \"monthly\")"
            )),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_engine_str())
    }
}

impl Serialize for Cadence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_engine_str())
    }
}
