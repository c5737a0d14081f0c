//! UTC date and time persisted as RFC3339 text.
//!
//! Sub-second precision is dropped at construction so the formatted
//! text is fixed width and lexicographic order matches chronological
//! order, which the storage layer relies on when comparing timestamp
//! columns in SQL.
use crate::Result;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Add};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

/// Date and time in UTC with whole-second precision.
#[derive(
    Debug, Clone, Serialize, Deserialize, Ord, PartialOrd, Eq, PartialEq,
)]
pub struct UtcDateTime(
    #[serde(with = "time::serde::rfc3339")] pub(crate) OffsetDateTime,
);

impl Default for UtcDateTime {
    fn default() -> Self {
        OffsetDateTime::now_utc().into()
    }
}

impl UtcDateTime {
    /// Create a UTC date time for now.
    pub fn now() -> Self {
        Default::default()
    }

    /// Parse as RFC3339; any fractional second is discarded.
    pub fn parse_rfc3339(value: &str) -> Result<Self> {
        Ok(OffsetDateTime::parse(value, &Rfc3339)?.into())
    }

    /// Format as RFC3339.
    pub fn to_rfc3339(&self) -> Result<String> {
        Ok(self.0.format(&Rfc3339)?)
    }
}

impl Add<Duration> for UtcDateTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        (self.0 + rhs).into()
    }
}

impl From<OffsetDateTime> for UtcDateTime {
    fn from(value: OffsetDateTime) -> Self {
        let value = value.to_offset(time::UtcOffset::UTC);
        Self(value.replace_nanosecond(0).unwrap_or(value))
    }
}

impl From<UtcDateTime> for OffsetDateTime {
    fn from(value: UtcDateTime) -> Self {
        value.0
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(value) => write!(f, "{}", value),
            Err(_) => Err(fmt::Error),
        }
    }
}
