use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Duration, OffsetDateTime};
use time::format_description::well_known::Rfc3339;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TimestampError {
    #[error("Timestamp out of range: {0}")]
    OutOfRange(String),
    #[error("Unrecognized timestamp string: {0}")]
    Unparseable(String),
}

/// Every shape a timestamp has been stored or sent as: epoch milliseconds,
/// an RFC 3339 string, or a seconds/nanoseconds pair with or without the
/// leading underscore.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LegacyTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Iso(String),
    Seconds {
        seconds: i64,
        #[serde(default)]
        nanoseconds: i64,
    },
    UnderscoreSeconds {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds", default)]
        nanoseconds: i64,
    },
}

/// UTC instant used everywhere inside the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        Self(datetime.to_offset(time::UtcOffset::UTC))
    }

    pub fn from_millis(millis: i64) -> Result<Self, TimestampError> {
        let nanos = i128::from(millis) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map(Self)
            .map_err(|_| TimestampError::OutOfRange(millis.to_string()))
    }

    pub fn from_legacy(raw: LegacyTimestamp) -> Result<Self, TimestampError> {
        match raw {
            LegacyTimestamp::Millis(ms) => Self::from_millis(ms),
            LegacyTimestamp::FractionalMillis(ms) => {
                if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
                    return Err(TimestampError::OutOfRange(ms.to_string()));
                }
                Self::from_millis(ms.floor() as i64)
            }
            LegacyTimestamp::Iso(text) => OffsetDateTime::parse(text.trim(), &Rfc3339)
                .map(Self::from_datetime)
                .map_err(|_| TimestampError::Unparseable(text)),
            LegacyTimestamp::Seconds { seconds, nanoseconds }
            | LegacyTimestamp::UnderscoreSeconds { seconds, nanoseconds } => {
                let nanos = i128::from(seconds) * 1_000_000_000 + i128::from(nanoseconds);
                OffsetDateTime::from_unix_timestamp_nanos(nanos)
                    .map(Self)
                    .map_err(|_| TimestampError::OutOfRange(format!("{seconds}s {nanoseconds}ns")))
            }
        }
    }

    pub fn datetime(&self) -> OffsetDateTime {
        self.0
    }

    pub fn unix_millis(&self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration).map(Self)
    }

    /// Milliseconds from `now` until this instant, clamped at zero.
    pub fn millis_after(&self, now: Timestamp) -> i64 {
        let remaining = self.0 - now.0;
        (remaining.whole_milliseconds().max(0)) as i64
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(datetime: OffsetDateTime) -> Self {
        Self::from_datetime(datetime)
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LegacyTimestamp::deserialize(deserializer)?;
        Timestamp::from_legacy(raw).map_err(serde::de::Error::custom)
    }
}
