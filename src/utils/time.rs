//! Timestamp helpers for the session store.
//!
//! Use as `#[serde(with = "crate::utils::time")]` on an `OffsetDateTime` field to store it
//! as an RFC 3339 string.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// The current time in the local offset, or UTC if the offset cannot be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYYMMDD-HHMMSS`, the timestamp prefix of a session id.
pub fn session_stamp(datetime: OffsetDateTime) -> String {
    datetime
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM:SS`, for tables.
pub fn listing(datetime: OffsetDateTime) -> String {
    datetime
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}
