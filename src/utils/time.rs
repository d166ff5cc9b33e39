//! Timestamp helpers: RFC 3339 serde for transcript snapshots and the short
//! clock label shown under each message.

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

/// Two-digit hour and minute, e.g. `09:05`.
pub fn clock_label(datetime: OffsetDateTime) -> String {
    let format = format_description!("[hour]:[minute]");
    datetime
        .format(&format)
        .unwrap_or_else(|_| format!("{:02}:{:02}", datetime.hour(), datetime.minute()))
}

/// The current time in the local offset, falling back to UTC when the
/// offset cannot be determined (as happens in multi-threaded processes).
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
