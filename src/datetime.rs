//! Date-time normalization at the ingestion boundary.
//!
//! The appointment services serialize `LocalDateTime` either as an ISO
//! string or as a component array (`[2024, 12, 1, 14, 0]`, Jackson's
//! default without the JSR-310 string module). Both are folded into one
//! canonical `NaiveDateTime` in local wall-clock time as soon as a DTO is
//! deserialized; nothing past the models sees the raw forms.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire format used when sending date-times back to the server.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw date-time as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateTimeRepresentation {
    IsoString(String),
    ComponentTuple(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateTimeError {
    #[error("Date-time array must have 3 to 7 components, got {0}")]
    TupleLength(usize),
    #[error("Date-time component out of range: {0:?}")]
    OutOfRange(Vec<i64>),
    #[error("Unparseable date-time: {0}")]
    Unparseable(String),
}

impl DateTimeRepresentation {
    /// Fold either representation into local wall-clock time.
    pub fn normalize(&self) -> Result<NaiveDateTime, DateTimeError> {
        match self {
            Self::ComponentTuple(parts) => normalize_tuple(parts),
            Self::IsoString(raw) => normalize_iso(raw),
        }
    }
}

/// `[year, month(1-based), day, hour, minute, second, nanos]`; the time
/// components default to zero.
fn normalize_tuple(parts: &[i64]) -> Result<NaiveDateTime, DateTimeError> {
    if !(3..=7).contains(&parts.len()) {
        return Err(DateTimeError::TupleLength(parts.len()));
    }
    let at = |i: usize| parts.get(i).copied().unwrap_or(0);
    let out_of_range = || DateTimeError::OutOfRange(parts.to_vec());

    let year = i32::try_from(at(0)).map_err(|_| out_of_range())?;
    let [month, day, hour, minute, second, nanos] =
        [at(1), at(2), at(3), at(4), at(5), at(6)].map(|v| u32::try_from(v).ok());
    let date = NaiveDate::from_ymd_opt(year, month.ok_or_else(out_of_range)?, day.ok_or_else(out_of_range)?)
        .ok_or_else(out_of_range)?;
    let time = NaiveTime::from_hms_nano_opt(
        hour.ok_or_else(out_of_range)?,
        minute.ok_or_else(out_of_range)?,
        second.ok_or_else(out_of_range)?,
        nanos.ok_or_else(out_of_range)?,
    )
    .ok_or_else(out_of_range)?;

    Ok(date.and_time(time))
}

fn normalize_iso(raw: &str) -> Result<NaiveDateTime, DateTimeError> {
    let s = raw.trim();

    // Zoned instants are shifted into local time.
    if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
        return Ok(zoned.with_timezone(&Local).naive_local());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| DateTimeError::Unparseable(raw.to_string()))
}

/// Booking form date (`YYYY-MM-DD`) and time (`HH:MM`) joined into the
/// wire form `YYYY-MM-DDTHH:MM:00`.
pub fn compose_booking_date_time(date: &str, time: &str) -> Result<String, DateTimeError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| DateTimeError::Unparseable(date.to_string()))?;
    let clock = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .map_err(|_| DateTimeError::Unparseable(time.to_string()))?;
    Ok(day.and_time(clock).format(WIRE_FORMAT).to_string())
}

const WEEKDAYS_FR: [&str; 7] = ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."];
const MONTHS_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.", "déc.",
];

/// Short French rendering, e.g. `dim. 1 déc. 2024, 14:00`.
pub fn format_fr(dt: &NaiveDateTime) -> String {
    format!(
        "{} {} {} {}, {:02}:{:02}",
        WEEKDAYS_FR[dt.weekday().num_days_from_monday() as usize],
        dt.day(),
        MONTHS_FR[dt.month0() as usize],
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}

/// Render a raw wire value, falling back to its text when it does not parse.
pub fn format_raw_fr(raw: &DateTimeRepresentation) -> String {
    match raw.normalize() {
        Ok(dt) => format_fr(&dt),
        Err(_) => match raw {
            DateTimeRepresentation::IsoString(s) => s.clone(),
            DateTimeRepresentation::ComponentTuple(parts) => format!("{parts:?}"),
        },
    }
}

// ── Serde adapters for DTO fields ───────────────────────────

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    DateTimeRepresentation::deserialize(deserializer)?
        .normalize()
        .map_err(serde::de::Error::custom)
}

pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.format(WIRE_FORMAT).to_string())
}

/// Same adapters for nullable fields.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTimeRepresentation>::deserialize(deserializer)?
            .map(|raw| raw.normalize())
            .transpose()
            .map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn five_element_tuple_is_local_wall_clock() {
        let raw: DateTimeRepresentation = serde_json::from_str("[2024,12,1,14,0]").unwrap();
        assert_eq!(raw.normalize().unwrap(), local(2024, 12, 1, 14, 0));
    }

    #[test]
    fn tuple_time_components_default_to_zero() {
        let raw = DateTimeRepresentation::ComponentTuple(vec![2024, 2, 29]);
        assert_eq!(raw.normalize().unwrap(), local(2024, 2, 29, 0, 0));
    }

    #[test]
    fn seven_element_tuple_keeps_seconds_and_nanos() {
        let raw = DateTimeRepresentation::ComponentTuple(vec![2025, 1, 10, 9, 30, 15, 500_000_000]);
        let dt = raw.normalize().unwrap();
        assert_eq!(dt.second(), 15);
        assert_eq!(dt.nanosecond(), 500_000_000);
    }

    #[test]
    fn tuple_length_checked() {
        assert_eq!(
            DateTimeRepresentation::ComponentTuple(vec![2024, 12]).normalize(),
            Err(DateTimeError::TupleLength(2))
        );
        assert_eq!(
            DateTimeRepresentation::ComponentTuple(vec![0; 8]).normalize(),
            Err(DateTimeError::TupleLength(8))
        );
    }

    #[test]
    fn tuple_range_checked() {
        assert!(matches!(
            DateTimeRepresentation::ComponentTuple(vec![2024, 13, 1]).normalize(),
            Err(DateTimeError::OutOfRange(_))
        ));
        assert!(matches!(
            DateTimeRepresentation::ComponentTuple(vec![2024, 12, 1, -1, 0]).normalize(),
            Err(DateTimeError::OutOfRange(_))
        ));
    }

    #[test]
    fn naive_iso_string_is_local() {
        let raw: DateTimeRepresentation = serde_json::from_str("\"2024-12-01T14:00:00\"").unwrap();
        assert_eq!(raw.normalize().unwrap(), local(2024, 12, 1, 14, 0));

        let short = DateTimeRepresentation::IsoString("2024-12-01T14:00".into());
        assert_eq!(short.normalize().unwrap(), local(2024, 12, 1, 14, 0));

        let fractional = DateTimeRepresentation::IsoString("2024-12-01T14:00:00.123".into());
        assert_eq!(fractional.normalize().unwrap().minute(), 0);
    }

    #[test]
    fn zoned_iso_string_shifts_to_local() {
        let raw = DateTimeRepresentation::IsoString("2024-12-01T14:00:00Z".into());
        let expected = chrono::Utc
            .with_ymd_and_hms(2024, 12, 1, 14, 0, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(raw.normalize().unwrap(), expected);
    }

    #[test]
    fn bare_date_is_midnight() {
        let raw = DateTimeRepresentation::IsoString("2025-01-10".into());
        assert_eq!(raw.normalize().unwrap(), local(2025, 1, 10, 0, 0));
    }

    #[test]
    fn garbage_string_rejected() {
        let raw = DateTimeRepresentation::IsoString("tomorrow".into());
        assert_eq!(raw.normalize(), Err(DateTimeError::Unparseable("tomorrow".into())));
    }

    #[test]
    fn booking_date_time_composition() {
        assert_eq!(
            compose_booking_date_time("2025-01-10", "09:00").unwrap(),
            "2025-01-10T09:00:00"
        );
        assert_eq!(
            compose_booking_date_time("2025-01-10", "09:00:00").unwrap(),
            "2025-01-10T09:00:00"
        );
        assert!(compose_booking_date_time("10/01/2025", "09:00").is_err());
        assert!(compose_booking_date_time("2025-01-10", "9h").is_err());
    }

    #[test]
    fn french_short_format() {
        assert_eq!(format_fr(&local(2024, 12, 1, 14, 0)), "dim. 1 déc. 2024, 14:00");
        assert_eq!(format_fr(&local(2025, 8, 4, 9, 5)), "lun. 4 août 2025, 09:05");
    }

    #[test]
    fn raw_format_falls_back_to_text() {
        let raw = DateTimeRepresentation::IsoString("bientôt".into());
        assert_eq!(format_raw_fr(&raw), "bientôt");
        let tuple = DateTimeRepresentation::ComponentTuple(vec![2024, 12, 1, 14, 0]);
        assert_eq!(format_raw_fr(&tuple), "dim. 1 déc. 2024, 14:00");
    }

    #[derive(Deserialize, Serialize)]
    struct Holder {
        #[serde(with = "crate::datetime")]
        at: NaiveDateTime,
        #[serde(with = "crate::datetime::option", default)]
        maybe: Option<NaiveDateTime>,
    }

    #[test]
    fn serde_adapters_accept_both_forms() {
        let h: Holder = serde_json::from_str(r#"{"at":[2024,12,1,14,0],"maybe":"2024-12-02T08:30:00"}"#).unwrap();
        assert_eq!(h.at, local(2024, 12, 1, 14, 0));
        assert_eq!(h.maybe, Some(local(2024, 12, 2, 8, 30)));

        let h: Holder = serde_json::from_str(r#"{"at":"2024-12-01T14:00:00","maybe":null}"#).unwrap();
        assert_eq!(h.maybe, None);

        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["at"], "2024-12-01T14:00:00");
    }
}
