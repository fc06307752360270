//! Calendar-date text conventions.
//!
//! Dates cross the ledger boundary without a time-of-day component, in two
//! textual forms: `YYYY-MM-DD` for machine-facing fields and `YYYY/MM/DD` for
//! display fields. Both parse back to the same [`NaiveDate`].

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};

/// Format of machine-facing date fields.
pub const MACHINE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of display-oriented date fields.
pub const DISPLAY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Parses a date in either the machine or the display format.
///
/// # Example
///
/// ```
/// use leave_ledger::models::parse_calendar_date;
///
/// let machine = parse_calendar_date("2024-10-01").unwrap();
/// let display = parse_calendar_date("2024/10/01").unwrap();
/// assert_eq!(machine, display);
/// ```
pub fn parse_calendar_date(value: &str) -> LedgerResult<NaiveDate> {
    let trimmed = value.trim();
    let format = if trimmed.contains('/') {
        DISPLAY_DATE_FORMAT
    } else {
        MACHINE_DATE_FORMAT
    };
    NaiveDate::parse_from_str(trimmed, format).map_err(|e| LedgerError::InvalidDate {
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// Formats a date for machine-facing fields.
pub fn to_machine_format(date: NaiveDate) -> String {
    date.format(MACHINE_DATE_FORMAT).to_string()
}

/// Formats a date for display fields.
pub fn to_display_format(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Serde adapter writing `YYYY/MM/DD` and reading either format.
pub mod display_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a date in the display format.
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_display_format(*date))
    }

    /// Deserializes a date in either format.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional display dates.
pub mod option_display_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional date in the display format.
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&super::to_display_format(*date)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional date in either format.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| super::parse_calendar_date(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        date: NaiveDate,
        #[serde(with = "display_date")]
        date_display: NaiveDate,
        #[serde(with = "option_display_date")]
        next_display: Option<NaiveDate>,
    }

    #[test]
    fn test_both_formats_parse_to_same_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(parse_calendar_date("2025-07-01").unwrap(), expected);
        assert_eq!(parse_calendar_date("2025/07/01").unwrap(), expected);
        assert_eq!(parse_calendar_date(" 2025/07/01 ").unwrap(), expected);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        match parse_calendar_date("2025/02/30") {
            Err(LedgerError::InvalidDate { value, .. }) => assert_eq!(value, "2025/02/30"),
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
        assert!(parse_calendar_date("01-07-2025").is_err());
    }

    #[test]
    fn test_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        assert_eq!(to_machine_format(date), "2024-10-01");
        assert_eq!(to_display_format(date), "2024/10/01");
    }

    #[test]
    fn test_serde_adapters_write_display_and_read_either() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let row = Row {
            date,
            date_display: date,
            next_display: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["date"], "2024-10-01");
        assert_eq!(json["date_display"], "2024/10/01");
        assert!(json["next_display"].is_null());

        let parsed: Row = serde_json::from_str(
            r#"{"date":"2024-10-01","date_display":"2024-10-01","next_display":"2025/10/01"}"#,
        )
        .unwrap();
        assert_eq!(parsed.date_display, date);
        assert_eq!(parsed.next_display, NaiveDate::from_ymd_opt(2025, 10, 1));
    }
}
