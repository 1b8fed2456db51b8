use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

pub const NOT_AVAILABLE: &str = "N/A";

const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM[:SS]` and plain dates.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_date_time(value).map(|dt| dt.date())
}

/// `15/3/2024`
pub fn format_date(value: Option<&str>) -> String {
    match value.and_then(parse_date) {
        Some(date) => format!("{}/{}/{}", date.day(), date.month(), date.year()),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `15 de marzo de 2024`
pub fn format_date_long(value: Option<&str>) -> String {
    match value.and_then(parse_date) {
        Some(date) => long_date(date),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `15 de marzo de 2024, 09:30`
pub fn format_date_time(value: Option<&str>) -> String {
    match value.and_then(parse_date_time) {
        Some(dt) => format!("{}, {:02}:{:02}", long_date(dt.date()), dt.hour(), dt.minute()),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Value for an `<input type="date">`.
pub fn to_date_input(value: Option<&str>) -> String {
    value
        .and_then(parse_date)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "Sí" } else { "No" }
}

fn long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_short() {
        assert_eq!(format_date(Some("2024-03-15")), "15/3/2024");
        assert_eq!(format_date(Some("2024-03-15T10:30:00Z")), "15/3/2024");
        assert_eq!(format_date(Some("2024-12-01T08:00:00.000Z")), "1/12/2024");
    }

    #[test]
    fn test_format_date_missing_or_invalid() {
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some("")), "N/A");
        assert_eq!(format_date(Some("ayer")), "N/A");
    }

    #[test]
    fn test_format_date_long() {
        assert_eq!(format_date_long(Some("2024-03-15")), "15 de marzo de 2024");
        assert_eq!(format_date_long(Some("2023-12-31T23:00:00Z")), "31 de diciembre de 2023");
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(format_date_time(Some("2024-03-15T09:30:00")), "15 de marzo de 2024, 09:30");
        assert_eq!(format_date_time(Some("2024-03-15")), "15 de marzo de 2024, 00:00");
    }

    #[test]
    fn test_to_date_input() {
        assert_eq!(to_date_input(Some("2020-05-04T00:00:00.000Z")), "2020-05-04");
        assert_eq!(to_date_input(None), "");
    }

    #[test]
    fn test_or_na_and_yes_no() {
        assert_eq!(or_na(Some("Labrador")), "Labrador");
        assert_eq!(or_na(Some("  ")), "N/A");
        assert_eq!(or_na(None), "N/A");
        assert_eq!(yes_no(true), "Sí");
        assert_eq!(yes_no(false), "No");
    }
}
