use chrono::{Datelike, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp cell at day resolution.
///
/// Month-only forms (`YYYY-MM`, `YYYY/MM`, `YYYYMM`) land on the first of the
/// month. Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() {
        return None;
    }

    // Some producers append a midnight time even to monthly data.
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // `%Y%m%d` would happily eat a six digit `YYYYMM`, so gate on length.
    if s.len() != 6 {
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d);
            }
        }
    }

    parse_year_month(s)
}

fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let (year, month) = if let Some((y, m)) = s.split_once(['-', '/']) {
        (y, m)
    } else if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.split_at(4)
    } else {
        return None;
    };
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

// ---------------------------------------------------------------------------
// Plot axis coordinates (decimal years)
// ---------------------------------------------------------------------------

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Convert a date to the decimal-year coordinate used on the chart x axis.
pub fn date_to_axis(date: NaiveDate) -> f64 {
    let year = date.year();
    year as f64 + date.ordinal0() as f64 / days_in_year(year) as f64
}

/// Inverse of [`date_to_axis`], rounded to the nearest day.
pub fn axis_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    let year = x.floor();
    if year < i32::MIN as f64 || year > i32::MAX as f64 {
        return None;
    }
    let year = year as i32;
    let days = days_in_year(year);
    let ordinal0 = ((x - year as f64) * days as f64).round() as u32;
    if ordinal0 >= days {
        return NaiveDate::from_yo_opt(year.checked_add(1)?, 1);
    }
    NaiveDate::from_yo_opt(year, ordinal0 + 1)
}

/// Short month label used in hover text and the summary table (`Mar 2024`).
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_timestamp("1982-03-01"), Some(ymd(1982, 3, 1)));
        assert_eq!(parse_timestamp("1982-03-01 00:00:00"), Some(ymd(1982, 3, 1)));
        assert_eq!(parse_timestamp("1982-03-15T12:30"), Some(ymd(1982, 3, 15)));
        assert_eq!(parse_timestamp("1982/03/15"), Some(ymd(1982, 3, 15)));
        assert_eq!(parse_timestamp("19820315"), Some(ymd(1982, 3, 15)));
        assert_eq!(parse_timestamp(" \"1982-03\" "), Some(ymd(1982, 3, 1)));
        assert_eq!(parse_timestamp("1982/3"), Some(ymd(1982, 3, 1)));
        assert_eq!(parse_timestamp("198203"), Some(ymd(1982, 3, 1)));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "time", "1982-13", "1982-02-30", "82-03", "abc123", "1982-03-01x"] {
            assert_eq!(parse_timestamp(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn axis_coordinates_round_trip() {
        for d in [ymd(1980, 1, 1), ymd(1999, 12, 31), ymd(2000, 2, 29), ymd(2024, 7, 15)] {
            assert_eq!(axis_to_date(date_to_axis(d)), Some(d));
        }
        assert_eq!(date_to_axis(ymd(2001, 1, 1)), 2001.0);
        assert!(axis_to_date(f64::NAN).is_none());
    }

    #[test]
    fn month_label_is_short() {
        assert_eq!(month_label(ymd(2024, 3, 1)), "Mar 2024");
    }
}
