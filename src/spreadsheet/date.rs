//! Turns the many ways a spreadsheet can spell a date into a timestamp.

use time::{
    Date, Duration, Month, OffsetDateTime, PrimitiveDateTime,
    format_description::well_known::{Iso8601, Rfc3339},
    macros::{datetime, format_description},
};

use crate::spreadsheet::CellValue;

/// Day zero of Excel's serial date numbers, which accounts for Excel treating 1900 as a leap year.
const EXCEL_EPOCH: OffsetDateTime = datetime!(1899-12-30 0:00 UTC);

/// The serial number of 9999-12-31, the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Normalize a date cell, falling back to `now` when the cell cannot be read as a date.
///
/// The cell is tried as, in order:
/// 1. a date value, which is returned as is,
/// 2. an RFC 3339 or ISO 8601 string, e.g. `2024-03-05` or `2024-03-05T10:00:00-03:00`,
///    or a date and time separated by a space, e.g. `2024-03-05 10:30:00`,
/// 3. `day/month/year` with `/` or `-` separators, e.g. `05/03/2024` is the 5th of March,
/// 4. `year/month/day` with the same separators.
///
/// Numbers are Excel serial dates. Dates without a time are midnight UTC and
/// two digit years are in the 2000s. The fallback logs a warning.
///
/// An import passes the same `now` for every row, so all rows without a
/// usable date get the same timestamp.
pub fn normalize_date(value: Option<&CellValue>, now: OffsetDateTime) -> OffsetDateTime {
    let parsed = match value {
        Some(CellValue::Date(date)) => Some(*date),
        Some(CellValue::Number(serial)) => excel_serial_to_datetime(*serial),
        Some(CellValue::Text(text)) => parse_date_text(text),
        None => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!("Invalid or missing date {value:?} in spreadsheet, using the current time");
        now
    })
}

/// Convert an Excel serial date number, e.g. `45356.5` for noon on 2024-03-05.
///
/// Returns `None` for numbers outside the range of dates Excel can represent.
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<OffsetDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_EXCEL_SERIAL + 1.0 {
        return None;
    }

    // Rounding to whole seconds removes the floating point noise in the time of day.
    let seconds = (serial * 86_400.0).round() as i64;

    EXCEL_EPOCH.checked_add(Duration::seconds(seconds))
}

/// Parse a date string with the same rules as [normalize_date], without the fallback.
pub(crate) fn parse_date_text(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();

    parse_standard_date(text).or_else(|| {
        let [first, second, third] = split_date_parts(text)?;

        build_date(third, second, first).or_else(|| build_date(first, second, third))
    })
}

fn parse_standard_date(text: &str) -> Option<OffsetDateTime> {
    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date_time);
    }

    if let Ok(date_time) = OffsetDateTime::parse(text, &Iso8601::DEFAULT) {
        return Some(date_time);
    }

    if let Ok(date_time) = PrimitiveDateTime::parse(text, &Iso8601::DEFAULT) {
        return Some(date_time.assume_utc());
    }

    if let Ok(date_time) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(date_time.assume_utc());
    }

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn split_date_parts(text: &str) -> Option<[i32; 3]> {
    let parts = text
        .split(['-', '/'])
        .map(|part| part.trim().parse::<i32>().ok())
        .collect::<Option<Vec<_>>>()?;

    parts.try_into().ok()
}

fn build_date(year: i32, month: i32, day: i32) -> Option<OffsetDateTime> {
    if year <= 0 {
        return None;
    }

    let year = if year < 100 { year + 2000 } else { year };
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    let day = u8::try_from(day).ok()?;

    Date::from_calendar_date(year, month, day)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

#[cfg(test)]
mod normalize_date_tests {
    use time::macros::datetime;

    use crate::spreadsheet::{
        CellValue,
        date::{excel_serial_to_datetime, normalize_date},
    };

    const NOW: time::OffsetDateTime = datetime!(2026-10-19 12:34:56 UTC);

    fn normalize_text(text: &str) -> time::OffsetDateTime {
        normalize_date(Some(&CellValue::Text(text.to_owned())), NOW)
    }

    #[test]
    fn date_values_are_returned_unchanged() {
        let date = datetime!(2024-03-05 10:00 -3);

        let got = normalize_date(Some(&CellValue::Date(date)), NOW);

        assert_eq!(got, date);
    }

    #[test]
    fn slashes_are_day_month_year() {
        assert_eq!(normalize_text("05/03/2024"), datetime!(2024-03-05 0:00 UTC));
        assert_eq!(normalize_text("13/12/2023"), datetime!(2023-12-13 0:00 UTC));
    }

    #[test]
    fn iso_dates_are_year_month_day() {
        assert_eq!(normalize_text("2024-03-05"), datetime!(2024-03-05 0:00 UTC));
    }

    #[test]
    fn iso_date_times_keep_their_offset() {
        assert_eq!(
            normalize_text("2024-03-05T10:30:00-03:00"),
            datetime!(2024-03-05 10:30 -3)
        );
        assert_eq!(
            normalize_text("2024-03-05T10:30:00"),
            datetime!(2024-03-05 10:30 UTC)
        );
    }

    #[test]
    fn space_separated_date_times_are_utc() {
        assert_eq!(
            normalize_text("2024-03-05 10:30:00"),
            datetime!(2024-03-05 10:30 UTC)
        );
    }

    #[test]
    fn dashes_are_day_month_year() {
        assert_eq!(normalize_text("5-3-2024"), datetime!(2024-03-05 0:00 UTC));
    }

    #[test]
    fn year_first_is_tried_after_day_first() {
        assert_eq!(normalize_text("2024/03/05"), datetime!(2024-03-05 0:00 UTC));
        assert_eq!(normalize_text("2024-3-5"), datetime!(2024-03-05 0:00 UTC));
    }

    #[test]
    fn two_digit_years_are_in_this_century() {
        assert_eq!(normalize_text("05/03/24"), datetime!(2024-03-05 0:00 UTC));
    }

    #[test]
    fn impossible_dates_fall_back_to_now() {
        assert_eq!(normalize_text("31/02/2024"), NOW);
        assert_eq!(normalize_text("00/01/2024"), NOW);
    }

    #[test]
    fn garbage_falls_back_to_now() {
        for text in ["", "amanhã", "1/2", "1/2/3/4", "a/b/c"] {
            assert_eq!(normalize_text(text), NOW, "input {text:?}");
        }
    }

    #[test]
    fn missing_date_falls_back_to_now() {
        assert_eq!(normalize_date(None, NOW), NOW);
    }

    #[test]
    fn numbers_are_excel_serial_dates() {
        let got = normalize_date(Some(&CellValue::Number(45356.0)), NOW);

        assert_eq!(got, datetime!(2024-03-05 0:00 UTC));
    }

    #[test]
    fn excel_serial_keeps_time_of_day() {
        assert_eq!(
            excel_serial_to_datetime(45356.5),
            Some(datetime!(2024-03-05 12:00 UTC))
        );
    }

    #[test]
    fn excel_serial_out_of_range_is_none() {
        assert_eq!(excel_serial_to_datetime(0.0), None);
        assert_eq!(excel_serial_to_datetime(-1.0), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
        assert_eq!(excel_serial_to_datetime(1e12), None);
    }
}
