use crate::lookup::details::FieldError;
use chrono::{DateTime, TimeZone, Utc};

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parses a publication date as displayed on detail pages
///
/// Accepts "2003", "December 2003" and "December 10th 2003". A missing month
/// or day defaults to January / the 1st, and an unknown month name falls back
/// to January. The result is midnight UTC.
///
/// # Examples
///
/// ```
/// use shelfari_metadata::lookup::parse_pubdate;
///
/// let date = parse_pubdate("December 10th 2003").unwrap();
/// assert_eq!(date.format("%Y-%m-%d").to_string(), "2003-12-10");
/// ```
pub fn parse_pubdate(text: &str) -> Result<DateTime<Utc>, FieldError> {
    let invalid = || FieldError::Date(text.to_string());

    let parts: Vec<&str> = text
        .split_whitespace()
        .map(|part| part.trim_matches(','))
        .filter(|part| !part.is_empty())
        .collect();

    let (year_text, rest) = parts.split_last().ok_or_else(invalid)?;
    if year_text.len() != 4 || !year_text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = year_text.parse().map_err(|_| invalid())?;

    let month = rest
        .first()
        .and_then(|name| {
            let name = name.to_lowercase();
            MONTHS.iter().position(|m| *m == name)
        })
        .map(|index| index as u32 + 1)
        .unwrap_or(1);

    let day = match rest.get(1) {
        Some(day_text) => {
            let digits: String = day_text.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().map_err(|_| invalid())?
        }
        None => 1,
    };

    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(invalid)
}
