use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// `YYYY:MM:DD HH:MM:SS` as written by EXIF and exiftool. Anything after the
/// seconds (offset, sub-seconds) is ignored.
static COMPACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}):(\d{2}):(\d{2})[ T](\d{2}):(\d{2}):(\d{2})").unwrap()
});
static OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+-]\d{2}:?\d{2}$").unwrap());
static FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\d+").unwrap());

/// The input did not match any supported date-time layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized date-time: {input:?}")]
pub struct ParseError {
    pub input: String,
}

impl ParseError {
    fn new(input: &str) -> Self {
        Self { input: input.to_string() }
    }
}

/// Normalize a metadata date string to a naive wall-clock timestamp.
///
/// Accepted, in order:
/// 1. `2021:06:15 14:30:00` (also with `T` between date and time)
/// 2. `2021-06-15T14:30:00.123+02:00`: the `T`, a `Z`, the offset and the
///    fractional seconds are all dropped; the offset is not applied
/// 3. `2021-06-15` (midnight)
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::new(s));
    }

    if let Some(caps) = COMPACT_RE.captures(s) {
        let num = |i: usize| caps[i].parse::<u32>().ok();
        let date = num(1)
            .and_then(|y| NaiveDate::from_ymd_opt(y as i32, num(2)?, num(3)?))
            .and_then(|d| d.and_hms_opt(num(4)?, num(5)?, num(6)?));
        return date.ok_or_else(|| ParseError::new(s));
    }

    let cleaned = s.replace('T', " ");
    let cleaned = cleaned.strip_suffix('Z').unwrap_or(&cleaned);
    let cleaned = OFFSET_RE.replace(cleaned, "");
    let cleaned = FRACTION_RE.replace_all(&cleaned, "");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default());
    }

    Err(ParseError::new(s))
}
