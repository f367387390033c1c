//! Positional decoding of sensor timestamps.
//!
//! Sensors key their readings with a 15 character string `MMDDYYYY_HHMMSS`:
//! fourteen digits and one separator at index 8. The separator is never
//! inspected, only skipped.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

pub const INVALID_TIMESTAMP: &str = "Invalid Timestamp";

const ENCODED_LEN: usize = 15;
const SEPARATOR_IDX: usize = 8;

fn field(raw: &[u8], start: usize, end: usize) -> Option<u32> {
    let digits = raw.get(start..end)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(digits.iter().fold(0_u32, |acc, d| acc * 10 + u32::from(d - b'0')))
}

/// Decodes a raw sensor timestamp. Returns `None` for anything that is not a
/// real calendar date and time; out-of-range fields never roll over.
pub fn decode(raw: &str) -> Option<NaiveDateTime> {
    let bytes = raw.as_bytes();
    if bytes.len() != ENCODED_LEN || !raw.is_ascii() {
        return None;
    }

    let month = field(bytes, 0, 2)?;
    let day = field(bytes, 2, 4)?;
    let year = field(bytes, 4, SEPARATOR_IDX)?;
    let hour = field(bytes, 9, 11)?;
    let minute = field(bytes, 11, 13)?;
    let second = field(bytes, 13, 15)?;

    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

/// Inverse of [`decode`], always using `_` as the separator.
pub fn encode(ts: &NaiveDateTime) -> String {
    format!(
        "{:02}{:02}{:04}_{:02}{:02}{:02}",
        ts.month(),
        ts.day(),
        ts.year(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Human readable form used by tables, or [`INVALID_TIMESTAMP`].
pub fn display(raw: &str) -> String {
    match decode(raw) {
        Some(ts) => ts.format("%m/%d/%Y, %H:%M:%S").to_string(),
        None => INVALID_TIMESTAMP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_positional_fields() {
        let ts = decode("01152024_143000").expect("valid timestamp");
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 30);
        assert_eq!(ts.second(), 0);
    }

    #[test]
    fn separator_is_skipped_not_checked() {
        assert_eq!(decode("01152024-143000"), decode("01152024_143000"));
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in [
            "",
            "0115202414300",
            "01152024_1430000",
            "0x152024_143000",
            "13152024_143000",
            "02302024_120000",
            "01152024_250000",
            "01152024_146100",
            "01152024_14300é",
        ] {
            assert_eq!(decode(raw), None, "{raw:?} should not decode");
            assert_eq!(display(raw), INVALID_TIMESTAMP);
        }
    }

    #[test]
    fn decode_encode_decode_is_stable() {
        for raw in ["01152024_143000", "12312023-235959", "02292024_000000"] {
            let first = decode(raw).expect("valid timestamp");
            let again = decode(&encode(&first)).expect("re-encoded timestamp decodes");
            assert_eq!(first, again);
        }
    }

    #[test]
    fn display_formats_date_and_time() {
        assert_eq!(display("07042023_090507"), "07/04/2023, 09:05:07");
    }
}
