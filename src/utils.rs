use std::fs::File;
use std::io::Read;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::structs::quiz_type::Seconds;

pub fn read_file(file_path: &str) -> Result<String, std::io::Error> {
    let mut file = File::open(file_path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

// RFC 3339 timestamp as sent to the reporting endpoint
pub fn timestamp(at: &OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

pub fn now() -> String {
    timestamp(&OffsetDateTime::now_utc())
}

// part / whole as a rounded percentage, 0 for an empty whole
pub fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

pub fn rounded_average(total: Seconds, count: usize) -> Seconds {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as Seconds
}

// 125 -> "2:05"
pub fn format_clock(seconds: Seconds) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
