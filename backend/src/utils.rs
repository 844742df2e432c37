use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::models::SortOrder;

/// Parse an RFC 3339 timestamp (`2024-01-01T12:00:00Z`, optionally with
/// fractional seconds or an offset) into UTC.
pub fn parse_iso8601_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an ISO-8601 duration (`PT1M30S`, `P1DT2H`) to whole seconds.
/// Calendar components (years, months) and malformed input yield `None`.
pub fn parse_iso8601_duration(duration_str: &str) -> Option<i64> {
    let rest = duration_str.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut total_seconds = 0.0;
    let mut current_number = String::new();
    let mut in_time = false;
    let mut seen_component = false;

    for ch in rest.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
            continue;
        }
        if ch == 'T' {
            if in_time || !current_number.is_empty() {
                return None;
            }
            in_time = true;
            continue;
        }

        let num = current_number.parse::<f64>().ok()?;
        current_number.clear();
        total_seconds += match (in_time, ch) {
            (false, 'W') => num * 604_800.0,
            (false, 'D') => num * 86_400.0,
            (true, 'H') => num * 3600.0,
            (true, 'M') => num * 60.0,
            (true, 'S') => num,
            _ => return None,
        };
        seen_component = true;
    }

    if !current_number.is_empty() || !seen_component {
        return None;
    }
    Some(total_seconds as i64)
}

/// `MM:SS`, or `HH:MM:SS` once the duration reaches an hour.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (m, s) = (seconds / 60, seconds % 60);
    let (h, m) = (m / 60, m % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

pub fn compare_with_order_float(a: f64, b: f64, order: &SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        SortOrder::Desc => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

pub fn compare_with_order_int(a: i64, b: i64, order: &SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => a.cmp(&b),
        SortOrder::Desc => b.cmp(&a),
    }
}

pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn channel_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{channel_id}")
}

/// Split comma separated keywords, dropping blanks.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
