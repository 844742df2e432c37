use chrono::{DateTime, Utc};
use log::{debug, error};

use crate::config::SHORTS_MAX_SECONDS;
use crate::error::FetchError;
use crate::models::{EnrichedVideo, FetchSettings, Rating, VideoItem};
use crate::utils::{format_duration, parse_iso8601_duration, parse_iso8601_timestamp};

pub fn parse_duration_field(duration: &str) -> Result<i64, FetchError> {
    parse_iso8601_duration(duration).ok_or_else(|| FetchError::Parse {
        field: "duration",
        value: duration.to_string(),
    })
}

pub fn parse_published_at(published_at: &str) -> Result<DateTime<Utc>, FetchError> {
    parse_iso8601_timestamp(published_at).ok_or_else(|| FetchError::Parse {
        field: "publishedAt",
        value: published_at.to_string(),
    })
}

/// Duration in seconds, 0 when the ISO-8601 string cannot be parsed.
pub fn duration_seconds(duration: &str) -> i64 {
    parse_duration_field(duration).unwrap_or_else(|e| {
        debug!("{e}, using 0");
        0
    })
}

/// Acceptance test against the view floor and duration ceiling. With
/// `only_shorts`, anything over 60 seconds is rejected as well.
pub fn is_acceptable(
    video: &VideoItem,
    min_views: i64,
    max_duration_seconds: i64,
    only_shorts: bool,
) -> bool {
    if video.view_count() < min_views {
        return false;
    }

    let seconds = duration_seconds(video.duration());
    if seconds > max_duration_seconds {
        return false;
    }
    if only_shorts && seconds > SHORTS_MAX_SECONDS {
        return false;
    }

    true
}

/// Whole days since publication, never less than 1.
pub fn age_days_at(published_at: &str, now: DateTime<Utc>) -> i64 {
    match parse_published_at(published_at) {
        Ok(published) => (now - published).num_days().max(1),
        Err(e) => {
            error!("{e}, assuming 1 day");
            1
        }
    }
}

pub fn age_days(published_at: &str) -> i64 {
    age_days_at(published_at, Utc::now())
}

pub fn daily_views_at(view_count: i64, published_at: &str, now: DateTime<Utc>) -> f64 {
    view_count as f64 / age_days_at(published_at, now) as f64
}

pub fn rating(view_count: i64) -> Rating {
    match view_count {
        v if v >= 10_000_000 => Rating::Triple,
        v if v >= 1_000_000 => Rating::Double,
        v if v >= 500_000 => Rating::Single,
        _ => Rating::None,
    }
}

pub fn enrich_at(video: VideoItem, now: DateTime<Utc>) -> EnrichedVideo {
    let views = video.view_count();
    let daily_views = daily_views_at(views, video.published_at(), now);
    let duration_seconds = duration_seconds(video.duration());

    EnrichedVideo {
        daily_views,
        rating: rating(views),
        duration_seconds,
        formatted_duration: format_duration(duration_seconds),
        video,
    }
}

/// Filter `videos` in arrival order and enrich the accepted ones, stopping
/// once `limit_per_keyword` records have been accepted.
pub fn filter_and_enrich(
    videos: Vec<VideoItem>,
    settings: &FetchSettings,
    now: DateTime<Utc>,
) -> Vec<EnrichedVideo> {
    let mut accepted = Vec::new();
    if settings.limit_per_keyword == 0 {
        return accepted;
    }

    for video in videos {
        if !is_acceptable(
            &video,
            settings.min_views,
            settings.max_duration_seconds,
            settings.only_shorts,
        ) {
            continue;
        }

        accepted.push(enrich_at(video, now));
        if accepted.len() >= settings.limit_per_keyword {
            break;
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentDetails, Snippet, Statistics};
    use chrono::{Duration, TimeZone};

    fn video(views: &str, duration: &str, published_at: &str) -> VideoItem {
        VideoItem {
            id: "vid".into(),
            snippet: Some(Snippet {
                title: Some("title".into()),
                published_at: Some(published_at.into()),
                ..Default::default()
            }),
            content_details: Some(ContentDetails {
                duration: Some(duration.into()),
            }),
            statistics: Some(Statistics {
                view_count: Some(views.into()),
                ..Default::default()
            }),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn acceptance_thresholds() {
        let v = video("150000", "PT45S", "2024-05-01T00:00:00Z");
        assert!(is_acceptable(&v, 100_000, 60, true));
        assert!(!is_acceptable(&v, 200_000, 60, true));
        assert!(!is_acceptable(&v, 100_000, 30, true));
        assert!(is_acceptable(&v, 150_000, 45, true));
    }

    #[test]
    fn shorts_cap_applies_regardless_of_max_duration() {
        let v = video("150000", "PT1M30S", "2024-05-01T00:00:00Z");
        assert!(!is_acceptable(&v, 0, 600, true));
        assert!(is_acceptable(&v, 0, 600, false));
    }

    #[test]
    fn acceptance_is_monotone_in_thresholds() {
        let videos = [
            video("150000", "PT45S", "2024-05-01T00:00:00Z"),
            video("999", "PT10S", "2024-05-01T00:00:00Z"),
            video("5000000", "PT59S", "2024-05-01T00:00:00Z"),
            video("abc", "bogus", "2024-05-01T00:00:00Z"),
        ];
        for v in &videos {
            for min_views in [0, 1000, 150_000, 10_000_000] {
                for max_duration in [0, 10, 45, 60] {
                    if !is_acceptable(v, min_views, max_duration, true) {
                        continue;
                    }
                    for looser_views in [0, min_views / 2, min_views] {
                        for looser_duration in [max_duration, max_duration + 15, 600] {
                            assert!(is_acceptable(v, looser_views, looser_duration, true));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unparsable_fields_fall_back() {
        let v = video("not-a-number", "garbage", "2024-05-01T00:00:00Z");
        assert!(is_acceptable(&v, 0, 0, true));
        assert!(!is_acceptable(&v, 1, 60, true));
        assert_eq!(duration_seconds("garbage"), 0);
    }

    #[test]
    fn parse_helpers_name_the_offending_field() {
        assert_eq!(parse_duration_field("PT1M5S").unwrap(), 65);
        match parse_duration_field("P1M") {
            Err(FetchError::Parse { field, value }) => {
                assert_eq!(field, "duration");
                assert_eq!(value, "P1M");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(
            parse_published_at("2024-05-22T12:00:00Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 22, 12, 0, 0).unwrap()
        );
        let err = parse_published_at("yesterday").unwrap_err();
        assert!(matches!(err, FetchError::Parse { field: "publishedAt", .. }));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn age_is_never_below_one_day() {
        let now = now();
        assert_eq!(age_days_at("2024-06-01T12:00:00Z", now), 1);
        assert_eq!(age_days_at("2024-06-01T00:00:00Z", now), 1);
        assert_eq!(age_days_at("2024-05-31T11:00:00Z", now), 1);
        assert_eq!(age_days_at("2024-05-22T12:00:00Z", now), 10);
        assert_eq!(age_days_at("2030-01-01T00:00:00Z", now), 1);
        assert_eq!(age_days_at("not a date", now), 1);
        assert_eq!(age_days_at("", now), 1);

        for hours in 0..72 {
            let published = (now - Duration::hours(hours)).to_rfc3339();
            assert!(age_days_at(&published, now) >= 1);
        }
    }

    #[test]
    fn daily_views_divide_by_age() {
        let now = now();
        assert_eq!(daily_views_at(1000, "2024-05-22T12:00:00Z", now), 100.0);
        assert_eq!(daily_views_at(1000, "2024-06-01T12:00:00Z", now), 1000.0);
        assert_eq!(daily_views_at(1000, "???", now), 1000.0);
    }

    #[test]
    fn rating_tiers_are_inclusive_at_lower_bound() {
        assert_eq!(rating(0), Rating::None);
        assert_eq!(rating(499_999), Rating::None);
        assert_eq!(rating(500_000), Rating::Single);
        assert_eq!(rating(999_999), Rating::Single);
        assert_eq!(rating(1_000_000), Rating::Double);
        assert_eq!(rating(9_999_999), Rating::Double);
        assert_eq!(rating(10_000_000), Rating::Triple);
        assert_eq!(rating(10_000_000).marker(), "🔥🔥🔥");
        assert_eq!(rating(500_000).marker(), "🔥");

        let mut previous = Rating::None;
        for views in (0..12_000_000).step_by(250_000) {
            let current = rating(views);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn enrich_derives_all_metrics() {
        let enriched = enrich_at(video("2000000", "PT59S", "2024-05-22T12:00:00Z"), now());
        assert_eq!(enriched.daily_views, 200_000.0);
        assert_eq!(enriched.rating, Rating::Double);
        assert_eq!(enriched.duration_seconds, 59);
        assert_eq!(enriched.formatted_duration, "00:59");
        assert_eq!(enriched.video.id, "vid");
    }

    #[test]
    fn filter_respects_limit_and_order() {
        let videos: Vec<VideoItem> = (0..10)
            .map(|i| {
                let mut v = video(&format!("{}", 200_000 + i), "PT30S", "2024-05-01T00:00:00Z");
                v.id = format!("v{i}");
                v
            })
            .collect();
        let settings = FetchSettings {
            days: 30,
            max_pages: 1,
            min_views: 100_000,
            max_duration_seconds: 60,
            limit_per_keyword: 3,
            only_shorts: true,
        };

        let accepted = filter_and_enrich(videos, &settings, now());
        let ids: Vec<&str> = accepted.iter().map(|e| e.video.id.as_str()).collect();
        assert_eq!(ids, vec!["v0", "v1", "v2"]);
    }
}
