//! The episode record shared by the feed parsers and the card renderer.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::cmp::Reverse;

/// A single podcast episode, built fresh from each feed fetch.
///
/// Every field is always present; missing feed data is stored as an empty
/// string and the renderer substitutes placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episode {
    pub title: String,
    /// Episode web page.
    pub link: String,
    /// Publication date exactly as the feed wrote it.
    pub pub_date: String,
    /// Plain-text synopsis with markup already stripped.
    pub description: String,
    /// Playable media URL (RSS `enclosure`).
    pub audio: String,
    /// Cover art URL.
    pub image: String,
}

impl Episode {
    /// Parses [`Episode::pub_date`], returning `None` when it is blank or
    /// not in a recognized format (see [`parse_pub_date`]).
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        parse_pub_date(&self.pub_date)
    }
}

/// Date-time layouts without an offset, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses a feed publication date.
///
/// Accepts RFC 2822 (the RSS `pubDate` format, including named zones such as
/// `GMT` or `EST`), RFC 3339, `YYYY-MM-DD HH:MM:SS` as emitted by feed-to-JSON
/// proxies, and bare `YYYY-MM-DD`. Values without an offset are taken as UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    // chrono rejects a weekday that disagrees with the date; feeds often get it wrong
    if let Some(dt) = strip_weekday(raw).and_then(|rest| DateTime::parse_from_rfc2822(rest).ok()) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Returns an RFC 2822 date without its leading `Day,` token.
fn strip_weekday(raw: &str) -> Option<&str> {
    let (day, rest) = raw.split_once(',')?;
    let day = day.trim();
    if day.is_empty() || !day.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(rest.trim_start())
}

/// Sorts episodes newest first.
///
/// The sort is stable. Episodes whose date cannot be parsed are placed after
/// every dated episode and keep their feed order among themselves. This is a
/// chosen total order: a plain comparison of unparseable dates has no defined
/// position, and `sort_by_cached_key` needs one.
pub fn sort_newest_first(episodes: &mut [Episode]) {
    // Option orders None before Some, so Reverse puts undated entries last
    episodes.sort_by_cached_key(|episode| Reverse(episode.published()));
}
