//! Renders the episodes of a podcast RSS feed as cards inside an HTML page.
//!
//! The feed is fetched directly, or through a feed-to-JSON proxy when the
//! direct request fails. Episodes are ordered newest first and written into
//! the page's `latest-episode` and `episode-list` regions.

pub mod config;
pub mod episode;
pub mod feed;
pub mod pipeline;
pub mod render;
pub mod util;
