//! Rendering episodes into page regions.
//!
//! Cards are plain HTML strings built by [`render_card`]; [`render_episodes`]
//! places them into the `latest-episode` and `episode-list` regions of a
//! [`Page`]. A failed fetch is surfaced with [`render_failure`] instead.

mod card;
pub mod page;

pub use card::{format_date, render_card, CardOptions, DESCRIPTION_LIMIT, UNTITLED_EPISODE};
pub use page::{Page, EPISODE_LIST_ID, LATEST_EPISODE_ID};

use crate::episode::Episode;
use crate::util::escape_html;

/// Classes added to the latest-episode region once it holds a card.
const LATEST_CLASSES: [&str; 2] = ["cards", "one"];

/// What [`render_episodes`] changed on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Whether a latest-episode region was filled.
    pub latest: bool,
    /// Number of episode-list regions filled.
    pub lists: usize,
}

/// Renders episodes (already in display order) into the page.
///
/// The newest card goes into the latest-episode region; every list region
/// receives all cards. An empty slice leaves the page untouched.
pub fn render_episodes(page: &mut Page, episodes: &[Episode], options: &CardOptions) -> RenderSummary {
    let Some(first) = episodes.first() else {
        return RenderSummary::default();
    };

    let latest = page.fill_latest(&render_card(first, options), &LATEST_CLASSES);

    let cards: String = episodes
        .iter()
        .map(|episode| render_card(episode, options))
        .collect();
    let lists = page.fill_lists(&cards);

    tracing::debug!(episodes = episodes.len(), latest, lists, "Rendered episode cards");
    RenderSummary { latest, lists }
}

/// The notice shown when no episodes could be loaded, linking to the feed.
pub fn failure_message(feed_url: &str) -> String {
    format!(
        "<p class=\"muted\">We\u{2019}re having trouble loading episodes right now. \
         <a href=\"{}\" target=\"_blank\" rel=\"noopener\">View RSS feed</a>.</p>",
        escape_html(feed_url)
    )
}

/// Puts the failure notice into the first episode-list region. Returns `false`
/// if the page has none.
pub fn render_failure(page: &mut Page, feed_url: &str) -> bool {
    page.fill_first_list(&failure_message(feed_url))
}
