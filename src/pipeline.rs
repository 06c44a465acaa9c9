//! One end-to-end run: fetch, order, render.

use crate::config::Config;
use crate::episode::sort_newest_first;
use crate::feed::{fetch_episodes, FeedError};
use crate::render::{render_episodes, render_failure, Page, RenderSummary};

/// Result of a pipeline run.
#[derive(Debug)]
pub enum RunOutcome {
    /// No feed URL configured; nothing was fetched and the page is unchanged.
    Skipped,
    /// Episodes were fetched and rendered.
    Rendered {
        episodes: usize,
        summary: RenderSummary,
    },
    /// Both retrieval paths failed. The failure notice has been rendered.
    Failed(FeedError),
}

impl RunOutcome {
    /// Whether the page may have been modified and should be written.
    pub fn page_changed(&self) -> bool {
        !matches!(self, RunOutcome::Skipped)
    }
}

/// Runs the pipeline against `page` using the settings in `config`.
///
/// Never returns an error: a terminal fetch failure is rendered into the page
/// and reported as [`RunOutcome::Failed`] so the caller still writes the page.
pub async fn run(client: &reqwest::Client, config: &Config, page: &mut Page) -> RunOutcome {
    let Some(feed_url) = config.feed_url() else {
        tracing::debug!("No feed URL configured, skipping episode rendering");
        return RunOutcome::Skipped;
    };

    match fetch_episodes(client, feed_url, &config.fallback_endpoint).await {
        Ok(mut episodes) => {
            sort_newest_first(&mut episodes);
            let summary = render_episodes(page, &episodes, &config.card_options());
            tracing::info!(
                feed = %feed_url,
                episodes = episodes.len(),
                lists = summary.lists,
                "Rendered episodes"
            );
            RunOutcome::Rendered {
                episodes: episodes.len(),
                summary,
            }
        }
        Err(e) => {
            tracing::error!(feed = %feed_url, error = %e, "Failed to load episodes");
            if !render_failure(page, feed_url) {
                tracing::warn!("Page has no episode list to show the failure in");
            }
            RunOutcome::Failed(e)
        }
    }
}
