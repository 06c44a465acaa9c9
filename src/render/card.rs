//! HTML card for a single episode.

use std::fmt::Write;

use crate::config::{DEFAULT_DATE_FORMAT, DEFAULT_IMAGE};
use crate::episode::{parse_pub_date, Episode};
use crate::util::{escape_html, truncate_chars};

/// Characters of description shown on a card before it is cut with an ellipsis.
pub const DESCRIPTION_LIMIT: usize = 240;

/// Title shown for episodes that have none.
pub const UNTITLED_EPISODE: &str = "Untitled episode";

/// Presentation settings shared by every card on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardOptions {
    /// Cover image for episodes without artwork.
    pub default_image: String,
    /// strftime pattern for the publication date.
    pub date_format: String,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            default_image: DEFAULT_IMAGE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Formats a feed date for display, in the date's own UTC offset.
///
/// Returns an empty string if the date cannot be parsed or `format` is not a
/// valid strftime pattern.
///
/// # Examples
///
/// ```
/// use podcast_cards::render::format_date;
///
/// assert_eq!(format_date("Fri, 01 Mar 2024 09:00:00 GMT", "%b %-d, %Y"), "Mar 1, 2024");
/// assert_eq!(format_date("not a date", "%b %-d, %Y"), "");
/// ```
pub fn format_date(raw: &str, format: &str) -> String {
    let Some(date) = parse_pub_date(raw) else {
        return String::new();
    };

    let mut out = String::new();
    // chrono reports a bad pattern as a fmt::Error rather than panicking here
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!(format = %format, "Invalid date format pattern");
        return String::new();
    }
    out
}

/// Makes a URL safe inside a single-quoted CSS `url('...')`.
fn css_url(url: &str) -> String {
    url.replace('\\', "%5C")
        .replace('\'', "%27")
        .replace('\n', "%0A")
        .replace('\r', "%0D")
}

/// Builds the HTML card for one episode.
///
/// Every interpolated value is escaped. Empty fields fall back to
/// [`UNTITLED_EPISODE`], a `#` link and the default image; the audio player is
/// omitted when the episode has no audio. The episode link opens in a new
/// browsing context with `rel="noopener"`.
pub fn render_card(episode: &Episode, options: &CardOptions) -> String {
    let image = if episode.image.is_empty() {
        options.default_image.as_str()
    } else {
        episode.image.as_str()
    };
    let title = if episode.title.is_empty() {
        UNTITLED_EPISODE
    } else {
        episode.title.as_str()
    };
    let link = if episode.link.is_empty() {
        "#"
    } else {
        episode.link.as_str()
    };

    let cover_style = if image.is_empty() {
        String::new()
    } else {
        format!(
            " style=\"background-image:url('{}')\"",
            escape_html(&css_url(image))
        )
    };
    let audio = if episode.audio.is_empty() {
        String::new()
    } else {
        format!(
            "<audio controls preload=\"none\" src=\"{}\"></audio>",
            escape_html(&episode.audio)
        )
    };
    let date = format_date(&episode.pub_date, &options.date_format);
    let description = truncate_chars(&episode.description, DESCRIPTION_LIMIT);

    format!(
        r#"
      <article class="card">
        <div class="card-media cover"{cover_style}></div>
        <div class="card-body">
          <h3>{title}</h3>
          <p class="muted tiny">{date}</p>
          <p class="muted">{description}</p>
          <div class="card-actions">
            {audio}
            <div class="links">
              <a class="btn small" href="{link}" target="_blank" rel="noopener">Episode page</a>
            </div>
          </div>
        </div>
      </article>"#,
        title = escape_html(title),
        date = escape_html(&date),
        description = escape_html(&description),
        link = escape_html(link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ELLIPSIS;
    use pretty_assertions::assert_eq;

    fn full_episode() -> Episode {
        Episode {
            title: "Episode 7".into(),
            link: "https://example.com/ep7".into(),
            pub_date: "Fri, 01 Mar 2024 09:00:00 GMT".into(),
            description: "We talk about Rust.".into(),
            audio: "https://cdn.example.com/ep7.mp3".into(),
            image: "https://example.com/ep7.jpg".into(),
        }
    }

    /// Extracts the text of `<p class="muted">…</p>` from a card.
    fn description_of(card: &str) -> &str {
        let start = card.find(r#"<p class="muted">"#).unwrap() + r#"<p class="muted">"#.len();
        let end = start + card[start..].find("</p>").unwrap();
        &card[start..end]
    }

    #[test]
    fn test_full_card() {
        let card = render_card(&full_episode(), &CardOptions::default());
        assert!(card.contains(r#"style="background-image:url('https://example.com/ep7.jpg')""#));
        assert!(card.contains("<h3>Episode 7</h3>"));
        assert!(card.contains(r#"<p class="muted tiny">Mar 1, 2024</p>"#));
        assert!(card.contains(r#"<p class="muted">We talk about Rust.</p>"#));
        assert!(card.contains(
            r#"<audio controls preload="none" src="https://cdn.example.com/ep7.mp3"></audio>"#
        ));
        assert!(card.contains(
            r#"<a class="btn small" href="https://example.com/ep7" target="_blank" rel="noopener">Episode page</a>"#
        ));
    }

    #[test]
    fn test_placeholders_for_empty_episode() {
        let card = render_card(&Episode::default(), &CardOptions::default());
        assert!(card.contains("<h3>Untitled episode</h3>"));
        assert!(card.contains(r##"href="#""##));
        assert!(card.contains("url('assets/logo.svg')"));
        assert!(card.contains(r#"<p class="muted tiny"></p>"#));
        assert!(!card.contains("<audio"));
    }

    #[test]
    fn test_custom_default_image() {
        let options = CardOptions {
            default_image: "/static/cover.png".into(),
            ..CardOptions::default()
        };
        let card = render_card(&Episode::default(), &options);
        assert!(card.contains("url('/static/cover.png')"));
    }

    #[test]
    fn test_no_cover_style_when_no_image_at_all() {
        let options = CardOptions {
            default_image: String::new(),
            ..CardOptions::default()
        };
        let card = render_card(&Episode::default(), &options);
        assert!(card.contains(r#"<div class="card-media cover"></div>"#));
    }

    #[test]
    fn test_description_over_limit_is_truncated() {
        let episode = Episode {
            description: "x".repeat(300),
            ..full_episode()
        };
        let card = render_card(&episode, &CardOptions::default());
        let description = description_of(&card);
        assert_eq!(description, format!("{}{}", "x".repeat(240), ELLIPSIS));
    }

    #[test]
    fn test_description_at_limit_is_untouched() {
        let episode = Episode {
            description: "y".repeat(240),
            ..full_episode()
        };
        let card = render_card(&episode, &CardOptions::default());
        assert_eq!(description_of(&card), "y".repeat(240));
    }

    #[test]
    fn test_values_are_escaped() {
        let episode = Episode {
            title: "<script>alert(1)</script>".into(),
            link: r#"https://example.com/?a=1&b="2""#.into(),
            description: "1 < 2 & 3 > 2".into(),
            audio: r#"x.mp3" onplay="steal()"#.into(),
            image: "https://example.com/it's.jpg".into(),
            ..Episode::default()
        };
        let card = render_card(&episode, &CardOptions::default());
        assert!(card.contains("<h3>&lt;script&gt;alert(1)&lt;/script&gt;</h3>"));
        assert!(card.contains(r#"href="https://example.com/?a=1&amp;b=&quot;2&quot;""#));
        assert!(card.contains("1 &lt; 2 &amp; 3 &gt; 2"));
        assert!(card.contains(r#"src="x.mp3&quot; onplay=&quot;steal()""#));
        assert!(card.contains("url('https://example.com/it%27s.jpg')"));
    }

    #[test]
    fn test_format_date_patterns() {
        assert_eq!(format_date("2024-03-01", "%b %-d, %Y"), "Mar 1, 2024");
        assert_eq!(format_date("2023-12-25 08:00:00", "%Y-%m-%d"), "2023-12-25");
        assert_eq!(format_date("", "%b %-d, %Y"), "");
        assert_eq!(format_date("yesterday", "%b %-d, %Y"), "");
        assert_eq!(format_date("Mon, 01 Mar 2024 09:00:00 GMT", "%b %-d, %Y"), "Mar 1, 2024");
    }

    #[test]
    fn test_format_date_uses_feed_offset() {
        // 23:30 in New York is already the next day in UTC
        assert_eq!(
            format_date("Sun, 31 Dec 2023 23:30:00 -0500", "%b %-d, %Y"),
            "Dec 31, 2023"
        );
    }

    #[test]
    fn test_format_date_bad_pattern() {
        assert_eq!(format_date("2024-03-01", "%Q"), "");
    }
}
