//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: only absolute http(s) URLs are fetched
//! - **HTML text extraction**: inert markup stripping for feed descriptions
//! - **Text processing**: character-budget truncation for card synopses
//!
//! # Examples
//!
//! ```
//! use podcast_cards::util::{strip_tags, truncate_chars, validate_feed_url};
//!
//! let url = validate_feed_url("https://example.com/feed.xml").unwrap();
//! let text = strip_tags("<p>Episode <b>one</b></p>");
//! assert_eq!(text, "Episode one");
//! assert_eq!(truncate_chars(&text, 7), "Episode…");
//! # let _ = url;
//! ```

mod html;
mod text;
mod url_validator;

pub use html::{escape_html, strip_tags};
pub use text::{truncate_chars, ELLIPSIS};
pub use url_validator::{validate_feed_url, UrlValidationError};
