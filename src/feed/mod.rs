//! Retrieval of podcast episodes from an RSS feed.
//!
//! - **Parsing**: Convert RSS 2.0 XML into [`Episode`](crate::episode::Episode) records
//! - **Proxy decoding**: Read the JSON produced by a feed-to-JSON proxy
//! - **Fetching**: Direct HTTP retrieval with a single proxy fallback
//!
//! # Architecture
//!
//! - `parser` - Streaming XML extraction using `quick-xml`
//! - `proxy` - Lenient `serde_json` decoding of rss2json-style responses
//! - `fetcher` - HTTP fetching, body limits and the fallback decision
//!
//! # Example
//!
//! ```ignore
//! use podcast_cards::feed::fetch_episodes;
//!
//! let episodes = fetch_episodes(&client, "https://example.com/feed.xml", endpoint).await?;
//! ```

mod fetcher;
mod parser;
mod proxy;

pub use fetcher::{fetch_episodes, FeedError, FetchError};
pub use parser::{parse_feed_xml, ParseError};
pub use proxy::{parse_proxy_response, FEED_URL_PARAM};
