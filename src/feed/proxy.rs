//! Decoding of feed-to-JSON proxy responses (rss2json-compatible).

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::episode::Episode;
use crate::feed::fetcher::FetchError;
use crate::util::strip_tags;

/// Query parameter carrying the feed URL to the proxy endpoint.
pub const FEED_URL_PARAM: &str = "rss_url";

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    items: Option<Vec<ProxyItem>>,
}

/// One converted feed item. Proxies are inconsistent about field types,
/// so every field tolerates a non-string value by treating it as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyItem {
    title: Lenient,
    link: Lenient,
    #[serde(rename = "pubDate")]
    pub_date: Lenient,
    published: Lenient,
    content: Lenient,
    description: Lenient,
    enclosure: Enclosure,
    thumbnail: Lenient,
}

/// A string field that degrades to `None` for nulls, numbers, objects, ...
#[derive(Debug, Default)]
struct Lenient(Option<String>);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Other(IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Lenient(Some(text)),
            Raw::Other(_) => Lenient(None),
        })
    }
}

impl Lenient {
    /// The value if present and non-empty.
    fn non_empty(&self) -> Option<&str> {
        self.0.as_deref().filter(|s| !s.is_empty())
    }

    fn into_string(self) -> String {
        self.0.unwrap_or_default()
    }
}

/// `enclosure` is an object (`{"link": ..., "thumbnail": ...}`) on most
/// proxies, a bare URL string on some, and `[]` or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Enclosure {
    Object {
        #[serde(default)]
        link: Lenient,
        #[serde(default)]
        thumbnail: Lenient,
    },
    Url(String),
    #[default]
    #[serde(skip)]
    Missing,
    Other(IgnoredAny),
}

impl Enclosure {
    fn audio(&self) -> &str {
        match self {
            Enclosure::Object { link, .. } => link.non_empty().unwrap_or_default(),
            Enclosure::Url(url) => url,
            Enclosure::Missing | Enclosure::Other(_) => "",
        }
    }

    fn thumbnail(&self) -> Option<&str> {
        match self {
            Enclosure::Object { thumbnail, .. } => thumbnail.non_empty(),
            _ => None,
        }
    }
}

impl ProxyItem {
    fn into_episode(self) -> Episode {
        let pub_date = self
            .pub_date
            .non_empty()
            .or_else(|| self.published.non_empty())
            .unwrap_or_default()
            .to_owned();
        let description = strip_tags(
            self.content
                .non_empty()
                .or_else(|| self.description.non_empty())
                .unwrap_or_default(),
        );
        let audio = self.enclosure.audio().to_owned();
        let image = self
            .thumbnail
            .non_empty()
            .or_else(|| self.enclosure.thumbnail())
            .unwrap_or_default()
            .to_owned();

        Episode {
            title: self.title.into_string(),
            link: self.link.into_string(),
            pub_date,
            description,
            audio,
            image,
        }
    }
}

/// Decodes a proxy response body into episodes, preserving item order.
///
/// # Errors
///
/// - [`FetchError::Json`] if the body is not valid JSON or not an object
/// - [`FetchError::MissingItems`] if `items` is absent or `null`
pub fn parse_proxy_response(body: &[u8]) -> Result<Vec<Episode>, FetchError> {
    let response: ProxyResponse = serde_json::from_slice(body)?;
    let items = response.items.ok_or(FetchError::MissingItems)?;
    Ok(items.into_iter().map(ProxyItem::into_episode).collect())
}
