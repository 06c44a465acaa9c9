//! RSS 2.0 document parsing into episode records.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::episode::Episode;
use crate::util::strip_tags;

/// Errors produced while reading a feed document.
///
/// Any of these means the payload is not well-formed XML; the caller treats
/// them all as a failed direct fetch.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML reader rejected the input (syntax error, mismatched end tag,
    /// undefined entity, ...).
    #[error("XML parse error at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    /// Input ended while elements were still open.
    #[error("Unexpected end of document: {0} element(s) left open")]
    UnclosedElements(usize),
    /// The document contains no element at all.
    #[error("Document has no root element")]
    NoRootElement,
    /// Non-whitespace text or a second element outside the root element.
    #[error("Content after or outside the root element at byte {0}")]
    ContentOutsideRoot(u64),
}

/// Item child elements whose text content becomes an episode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    Link,
    PubDate,
    Encoded,
    Description,
}

impl TextField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            // content:encoded
            b"encoded" => Some(Self::Encoded),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }
}

/// First-match values collected for one `<item>`.
#[derive(Debug, Default)]
struct ItemFields {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    encoded: Option<String>,
    description: Option<String>,
    audio: Option<String>,
    image: Option<String>,
}

impl ItemFields {
    fn slot(&mut self, field: TextField) -> &mut Option<String> {
        match field {
            TextField::Title => &mut self.title,
            TextField::Link => &mut self.link,
            TextField::PubDate => &mut self.pub_date,
            TextField::Encoded => &mut self.encoded,
            TextField::Description => &mut self.description,
        }
    }

    fn into_episode(self) -> Episode {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_owned()).unwrap_or_default();

        let encoded = trimmed(self.encoded);
        let description = if encoded.is_empty() {
            strip_tags(&trimmed(self.description))
        } else {
            strip_tags(&encoded)
        };

        Episode {
            title: trimmed(self.title),
            link: trimmed(self.link),
            pub_date: trimmed(self.pub_date),
            description,
            audio: self.audio.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
        }
    }
}

/// Text being accumulated for a field until its element closes.
struct Capture {
    field: TextField,
    depth: usize,
    text: String,
}

/// Parses an RSS document into episodes, one per `<item>` element.
///
/// Elements are matched by local name, so namespaced extensions such as
/// `itunes:image` and `content:encoded` are recognized whatever prefix the
/// feed binds. For each field the first matching descendant of the item
/// wins, mirroring a document-order selector lookup:
///
/// - `title`, `link`, `pubDate`: trimmed text content
/// - description: `content:encoded` if it has text, else `description`,
///   stripped of markup
/// - audio: `url` attribute of the first `enclosure`
/// - image: `href` (or `url`) attribute of the first `image` element
///
/// Missing fields become empty strings.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not well-formed XML. An empty
/// `Vec` is returned for a well-formed document without items.
///
/// # Security
///
/// quick-xml (0.37) does not expand `<!ENTITY>` declarations; custom entities
/// fail to unescape and surface as [`ParseError::Malformed`].
pub fn parse_feed_xml(xml: &str) -> Result<Vec<Episode>, ParseError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    // Whitespace is significant inside captured text; fields are trimmed later
    reader.config_mut().trim_text(false);
    let decoder = reader.decoder();

    let mut episodes = Vec::new();
    let mut depth: usize = 0;
    let mut root_seen = false;
    // Open item fields and the depth of the <item> element itself
    let mut item: Option<(ItemFields, usize)> = None;
    let mut capture: Option<Capture> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Malformed {
            position: reader.error_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                if depth == 0 {
                    if root_seen {
                        return Err(ParseError::ContentOutsideRoot(reader.buffer_position() as u64));
                    }
                    root_seen = true;
                }
                depth += 1;

                // Markup nested inside a captured field only contributes text
                if capture.is_some() {
                    continue;
                }

                if let Some((fields, _)) = item.as_mut() {
                    if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                        if fields.slot(field).is_none() {
                            capture = Some(Capture {
                                field,
                                depth,
                                text: String::new(),
                            });
                        }
                    } else {
                        read_media_attributes(&e, decoder, fields)?;
                    }
                } else if e.local_name().as_ref() == b"item" {
                    item = Some((ItemFields::default(), depth));
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if root_seen {
                        return Err(ParseError::ContentOutsideRoot(reader.buffer_position() as u64));
                    }
                    root_seen = true;
                }
                if capture.is_some() {
                    continue;
                }

                if let Some((fields, _)) = item.as_mut() {
                    if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                        fields.slot(field).get_or_insert_with(String::new);
                    } else {
                        read_media_attributes(&e, decoder, fields)?;
                    }
                } else if e.local_name().as_ref() == b"item" {
                    // A self-closing <item/> still counts as an (empty) episode
                    episodes.push(ItemFields::default().into_episode());
                }
            }
            Event::End(_) => {
                if let Some(active) = capture.take_if(|c| c.depth == depth) {
                    if let Some((fields, _)) = item.as_mut() {
                        *fields.slot(active.field) = Some(active.text);
                    }
                }
                if let Some((fields, _)) = item.take_if(|(_, item_depth)| *item_depth == depth) {
                    episodes.push(fields.into_episode());
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) => {
                if depth == 0 {
                    let raw = decoder.decode(&e).map_err(|err| ParseError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?;
                    if !raw.trim().is_empty() {
                        return Err(ParseError::ContentOutsideRoot(reader.buffer_position() as u64));
                    }
                } else if let Some(active) = capture.as_mut() {
                    let text = e.unescape().map_err(|err| ParseError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?;
                    active.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(active) = capture.as_mut() {
                    active.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no episode data
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ParseError::UnclosedElements(depth));
    }
    if !root_seen {
        return Err(ParseError::NoRootElement);
    }

    Ok(episodes)
}

/// Records `enclosure` and `image` attributes, first occurrence only.
fn read_media_attributes(
    e: &BytesStart<'_>,
    decoder: Decoder,
    fields: &mut ItemFields,
) -> Result<(), ParseError> {
    match e.local_name().as_ref() {
        b"enclosure" if fields.audio.is_none() => {
            let url = attribute_value(e, decoder, b"url")?;
            fields.audio = Some(url.unwrap_or_default());
        }
        b"image" if fields.image.is_none() => {
            let href = attribute_value(e, decoder, b"href")?.filter(|href| !href.is_empty());
            let image = match href {
                Some(href) => href,
                None => attribute_value(e, decoder, b"url")?.unwrap_or_default(),
            };
            fields.image = Some(image);
        }
        _ => {}
    }
    Ok(())
}

fn attribute_value(
    e: &BytesStart<'_>,
    decoder: Decoder,
    key: &[u8],
) -> Result<Option<String>, ParseError> {
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed feed attribute");
                continue;
            }
        };
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|err| ParseError::Malformed {
                    position: 0,
                    message: err.to_string(),
                })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
