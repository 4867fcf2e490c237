//! Parses the remote GData-style calendar feed into flat event records.
//!
//! One record is produced per top-level `<entry>` element, in document order.
//! The `id` and `title` elements are structurally required — their absence
//! fails the whole batch. The `gd:*` sub-elements are optional and map to
//! empty fields when missing; they are matched at any depth inside the entry
//! (a `gd:reminder` is typically nested inside `gd:when`).
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Maximum allowed element nesting depth inside a single entry.
/// Prevents unbounded parser state from a maliciously nested feed.
const MAX_ENTRY_DEPTH: usize = 50;

/// Errors that abort a parse. Any of these discards the entire batch —
/// the cycle never publishes a partial prefix.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Feed is not valid UTF-8")]
    InvalidUtf8,

    #[error("Entry {entry} is missing required element <{element}>")]
    MissingElement { entry: usize, element: &'static str },

    #[error("Entry nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    #[error("Unexpected end of document inside <entry>")]
    UnexpectedEof,
}

/// One normalized calendar event. Created fresh each cycle and discarded
/// after serialization; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    /// Text of the entry's `<id>` element (required, empty text tolerated).
    pub id: String,
    /// Event name from the `<title>` element (required, empty text tolerated).
    pub title: String,
    /// Display name from the first `<author>`'s `name` child; empty if absent.
    pub organizer: String,
    /// Semicolon-joined attendee emails from every `gd:who`; empty if none.
    pub attendees: String,
    /// Free-text `valueString` of the first `gd:where`; empty if absent.
    pub location: String,
    /// Verbatim `startTime` of the first `gd:when`; empty if absent.
    pub start_time: String,
    /// `minutes` of the first `gd:reminder` with `method="alert"`; empty if
    /// none matches.
    pub reminder_minutes: String,
}

/// Parse a raw feed body into ordered event records.
///
/// XXE note: quick-xml (0.37) does not parse `<!ENTITY>` declarations, so a
/// hostile feed cannot smuggle external content through entity expansion —
/// unknown entity references fail the parse instead.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<EventRecord>, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"entry" => {
                let record = parse_entry(&mut reader, records.len())?;
                records.push(record);
            }
            Event::Empty(e) if e.name().as_ref() == b"entry" => {
                // A self-closing entry cannot carry its required id element
                return Err(ParseError::MissingElement {
                    entry: records.len(),
                    element: "id",
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(records)
}

/// Working state for the optional per-entry fields, filled as the entry's
/// subtree streams past.
#[derive(Default)]
struct EntryFields {
    attendees: Vec<String>,
    location: Option<String>,
    start_time: Option<String>,
    reminder_minutes: Option<String>,
}

/// Consume one `<entry>` subtree (the Start tag has already been read) and
/// normalize it into an [`EventRecord`].
fn parse_entry(reader: &mut Reader<&[u8]>, index: usize) -> Result<EventRecord, ParseError> {
    let mut id: Option<String> = None;
    let mut title: Option<String> = None;
    let mut organizer = String::new();
    let mut author_seen = false;
    let mut fields = EntryFields::default();
    let mut depth: usize = 0;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"id" if id.is_none() => {
                    id = Some(read_element_text(reader)?);
                }
                b"title" if title.is_none() => {
                    title = Some(read_element_text(reader)?);
                }
                b"author" if !author_seen => {
                    author_seen = true;
                    organizer = read_author_name(reader)?;
                }
                _ => {
                    collect_optional_fields(reader, &e, &mut fields)?;
                    depth += 1;
                    if depth > MAX_ENTRY_DEPTH {
                        return Err(ParseError::MaxDepthExceeded(MAX_ENTRY_DEPTH));
                    }
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                // Self-closing required elements carry no text; empty text
                // is tolerated, only the element's absence is fatal.
                b"id" if id.is_none() => id = Some(String::new()),
                b"title" if title.is_none() => title = Some(String::new()),
                _ => collect_optional_fields(reader, &e, &mut fields)?,
            },
            Event::End(e) if depth == 0 && e.name().as_ref() == b"entry" => break,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
    }

    let id = id.ok_or(ParseError::MissingElement {
        entry: index,
        element: "id",
    })?;
    let title = title.ok_or(ParseError::MissingElement {
        entry: index,
        element: "title",
    })?;

    Ok(EventRecord {
        id,
        title,
        organizer,
        attendees: fields.attendees.join(";"),
        location: fields.location.unwrap_or_default(),
        start_time: fields.start_time.unwrap_or_default(),
        reminder_minutes: fields.reminder_minutes.unwrap_or_default(),
    })
}

/// Scan the first `<author>` subtree for its `name` child (direct children
/// only; last match wins when several are present).
fn read_author_name(reader: &mut Reader<&[u8]>) -> Result<String, ParseError> {
    let mut name = String::new();
    let mut depth: usize = 0;
    loop {
        match reader.read_event()? {
            Event::Start(e) if depth == 0 && e.name().as_ref() == b"name" => {
                name = read_element_text(reader)?;
            }
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break, // </author>
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
    }
    Ok(name)
}

/// Accumulate the unescaped text content of the element whose Start tag was
/// just consumed, reading through its matching End tag. Nested markup is
/// skipped; only character data contributes.
fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<String, ParseError> {
    let mut text = String::new();
    let mut depth: usize = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                depth += 1;
                if depth > MAX_ENTRY_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_ENTRY_DEPTH));
                }
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(e) => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) => text.push_str(
                std::str::from_utf8(e.as_ref()).map_err(|_| ParseError::InvalidUtf8)?,
            ),
            Event::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
    }
    Ok(text)
}

/// Extract attribute values from the `gd:*` sub-elements.
///
/// First match wins for where/when/reminder; every `gd:who` contributes one
/// attendee. The reminder scan is bounded by the reminder elements themselves
/// and takes the first whose method is "alert".
fn collect_optional_fields(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    fields: &mut EntryFields,
) -> Result<(), ParseError> {
    let decoder = reader.decoder();
    match e.name().as_ref() {
        b"gd:who" => {
            if let Some(email) = find_attribute(e, decoder, b"email")? {
                fields.attendees.push(email);
            }
        }
        b"gd:where" if fields.location.is_none() => {
            fields.location = find_attribute(e, decoder, b"valueString")?;
        }
        b"gd:when" if fields.start_time.is_none() => {
            fields.start_time = find_attribute(e, decoder, b"startTime")?;
        }
        b"gd:reminder" if fields.reminder_minutes.is_none() => {
            let method = find_attribute(e, decoder, b"method")?;
            if method.as_deref() == Some("alert") {
                fields.reminder_minutes = find_attribute(e, decoder, b"minutes")?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Decoded, unescaped value of the named attribute, if present.
fn find_attribute(
    e: &BytesStart<'_>,
    decoder: quick_xml::encoding::Decoder,
    name: &[u8],
) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        if attr.key.as_ref() == name {
            let value = attr.decode_and_unescape_value(decoder)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
