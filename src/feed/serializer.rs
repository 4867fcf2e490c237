//! Renders normalized event records into the output feed document.
//!
//! The document is a compact wire payload, not a human-edited file, so no
//! indentation: a UTF-8 XML declaration, a `<root>` element, and one
//! self-closing `<entry>` per record carrying the seven fields as attributes.
//! The output attribute names (`id`, `name`, `author`, `guests`, `place`,
//! `reminder`, `when`) are the consumer-facing contract and differ from the
//! internal field names.
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

use super::parser::EventRecord;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Failed to write feed document: {0}")]
    Write(#[from] std::io::Error),

    #[error("Generated feed document contains invalid UTF-8")]
    InvalidUtf8,
}

/// Render the records into a single well-formed XML document.
///
/// Always well-formed, even for zero records (`<root></root>`). Attribute
/// values are XML-escaped by the writer.
pub fn render_feed(events: &[EventRecord]) -> Result<String, SerializeError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("root")))?;

    for event in events {
        let mut entry = BytesStart::new("entry");
        entry.push_attribute(("id", event.id.as_str()));
        entry.push_attribute(("name", event.title.as_str()));
        entry.push_attribute(("author", event.organizer.as_str()));
        entry.push_attribute(("guests", event.attendees.as_str()));
        entry.push_attribute(("place", event.location.as_str()));
        entry.push_attribute(("reminder", event.reminder_minutes.as_str()));
        entry.push_attribute(("when", event.start_time.as_str()));
        writer.write_event(Event::Empty(entry))?;
    }

    writer.write_event(Event::End(BytesEnd::new("root")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|_| SerializeError::InvalidUtf8)
}
