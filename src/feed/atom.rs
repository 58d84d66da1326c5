use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;

use crate::clean::CleanedEntry;
use crate::util::strip_xml_invalid;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const GENERATOR: &str = "goodreads-cleaner";

/// The output document could not be built.
///
/// Only reachable if the in-memory XML writer fails; well-formed input
/// always serializes.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Failed to write Atom XML: {0}")]
    Xml(String),
    #[error("Generated Atom contains invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Feed-level metadata of an output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    /// Atom `<id>`; the source feed URL.
    pub id: String,
    pub title: String,
    pub author: String,
    /// `rel="alternate"` link; the source feed URL.
    pub alternate: String,
    /// `rel="self"` link; where the document is published.
    pub self_link: String,
    pub language: String,
    /// Timestamp of the newest source entry, or the Unix epoch for an empty source.
    pub updated: DateTime<Utc>,
}

/// Outcome of [`write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was replaced.
    Written,
    /// The file already held identical bytes and was left alone.
    Unchanged,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Builds an Atom 1.0 document from cleaned entries, in order.
///
/// An empty `entries` slice yields a valid feed with no `<entry>` elements.
/// Output is a pure function of the arguments: identical input produces
/// byte-identical documents.
pub fn serialize(meta: &FeedMeta, entries: &[CleanedEntry]) -> Result<String, SerializationError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", ATOM_NS));
    feed.push_attribute(("xml:lang", meta.language.as_str()));
    write_event(&mut writer, Event::Start(feed))?;

    write_text_element(&mut writer, "id", &meta.id, &[])?;
    write_text_element(&mut writer, "title", &meta.title, &[])?;
    write_text_element(&mut writer, "updated", &format_timestamp(meta.updated), &[])?;

    write_event(&mut writer, Event::Start(BytesStart::new("author")))?;
    write_text_element(&mut writer, "name", &meta.author, &[])?;
    write_event(&mut writer, Event::End(BytesEnd::new("author")))?;

    write_link(&mut writer, &meta.alternate, "alternate")?;
    write_link(&mut writer, &meta.self_link, "self")?;
    write_text_element(
        &mut writer,
        "generator",
        GENERATOR,
        &[("version", env!("CARGO_PKG_VERSION"))],
    )?;

    for entry in entries {
        write_event(&mut writer, Event::Start(BytesStart::new("entry")))?;
        write_text_element(&mut writer, "id", &entry.id, &[])?;
        write_text_element(&mut writer, "title", &entry.title, &[])?;
        write_text_element(&mut writer, "updated", &format_timestamp(entry.updated), &[])?;
        write_link(&mut writer, &entry.link, "alternate")?;
        if !entry.summary.is_empty() {
            write_text_element(&mut writer, "summary", &entry.summary, &[("type", "text")])?;
        }
        write_text_element(&mut writer, "content", &entry.content, &[("type", "text")])?;
        write_event(&mut writer, Event::End(BytesEnd::new("entry")))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("feed")))?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_event(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), SerializationError> {
    writer
        .write_event(event)
        .map_err(|e| SerializationError::Xml(e.to_string()))
}

fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    text: &str,
    attrs: &[(&str, &str)],
) -> Result<(), SerializationError> {
    let mut start = BytesStart::new(name);
    for &attr in attrs {
        start.push_attribute(attr);
    }
    write_event(writer, Event::Start(start))?;
    write_event(writer, Event::Text(BytesText::new(&strip_xml_invalid(text))))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn write_link(writer: &mut XmlWriter, href: &str, rel: &str) -> Result<(), SerializationError> {
    let mut link = BytesStart::new("link");
    link.push_attribute(("href", strip_xml_invalid(href).as_ref()));
    link.push_attribute(("rel", rel));
    write_event(writer, Event::Empty(link))
}

/// Replaces the file at `path` with `document` atomically.
///
/// Writes to a temporary file in the same directory, syncs it to disk, then
/// renames it over the destination, so readers see either the old or the new
/// document and never a partial one. If the destination already holds the
/// same bytes nothing is written.
pub fn write(document: &str, path: &Path) -> std::io::Result<WriteOutcome> {
    use std::time::{SystemTime, UNIX_EPOCH};

    match std::fs::read(path) {
        Ok(existing) if existing == document.as_bytes() => {
            tracing::debug!(path = %path.display(), "Output unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    // Randomized temp name so a leftover from an interrupted run never collides
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    let result = file
        .write_all(document.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);

    let result = result.and_then(|()| {
        // On Windows, rename fails if destination exists
        #[cfg(windows)]
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        std::fs::rename(&temp_path, path)
    });

    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(WriteOutcome::Written)
}
