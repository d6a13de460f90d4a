//! MediaWiki XML dump reader
//!
//! Incrementally discovers `<page>` boundaries in a multi-gigabyte dump.
//! Element names are matched by local name, so any namespace prefix on the
//! dump's elements is tolerated.

use super::record::{DumpError, PageRecord};
use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Streaming reader over a Wikimedia XML dump file.
pub struct DumpReader {
    path: PathBuf,
    reader: XmlSource,
    language: String,
    /// Page currently being assembled, if the scanner is inside `<page>`.
    current_page: Option<PartialPage>,
    /// Inside a `<revision>` element. Ids seen here are revision ids and
    /// must not be captured as the page id.
    in_revision: bool,
    finished: bool,
}

/// Reader abstraction for plain and bzip2-compressed dumps.
enum XmlSource {
    Bzip2(Reader<BufReader<BzDecoder<File>>>),
    Plain(Reader<BufReader<File>>),
}

impl XmlSource {
    fn read_event<'a>(&mut self, buf: &'a mut Vec<u8>) -> Result<Event<'a>, quick_xml::Error> {
        buf.clear();
        match self {
            XmlSource::Bzip2(reader) => reader.read_event_into(buf),
            XmlSource::Plain(reader) => reader.read_event_into(buf),
        }
    }
}

/// Page fields gathered so far from the event stream.
#[derive(Debug, Default)]
struct PartialPage {
    id: Option<String>,
    title: Option<String>,
    text: Option<String>,
}

/// Result of scanning forward to the next page boundary.
enum ParseResult {
    Record(PageRecord),
    /// Page was structurally incomplete; warned and dropped.
    Skipped,
    Eof,
}

impl DumpReader {
    /// Open a dump file, sniffing bzip2 compression from the extension.
    pub fn open(path: impl AsRef<Path>, language: impl Into<String>) -> Result<Self, DumpError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        let is_bz2 = path.to_string_lossy().ends_with(".bz2");
        let reader = if is_bz2 {
            let decoder = BzDecoder::new(file);
            let buf_reader = BufReader::with_capacity(1024 * 1024, decoder);
            XmlSource::Bzip2(Reader::from_reader(buf_reader))
        } else {
            let buf_reader = BufReader::with_capacity(1024 * 1024, file);
            XmlSource::Plain(Reader::from_reader(buf_reader))
        };

        Ok(Self {
            path,
            reader,
            language: language.into(),
            current_page: None,
            in_revision: false,
            finished: false,
        })
    }

    /// File name of the dump, for logging.
    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dump")
    }

    /// Scan forward to the next `</page>` and assemble its record.
    fn parse_next_page(&mut self) -> Result<ParseResult, DumpError> {
        let mut buf = Vec::with_capacity(8192);
        let mut text_buf = String::new();
        let mut capturing: Option<String> = None;

        loop {
            let event = self.reader.read_event(&mut buf)?;

            match event {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();

                    match name.as_str() {
                        "page" => {
                            if self.current_page.is_some() {
                                return Err(DumpError::Malformed(
                                    "nested <page> element".to_string(),
                                ));
                            }
                            self.current_page = Some(PartialPage::default());
                            self.in_revision = false;
                        }
                        "revision" => {
                            self.in_revision = true;
                        }
                        "title" | "id" | "text" => {
                            if self.current_page.is_some() {
                                capturing = Some(name);
                                text_buf.clear();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    if capturing.is_some() {
                        if let Ok(text) = e.unescape() {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::CData(ref e) => {
                    if capturing.is_some() {
                        if let Ok(text) = String::from_utf8(e.to_vec()) {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();

                    match name.as_str() {
                        "revision" => {
                            self.in_revision = false;
                        }
                        "title" => {
                            if let Some(ref mut page) = self.current_page {
                                page.title = Some(text_buf.clone());
                            }
                            capturing = None;
                        }
                        "id" => {
                            // Only the page id counts; revisions and
                            // contributors carry their own ids.
                            if let Some(ref mut page) = self.current_page {
                                if !self.in_revision && page.id.is_none() {
                                    page.id = Some(text_buf.clone());
                                }
                            }
                            capturing = None;
                        }
                        "text" => {
                            if let Some(ref mut page) = self.current_page {
                                if self.in_revision {
                                    page.text = Some(text_buf.clone());
                                }
                            }
                            capturing = None;
                        }
                        "page" => {
                            let Some(page) = self.current_page.take() else {
                                return Err(DumpError::Malformed(
                                    "</page> without matching <page>".to_string(),
                                ));
                            };
                            return Ok(self.assemble(page));
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    if self.current_page.is_some() {
                        return Err(DumpError::Malformed(
                            "dump truncated inside a <page> element".to_string(),
                        ));
                    }
                    return Ok(ParseResult::Eof);
                }
                _ => {}
            }

            buf.clear();
        }
    }

    fn assemble(&self, page: PartialPage) -> ParseResult {
        let (Some(id), Some(title), Some(text)) = (page.id, page.title, page.text) else {
            warn!("skipping structurally incomplete page in {}", self.source_name());
            return ParseResult::Skipped;
        };
        if id.is_empty() {
            warn!("skipping page with empty id in {}", self.source_name());
            return ParseResult::Skipped;
        }
        ParseResult::Record(PageRecord {
            id,
            title,
            text,
            language: self.language.clone(),
        })
    }
}

impl Iterator for DumpReader {
    type Item = Result<PageRecord, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.parse_next_page() {
                Ok(ParseResult::Record(record)) => return Some(Ok(record)),
                Ok(ParseResult::Skipped) => continue,
                Ok(ParseResult::Eof) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
