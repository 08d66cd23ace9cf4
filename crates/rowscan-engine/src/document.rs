//! Source documents: page and row splitting.

use std::fs;
use std::path::Path;

use crate::ParseError;

/// A source document split into pages and rows.
///
/// Pages are delimited by the ASCII form-feed character (0x0C), rows by LF
/// or CRLF. The text is expected to be UTF-8; a leading BOM is stripped.
#[derive(Debug, Clone)]
pub struct Document {
    /// Pages in document order.
    pages: Vec<Page>,
}

/// One page of a document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Rows in page order, line terminators removed.
    rows: Vec<String>,
}

impl Document {
    /// Splits document text into pages and rows.
    pub fn parse(text: &str) -> Self {
        let text = text.trim_start_matches('\u{feff}');
        let mut chunks: Vec<&str> = text.split('\u{000C}').collect();
        // A trailing form-feed terminates the last page rather than opening
        // an empty one.
        if chunks.len() > 1 && chunks.last().is_some_and(|chunk| chunk.is_empty()) {
            chunks.pop();
        }
        Self {
            pages: chunks.into_iter().map(Page::parse).collect(),
        }
    }

    /// Reads and splits a document file.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let text = fs::read_to_string(path).map_err(|source| ParseError::ReadDocument {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Pages in document order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// One page by index.
    pub fn page(&self, index: usize) -> &Page {
        &self.pages[index]
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl Page {
    /// Splits page text into rows.
    fn parse(text: &str) -> Self {
        Self {
            rows: text
                .lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
        }
    }

    /// Rows in page order.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// True when the page has no rows at all.
    ///
    /// Such pages are labelled `EMPTY` by the scan and skipped without
    /// consuming a layout attempt.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
