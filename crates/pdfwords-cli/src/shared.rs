use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use pdfwords_core::{ExtractOptions, ExtractWarning};
use pdfwords_parse::{Document, ObjectTable};

use crate::page_range::parse_page_range;

/// Read a file, printing a user-facing message on failure.
fn read_file(file: &Path) -> Result<Vec<u8>, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        1
    })
}

/// Open a PDF as a [`Document`].
///
/// Returns `Err(1)` with a message on stderr when the file is missing,
/// unreadable, or holds no recoverable objects.
pub fn open_document(file: &Path, options: ExtractOptions) -> Result<Document, i32> {
    let bytes = read_file(file)?;
    Document::open_with_options(&bytes, options).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Scan a file into an [`ObjectTable`] without building pages.
pub fn open_object_table(file: &Path) -> Result<ObjectTable, i32> {
    let bytes = read_file(file)?;
    pdfwords_parse::parse_objects(&bytes).map_err(|e| {
        eprintln!("Error: failed to parse PDF objects: {e}");
        1
    })
}

/// Resolve an optional page range string into 0-indexed page indices.
///
/// `None` selects every page.
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<Vec<usize>, i32> {
    match pages {
        Some(range) => parse_page_range(range, page_count).map_err(|e| {
            eprintln!("Error: {e}");
            1
        }),
        None => Ok((0..page_count).collect()),
    }
}

/// Print warnings to stderr, one per line.
pub fn print_warnings(warnings: &[ExtractWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Prints "Processing page N/M..." to stderr when stderr is a terminal.
pub struct ProgressReporter {
    total: usize,
    is_tty: bool,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Report progress for page `current` (1-indexed).
    pub fn report(&self, current: usize) {
        if self.is_tty {
            eprint!("\rProcessing page {}/{}...", current, self.total);
            let _ = io::stderr().flush();
        }
    }

    /// Clear the progress line.
    pub fn finish(&self) {
        if self.is_tty {
            eprint!("\r{}\r", " ".repeat(40));
            let _ = io::stderr().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_document_file_not_found() {
        let result = open_document(Path::new("/nonexistent/file.pdf"), ExtractOptions::default());
        assert_eq!(result.err(), Some(1));
    }

    #[test]
    fn open_document_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = open_document(file.path(), ExtractOptions::default());
        assert_eq!(result.err(), Some(1));
    }

    #[test]
    fn open_object_table_reads_bare_objects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n42\nendobj\n")
            .unwrap();
        let table = open_object_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resolve_pages_none_returns_all() {
        assert_eq!(resolve_pages(None, 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn resolve_pages_with_range() {
        assert_eq!(resolve_pages(Some("1,3"), 5).unwrap(), vec![0, 2]);
    }

    #[test]
    fn resolve_pages_invalid_range() {
        assert_eq!(resolve_pages(Some("0"), 5).unwrap_err(), 1);
    }

    #[test]
    fn progress_reporter_creation() {
        let reporter = ProgressReporter::new(10);
        assert_eq!(reporter.total, 10);
    }
}
