//! pdfwords-core: Backend-independent data types and algorithms.
//!
//! This crate provides the foundational types ([`Rect`], [`Matrix`],
//! [`PWord`], errors and options) and the word assembly pass used by
//! pdfwords. It does not read PDF bytes; see `pdfwords-parse` for that.

pub mod accents;
pub mod error;
pub mod geometry;
pub mod splitter;
pub mod unicode_norm;
pub mod words;

pub use error::{ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode, PdfError};
pub use geometry::{Matrix, Rect};
pub use splitter::{SimpleSplitter, WordSplitter};
pub use unicode_norm::{UnicodeNorm, normalize_words};
pub use words::{AssembleOptions, FontRef, PWord, WordAssembler};
