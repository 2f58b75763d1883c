//! pdfwords-parse: PDF object parser and content stream interpreter.
//!
//! This crate reads PDF bytes without an xref table: objects are found by
//! scanning, references are resolved lazily against the resulting
//! [`ObjectTable`], and page content streams are interpreted into
//! positioned words. It depends on pdfwords-core for shared data types and
//! the word assembler.
//!
//! ```ignore
//! use pdfwords_parse::{Document, pdfwords_core::SimpleSplitter};
//!
//! let doc = Document::open(&bytes)?;
//! for index in 0..doc.page_count() {
//!     let result = doc.page_words(index, &SimpleSplitter)?;
//!     for word in result.value {
//!         println!("{} {:?}", word.text, word.bbox);
//!     }
//! }
//! ```

pub mod cmap;
pub mod document;
pub mod encoding;
pub mod error;
pub mod filters;
pub mod font;
pub mod handler;
pub mod interpreter;
pub mod interpreter_state;
pub mod object;
pub mod object_table;
pub mod resolver;
pub mod scanner;
pub mod standard_fonts;
pub mod text_state;
pub mod tokenizer;

pub use document::Document;
pub use error::BackendError;
pub use font::{FontCache, FontResolver, PageFonts, PdfFont, resolve_font};
pub use handler::{ContentHandler, WordCollector};
pub use interpreter::{collect_raw_words, get_page_words, interpret_content_stream};
pub use object::{CodeWidth, HexString, ObjId, PdfDict, PdfStream, PdfValue};
pub use object_table::{ObjectTable, get_objects, parse_objects, parse_objects_with_options};
pub use pdfwords_core;
pub use resolver::{dereference, dereference_objects_deep, resolve_deep};
