//! Document layer: catalog discovery, page tree and per-page extraction.
//!
//! Objects are found by scanning, so the catalog comes from the last
//! `trailer` dictionary, then from an XRef stream dictionary, and finally
//! from any object typed `/Catalog`.

use std::collections::HashSet;

use pdfwords_core::{
    AssembleOptions, ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode, PWord,
    PdfError, Rect, WordAssembler, WordSplitter, normalize_words,
};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::filters::decode_stream;
use crate::font::{FontCache, PageFonts};
use crate::interpreter::collect_raw_words;
use crate::object::{ObjId, PdfDict, PdfValue};
use crate::object_table::{ObjectTable, parse_objects_with_options};
use crate::resolver::{dereference, resolve_id};

/// Depth cap for `/Parent` chains and nested `/Pages` nodes.
const MAX_TREE_DEPTH: usize = 256;

static EMPTY_DICT: PdfDict = PdfDict::new();

/// A parsed PDF document.
///
/// The object table and the font cache are filled when the document is
/// opened and only read afterwards, so pages can be extracted from
/// several threads through a shared reference.
pub struct Document {
    table: ObjectTable,
    pages: Vec<ObjId>,
    fonts: FontCache,
    options: ExtractOptions,
    assemble: AssembleOptions,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("objects", &self.table.len())
            .field("page_count", &self.pages.len())
            .field("fonts", &self.fonts.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Parse a document with default options.
    ///
    /// # Errors
    ///
    /// Fails for empty input or when no object can be recovered.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        Self::open_with_options(bytes, ExtractOptions::default())
    }

    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Fails for empty input or when no object can be recovered.
    pub fn open_with_options(bytes: &[u8], options: ExtractOptions) -> Result<Self, BackendError> {
        let table = parse_objects_with_options(bytes, &options)?;
        Ok(Self::from_table(table, options))
    }

    /// Build the page list and font cache over an existing object table.
    pub fn from_table(table: ObjectTable, options: ExtractOptions) -> Self {
        let pages = match find_catalog(&table) {
            Some(catalog) => collect_pages(&table, catalog),
            None => Vec::new(),
        };
        let pages = if pages.is_empty() {
            debug!("no usable page tree, falling back to /Type /Page objects");
            loose_pages(&table)
        } else {
            pages
        };

        let mut fonts = FontCache::new();
        for &page in &pages {
            preload_fonts(&mut fonts, &table, page_resources(&table, page), &options);
        }
        debug!(pages = pages.len(), fonts = fonts.len(), "document opened");

        Self {
            table,
            pages,
            fonts,
            options,
            assemble: AssembleOptions::default(),
        }
    }

    /// Replace the word assembly tolerances.
    pub fn with_assemble_options(mut self, assemble: AssembleOptions) -> Self {
        self.assemble = assemble;
        self
    }

    pub fn table(&self) -> &ObjectTable {
        &self.table
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn font_cache(&self) -> &FontCache {
        &self.fonts
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page objects in document order.
    pub fn page_ids(&self) -> &[ObjId] {
        &self.pages
    }

    /// Warnings collected while the object table was built.
    pub fn warnings(&self) -> &[ExtractWarning] {
        self.table.warnings()
    }

    /// Inherited `/MediaBox` of a page.
    pub fn media_box(&self, index: usize) -> Option<Rect> {
        let page = *self.pages.get(index)?;
        let values: Vec<f64> = inherited(&self.table, page, "MediaBox")?
            .as_array()?
            .iter()
            .filter_map(|v| dereference(v, &self.table).as_f64())
            .collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Rect::from_points([(*x0, *y0), (*x1, *y1)]),
            _ => None,
        }
    }

    /// Inherited `/Resources` of a page; empty when there are none.
    pub fn page_resources(&self, index: usize) -> &PdfDict {
        match self.pages.get(index) {
            Some(&page) => page_resources(&self.table, page),
            None => &EMPTY_DICT,
        }
    }

    /// Decoded content of a page. Arrays of streams are joined with a
    /// newline; a page without `/Contents` is empty.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range or a content stream cannot be
    /// decoded.
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>, BackendError> {
        let page = self.page_dict(index)?;
        let Some(contents) = page.get("Contents") else {
            return Ok(Vec::new());
        };
        match dereference(contents, &self.table) {
            PdfValue::Stream(stream) => {
                decode_stream(stream, &self.table, self.options.max_stream_bytes)
            }
            PdfValue::Array(items) => {
                let mut content = Vec::new();
                for item in items {
                    let Some(stream) = dereference(item, &self.table).as_stream() else {
                        warn!(page = index, "skipping /Contents entry that is not a stream");
                        continue;
                    };
                    let bytes = decode_stream(stream, &self.table, self.options.max_stream_bytes)?;
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    content.extend_from_slice(&bytes);
                }
                Ok(content)
            }
            PdfValue::Reference(id) => Err(BackendError::Parse(format!(
                "/Contents points at missing object {id}"
            ))),
            other => Err(BackendError::Parse(format!(
                "/Contents is a {}, not a stream",
                other.kind()
            ))),
        }
    }

    /// Words of one page: interpreted, assembled and normalized.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range or the page content cannot be
    /// decoded. Problems inside the content become warnings.
    pub fn page_words<S>(
        &self,
        index: usize,
        tokenizer: &S,
    ) -> Result<ExtractResult<Vec<PWord>>, BackendError>
    where
        S: WordSplitter + ?Sized,
    {
        let content = self.page_content(index)?;
        let resources = self.page_resources(index);
        let mut fonts = PageFonts::new(&self.fonts, &self.table, self.options.max_stream_bytes);
        let ExtractResult { value, warnings } =
            collect_raw_words(&content, resources, &self.table, &mut fonts, &self.options);

        let raw_count = value.len();
        let mut words = WordAssembler::new(self.assemble.clone()).assemble(value, tokenizer);
        normalize_words(&mut words, self.options.unicode_norm);
        debug!(page = index, raw = raw_count, words = words.len(), "page extracted");

        let warnings = warnings.into_iter().map(|w| w.on_page(index)).collect();
        Ok(ExtractResult::with_warnings(words, warnings))
    }

    /// Words of every page, one list per page.
    ///
    /// A page whose content cannot be decoded yields an empty list and a
    /// warning.
    pub fn words<S>(&self, tokenizer: &S) -> ExtractResult<Vec<Vec<PWord>>>
    where
        S: WordSplitter + ?Sized,
    {
        let mut pages = Vec::with_capacity(self.pages.len());
        let mut warnings = Vec::new();
        for index in 0..self.pages.len() {
            match self.page_words(index, tokenizer) {
                Ok(result) => {
                    warnings.extend(result.warnings);
                    pages.push(result.value);
                }
                Err(e) => {
                    warn!(page = index, error = %e, "skipping page");
                    if self.options.collect_warnings {
                        warnings.push(
                            ExtractWarning::with_code(
                                ExtractWarningCode::FilterFailure,
                                format!("page content skipped: {e}"),
                            )
                            .on_page(index),
                        );
                    }
                    pages.push(Vec::new());
                }
            }
        }
        ExtractResult::with_warnings(pages, warnings)
    }

    fn page_dict(&self, index: usize) -> Result<&PdfDict, BackendError> {
        let page = *self.pages.get(index).ok_or_else(|| {
            BackendError::Core(PdfError::Other(format!(
                "page index {index} out of range (document has {} pages)",
                self.pages.len()
            )))
        })?;
        resolve_id(page, &self.table)
            .and_then(PdfValue::as_dict)
            .ok_or_else(|| BackendError::Parse(format!("page object {page} is not a dictionary")))
    }
}

/// Catalog object: last trailer `/Root`, then an XRef stream `/Root`, then
/// the highest numbered `/Type /Catalog` object.
fn find_catalog(table: &ObjectTable) -> Option<ObjId> {
    let is_dict = |id: ObjId| table.get(id).and_then(PdfValue::as_dict).is_some();

    let from_trailer = table
        .trailers()
        .iter()
        .rev()
        .filter_map(|t| t.get("Root").and_then(PdfValue::as_reference))
        .find(|id| is_dict(*id));
    if from_trailer.is_some() {
        return from_trailer;
    }

    let ids = table.ids();
    let from_xref = ids
        .iter()
        .rev()
        .filter_map(|id| table.get(*id).and_then(PdfValue::as_stream))
        .filter(|s| s.type_name() == Some("XRef"))
        .filter_map(|s| s.dict.get("Root").and_then(PdfValue::as_reference))
        .find(|id| is_dict(*id));
    if from_xref.is_some() {
        return from_xref;
    }

    ids.iter().rev().copied().find(|id| {
        table
            .get(*id)
            .and_then(PdfValue::as_dict)
            .and_then(|d| d.get("Type"))
            .and_then(PdfValue::as_name)
            == Some("Catalog")
    })
}

/// Leaf pages under the catalog's `/Pages`, in order.
fn collect_pages(table: &ObjectTable, catalog: ObjId) -> Vec<ObjId> {
    let mut pages = Vec::new();
    let root = table
        .get(catalog)
        .and_then(PdfValue::as_dict)
        .and_then(|d| d.get("Pages"))
        .and_then(PdfValue::as_reference);
    if let Some(root) = root {
        let mut visited = HashSet::new();
        walk_page_tree(table, root, &mut visited, &mut pages, 0);
    }
    pages
}

fn walk_page_tree(
    table: &ObjectTable,
    node: ObjId,
    visited: &mut HashSet<ObjId>,
    pages: &mut Vec<ObjId>,
    depth: usize,
) {
    if depth > MAX_TREE_DEPTH || !visited.insert(node) {
        warn!(object = %node, "page tree cycle or excessive depth");
        return;
    }
    let Some(dict) = resolve_id(node, table).and_then(PdfValue::as_dict) else {
        return;
    };
    let kids = dict
        .get("Kids")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_array);
    let node_type = dict.get("Type").and_then(PdfValue::as_name);

    match (node_type, kids) {
        (Some("Page"), _) | (None, None) => pages.push(node),
        (_, Some(kids)) => {
            for kid in kids {
                if let Some(id) = kid.as_reference() {
                    walk_page_tree(table, id, visited, pages, depth + 1);
                }
            }
        }
        _ => {}
    }
}

/// Every `/Type /Page` object in object-number order.
fn loose_pages(table: &ObjectTable) -> Vec<ObjId> {
    table
        .ids()
        .into_iter()
        .filter(|id| {
            table
                .get(*id)
                .and_then(PdfValue::as_dict)
                .and_then(|d| d.get("Type"))
                .and_then(PdfValue::as_name)
                == Some("Page")
        })
        .collect()
}

/// Look up `key` on the page, then up the `/Parent` chain.
fn inherited<'a>(table: &'a ObjectTable, page: ObjId, key: &str) -> Option<&'a PdfValue> {
    let mut current = resolve_id(page, table).and_then(PdfValue::as_dict)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Some(value) = current.get(key) {
            return Some(dereference(value, table));
        }
        current = current
            .get("Parent")
            .map(|v| dereference(v, table))
            .and_then(PdfValue::as_dict)?;
    }
    None
}

fn page_resources(table: &ObjectTable, page: ObjId) -> &PdfDict {
    inherited(table, page, "Resources")
        .and_then(PdfValue::as_dict)
        .unwrap_or(&EMPTY_DICT)
}

fn font_dict<'a>(resources: &'a PdfDict, table: &'a ObjectTable) -> Option<&'a PdfDict> {
    resources
        .get("Font")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_dict)
}

/// Resolve the fonts of a resource dictionary and of the form XObjects it
/// names, one level deep.
fn preload_fonts(
    cache: &mut FontCache,
    table: &ObjectTable,
    resources: &PdfDict,
    options: &ExtractOptions,
) {
    if let Some(fonts) = font_dict(resources, table) {
        cache.preload(fonts, table, options.max_stream_bytes);
    }

    let Some(xobjects) = resources
        .get("XObject")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_dict)
    else {
        return;
    };
    for entry in xobjects.values() {
        let Some(stream) = dereference(entry, table).as_stream() else {
            continue;
        };
        let form_fonts = stream
            .dict
            .get("Resources")
            .map(|v| dereference(v, table))
            .and_then(PdfValue::as_dict)
            .and_then(|res| font_dict(res, table));
        if let Some(fonts) = form_fonts {
            cache.preload(fonts, table, options.max_stream_bytes);
        }
    }
}
