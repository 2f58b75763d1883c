//! Font resource resolution.
//!
//! Turns a `/Font` resource dictionary into a [`PdfFont`]: glyph widths,
//! vertical metrics, style flags and the code-to-Unicode mapping. Metrics
//! are stored in text space units for a font size of 1.
//!
//! Resolved fonts are cached by object identity in a [`FontCache`] that is
//! filled up front and then only read. [`PageFonts`] layers a per-page
//! overlay on top of it for fonts the cache did not see.

use std::collections::HashMap;
use std::sync::Arc;

use pdfwords_core::FontRef;
use tracing::{debug, warn};

use crate::cmap::ToUnicodeCMap;
use crate::encoding::{BaseEncoding, SimpleEncoding};
use crate::filters::decode_stream;
use crate::object::{CodeWidth, ObjId, PdfDict, PdfValue};
use crate::object_table::ObjectTable;
use crate::resolver::{dereference, resolve_id};
use crate::standard_fonts::{self, strip_subset_prefix};

const DEFAULT_ASCENT: f32 = 750.0;
const DEFAULT_DESCENT: f32 = -250.0;
const DEFAULT_CAP_HEIGHT: f32 = 700.0;
/// Width assumed for every glyph when a font carries no width data at all.
const DEFAULT_WIDTH: f32 = 500.0;
/// Space width in glyph units when the font has no space glyph.
const FALLBACK_SPACE: f32 = 250.0;
const GLYPH_SCALE: f32 = 0.001;

const FLAG_ITALIC: i64 = 1 << 6;
const FLAG_FORCE_BOLD: i64 = 1 << 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Type1, MMType1 and TrueType.
    Simple,
    Type3,
    /// Type0 with a CID descendant.
    Composite,
}

/// A resolved font.
#[derive(Debug, Clone)]
pub struct PdfFont {
    /// `/BaseFont` without a subset prefix.
    pub base_name: String,
    pub kind: FontKind,
    pub code_width: CodeWidth,
    widths: HashMap<u32, f32>,
    default_width: f32,
    pub bold: bool,
    pub italic: bool,
    pub has_descent: bool,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    space_width: f32,
    space_code: Option<u32>,
    to_unicode: Option<ToUnicodeCMap>,
    encoding: Option<SimpleEncoding>,
    /// Glyph space to text space factor (0.001, or `FontMatrix[0]` for Type3).
    pub font_matrix_scale: f32,
    pub object_id: Option<ObjId>,
}

/// A glyph shown from a string operand.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownCode {
    /// Code that widths and word spacing are looked up by.
    pub code: u32,
    pub text: String,
    pub is_space: bool,
}

fn split_codes(bytes: &[u8], width: CodeWidth) -> Vec<u32> {
    bytes
        .chunks(width.bytes())
        .map(|chunk| chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
        .collect()
}

impl PdfFont {
    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        split_codes(bytes, self.code_width)
    }

    /// Codes of a `Tj`/`TJ` string operand with their text.
    ///
    /// A hex string grouped into 4 or 8 digit units and shown with a
    /// one-byte simple font is read unit by unit, so `<0048 0069>` shows
    /// "Hi" rather than NUL-prefixed bytes.
    pub fn shown_codes(&self, value: &PdfValue) -> Vec<ShownCode> {
        let (bytes, unit_width) = match value {
            PdfValue::LiteralString(bytes) => (bytes.as_slice(), CodeWidth::One),
            PdfValue::HexString(hex) => (hex.bytes.as_slice(), hex.unit_width),
            _ => return Vec::new(),
        };
        let wide = self.kind != FontKind::Composite
            && self.code_width == CodeWidth::One
            && unit_width != CodeWidth::One;
        if !wide {
            return self
                .codes(bytes)
                .into_iter()
                .map(|code| ShownCode {
                    code,
                    text: self.unicode_for_code(code),
                    is_space: self.is_space(code),
                })
                .collect();
        }
        split_codes(bytes, unit_width)
            .into_iter()
            .map(|unit| self.wide_unit(unit))
            .collect()
    }

    /// One unit of a wide-grouped hex string. ToUnicode wins; units that
    /// fit a byte go through the encoding; the rest are code points.
    fn wide_unit(&self, unit: u32) -> ShownCode {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.lookup(unit)) {
            return ShownCode {
                code: unit,
                is_space: !text.is_empty() && text.chars().all(char::is_whitespace),
                text: text.to_string(),
            };
        }
        if unit <= 0xFF {
            return ShownCode {
                code: unit,
                text: self.unicode_for_code(unit),
                is_space: self.is_space(unit),
            };
        }
        let ch = char::from_u32(unit)
            .filter(|c| !c.is_control())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        ShownCode {
            code: unit,
            is_space: ch.is_whitespace(),
            text: ch.to_string(),
        }
    }

    /// Text for a code: ToUnicode, then the simple encoding, then Latin-1.
    /// Unmapped codes yield U+FFFD.
    pub fn unicode_for_code(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.lookup(code)) {
            return text.to_string();
        }
        if self.kind == FontKind::Composite {
            return char::REPLACEMENT_CHARACTER.to_string();
        }
        let Ok(byte) = u8::try_from(code) else {
            return char::REPLACEMENT_CHARACTER.to_string();
        };
        if let Some(text) = self
            .encoding
            .as_ref()
            .and_then(|e| e.decode(byte))
            .filter(|t| !t.chars().all(char::is_control))
        {
            return text;
        }
        match char::from(byte) {
            c if c.is_control() => char::REPLACEMENT_CHARACTER.to_string(),
            c => c.to_string(),
        }
    }

    /// Advance width of `code` in text space units at size 1.
    pub fn char_width(&self, code: u32) -> f32 {
        self.widths
            .get(&code)
            .copied()
            .unwrap_or(self.default_width)
    }

    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Negative below the baseline.
    pub fn descent(&self) -> f32 {
        self.descent
    }

    pub fn cap_height(&self) -> f32 {
        self.cap_height
    }

    /// Width of the space glyph in text space units at size 1.
    pub fn space_width(&self) -> f32 {
        self.space_width
    }

    /// Whether `code` is the single-byte space that word spacing applies to.
    pub fn is_word_space_code(&self, code: u32) -> bool {
        self.code_width == CodeWidth::One && code == 32
    }

    /// Whether `code` renders as white space.
    pub fn is_space(&self, code: u32) -> bool {
        if self.space_code == Some(code) {
            return true;
        }
        let text = self.unicode_for_code(code);
        !text.is_empty() && text.chars().all(char::is_whitespace)
    }

    pub fn font_ref(&self, resource_name: &str) -> FontRef {
        FontRef {
            base_name: self.base_name.clone(),
            resource_name: resource_name.to_string(),
            object_id: self.object_id.map(|id| (id.num, id.generation)),
            has_descent: self.has_descent,
        }
    }
}

/// Resolve a font dictionary.
///
/// Never fails: missing entries fall back to standard-14 metrics or to
/// defaults, and an undecodable ToUnicode stream is ignored.
pub fn resolve_font(dict: &PdfDict, table: &ObjectTable, max_bytes: usize) -> PdfFont {
    let subtype = name_entry(dict, "Subtype", table).unwrap_or("Type1");
    let base_name = name_entry(dict, "BaseFont", table)
        .map(|n| strip_subset_prefix(n).to_string())
        .unwrap_or_default();
    let to_unicode = dict
        .get("ToUnicode")
        .and_then(|v| load_cmap(v, table, max_bytes));

    let font = match subtype {
        "Type0" => resolve_composite(dict, base_name, to_unicode, table, max_bytes),
        _ => resolve_simple(dict, subtype, base_name, to_unicode, table),
    };
    debug!(
        font = %font.base_name,
        kind = ?font.kind,
        widths = font.widths.len(),
        "font resolved"
    );
    font
}

fn resolve_simple(
    dict: &PdfDict,
    subtype: &str,
    base_name: String,
    to_unicode: Option<ToUnicodeCMap>,
    table: &ObjectTable,
) -> PdfFont {
    let kind = if subtype == "Type3" {
        FontKind::Type3
    } else {
        FontKind::Simple
    };
    let scale = match kind {
        FontKind::Type3 => dict
            .get("FontMatrix")
            .and_then(|v| number_array(v, table))
            .and_then(|m| m.first().copied())
            .filter(|a| *a != 0.0)
            .map(|a| a.abs())
            .unwrap_or(GLYPH_SCALE),
        _ => GLYPH_SCALE,
    };

    let standard = standard_fonts::lookup(&base_name);
    let descriptor = dict.get("FontDescriptor").map(|v| dereference(v, table));
    let descriptor = descriptor.and_then(PdfValue::as_dict);
    let metrics = Descriptor::read(descriptor, table);

    let first_char = number_entry(dict, "FirstChar", table).unwrap_or(0.0).max(0.0) as u32;
    let listed = dict
        .get("Widths")
        .and_then(|v| number_array(v, table))
        .unwrap_or_default();

    let mut widths = HashMap::new();
    let default_width;
    if !listed.is_empty() {
        for (i, w) in listed.iter().enumerate() {
            let Some(code) = u32::try_from(i).ok().and_then(|i| first_char.checked_add(i)) else {
                break;
            };
            widths.insert(code, w * scale);
        }
        default_width = metrics.missing_width.unwrap_or(0.0) * scale;
    } else if let Some(std) = &standard {
        for code in 0..=255u32 {
            if let Some(w) = std.width(code) {
                widths.insert(code, w * scale);
            }
        }
        default_width = metrics.missing_width.unwrap_or(0.0) * scale;
    } else {
        default_width = metrics.missing_width.unwrap_or(DEFAULT_WIDTH) * scale;
    }

    let mut encoding = SimpleEncoding::new(default_base_encoding(subtype, &metrics));
    match dict.get("Encoding").map(|v| dereference(v, table)) {
        Some(PdfValue::Name(name)) => {
            if let Some(base) = BaseEncoding::from_name(name) {
                encoding = SimpleEncoding::new(base);
            }
        }
        Some(PdfValue::Dict(enc)) => {
            if let Some(base) = name_entry(enc, "BaseEncoding", table)
                .and_then(BaseEncoding::from_name)
            {
                encoding = SimpleEncoding::new(base);
            }
            if let Some(diffs) = enc
                .get("Differences")
                .map(|v| dereference(v, table))
                .and_then(PdfValue::as_array)
            {
                let diffs: Vec<PdfValue> =
                    diffs.iter().map(|v| dereference(v, table).clone()).collect();
                encoding.apply_differences(&diffs);
            }
        }
        _ => {}
    }

    let (std_ascent, std_descent, std_cap) = standard
        .as_ref()
        .map(|s| (s.ascent, s.descent, s.cap_height))
        .unwrap_or((DEFAULT_ASCENT, DEFAULT_DESCENT, DEFAULT_CAP_HEIGHT));
    let ascent = metrics.ascent.unwrap_or(std_ascent);
    let descent = metrics.descent.unwrap_or(std_descent);
    let cap_height = metrics.cap_height.unwrap_or(std_cap.min(ascent));

    let mut font = PdfFont {
        bold: metrics.bold
            || standard.as_ref().is_some_and(|s| s.bold)
            || name_suggests_bold(&base_name),
        italic: metrics.italic
            || standard.as_ref().is_some_and(|s| s.italic)
            || name_suggests_italic(&base_name),
        has_descent: descent < 0.0,
        base_name,
        kind,
        code_width: CodeWidth::One,
        widths,
        default_width,
        ascent: ascent * scale,
        descent: descent * scale,
        cap_height: cap_height * scale,
        space_width: 0.0,
        space_code: None,
        to_unicode,
        encoding: Some(encoding),
        font_matrix_scale: scale,
        object_id: None,
    };
    font.space_code = find_space_code(&font);
    font.space_width = space_width(&font, FALLBACK_SPACE * scale);
    font
}

fn resolve_composite(
    dict: &PdfDict,
    base_name: String,
    to_unicode: Option<ToUnicodeCMap>,
    table: &ObjectTable,
    max_bytes: usize,
) -> PdfFont {
    let code_width = match dict.get("Encoding").map(|v| dereference(v, table)) {
        Some(PdfValue::Stream(_)) => dict
            .get("Encoding")
            .and_then(|v| load_cmap(v, table, max_bytes))
            .and_then(|c| c.code_width())
            .unwrap_or(CodeWidth::Two),
        _ => CodeWidth::Two,
    };

    let descendant = dict
        .get("DescendantFonts")
        .map(|v| dereference(v, table))
        .and_then(|v| match v {
            PdfValue::Array(items) => items.first().map(|f| dereference(f, table)),
            other => Some(other),
        })
        .and_then(PdfValue::as_dict);

    let mut widths = HashMap::new();
    let mut default_width = 1000.0;
    let mut metrics = Descriptor::default();
    if let Some(cid) = descendant {
        if let Some(dw) = number_entry(cid, "DW", table) {
            default_width = dw;
        }
        if let Some(w) = cid
            .get("W")
            .map(|v| dereference(v, table))
            .and_then(PdfValue::as_array)
        {
            widths = parse_w_array(w, table);
        }
        let descriptor = cid
            .get("FontDescriptor")
            .map(|v| dereference(v, table))
            .and_then(PdfValue::as_dict);
        metrics = Descriptor::read(descriptor, table);
    }

    let ascent = metrics.ascent.unwrap_or(DEFAULT_ASCENT);
    let descent = metrics.descent.unwrap_or(DEFAULT_DESCENT);
    let cap_height = metrics.cap_height.unwrap_or(DEFAULT_CAP_HEIGHT.min(ascent));

    let mut font = PdfFont {
        bold: metrics.bold || name_suggests_bold(&base_name),
        italic: metrics.italic || name_suggests_italic(&base_name),
        has_descent: descent < 0.0,
        base_name,
        kind: FontKind::Composite,
        code_width,
        widths: widths
            .into_iter()
            .map(|(k, w)| (k, w * GLYPH_SCALE))
            .collect(),
        default_width: default_width * GLYPH_SCALE,
        ascent: ascent * GLYPH_SCALE,
        descent: descent * GLYPH_SCALE,
        cap_height: cap_height * GLYPH_SCALE,
        space_width: 0.0,
        space_code: None,
        to_unicode,
        encoding: None,
        font_matrix_scale: GLYPH_SCALE,
        object_id: None,
    };
    font.space_code = find_space_code(&font);
    font.space_width = space_width(&font, FALLBACK_SPACE * GLYPH_SCALE);
    font
}

/// Parse a CID `/W` array. Both `c [w1 w2 ...]` and `c_first c_last w`
/// forms are accepted.
pub fn parse_w_array(items: &[PdfValue], table: &ObjectTable) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let start = dereference(&items[i], table).as_i64();
        let Some(start) = start.and_then(|v| u32::try_from(v).ok()) else {
            i += 1;
            continue;
        };
        let Some(next) = items.get(i + 1).map(|v| dereference(v, table)) else {
            break;
        };
        match next {
            PdfValue::Array(list) => {
                for (j, w) in list.iter().enumerate() {
                    let Some(cid) = u32::try_from(j).ok().and_then(|j| start.checked_add(j)) else {
                        break;
                    };
                    if let Some(w) = dereference(w, table).as_f64() {
                        widths.insert(cid, w as f32);
                    }
                }
                i += 2;
            }
            other => {
                let end = other.as_i64().map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX));
                let w = items.get(i + 2).and_then(|v| dereference(v, table).as_f64());
                if let (Some(end), Some(w)) = (end, w) {
                    // guard against absurd ranges in damaged files
                    for cid in start..=end.min(start.saturating_add(0xFFFF)) {
                        widths.insert(cid, w as f32);
                    }
                }
                i += 3;
            }
        }
    }
    widths
}

/// Values read from a `/FontDescriptor`, in glyph units.
#[derive(Debug, Default)]
struct Descriptor {
    ascent: Option<f32>,
    descent: Option<f32>,
    cap_height: Option<f32>,
    missing_width: Option<f32>,
    symbolic: bool,
    bold: bool,
    italic: bool,
}

impl Descriptor {
    fn read(dict: Option<&PdfDict>, table: &ObjectTable) -> Self {
        let Some(dict) = dict else {
            return Self::default();
        };
        let flags = number_entry(dict, "Flags", table).map_or(0, |f| f as i64);
        let weight = number_entry(dict, "FontWeight", table).unwrap_or(0.0);
        let angle = number_entry(dict, "ItalicAngle", table).unwrap_or(0.0);
        Self {
            ascent: number_entry(dict, "Ascent", table).filter(|v| *v != 0.0),
            descent: number_entry(dict, "Descent", table),
            cap_height: number_entry(dict, "CapHeight", table).filter(|v| *v > 0.0),
            missing_width: number_entry(dict, "MissingWidth", table),
            symbolic: flags & (1 << 2) != 0,
            bold: flags & FLAG_FORCE_BOLD != 0 || weight >= 600.0,
            italic: flags & FLAG_ITALIC != 0 || angle != 0.0,
        }
    }
}

fn default_base_encoding(subtype: &str, metrics: &Descriptor) -> BaseEncoding {
    match subtype {
        _ if metrics.symbolic => BaseEncoding::Latin1,
        "TrueType" => BaseEncoding::WinAnsi,
        _ => BaseEncoding::Standard,
    }
}

fn name_suggests_bold(name: &str) -> bool {
    ["Bold", "Black", "Heavy"].iter().any(|hint| name.contains(hint))
}

fn name_suggests_italic(name: &str) -> bool {
    ["Italic", "Oblique"].iter().any(|hint| name.contains(hint))
}

fn find_space_code(font: &PdfFont) -> Option<u32> {
    if let Some(code) = font.to_unicode.as_ref().and_then(|c| c.code_for(" ")) {
        return Some(code);
    }
    match &font.encoding {
        Some(enc) if enc.decode(b' ').as_deref() == Some(" ") => Some(32),
        _ => None,
    }
}

fn space_width(font: &PdfFont, fallback: f32) -> f32 {
    font.space_code
        .map(|code| font.char_width(code))
        .filter(|w| *w > 0.0)
        .unwrap_or(fallback)
}

fn load_cmap(value: &PdfValue, table: &ObjectTable, max_bytes: usize) -> Option<ToUnicodeCMap> {
    let stream = dereference(value, table).as_stream()?;
    match decode_stream(stream, table, max_bytes) {
        Ok(data) => Some(ToUnicodeCMap::parse(&data)),
        Err(e) => {
            warn!(error = %e, "ignoring undecodable CMap stream");
            None
        }
    }
}

fn name_entry<'a>(dict: &'a PdfDict, key: &str, table: &'a ObjectTable) -> Option<&'a str> {
    dict.get(key).map(|v| dereference(v, table)).and_then(PdfValue::as_name)
}

fn number_entry(dict: &PdfDict, key: &str, table: &ObjectTable) -> Option<f32> {
    dict.get(key)
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_f64)
        .map(|v| v as f32)
}

fn number_array(value: &PdfValue, table: &ObjectTable) -> Option<Vec<f32>> {
    let items = dereference(value, table).as_array()?;
    Some(
        items
            .iter()
            .map(|v| dereference(v, table).as_f64().unwrap_or(0.0) as f32)
            .collect(),
    )
}

/// Source of fonts for the interpreter, keyed by `/Font` resource entry.
pub trait FontResolver {
    /// Font for the resource entry `entry` registered under `resource_name`.
    fn resolve(&mut self, resource_name: &str, entry: &PdfValue) -> Option<Arc<PdfFont>>;
}

/// Fonts resolved once per document, keyed by indirect object identity.
#[derive(Debug, Clone, Default)]
pub struct FontCache {
    fonts: HashMap<ObjId, Arc<PdfFont>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObjId) -> Option<Arc<PdfFont>> {
        self.fonts.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Resolve and cache every indirect font of a `/Font` resource dictionary.
    pub fn preload(&mut self, fonts: &PdfDict, table: &ObjectTable, max_bytes: usize) {
        for entry in fonts.values() {
            let PdfValue::Reference(id) = entry else {
                continue;
            };
            if self.fonts.contains_key(id) {
                continue;
            }
            if let Some(font) = load_indirect(*id, table, max_bytes) {
                self.fonts.insert(*id, font);
            }
        }
    }
}

fn load_indirect(id: ObjId, table: &ObjectTable, max_bytes: usize) -> Option<Arc<PdfFont>> {
    let dict = resolve_id(id, table).and_then(PdfValue::as_dict)?;
    let mut font = resolve_font(dict, table, max_bytes);
    font.object_id = Some(id);
    Some(Arc::new(font))
}

/// Per-page font lookup over a shared read-only [`FontCache`].
///
/// Fonts the cache misses are resolved once and kept in a page-local
/// overlay; inline font dictionaries are only ever cached here.
#[derive(Debug)]
pub struct PageFonts<'a> {
    shared: &'a FontCache,
    table: &'a ObjectTable,
    max_bytes: usize,
    indirect: HashMap<ObjId, Arc<PdfFont>>,
    inline: HashMap<(String, usize), Arc<PdfFont>>,
}

impl<'a> PageFonts<'a> {
    pub fn new(shared: &'a FontCache, table: &'a ObjectTable, max_bytes: usize) -> Self {
        Self {
            shared,
            table,
            max_bytes,
            indirect: HashMap::new(),
            inline: HashMap::new(),
        }
    }
}

impl FontResolver for PageFonts<'_> {
    fn resolve(&mut self, resource_name: &str, entry: &PdfValue) -> Option<Arc<PdfFont>> {
        if let PdfValue::Reference(id) = entry {
            if let Some(font) = self.shared.get(*id) {
                return Some(font);
            }
            if let Some(font) = self.indirect.get(id) {
                return Some(Arc::clone(font));
            }
            let font = load_indirect(*id, self.table, self.max_bytes)?;
            self.indirect.insert(*id, Arc::clone(&font));
            return Some(font);
        }

        let dict = entry.as_dict()?;
        // identity of the inline dictionary, not its contents
        let key = (resource_name.to_string(), std::ptr::from_ref(dict) as usize);
        if let Some(font) = self.inline.get(&key) {
            return Some(Arc::clone(font));
        }
        let font = Arc::new(resolve_font(dict, self.table, self.max_bytes));
        self.inline.insert(key, Arc::clone(&font));
        Some(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PdfStream;

    const LIMIT: usize = 1 << 20;

    fn name(n: &str) -> PdfValue {
        PdfValue::Name(n.to_string())
    }

    fn ints(values: &[i64]) -> PdfValue {
        PdfValue::Array(values.iter().map(|v| PdfValue::Int(*v)).collect())
    }

    fn dict(entries: Vec<(&str, PdfValue)>) -> PdfDict {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn assert_approx(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn simple_font_with_widths() {
        let font_dict = dict(vec![
            ("Subtype", name("TrueType")),
            ("BaseFont", name("ABCDEF+Arial-BoldMT")),
            ("FirstChar", PdfValue::Int(32)),
            ("Widths", ints(&[278, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 722])),
        ]);
        let font = resolve_font(&font_dict, &ObjectTable::new(), LIMIT);
        assert_eq!(font.base_name, "Arial-BoldMT");
        assert_eq!(font.kind, FontKind::Simple);
        assert!(font.bold);
        assert!(!font.italic);
        assert_approx(font.char_width(65), 0.722);
        assert_approx(font.char_width(200), 0.0);
        assert_approx(font.space_width(), 0.278);
        assert_eq!(font.unicode_for_code(65), "A");
        assert_eq!(font.unicode_for_code(0x80), "€");
        assert!(font.is_space(32));
    }

    #[test]
    fn standard_font_without_widths() {
        let font_dict = dict(vec![
            ("Subtype", name("Type1")),
            ("BaseFont", name("Helvetica")),
        ]);
        let font = resolve_font(&font_dict, &ObjectTable::new(), LIMIT);
        assert_approx(font.char_width(u32::from(b'H')), 0.722);
        assert_approx(font.space_width(), 0.278);
        assert_approx(font.ascent(), 0.718);
        assert_approx(font.descent(), -0.207);
        assert!(font.has_descent);
        // StandardEncoding curly apostrophe
        assert_eq!(font.unicode_for_code(0x27), "\u{2019}");
    }

    #[test]
    fn unknown_font_without_widths_uses_default() {
        let font_dict = dict(vec![("BaseFont", name("Mystery"))]);
        let font = resolve_font(&font_dict, &ObjectTable::new(), LIMIT);
        assert_approx(font.char_width(u32::from(b'x')), 0.5);
        assert_approx(font.space_width(), 0.5);
    }

    #[test]
    fn descriptor_flags_and_metrics() {
        let mut table = ObjectTable::new();
        table.insert(
            ObjId::new(7, 0),
            PdfValue::Dict(dict(vec![
                ("Ascent", PdfValue::Int(900)),
                ("Descent", PdfValue::Int(-200)),
                ("CapHeight", PdfValue::Int(650)),
                ("Flags", PdfValue::Int(FLAG_ITALIC | FLAG_FORCE_BOLD)),
                ("MissingWidth", PdfValue::Int(444)),
            ])),
        );
        let font_dict = dict(vec![
            ("BaseFont", name("Custom")),
            ("FontDescriptor", PdfValue::Reference(ObjId::new(7, 0))),
        ]);
        let font = resolve_font(&font_dict, &table, LIMIT);
        assert!(font.bold && font.italic);
        assert_approx(font.ascent(), 0.9);
        assert_approx(font.cap_height(), 0.65);
        assert_approx(font.char_width(u32::from(b'q')), 0.444);
    }

    #[test]
    fn differences_and_type3_scale() {
        let font_dict = dict(vec![
            ("Subtype", name("Type3")),
            (
                "FontMatrix",
                PdfValue::Array(vec![
                    PdfValue::Real(0.01),
                    PdfValue::Int(0),
                    PdfValue::Int(0),
                    PdfValue::Real(0.01),
                    PdfValue::Int(0),
                    PdfValue::Int(0),
                ]),
            ),
            ("FirstChar", PdfValue::Int(1)),
            ("Widths", ints(&[50, 25])),
            (
                "Encoding",
                PdfValue::Dict(dict(vec![(
                    "Differences",
                    PdfValue::Array(vec![PdfValue::Int(1), name("H"), name("space")]),
                )])),
            ),
        ]);
        let font = resolve_font(&font_dict, &ObjectTable::new(), LIMIT);
        assert_eq!(font.kind, FontKind::Type3);
        assert_approx(font.char_width(1), 0.5);
        assert_eq!(font.unicode_for_code(1), "H");
        assert!(font.is_space(2));
        assert!(!font.is_word_space_code(2));
    }

    #[test]
    fn composite_font_with_to_unicode() {
        let mut table = ObjectTable::new();
        let cmap = b"begincodespacerange <0000> <FFFF> endcodespacerange\n\
            beginbfchar <0003> <0020> <0024> <0041> endbfchar"
            .to_vec();
        table.insert(
            ObjId::new(20, 0),
            PdfValue::Stream(PdfStream::new(PdfDict::new(), cmap)),
        );
        table.insert(
            ObjId::new(21, 0),
            PdfValue::Dict(dict(vec![
                ("Subtype", name("CIDFontType2")),
                ("DW", PdfValue::Int(1000)),
                (
                    "W",
                    PdfValue::Array(vec![
                        PdfValue::Int(3),
                        ints(&[250]),
                        PdfValue::Int(36),
                        PdfValue::Int(40),
                        PdfValue::Int(600),
                    ]),
                ),
            ])),
        );
        let font_dict = dict(vec![
            ("Subtype", name("Type0")),
            ("BaseFont", name("XYZABC+NotoSans-Italic")),
            ("Encoding", name("Identity-H")),
            (
                "DescendantFonts",
                PdfValue::Array(vec![PdfValue::Reference(ObjId::new(21, 0))]),
            ),
            ("ToUnicode", PdfValue::Reference(ObjId::new(20, 0))),
        ]);
        let font = resolve_font(&font_dict, &table, LIMIT);
        assert_eq!(font.kind, FontKind::Composite);
        assert_eq!(font.code_width, CodeWidth::Two);
        assert!(font.italic);
        assert_eq!(font.codes(&[0x00, 0x24, 0x00, 0x03]), vec![0x24, 3]);
        assert_eq!(font.unicode_for_code(0x24), "A");
        assert_eq!(font.unicode_for_code(0x99), "\u{FFFD}");
        assert_approx(font.char_width(0x24), 0.6);
        assert_approx(font.char_width(0x99), 1.0);
        assert_approx(font.space_width(), 0.25);
        assert!(font.is_space(3));
    }

    #[test]
    fn w_array_forms() {
        let items = vec![
            PdfValue::Int(1),
            ints(&[500, 600]),
            PdfValue::Int(10),
            PdfValue::Int(12),
            PdfValue::Int(700),
        ];
        let widths = parse_w_array(&items, &ObjectTable::new());
        assert_eq!(widths.get(&1), Some(&500.0));
        assert_eq!(widths.get(&2), Some(&600.0));
        assert_eq!(widths.get(&11), Some(&700.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn widths_past_the_code_limit_are_dropped() {
        let font_dict = dict(vec![
            ("Subtype", name("Type1")),
            ("BaseFont", name("Helvetica")),
            ("FirstChar", PdfValue::Int(4_294_967_295)),
            ("Widths", ints(&[500, 500])),
        ]);
        let font = resolve_font(&font_dict, &ObjectTable::new(), LIMIT);
        assert_approx(font.char_width(u32::MAX), 0.5);
        assert_approx(font.char_width(0), 0.0);
    }

    #[test]
    fn w_array_near_the_code_limit() {
        let items = vec![
            PdfValue::Int(4_294_967_294),
            ints(&[100, 200, 300]),
            PdfValue::Int(1 << 40),
            ints(&[400]),
            PdfValue::Int(4_294_967_290),
            PdfValue::Int(1 << 40),
            PdfValue::Int(900),
        ];
        let widths = parse_w_array(&items, &ObjectTable::new());
        assert_eq!(widths.get(&4_294_967_294), Some(&100.0));
        assert_eq!(widths.get(&u32::MAX), Some(&200.0));
        assert_eq!(widths.get(&4_294_967_290), Some(&900.0));
        assert_eq!(widths.get(&4_294_967_293), Some(&900.0));
    }

    #[test]
    fn cache_is_keyed_by_object_id() {
        let mut table = ObjectTable::new();
        table.insert(
            ObjId::new(5, 0),
            PdfValue::Dict(dict(vec![("BaseFont", name("Courier"))])),
        );
        let resources = dict(vec![
            ("F1", PdfValue::Reference(ObjId::new(5, 0))),
            ("F2", PdfValue::Reference(ObjId::new(5, 0))),
        ]);
        let mut cache = FontCache::new();
        cache.preload(&resources, &table, LIMIT);
        assert_eq!(cache.len(), 1);

        let mut page = PageFonts::new(&cache, &table, LIMIT);
        let a = page.resolve("F1", &resources["F1"]).unwrap();
        let b = page.resolve("F2", &resources["F2"]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.object_id, Some(ObjId::new(5, 0)));
        assert_eq!(a.font_ref("F1").object_id, Some((5, 0)));
    }

    #[test]
    fn page_overlay_handles_misses_and_inline_fonts() {
        let mut table = ObjectTable::new();
        table.insert(
            ObjId::new(9, 0),
            PdfValue::Dict(dict(vec![("BaseFont", name("Times-Bold"))])),
        );
        let cache = FontCache::new();
        let mut page = PageFonts::new(&cache, &table, LIMIT);
        let missed = page
            .resolve("F1", &PdfValue::Reference(ObjId::new(9, 0)))
            .unwrap();
        assert!(missed.bold);

        let inline = PdfValue::Dict(dict(vec![("BaseFont", name("Courier"))]));
        let first = page.resolve("F2", &inline).unwrap();
        let second = page.resolve("F2", &inline).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.object_id, None);

        assert!(page.resolve("F3", &PdfValue::Reference(ObjId::new(99, 0))).is_none());
    }
}
