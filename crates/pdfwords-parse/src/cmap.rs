//! ToUnicode CMap parser for mapping character codes to Unicode strings.
//!
//! The CMap program is read with the content-stream tokenizer, so hex
//! strings, arrays and operators arrive as typed values. Supports
//! `bfchar` and `bfrange` (both the incrementing and the array form) with
//! UTF-16BE destinations, and derives the code width from
//! `begincodespacerange`.

use std::collections::HashMap;

use tracing::trace;

use crate::encoding::glyph_to_unicode;
use crate::object::{CodeWidth, PdfValue};
use crate::scanner::ByteCursor;
use crate::tokenizer::crop_next;

/// Largest `bfrange` expanded into the table.
const MAX_RANGE: u32 = 0xFFFF;

/// A parsed ToUnicode CMap that maps character codes to Unicode strings.
///
/// Unicode values may be single characters or multi-character strings
/// (e.g., the ligature glyph "ﬁ" mapped to "fi").
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    mappings: HashMap<u32, String>,
    code_width: Option<CodeWidth>,
}

impl ToUnicodeCMap {
    /// Parse a ToUnicode CMap from its decoded stream content.
    ///
    /// Malformed entries are skipped; parsing never fails.
    pub fn parse(data: &[u8]) -> Self {
        let mut cmap = Self::default();
        let mut cursor = ByteCursor::new(data);
        let mut operands: Vec<PdfValue> = Vec::new();

        loop {
            let value = match crop_next(&mut cursor, true, false) {
                Ok(Some(value)) => value,
                Ok(None) => break,
                Err(e) => {
                    trace!(error = %e, "stopping at malformed CMap token");
                    break;
                }
            };
            let PdfValue::OperatorTag(op) = value else {
                operands.push(value);
                continue;
            };
            match op.as_str() {
                "endcodespacerange" => cmap.read_codespace(&operands),
                "endbfchar" => cmap.read_bfchar(&operands),
                "endbfrange" => cmap.read_bfrange(&operands),
                _ => {}
            }
            operands.clear();
        }
        cmap
    }

    /// Look up the Unicode string for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Look up the Unicode string for a character code, falling back to
    /// U+FFFD (REPLACEMENT CHARACTER).
    pub fn lookup_or_replacement(&self, code: u32) -> String {
        self.lookup(code)
            .map(str::to_string)
            .unwrap_or_else(|| "\u{FFFD}".to_string())
    }

    /// Code width declared by the codespace ranges, if any.
    pub fn code_width(&self) -> Option<CodeWidth> {
        self.code_width
    }

    /// Code whose mapping is exactly `text`, if any.
    pub fn code_for(&self, text: &str) -> Option<u32> {
        self.mappings
            .iter()
            .filter(|(_, v)| v.as_str() == text)
            .map(|(k, _)| *k)
            .min()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn read_codespace(&mut self, operands: &[PdfValue]) {
        let widest = operands
            .chunks_exact(2)
            .filter_map(|pair| hex_bytes(&pair[0]).map(<[u8]>::len))
            .max();
        if let Some(width) = widest.and_then(CodeWidth::from_bytes) {
            self.code_width = Some(self.code_width.map_or(width, |w| w.max(width)));
        }
    }

    fn read_bfchar(&mut self, operands: &[PdfValue]) {
        for pair in operands.chunks_exact(2) {
            let Some(code) = hex_bytes(&pair[0]).map(code_value) else {
                continue;
            };
            let text = match &pair[1] {
                PdfValue::Name(name) => glyph_to_unicode(name),
                other => hex_bytes(other).map(|b| decode_utf16be(&utf16_units(b))),
            };
            if let Some(text) = text {
                self.mappings.insert(code, text);
            }
        }
    }

    fn read_bfrange(&mut self, operands: &[PdfValue]) {
        for triple in operands.chunks_exact(3) {
            let (Some(low), Some(high)) = (hex_bytes(&triple[0]), hex_bytes(&triple[1])) else {
                continue;
            };
            let (low, high) = (code_value(low), code_value(high));
            if high < low || high - low > MAX_RANGE {
                trace!(low, high, "skipping oversized bfrange");
                continue;
            }

            match &triple[2] {
                PdfValue::Array(items) => {
                    for (code, item) in (low..=high).zip(items) {
                        if let Some(bytes) = hex_bytes(item) {
                            self.mappings
                                .insert(code, decode_utf16be(&utf16_units(bytes)));
                        }
                    }
                }
                other => {
                    let Some(start) = hex_bytes(other).map(utf16_units) else {
                        continue;
                    };
                    let Some((&last, prefix)) = start.split_last() else {
                        continue;
                    };
                    for (offset, code) in (low..=high).enumerate() {
                        let mut units = prefix.to_vec();
                        units.push(last.wrapping_add(offset as u16));
                        self.mappings.insert(code, decode_utf16be(&units));
                    }
                }
            }
        }
    }
}

fn hex_bytes(value: &PdfValue) -> Option<&[u8]> {
    match value {
        PdfValue::HexString(hex) => Some(&hex.bytes),
        PdfValue::LiteralString(bytes) => Some(bytes),
        _ => None,
    }
}

/// Big-endian integer value of a source code.
fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Group bytes into UTF-16BE code units. A single byte is a unit of its own.
fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from(*hi) << 8,
            _ => 0,
        })
        .collect()
}

fn decode_utf16be(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
