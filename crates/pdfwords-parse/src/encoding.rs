//! Single-byte font encodings and glyph names.

use std::collections::HashMap;

use encoding_rs::{MACINTOSH, WINDOWS_1252};
use pdfwords_core::accents;

use crate::object::PdfValue;

/// The base encoding of a simple font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseEncoding {
    #[default]
    Standard,
    WinAnsi,
    MacRoman,
    /// Codes map straight to U+0000..U+00FF.
    Latin1,
}

impl BaseEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(Self::Standard),
            "WinAnsiEncoding" => Some(Self::WinAnsi),
            "MacRomanEncoding" | "MacExpertEncoding" => Some(Self::MacRoman),
            _ => None,
        }
    }

    /// Character for a single-byte code, if the encoding defines one.
    pub fn decode(self, code: u8) -> Option<char> {
        match self {
            Self::Latin1 => Some(char::from(code)),
            Self::WinAnsi => decode_single(WINDOWS_1252, code),
            Self::MacRoman if code >= 0x80 => decode_single(MACINTOSH, code),
            Self::MacRoman => Some(char::from(code)),
            Self::Standard => standard(code),
        }
    }
}

fn decode_single(encoding: &'static encoding_rs::Encoding, code: u8) -> Option<char> {
    let buf = [code];
    let (text, had_errors) = encoding.decode_without_bom_handling(&buf);
    if had_errors {
        return None;
    }
    text.chars().next().filter(|c| !c.is_control() || code < 0x80)
}

/// Adobe StandardEncoding: ASCII with curly quotes, plus an upper half
/// that differs from Latin-1.
fn standard(code: u8) -> Option<char> {
    let c = match code {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x00..=0x7F => return Some(char::from(code)),
        0xA1 => '¡',
        0xA2 => '¢',
        0xA3 => '£',
        0xA4 => '\u{2044}',
        0xA5 => '¥',
        0xA6 => 'ƒ',
        0xA7 => '§',
        0xA8 => '¤',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '«',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '·',
        0xB6 => '¶',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '»',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '¿',
        0xC1 => '`',
        0xC2 => '´',
        0xC3 => '\u{02C6}',
        0xC4 => '\u{02DC}',
        0xC5 => '¯',
        0xC6 => '\u{02D8}',
        0xC7 => '\u{02D9}',
        0xC8 => '¨',
        0xCA => '\u{02DA}',
        0xCB => '¸',
        0xCD => '\u{02DD}',
        0xCE => '\u{02DB}',
        0xCF => '\u{02C7}',
        0xD0 => '\u{2014}',
        0xE1 => 'Æ',
        0xE3 => 'ª',
        0xE8 => 'Ł',
        0xE9 => 'Ø',
        0xEA => 'Œ',
        0xEB => 'º',
        0xF1 => 'æ',
        0xF5 => 'ı',
        0xF8 => 'ł',
        0xF9 => 'ø',
        0xFA => 'œ',
        0xFB => 'ß',
        _ => return None,
    };
    Some(c)
}

/// A simple font's code-to-text mapping: a base encoding with optional
/// `/Differences` overrides.
#[derive(Debug, Clone, Default)]
pub struct SimpleEncoding {
    base: BaseEncoding,
    differences: HashMap<u8, String>,
}

impl SimpleEncoding {
    pub fn new(base: BaseEncoding) -> Self {
        Self {
            base,
            differences: HashMap::new(),
        }
    }

    pub fn base(&self) -> BaseEncoding {
        self.base
    }

    /// Apply a `/Differences` array: a code followed by the glyph names
    /// assigned to it and the codes after it.
    pub fn apply_differences(&mut self, items: &[PdfValue]) {
        let mut code: Option<u32> = None;
        for item in items {
            match item {
                PdfValue::Int(n) => code = u32::try_from(*n).ok(),
                PdfValue::Real(n) if *n >= 0.0 => code = Some(*n as u32),
                PdfValue::Name(name) => {
                    if let Some(c) = code.filter(|c| *c <= 0xFF) {
                        if let Some(text) = glyph_to_unicode(name) {
                            self.differences.insert(c as u8, text);
                        }
                    }
                    code = code.and_then(|c| c.checked_add(1));
                }
                _ => {}
            }
        }
    }

    /// Text for a single-byte code.
    pub fn decode(&self, code: u8) -> Option<String> {
        if let Some(text) = self.differences.get(&code) {
            return Some(text.clone());
        }
        self.base.decode(code).map(String::from)
    }
}

/// Unicode text for a glyph name, following the Adobe glyph naming rules
/// for `uniXXXX` and `uXXXX` forms and a table of common Latin names.
pub fn glyph_to_unicode(name: &str) -> Option<String> {
    // a ".sc" style suffix names a variant of the same glyph
    let name = name.split('.').next().unwrap_or(name);
    if name.is_empty() {
        return None;
    }

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|c| {
                    std::str::from_utf8(c)
                        .ok()
                        .and_then(|s| u16::from_str_radix(s, 16).ok())
                })
                .collect();
            if let Some(units) = units {
                return String::from_utf16(&units).ok();
            }
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c.to_string());
        }
    }

    if let Some(c) = named_glyph(name) {
        return Some(c.to_string());
    }
    if let Some(s) = ligature(name) {
        return Some(s.to_string());
    }
    accented_letter(name).map(String::from)
}

fn named_glyph(name: &str) -> Option<char> {
    let c = match name {
        "space" | "nbspace" | "nonbreakingspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "sfthyphen" | "softhyphen" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotesinglbase" => '\u{201A}',
        "quotedblbase" => '\u{201E}',
        "guillemotleft" => '«',
        "guillemotright" => '»',
        "guilsinglleft" => '\u{2039}',
        "guilsinglright" => '\u{203A}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "perthousand" => '\u{2030}',
        "trademark" => '\u{2122}',
        "copyright" => '©',
        "registered" => '®',
        "degree" => '°',
        "section" => '§',
        "paragraph" => '¶',
        "periodcentered" | "middot" => '·',
        "exclamdown" => '¡',
        "questiondown" => '¿',
        "cent" => '¢',
        "sterling" => '£',
        "yen" => '¥',
        "Euro" => '€',
        "currency" => '¤',
        "florin" => 'ƒ',
        "fraction" => '\u{2044}',
        "brokenbar" => '¦',
        "logicalnot" => '¬',
        "multiply" => '×',
        "divide" => '÷',
        "minus" => '\u{2212}',
        "plusminus" => '±',
        "mu" => 'µ',
        "ordfeminine" => 'ª',
        "ordmasculine" => 'º',
        "onehalf" => '½',
        "onequarter" => '¼',
        "threequarters" => '¾',
        "onesuperior" => '¹',
        "twosuperior" => '²',
        "threesuperior" => '³',
        "germandbls" => 'ß',
        "ae" => 'æ',
        "AE" => 'Æ',
        "oe" => 'œ',
        "OE" => 'Œ',
        "oslash" => 'ø',
        "Oslash" => 'Ø',
        "eth" => 'ð',
        "Eth" => 'Ð',
        "thorn" => 'þ',
        "Thorn" => 'Þ',
        "dotlessi" => 'ı',
        "lslash" => 'ł',
        "Lslash" => 'Ł',
        "grave" => '`',
        "acute" => '´',
        "circumflex" => '\u{02C6}',
        "tilde" => '\u{02DC}',
        "macron" => '¯',
        "breve" => '\u{02D8}',
        "dotaccent" => '\u{02D9}',
        "dieresis" => '¨',
        "ring" => '\u{02DA}',
        "cedilla" => '¸',
        "hungarumlaut" => '\u{02DD}',
        "ogonek" => '\u{02DB}',
        "caron" => '\u{02C7}',
        _ => return None,
    };
    Some(c)
}

fn ligature(name: &str) -> Option<&'static str> {
    Some(match name {
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        _ => return None,
    })
}

/// Names like `eacute` or `Scaron`: one base letter plus an accent name.
fn accented_letter(name: &str) -> Option<char> {
    let mut chars = name.chars();
    let base = chars.next().filter(char::is_ascii_alphabetic)?;
    let accent = accents::by_name(chars.as_str())?;
    accents::fuse(base, accent.combining)
}
