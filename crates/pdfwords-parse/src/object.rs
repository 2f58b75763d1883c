//! PDF value model.
//!
//! [`PdfValue`] is a closed tagged union over every value the tokenizer can
//! produce. Indirect objects are not nested owning pointers: a
//! [`PdfValue::Reference`] holds an [`ObjId`] that is looked up in the
//! [`ObjectTable`](crate::ObjectTable) when needed.

use std::collections::BTreeMap;
use std::fmt;

/// Dictionary keyed by name (without the leading `/`).
pub type PdfDict = BTreeMap<String, PdfValue>;

/// Object number and generation of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId {
    pub num: u32,
    pub generation: u16,
}

impl ObjId {
    pub fn new(num: u32, generation: u16) -> Self {
        Self { num, generation }
    }

    /// Table key in `"<num> <gen>"` form.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse a `"<num> <gen>"` key.
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.split_ascii_whitespace();
        let num = parts.next()?.parse().ok()?;
        let generation = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(num, generation))
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.num, self.generation)
    }
}

/// Bytes per character code in a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CodeWidth {
    #[default]
    One,
    Two,
    Four,
}

impl CodeWidth {
    pub fn bytes(self) -> usize {
        match self {
            CodeWidth::One => 1,
            CodeWidth::Two => 2,
            CodeWidth::Four => 4,
        }
    }

    pub fn from_bytes(n: usize) -> Option<Self> {
        match n {
            1 => Some(CodeWidth::One),
            2 => Some(CodeWidth::Two),
            4 => Some(CodeWidth::Four),
            _ => None,
        }
    }
}

/// Hex string bytes plus the code width observed while tokenizing.
///
/// The width is only a hint. Fonts with multi-byte codes split by their
/// own width; one-byte simple fonts read 2 and 4 byte groups as Unicode
/// units. Writing the string back keeps the digit groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexString {
    pub bytes: Vec<u8>,
    pub unit_width: CodeWidth,
    /// Whitespace appeared between hex digits.
    pub has_internal_space: bool,
}

impl HexString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }
}

/// Stream dictionary plus its undecoded body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfStream {
    pub dict: PdfDict,
    pub raw: Vec<u8>,
}

impl PdfStream {
    pub fn new(dict: PdfDict, raw: Vec<u8>) -> Self {
        Self { dict, raw }
    }

    /// `/Type` of the stream dictionary.
    pub fn type_name(&self) -> Option<&str> {
        self.dict.get("Type").and_then(PdfValue::as_name)
    }
}

/// A parsed PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Name without the leading `/`, `#xx` escapes expanded.
    Name(String),
    /// Raw bytes of a `( … )` string after escape processing.
    LiteralString(Vec<u8>),
    HexString(HexString),
    Array(Vec<PdfValue>),
    Dict(PdfDict),
    Reference(ObjId),
    Stream(PdfStream),
    /// A bare keyword in a content stream (`Tj`, `BT`, `'`, …).
    OperatorTag(String),
}

impl PdfValue {
    /// Short lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            PdfValue::Null => "null",
            PdfValue::Bool(_) => "bool",
            PdfValue::Int(_) => "int",
            PdfValue::Real(_) => "real",
            PdfValue::Name(_) => "name",
            PdfValue::LiteralString(_) => "string",
            PdfValue::HexString(_) => "hexstring",
            PdfValue::Array(_) => "array",
            PdfValue::Dict(_) => "dict",
            PdfValue::Reference(_) => "reference",
            PdfValue::Stream(_) => "stream",
            PdfValue::OperatorTag(_) => "operator",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PdfValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value; reals are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PdfValue::Int(i) => Some(*i),
            PdfValue::Real(r) if r.is_finite() => Some(*r as i64),
            _ => None,
        }
    }

    /// Numeric value of an int or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PdfValue::Int(i) => Some(*i as f64),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfValue::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Bytes of a literal or hex string.
    pub fn as_string_bytes(&self) -> Option<&[u8]> {
        match self {
            PdfValue::LiteralString(b) => Some(b),
            PdfValue::HexString(h) => Some(&h.bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfValue]> {
        match self {
            PdfValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Dictionary of a dict, or the dictionary of a stream.
    pub fn as_dict(&self) -> Option<&PdfDict> {
        match self {
            PdfValue::Dict(d) => Some(d),
            PdfValue::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfValue::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjId> {
        match self {
            PdfValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Entry `key` of a dict or stream dictionary.
    pub fn get(&self, key: &str) -> Option<&PdfValue> {
        self.as_dict()?.get(key)
    }

    /// Serialize as PDF syntax into `out`.
    ///
    /// Stream bodies are written verbatim, so the output may be binary.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            PdfValue::Null => out.extend_from_slice(b"null"),
            PdfValue::Bool(true) => out.extend_from_slice(b"true"),
            PdfValue::Bool(false) => out.extend_from_slice(b"false"),
            PdfValue::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
            PdfValue::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
            PdfValue::Name(n) => write_name(n, out),
            PdfValue::LiteralString(bytes) => write_literal(bytes, out),
            PdfValue::HexString(h) => {
                out.push(b'<');
                // digit groups carry the unit width back through a re-read
                let unit = if h.has_internal_space {
                    h.unit_width.bytes()
                } else {
                    h.bytes.len().max(1)
                };
                for (i, chunk) in h.bytes.chunks(unit).enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    for b in chunk {
                        out.extend_from_slice(format!("{b:02X}").as_bytes());
                    }
                }
                out.push(b'>');
            }
            PdfValue::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }
                out.push(b']');
            }
            PdfValue::Dict(dict) => write_dict(dict, out),
            PdfValue::Reference(id) => out.extend_from_slice(format!("{id} R").as_bytes()),
            PdfValue::Stream(stream) => {
                write_dict(&stream.dict, out);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(&stream.raw);
                out.extend_from_slice(b"\nendstream");
            }
            PdfValue::OperatorTag(tag) => out.extend_from_slice(tag.as_bytes()),
        }
    }

    /// PDF syntax as bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

impl fmt::Display for PdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl From<PdfDict> for PdfValue {
    fn from(dict: PdfDict) -> Self {
        PdfValue::Dict(dict)
    }
}

impl From<ObjId> for PdfValue {
    fn from(id: ObjId) -> Self {
        PdfValue::Reference(id)
    }
}

/// Reals always carry a decimal point so they read back as reals.
fn format_real(r: f64) -> String {
    if !r.is_finite() {
        return "0.0".to_string();
    }
    let s = r.to_string();
    if s.contains('.') { s } else { format!("{s}.0") }
}

fn write_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name.as_bytes() {
        if b == b'#' || !(0x21..=0x7E).contains(&b) || crate::scanner::is_delimiter(b) {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        } else {
            out.push(b);
        }
    }
}

fn write_literal(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
        }
    }
    out.push(b')');
}

fn write_dict(dict: &PdfDict, out: &mut Vec<u8>) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict {
        write_name(key, out);
        out.push(b' ');
        value.write_to(out);
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
}
