//! Object table builder.
//!
//! Objects are discovered by scanning the file for `<num> <gen> obj`
//! headers rather than through the cross-reference table, so damaged or
//! truncated files still yield whatever objects they contain. Later
//! definitions of the same object replace earlier ones, which is how
//! incremental updates behave.

use std::collections::HashMap;

use pdfwords_core::{ExtractOptions, ExtractWarning, ExtractWarningCode, PdfError};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::filters;
use crate::object::{ObjId, PdfDict, PdfStream, PdfValue};
use crate::scanner::{ByteCursor, is_whitespace};
use crate::tokenizer::{crop_next, crop_object};

/// All indirect objects of a document keyed by [`ObjId`].
///
/// Built once, then only read. A missing key is a normal condition
/// (dangling or forward reference), never an error.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: HashMap<ObjId, PdfValue>,
    trailers: Vec<PdfDict>,
    warnings: Vec<ExtractWarning>,
    max_reference_depth: usize,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            trailers: Vec::new(),
            warnings: Vec::new(),
            max_reference_depth: ExtractOptions::default().max_reference_depth,
        }
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `bytes` for objects. Never fails; problems become warnings.
    pub fn scan(bytes: &[u8], options: &ExtractOptions) -> Self {
        let mut table = Self {
            max_reference_depth: options.max_reference_depth,
            ..Self::default()
        };
        let mut cursor = ByteCursor::new(bytes);

        while cursor.skip_space_or_eof() {
            let line_start = cursor.position();

            if let Some(id) = match_object_header(&mut cursor) {
                match crop_object(&mut cursor) {
                    Ok(value) => {
                        table.insert_object(id, value.unwrap_or(PdfValue::Null), options);
                        cursor.skip_space_or_eof();
                        if cursor.starts_with(b"endobj") {
                            cursor.advance(b"endobj".len());
                        }
                    }
                    Err(e) => {
                        warn!(object = %id, error = %e, "skipping malformed object");
                        table.push_warning(
                            options,
                            ExtractWarning::with_code(
                                ExtractWarningCode::MalformedObject,
                                e.to_string(),
                            )
                            .with_element(format!("object {id}")),
                        );
                        cursor.set_position(line_start);
                        cursor.read_line();
                    }
                }
                continue;
            }

            if cursor.starts_with(b"trailer") {
                cursor.advance(b"trailer".len());
                match crop_next(&mut cursor, false, false) {
                    Ok(Some(PdfValue::Dict(dict))) => table.trailers.push(dict),
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "skipping malformed trailer");
                        cursor.set_position(line_start);
                        cursor.read_line();
                    }
                }
                continue;
            }

            cursor.read_line();
        }

        debug!(
            objects = table.objects.len(),
            trailers = table.trailers.len(),
            "object table built"
        );
        table
    }

    pub fn get(&self, id: ObjId) -> Option<&PdfValue> {
        self.objects.get(&id)
    }

    /// Look up by `"<num> <gen>"` key.
    pub fn get_by_key(&self, key: &str) -> Option<&PdfValue> {
        self.get(ObjId::from_key(key)?)
    }

    /// Insert or replace an object, returning the previous value.
    pub fn insert(&mut self, id: ObjId, value: PdfValue) -> Option<PdfValue> {
        self.objects.insert(id, value)
    }

    pub fn contains(&self, id: ObjId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object ids in ascending order.
    pub fn ids(&self) -> Vec<ObjId> {
        let mut ids: Vec<ObjId> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjId, &PdfValue)> {
        self.objects.iter()
    }

    /// `trailer` dictionaries in file order.
    pub fn trailers(&self) -> &[PdfDict] {
        &self.trailers
    }

    /// Issues met while building the table.
    pub fn warnings(&self) -> &[ExtractWarning] {
        &self.warnings
    }

    /// Maximum number of hops followed when resolving a reference.
    pub fn max_reference_depth(&self) -> usize {
        self.max_reference_depth
    }

    pub fn into_objects(self) -> HashMap<ObjId, PdfValue> {
        self.objects
    }

    fn push_warning(&mut self, options: &ExtractOptions, warning: ExtractWarning) {
        if options.collect_warnings {
            self.warnings.push(warning);
        }
    }

    fn insert_object(&mut self, id: ObjId, value: PdfValue, options: &ExtractOptions) {
        if let PdfValue::Stream(stream) = &value {
            if stream.type_name() == Some("ObjStm") {
                match self.expand_object_stream(stream, options) {
                    Ok(members) => {
                        debug!(object = %id, count = members.len(), "expanded object stream");
                        for (member_id, member) in members {
                            self.objects.insert(member_id, member);
                        }
                    }
                    Err(e) => {
                        warn!(object = %id, error = %e, "object stream expansion failed");
                        self.push_warning(
                            options,
                            ExtractWarning::with_code(
                                ExtractWarningCode::FilterFailure,
                                format!("object stream not expanded: {e}"),
                            )
                            .with_element(format!("object {id}")),
                        );
                    }
                }
            }
        }
        self.objects.insert(id, value);
    }

    /// Decode an `/Type /ObjStm` stream and read its member objects.
    ///
    /// The header holds `/N` pairs of object number and offset relative to
    /// `/First`. Members have generation 0.
    fn expand_object_stream(
        &self,
        stream: &PdfStream,
        options: &ExtractOptions,
    ) -> Result<Vec<(ObjId, PdfValue)>, BackendError> {
        let data = filters::decode_stream(stream, self, options.max_stream_bytes)?;
        let count = self.int_entry(&stream.dict, "N").unwrap_or(0);
        let first = self
            .int_entry(&stream.dict, "First")
            .filter(|&f| f <= data.len())
            .ok_or_else(|| BackendError::Parse("object stream /First out of range".into()))?;

        let mut header = ByteCursor::new(&data[..first]);
        let mut entries = Vec::with_capacity(count.min(first));
        while entries.len() < count {
            let num = crop_next(&mut header, false, false)?.and_then(|v| v.as_i64());
            let offset = crop_next(&mut header, false, false)?.and_then(|v| v.as_i64());
            let (Some(num), Some(offset)) = (num, offset) else {
                break;
            };
            let (Ok(num), Ok(offset)) = (u32::try_from(num), usize::try_from(offset)) else {
                continue;
            };
            entries.push((num, first.saturating_add(offset)));
        }

        let mut members = Vec::with_capacity(entries.len());
        for (i, &(num, start)) in entries.iter().enumerate() {
            if start >= data.len() {
                continue;
            }
            let end = entries
                .get(i + 1)
                .map(|&(_, next)| next)
                .filter(|&next| next > start && next <= data.len())
                .unwrap_or(data.len());
            let mut cursor = ByteCursor::new(&data[start..end]);
            match crop_next(&mut cursor, false, false) {
                Ok(value) => members.push((ObjId::new(num, 0), value.unwrap_or(PdfValue::Null))),
                Err(e) => warn!(object = num, error = %e, "skipping malformed compressed object"),
            }
        }
        Ok(members)
    }

    fn int_entry(&self, dict: &PdfDict, key: &str) -> Option<usize> {
        let value = crate::resolver::dereference(dict.get(key)?, self);
        usize::try_from(value.as_i64()?).ok()
    }
}

/// Match `<num> <gen> obj` at the cursor, consuming it on success.
fn match_object_header(cursor: &mut ByteCursor<'_>) -> Option<ObjId> {
    let mut lookahead = cursor.clone();
    let num = read_uint(&mut lookahead)?;
    if !lookahead.peek().is_some_and(is_whitespace) {
        return None;
    }
    lookahead.skip_space_or_eof();
    let generation = read_uint(&mut lookahead)?;
    if !lookahead.peek().is_some_and(is_whitespace) {
        return None;
    }
    lookahead.skip_space_or_eof();
    if lookahead.read_regular() != b"obj" {
        return None;
    }
    *cursor = lookahead;
    Some(ObjId::new(num, generation))
}

fn read_uint<T: std::str::FromStr>(cursor: &mut ByteCursor<'_>) -> Option<T> {
    let token = cursor.read_regular();
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Scan `bytes` into a raw object map, expanding object streams.
pub fn get_objects(bytes: &[u8]) -> HashMap<ObjId, PdfValue> {
    ObjectTable::scan(bytes, &ExtractOptions::default()).into_objects()
}

/// Build the object table for a document with default options.
///
/// # Errors
///
/// Fails only for empty input or when no object at all can be recovered.
pub fn parse_objects(bytes: &[u8]) -> Result<ObjectTable, BackendError> {
    parse_objects_with_options(bytes, &ExtractOptions::default())
}

/// Build the object table for a document.
pub fn parse_objects_with_options(
    bytes: &[u8],
    options: &ExtractOptions,
) -> Result<ObjectTable, BackendError> {
    if bytes.is_empty() {
        return Err(PdfError::EmptyInput.into());
    }
    let table = ObjectTable::scan(bytes, options);
    if table.is_empty() {
        return Err(BackendError::Parse("no PDF objects found".to_string()));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn name(s: &str) -> PdfValue {
        PdfValue::Name(s.to_string())
    }

    #[test]
    fn single_object_by_key() {
        let table = parse_objects(b"12 0 obj\n<< /Type /Page >>\nendobj\n").unwrap();
        assert_eq!(table.len(), 1);
        let value = table.get_by_key("12 0").unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict["Type"], name("Page"));
    }

    #[test]
    fn several_objects_and_same_line_bodies() {
        let input = b"%PDF-1.4\n1 0 obj 42 endobj 2 0 obj (text) endobj\n3 1 obj\n[1 2 0 R]\nendobj\n";
        let table = parse_objects(input).unwrap();
        assert_eq!(table.get(ObjId::new(1, 0)), Some(&PdfValue::Int(42)));
        assert_eq!(
            table.get(ObjId::new(2, 0)),
            Some(&PdfValue::LiteralString(b"text".to_vec()))
        );
        assert_eq!(
            table.get(ObjId::new(3, 1)),
            Some(&PdfValue::Array(vec![
                PdfValue::Int(1),
                PdfValue::Reference(ObjId::new(2, 0))
            ]))
        );
        assert_eq!(table.ids(), vec![ObjId::new(1, 0), ObjId::new(2, 0), ObjId::new(3, 1)]);
    }

    #[test]
    fn later_definition_wins() {
        let input = b"4 0 obj (old) endobj\n4 0 obj (new) endobj\n";
        let table = parse_objects(input).unwrap();
        assert_eq!(
            table.get(ObjId::new(4, 0)),
            Some(&PdfValue::LiteralString(b"new".to_vec()))
        );
    }

    #[test]
    fn malformed_object_is_skipped() {
        let input = b"1 0 obj\n<< /A 1\nendobj\n2 0 obj\n<< /B 2 >>\nendobj\n";
        let table = parse_objects(input).unwrap();
        assert!(table.get(ObjId::new(1, 0)).is_none());
        assert!(table.get(ObjId::new(2, 0)).is_some());
        assert_eq!(table.warnings().len(), 1);
        assert_eq!(table.warnings()[0].code, ExtractWarningCode::MalformedObject);
    }

    #[test]
    fn stream_objects_keep_raw_bytes() {
        let input = b"5 0 obj\n<< /Length 12 >>\nstream\nBT (x) Tj ET\nendstream\nendobj\n";
        let table = parse_objects(input).unwrap();
        let stream = table.get(ObjId::new(5, 0)).unwrap().as_stream().unwrap();
        assert_eq!(stream.raw, b"BT (x) Tj ET");
    }

    #[test]
    fn trailers_are_collected() {
        let input = b"1 0 obj << /Type /Catalog >> endobj\ntrailer\n<< /Root 1 0 R /Size 2 >>\n";
        let table = parse_objects(input).unwrap();
        assert_eq!(table.trailers().len(), 1);
        assert_eq!(
            table.trailers()[0]["Root"],
            PdfValue::Reference(ObjId::new(1, 0))
        );
    }

    #[test]
    fn object_stream_members_are_expanded() {
        let body = b"10 0 11 11 << /A 1 >> [/x /y]";
        let compressed = zlib(body);
        let mut input = format!(
            "7 0 obj\n<< /Type /ObjStm /N 2 /First 11 /Filter /FlateDecode /Length {} >>\nstream\n",
            compressed.len()
        )
        .into_bytes();
        input.extend_from_slice(&compressed);
        input.extend_from_slice(b"\nendstream\nendobj\n");

        let table = parse_objects(&input).unwrap();
        assert_eq!(
            table.get(ObjId::new(10, 0)).and_then(|v| v.get("A")),
            Some(&PdfValue::Int(1))
        );
        assert_eq!(
            table.get(ObjId::new(11, 0)),
            Some(&PdfValue::Array(vec![name("x"), name("y")]))
        );
        assert!(table.get(ObjId::new(7, 0)).unwrap().as_stream().is_some());
    }

    #[test]
    fn broken_object_stream_does_not_stop_the_scan() {
        let input = b"7 0 obj\n<< /Type /ObjStm /N 1 /First 4 /Filter /FlateDecode /Length 4 >>\nstream\nnope\nendstream\nendobj\n8 0 obj 1 endobj\n";
        let table = parse_objects(input).unwrap();
        assert_eq!(table.get(ObjId::new(8, 0)), Some(&PdfValue::Int(1)));
        assert!(
            table
                .warnings()
                .iter()
                .any(|w| w.code == ExtractWarningCode::FilterFailure)
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            parse_objects(b""),
            Err(BackendError::Core(PdfError::EmptyInput))
        ));
        assert!(matches!(
            parse_objects(b"not a pdf at all"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn header_requires_obj_keyword() {
        let table = ObjectTable::scan(b"1 0 R\n1 0 objx\n2 0 obj null endobj", &ExtractOptions::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ObjId::new(2, 0)), Some(&PdfValue::Null));
    }

    #[test]
    fn get_objects_returns_map() {
        let map = get_objects(b"3 0 obj /Name endobj");
        assert_eq!(map.get(&ObjId::new(3, 0)), Some(&name("Name")));
    }
}
