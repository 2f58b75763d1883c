//! Object tokenizer.
//!
//! Reads one typed [`PdfValue`] at a time from a [`ByteCursor`]. The same
//! reader serves file-level object bodies and content streams; in content
//! stream mode bare keywords become [`PdfValue::OperatorTag`]s and inline
//! images are copied out as opaque bytes.
//!
//! Malformed input yields a best-effort value. The only hard failure is a
//! dictionary that never closes, reported as [`BackendError::Parse`].

use tracing::trace;

use crate::error::BackendError;
use crate::object::{CodeWidth, HexString, ObjId, PdfDict, PdfStream, PdfValue};
use crate::scanner::{ByteCursor, is_delimiter, is_whitespace, trim_eol};

/// Keywords that delimit file-level structure. Outside content streams they
/// end whatever container is open.
const STRUCTURAL_KEYWORDS: &[&[u8]] = &[
    b"obj",
    b"endobj",
    b"stream",
    b"endstream",
    b"trailer",
    b"xref",
    b"startxref",
];

/// What a single read produced.
enum Cropped {
    Value(PdfValue),
    ArrayEnd,
    DictEnd,
    /// A structural keyword; the cursor is left in front of it.
    Keyword,
    Eof,
}

/// Read the next value.
///
/// `expect_operator_tags` selects content stream mode. `hex_unit_is_2bytes`
/// marks hex strings as two bytes per code unless their spacing says
/// otherwise.
///
/// Returns `Ok(None)` at end of input or in front of a structural keyword
/// such as `endobj`.
///
/// # Errors
///
/// Returns [`BackendError::Parse`] when a dictionary is not closed before
/// end of input or before a structural keyword.
pub fn crop_next(
    cursor: &mut ByteCursor<'_>,
    expect_operator_tags: bool,
    hex_unit_is_2bytes: bool,
) -> Result<Option<PdfValue>, BackendError> {
    loop {
        match crop(cursor, expect_operator_tags, hex_unit_is_2bytes)? {
            Cropped::Value(value) => return Ok(Some(value)),
            Cropped::Eof | Cropped::Keyword => return Ok(None),
            Cropped::ArrayEnd | Cropped::DictEnd => {
                trace!(offset = cursor.position(), "stray closing delimiter");
            }
        }
    }
}

/// Read one file-level object body.
///
/// A dictionary followed by the `stream` keyword becomes a
/// [`PdfValue::Stream`] carrying the raw body bytes.
pub fn crop_object(cursor: &mut ByteCursor<'_>) -> Result<Option<PdfValue>, BackendError> {
    let Some(value) = crop_next(cursor, false, false)? else {
        return Ok(None);
    };
    let PdfValue::Dict(dict) = value else {
        return Ok(Some(value));
    };

    let mark = cursor.position();
    cursor.skip_space_or_eof();
    if !cursor.starts_with(b"stream") {
        cursor.set_position(mark);
        return Ok(Some(PdfValue::Dict(dict)));
    }
    cursor.advance(b"stream".len());
    match cursor.peek() {
        Some(b'\r') => {
            cursor.advance(1);
            if cursor.peek() == Some(b'\n') {
                cursor.advance(1);
            }
        }
        Some(b'\n') => cursor.advance(1),
        _ => {}
    }

    let raw = read_stream_body(cursor, &dict);
    Ok(Some(PdfValue::Stream(PdfStream::new(dict, raw))))
}

fn crop(
    cursor: &mut ByteCursor<'_>,
    expect_operator_tags: bool,
    hex_unit_is_2bytes: bool,
) -> Result<Cropped, BackendError> {
    loop {
        if !cursor.skip_space_and_comments() {
            return Ok(Cropped::Eof);
        }
        let start = cursor.position();
        let Some(b) = cursor.peek() else {
            return Ok(Cropped::Eof);
        };

        match b {
            b'<' if cursor.peek_at(1) == Some(b'<') => {
                cursor.advance(2);
                let dict = parse_dictionary(cursor, hex_unit_is_2bytes)?;
                return Ok(Cropped::Value(PdfValue::Dict(dict)));
            }
            b'<' => {
                let hex = parse_hex_string(cursor, hex_unit_is_2bytes);
                return Ok(Cropped::Value(PdfValue::HexString(hex)));
            }
            b'>' if cursor.peek_at(1) == Some(b'>') => {
                cursor.advance(2);
                return Ok(Cropped::DictEnd);
            }
            b'(' => {
                let s = parse_literal_string(cursor);
                return Ok(Cropped::Value(PdfValue::LiteralString(s)));
            }
            b'[' => {
                cursor.advance(1);
                let items = parse_array(cursor, hex_unit_is_2bytes)?;
                return Ok(Cropped::Value(PdfValue::Array(items)));
            }
            b']' => {
                cursor.advance(1);
                return Ok(Cropped::ArrayEnd);
            }
            b'/' => return Ok(Cropped::Value(PdfValue::Name(parse_name(cursor)))),
            b')' | b'>' | b'{' | b'}' => {
                trace!(offset = start, byte = b, "skipping unexpected delimiter");
                cursor.advance(1);
                continue;
            }
            _ => {}
        }

        if let Some(id) = match_reference(cursor) {
            return Ok(Cropped::Value(PdfValue::Reference(id)));
        }

        let token = cursor.read_regular();
        if token.is_empty() {
            cursor.advance(1);
            continue;
        }

        let value = match token {
            b"true" => PdfValue::Bool(true),
            b"false" => PdfValue::Bool(false),
            b"null" => PdfValue::Null,
            _ if is_integer(token) => match std::str::from_utf8(token).ok().and_then(|s| s.parse().ok()) {
                Some(i) => PdfValue::Int(i),
                None => PdfValue::Real(lenient_real(token)),
            },
            _ if is_real(token) => PdfValue::Real(lenient_real(token)),
            _ if !expect_operator_tags && STRUCTURAL_KEYWORDS.contains(&token) => {
                cursor.set_position(start);
                return Ok(Cropped::Keyword);
            }
            _ if expect_operator_tags && !starts_numeric(token) => {
                if token == b"BI" {
                    let image = parse_inline_image(cursor, hex_unit_is_2bytes);
                    return Ok(Cropped::Value(PdfValue::Stream(image)));
                }
                PdfValue::OperatorTag(String::from_utf8_lossy(token).into_owned())
            }
            _ => {
                let value = lenient_real(token);
                trace!(
                    token = %String::from_utf8_lossy(token),
                    value,
                    "lenient numeric fallback"
                );
                PdfValue::Real(value)
            }
        };
        return Ok(Cropped::Value(value));
    }
}

/// Match `<int> <int> R` within the next 16 bytes without consuming
/// anything on a mismatch.
fn match_reference(cursor: &mut ByteCursor<'_>) -> Option<ObjId> {
    let window = cursor.peek_n(16);
    let num_end = skip_digits(window, 0)?;
    let gen_start = skip_spaces(window, num_end)?;
    let gen_end = skip_digits(window, gen_start)?;
    let r_pos = skip_spaces(window, gen_end)?;
    if window.get(r_pos) != Some(&b'R') {
        return None;
    }
    let after = r_pos + 1;
    if let Some(next) = cursor.peek_at(after) {
        if !is_whitespace(next) && !is_delimiter(next) {
            return None;
        }
    }

    let num = std::str::from_utf8(&window[..num_end]).ok()?.parse().ok()?;
    let generation = std::str::from_utf8(&window[gen_start..gen_end])
        .ok()?
        .parse()
        .ok()?;
    cursor.advance(after);
    Some(ObjId::new(num, generation))
}

/// Index after a non-empty run of ASCII digits starting at `from`.
fn skip_digits(window: &[u8], from: usize) -> Option<usize> {
    let len = window[from.min(window.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    (len > 0).then_some(from + len)
}

/// Index after a non-empty run of whitespace starting at `from`.
fn skip_spaces(window: &[u8], from: usize) -> Option<usize> {
    let len = window[from.min(window.len())..]
        .iter()
        .take_while(|&&b| is_whitespace(b))
        .count();
    (len > 0).then_some(from + len)
}

fn strip_sign(token: &[u8]) -> &[u8] {
    match token.first() {
        Some(b'-' | b'+') => &token[1..],
        _ => token,
    }
}

/// `[+-]?\d+`
fn is_integer(token: &[u8]) -> bool {
    let digits = strip_sign(token);
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// `[+-]?\d*\.\d+`
fn is_real(token: &[u8]) -> bool {
    let body = strip_sign(token);
    match body.iter().position(|&b| b == b'.') {
        Some(dot) => {
            let (int_part, frac) = (&body[..dot], &body[dot + 1..]);
            int_part.iter().all(u8::is_ascii_digit)
                && !frac.is_empty()
                && frac.iter().all(u8::is_ascii_digit)
        }
        None => false,
    }
}

fn starts_numeric(token: &[u8]) -> bool {
    matches!(token.first(), Some(b'0'..=b'9' | b'+' | b'-' | b'.'))
}

/// Best-effort numeric value: the longest parseable numeric prefix, else 0.
fn lenient_real(token: &[u8]) -> f64 {
    let prefix_len = token
        .iter()
        .take_while(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.'))
        .count();
    let text = String::from_utf8_lossy(&token[..prefix_len]);
    (1..=text.len())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse dictionary entries after `<<` up to the matching `>>`.
fn parse_dictionary(
    cursor: &mut ByteCursor<'_>,
    hex_unit_is_2bytes: bool,
) -> Result<PdfDict, BackendError> {
    let start = cursor.position();
    let unterminated =
        || BackendError::Parse(format!("unterminated dictionary at offset {start}"));

    let mut dict = PdfDict::new();
    loop {
        let key = match crop(cursor, false, hex_unit_is_2bytes)? {
            Cropped::DictEnd => return Ok(dict),
            Cropped::Eof | Cropped::Keyword => return Err(unterminated()),
            Cropped::ArrayEnd => continue,
            Cropped::Value(PdfValue::Name(key)) => key,
            Cropped::Value(other) => {
                trace!(kind = other.kind(), "ignoring non-name dictionary key");
                continue;
            }
        };
        match crop(cursor, false, hex_unit_is_2bytes)? {
            Cropped::Value(value) => {
                dict.insert(key, value);
            }
            Cropped::DictEnd => {
                dict.insert(key, PdfValue::Null);
                return Ok(dict);
            }
            Cropped::ArrayEnd => {
                dict.insert(key, PdfValue::Null);
            }
            Cropped::Eof | Cropped::Keyword => return Err(unterminated()),
        }
    }
}

/// Parse array elements after `[` up to the matching `]`.
///
/// An array cut short by end of input or a structural keyword keeps the
/// elements read so far.
fn parse_array(
    cursor: &mut ByteCursor<'_>,
    hex_unit_is_2bytes: bool,
) -> Result<Vec<PdfValue>, BackendError> {
    let mut items = Vec::new();
    loop {
        match crop(cursor, false, hex_unit_is_2bytes)? {
            Cropped::ArrayEnd => return Ok(items),
            Cropped::Eof | Cropped::Keyword => {
                trace!(len = items.len(), "unterminated array");
                return Ok(items);
            }
            Cropped::DictEnd => continue,
            Cropped::Value(value) => items.push(value),
        }
    }
}

/// Parse a literal string `(...)` with balanced parentheses and escape sequences.
///
/// Octal escapes keep the low eight bits (`\777` is `0xFF`). An unterminated
/// string returns what was read.
fn parse_literal_string(cursor: &mut ByteCursor<'_>) -> Vec<u8> {
    cursor.advance(1); // skip opening '('

    let mut result = Vec::new();
    let mut depth = 1u32;

    while let Some(b) = cursor.read() {
        match b {
            b'(' => {
                depth += 1;
                result.push(b'(');
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return result;
                }
                result.push(b')');
            }
            b'\\' => {
                let Some(escaped) = cursor.read() else {
                    break;
                };
                match escaped {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(0x08),
                    b'f' => result.push(0x0C),
                    b'\r' => {
                        // Backslash + CR (or CR+LF) = line continuation
                        if cursor.peek() == Some(b'\n') {
                            cursor.advance(1);
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = u16::from(escaped - b'0');
                        for _ in 0..2 {
                            match cursor.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    cursor.advance(1);
                                    val = val * 8 + u16::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((val & 0xFF) as u8);
                    }
                    // `\(`, `\)`, `\\` and unknown escapes keep the character
                    _ => result.push(escaped),
                }
            }
            _ => result.push(b),
        }
    }

    trace!(len = result.len(), "unterminated literal string");
    result
}

/// Parse a hex string `<...>`.
///
/// Whitespace and comments between digits are skipped, invalid digits are
/// dropped and an odd digit count is padded with `0`. When whitespace splits
/// the digits into equal groups of 4 or 8, that grouping sets the code width.
fn parse_hex_string(cursor: &mut ByteCursor<'_>, hex_unit_is_2bytes: bool) -> HexString {
    cursor.advance(1); // skip '<'

    let mut nibbles = Vec::new();
    let mut groups = Vec::new();
    let mut group_len = 0usize;
    let mut pending_space = false;
    let mut has_internal_space = false;

    while let Some(b) = cursor.read() {
        match b {
            b'>' => break,
            b'%' => {
                while let Some(c) = cursor.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    cursor.advance(1);
                }
                pending_space |= group_len > 0;
            }
            _ if is_whitespace(b) => pending_space |= group_len > 0,
            _ => match hex_digit(b) {
                Some(v) => {
                    if pending_space {
                        has_internal_space = true;
                        groups.push(group_len);
                        group_len = 0;
                        pending_space = false;
                    }
                    nibbles.push(v);
                    group_len += 1;
                }
                None => trace!(byte = b, "skipping invalid hex digit"),
            },
        }
    }
    if group_len > 0 {
        groups.push(group_len);
    }

    if nibbles.len() % 2 != 0 {
        nibbles.push(0);
    }
    let bytes = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();

    let uniform = |n: usize| has_internal_space && groups.iter().all(|&g| g == n);
    let unit_width = if uniform(8) {
        CodeWidth::Four
    } else if uniform(4) || hex_unit_is_2bytes {
        CodeWidth::Two
    } else {
        CodeWidth::One
    };

    HexString {
        bytes,
        unit_width,
        has_internal_space,
    }
}

/// Convert a hex digit character to its value (0-15).
fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parse a `/Name` token. Assumes current byte is `/`.
fn parse_name(cursor: &mut ByteCursor<'_>) -> String {
    cursor.advance(1); // skip '/'
    let raw = cursor.read_regular();

    // Handle #XX hex escapes in names
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) {
                name.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        name.push(raw[i]);
        i += 1;
    }

    String::from_utf8_lossy(&name).into_owned()
}

/// Parse inline image data after the `BI` keyword: `<entries> ID <data> EI`.
///
/// The payload is copied byte for byte up to an `EI` that stands alone
/// between whitespace, never tokenized.
fn parse_inline_image(cursor: &mut ByteCursor<'_>, hex_unit_is_2bytes: bool) -> PdfStream {
    let mut entries = Vec::new();
    loop {
        match crop(cursor, true, hex_unit_is_2bytes) {
            Ok(Cropped::Value(PdfValue::OperatorTag(tag))) if tag == "ID" => break,
            Ok(Cropped::Value(value)) => entries.push(value),
            Ok(Cropped::Eof) | Err(_) => {
                return PdfStream::new(pairs_to_dict(entries), Vec::new());
            }
            Ok(_) => {}
        }
    }

    // A single whitespace byte separates ID from the data
    if cursor.peek().is_some_and(is_whitespace) {
        cursor.advance(1);
    }

    let data = cursor.data();
    let data_start = cursor.position();
    let mut end = data.len();
    let mut resume = data.len();
    let mut i = data_start;
    while i + 1 < data.len() {
        if &data[i..i + 2] == b"EI"
            && (i == data_start || is_whitespace(data[i - 1]))
            && data
                .get(i + 2)
                .is_none_or(|&b| is_whitespace(b) || is_delimiter(b))
        {
            end = if i > data_start && is_whitespace(data[i - 1]) {
                i - 1
            } else {
                i
            };
            resume = i + 2;
            break;
        }
        i += 1;
    }

    let raw = data[data_start..end].to_vec();
    cursor.set_position(resume);
    PdfStream::new(pairs_to_dict(entries), raw)
}

fn pairs_to_dict(entries: Vec<PdfValue>) -> PdfDict {
    let mut dict = PdfDict::new();
    let mut iter = entries.into_iter();
    while let Some(key) = iter.next() {
        let value = iter.next().unwrap_or(PdfValue::Null);
        if let PdfValue::Name(key) = key {
            dict.insert(key, value);
        }
    }
    dict
}

/// Read a stream body; the cursor sits just past the `stream` line break.
///
/// A direct `/Length` is trusted when `endstream` follows it. Otherwise lines
/// are copied until one that is, or ends with, `endstream`: a non-empty
/// prefix on that line belongs to the body as is, while a bare `endstream`
/// line means the preceding line terminator is dropped (two bytes for CRLF,
/// one for LF or CR).
fn read_stream_body(cursor: &mut ByteCursor<'_>, dict: &PdfDict) -> Vec<u8> {
    let start = cursor.position();
    if let Some(len) = dict
        .get("Length")
        .and_then(PdfValue::as_i64)
        .and_then(|l| usize::try_from(l).ok())
    {
        let end = start.saturating_add(len);
        if end <= cursor.len() {
            let mut lookahead = cursor.clone();
            lookahead.set_position(end);
            lookahead.skip_space_or_eof();
            if lookahead.starts_with(b"endstream") {
                let raw = cursor.data()[start..end].to_vec();
                lookahead.advance(b"endstream".len());
                *cursor = lookahead;
                return raw;
            }
        }
        trace!(len, offset = start, "stream /Length does not reach endstream");
    }

    let mut raw = Vec::new();
    while let Some(line) = cursor.read_line() {
        let content = trim_eol(line).trim_ascii_end();
        if let Some(prefix) = content.strip_suffix(b"endstream") {
            if prefix.is_empty() {
                if raw.ends_with(b"\r\n") {
                    raw.truncate(raw.len() - 2);
                } else if raw.ends_with(b"\n") || raw.ends_with(b"\r") {
                    raw.truncate(raw.len() - 1);
                }
            } else {
                raw.extend_from_slice(prefix);
            }
            return raw;
        }
        raw.extend_from_slice(line);
    }
    trace!(offset = start, "stream without endstream");
    raw
}
