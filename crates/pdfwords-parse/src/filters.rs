//! Stream filter decoding.
//!
//! Supports the filters that carry text and object data: Flate, LZW,
//! ASCII85, ASCIIHex and RunLength, with PNG and TIFF predictors.
//! Image-only codecs are reported as unsupported.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use pdfwords_core::PdfError;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::object::{PdfDict, PdfStream, PdfValue};
use crate::object_table::ObjectTable;
use crate::resolver::dereference;

/// A stream filter named in a `/Filter` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Flate,
    Lzw,
    Ascii85,
    AsciiHex,
    RunLength,
    /// Identity when no security handler is involved.
    Crypt,
    /// Image codecs (DCT, JPX, CCITT, JBIG2).
    Image(String),
}

impl Filter {
    /// Parse a filter name, accepting the inline-image abbreviations.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "FlateDecode" | "Fl" => Self::Flate,
            "LZWDecode" | "LZW" => Self::Lzw,
            "ASCII85Decode" | "A85" => Self::Ascii85,
            "ASCIIHexDecode" | "AHx" => Self::AsciiHex,
            "RunLengthDecode" | "RL" => Self::RunLength,
            "Crypt" => Self::Crypt,
            "DCTDecode" | "DCT" | "JPXDecode" | "CCITTFaxDecode" | "CCF" | "JBIG2Decode" => {
                Self::Image(name.to_string())
            }
            _ => return None,
        })
    }
}

/// Entries of a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
    pub early_change: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

impl DecodeParams {
    fn from_dict(dict: &PdfDict, table: &ObjectTable) -> Self {
        let int = |key: &str| {
            dict.get(key)
                .and_then(|v| dereference(v, table).as_i64())
        };
        let positive = |key: &str, default: usize| {
            int(key)
                .filter(|v| *v > 0)
                .map(|v| v as usize)
                .unwrap_or(default)
        };
        let defaults = Self::default();
        Self {
            predictor: int("Predictor").unwrap_or(defaults.predictor),
            colors: positive("Colors", defaults.colors),
            bits_per_component: positive("BitsPerComponent", defaults.bits_per_component),
            columns: positive("Columns", defaults.columns),
            early_change: int("EarlyChange").map(|v| v != 0).unwrap_or(true),
        }
    }
}

/// Decode a stream's raw bytes through its filter chain.
pub fn decode_stream(
    stream: &PdfStream,
    table: &ObjectTable,
    max_bytes: usize,
) -> Result<Vec<u8>, BackendError> {
    decode(&stream.raw, &stream.dict, table, max_bytes)
}

/// Decode `raw` through the filters named in `dict`.
///
/// `/Filter` may be a single name or an array applied in order, with
/// `/DecodeParms` aligned by position. The abbreviated `/F` and `/DP`
/// keys of inline images are accepted as well.
pub fn decode(
    raw: &[u8],
    dict: &PdfDict,
    table: &ObjectTable,
    max_bytes: usize,
) -> Result<Vec<u8>, BackendError> {
    let chain = filter_chain(dict, table)?;
    if chain.is_empty() {
        check_limit(raw.len(), max_bytes)?;
        return Ok(raw.to_vec());
    }

    let mut data = raw.to_vec();
    for (filter, params) in chain {
        data = apply(&filter, &data, &params, max_bytes)?;
        check_limit(data.len(), max_bytes)?;
    }
    Ok(data)
}

fn filter_chain(
    dict: &PdfDict,
    table: &ObjectTable,
) -> Result<Vec<(Filter, DecodeParams)>, BackendError> {
    let Some(entry) = dict.get("Filter").or_else(|| dict.get("F")) else {
        return Ok(Vec::new());
    };
    let names: Vec<&PdfValue> = match dereference(entry, table) {
        PdfValue::Array(items) => items.iter().map(|v| dereference(v, table)).collect(),
        PdfValue::Null => Vec::new(),
        other => vec![other],
    };

    let params_entry = dict
        .get("DecodeParms")
        .or_else(|| dict.get("DP"))
        .map(|v| dereference(v, table));
    let params_at = |i: usize| -> DecodeParams {
        let value = match params_entry {
            Some(PdfValue::Array(items)) => items.get(i).map(|v| dereference(v, table)),
            Some(other) if i == 0 => Some(other),
            _ => None,
        };
        match value {
            Some(PdfValue::Dict(d)) => DecodeParams::from_dict(d, table),
            _ => DecodeParams::default(),
        }
    };

    names
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let name = value
                .as_name()
                .ok_or_else(|| BackendError::Filter(format!("filter is not a name: {value}")))?;
            let filter = Filter::from_name(name)
                .ok_or_else(|| BackendError::Filter(format!("unknown filter /{name}")))?;
            Ok((filter, params_at(i)))
        })
        .collect()
}

fn apply(
    filter: &Filter,
    data: &[u8],
    params: &DecodeParams,
    max_bytes: usize,
) -> Result<Vec<u8>, BackendError> {
    match filter {
        Filter::Flate => {
            let decoded = decode_flate(data, max_bytes)?;
            apply_predictor(decoded, params)
        }
        Filter::Lzw => {
            let decoded = decode_lzw(data, params.early_change)?;
            apply_predictor(decoded, params)
        }
        Filter::Ascii85 => decode_ascii85(data),
        Filter::AsciiHex => Ok(decode_ascii_hex(data)),
        Filter::RunLength => Ok(decode_run_length(data)),
        Filter::Crypt => Ok(data.to_vec()),
        Filter::Image(name) => Err(BackendError::Filter(format!(
            "unsupported image filter /{name}"
        ))),
    }
}

fn check_limit(len: usize, max_bytes: usize) -> Result<(), BackendError> {
    if len > max_bytes {
        return Err(PdfError::ResourceLimitExceeded {
            limit_name: "max_stream_bytes".to_string(),
            limit_value: max_bytes,
            actual_value: len,
        }
        .into());
    }
    Ok(())
}

/// Inflate zlib data, retrying as raw deflate when the header is damaged.
///
/// Truncated streams yield whatever was decoded before the error.
pub fn decode_flate(data: &[u8], max_bytes: usize) -> Result<Vec<u8>, BackendError> {
    let limit = max_bytes.saturating_add(1) as u64;

    let mut out = Vec::new();
    let zlib_err = match ZlibDecoder::new(data).take(limit).read_to_end(&mut out) {
        Ok(_) => return Ok(out),
        Err(e) => e,
    };
    if !out.is_empty() {
        warn!(error = %zlib_err, decoded = out.len(), "truncated flate stream");
        return Ok(out);
    }

    let mut raw = Vec::new();
    match DeflateDecoder::new(data).take(limit).read_to_end(&mut raw) {
        Ok(_) => {
            debug!("flate stream decoded as raw deflate");
            Ok(raw)
        }
        Err(_) if !raw.is_empty() => Ok(raw),
        Err(_) => Err(BackendError::Filter(format!(
            "FlateDecode failed: {zlib_err}"
        ))),
    }
}

/// Decode LZW data. `early_change` selects the code-width switch used by
/// most PDF producers.
pub fn decode_lzw(data: &[u8], early_change: bool) -> Result<Vec<u8>, BackendError> {
    let mut decoder = if early_change {
        weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
    } else {
        weezl::decode::Decoder::new(weezl::BitOrder::Msb, 8)
    };
    decoder
        .decode(data)
        .map_err(|e| BackendError::Filter(format!("LZWDecode failed: {e:?}")))
}

/// Decode ASCII base-85 data up to the `~>` marker.
pub fn decode_ascii85(data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut n = 0;

    for &b in data {
        match b {
            b'~' => break,
            b'z' if n == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[n] = b - b'!';
                n += 1;
                if n == 5 {
                    out.extend_from_slice(&ascii85_group(&group)?);
                    n = 0;
                }
            }
            b if crate::scanner::is_whitespace(b) => {}
            other => {
                return Err(BackendError::Filter(format!(
                    "invalid ASCII85 byte 0x{other:02X}"
                )));
            }
        }
    }

    if n > 1 {
        for slot in group.iter_mut().skip(n) {
            *slot = b'u' - b'!';
        }
        let bytes = ascii85_group(&group)?;
        out.extend_from_slice(&bytes[..n - 1]);
    }
    Ok(out)
}

fn ascii85_group(group: &[u8; 5]) -> Result<[u8; 4], BackendError> {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + u64::from(digit));
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| BackendError::Filter("ASCII85 group overflow".to_string()))
}

/// Decode hex digit pairs up to `>`. Non-hex bytes are skipped and an odd
/// final digit is padded with zero.
pub fn decode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;
    for &b in data {
        if b == b'>' {
            break;
        }
        let Some(nibble) = (b as char).to_digit(16) else {
            continue;
        };
        let nibble = nibble as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    out
}

/// Decode PackBits-style run-length data. Stops at the 128 marker.
pub fn decode_run_length(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;
    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let end = (i + length as usize + 1).min(data.len());
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            _ => {
                let Some(&b) = data.get(i) else {
                    break;
                };
                out.extend(std::iter::repeat_n(b, 257 - length as usize));
                i += 1;
            }
        }
    }
    out
}

fn apply_predictor(data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>, BackendError> {
    let bits = params.colors * params.bits_per_component;
    let bytes_per_pixel = bits.div_ceil(8).max(1);
    let bytes_per_row = (bits * params.columns).div_ceil(8).max(1);

    match params.predictor {
        1 => Ok(data),
        2 => Ok(tiff_predictor(&data, bytes_per_row, bytes_per_pixel)),
        10..=15 => png_predictor(&data, bytes_per_row, bytes_per_pixel),
        other => Err(BackendError::Filter(format!("unsupported predictor {other}"))),
    }
}

fn tiff_predictor(data: &[u8], bytes_per_row: usize, bytes_per_pixel: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for row in data.chunks(bytes_per_row) {
        let start = out.len();
        for (i, &b) in row.iter().enumerate() {
            let left = if i >= bytes_per_pixel {
                out[start + i - bytes_per_pixel]
            } else {
                0
            };
            out.push(b.wrapping_add(left));
        }
    }
    out
}

fn png_predictor(
    data: &[u8],
    bytes_per_row: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; bytes_per_row];
    let mut row = vec![0u8; bytes_per_row];

    for chunk in data.chunks(bytes_per_row + 1) {
        let (&kind, encoded) = match chunk.split_first() {
            Some(split) => split,
            None => continue,
        };
        row.fill(0);
        row[..encoded.len()].copy_from_slice(encoded);

        for i in 0..bytes_per_row {
            let left = if i >= bytes_per_pixel {
                row[i - bytes_per_pixel]
            } else {
                0
            };
            let up = prev[i];
            let up_left = if i >= bytes_per_pixel {
                prev[i - bytes_per_pixel]
            } else {
                0
            };
            let predicted = match kind {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(BackendError::Filter(format!(
                        "unknown PNG row filter {other}"
                    )));
                }
            };
            row[i] = row[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&row[..encoded.len()]);
        std::mem::swap(&mut prev, &mut row);
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
