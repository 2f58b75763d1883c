//! Content stream interpreter.
//!
//! Reads content stream operators with the object tokenizer, maintains the
//! graphics and text state and reports raw words to a [`ContentHandler`].
//! Form XObjects are replayed through the `Do` operator.
//!
//! A raw word is a run of non-space glyphs that ends at a space glyph, at
//! an implicit space (a wide `TJ` adjustment or large character spacing),
//! at any operator that moves the caret or changes the font, or at the end
//! of the stream. Its box spans the device positions of the glyph corners,
//! from the font descent up to the cap height.

use std::sync::Arc;

use pdfwords_core::{
    ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode, Matrix, PWord, Rect,
    WordAssembler, WordSplitter, normalize_words,
};
use tracing::{debug, trace, warn};

use crate::filters::decode_stream;
use crate::font::{FontCache, FontResolver, PageFonts, PdfFont};
use crate::handler::{ContentHandler, WordCollector};
use crate::interpreter_state::InterpreterState;
use crate::object::{PdfDict, PdfValue};
use crate::object_table::ObjectTable;
use crate::resolver::dereference;
use crate::scanner::ByteCursor;
use crate::text_state::{TextRenderMode, TextState};
use crate::tokenizer::crop_next;

/// Operators that are valid PDF but carry nothing for text extraction.
const IGNORED_OPERATORS: &[&str] = &[
    // graphics state
    "w", "J", "j", "M", "d", "ri", "i", "gs",
    // path construction and painting
    "m", "l", "c", "v", "y", "h", "re", "S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n",
    "W", "W*",
    // color
    "CS", "cs", "SC", "SCN", "sc", "scn", "G", "g", "RG", "rg", "K", "k",
    // shading, marked content, compatibility, Type3 glyphs
    "sh", "BMC", "BDC", "EMC", "MP", "DP", "BX", "EX", "d0", "d1",
    // stray inline image keywords
    "ID", "EI",
];

/// The glyph run being collected.
#[derive(Debug, Default)]
struct WordRun {
    text: String,
    bbox: Option<Rect>,
    font: Option<Arc<PdfFont>>,
    resource_name: String,
    font_size_px: i32,
}

impl WordRun {
    fn push(&mut self, text: &str, glyph_box: Rect, tstate: &TextState, font: &Arc<PdfFont>, size_px: i32) {
        if self.font.is_none() {
            self.font = Some(Arc::clone(font));
            self.resource_name = tstate.font_name.clone();
            self.font_size_px = size_px;
        }
        self.text.push_str(text);
        self.bbox = Some(match self.bbox {
            Some(bbox) => bbox.union(&glyph_box),
            None => glyph_box,
        });
    }

    /// Report the run, if it has any text, and start a new one.
    fn flush(&mut self, handler: &mut dyn ContentHandler) {
        let run = std::mem::take(self);
        let (Some(font), Some(bbox)) = (run.font, run.bbox) else {
            return;
        };
        if run.text.is_empty() {
            return;
        }
        handler.on_word(PWord {
            text: run.text,
            bbox,
            font_size_px: run.font_size_px,
            bold: font.bold,
            italic: font.italic,
            font: font.font_ref(&run.resource_name),
        });
    }
}

/// Text matrix scale × every `cm` scale × nominal size.
fn effective_font_size(gstate: &InterpreterState, tstate: &TextState) -> f64 {
    tstate.text_matrix().scale_factor() * gstate.cm_scale() * tstate.font_size
}

fn get_f64(operands: &[PdfValue], index: usize) -> Option<f64> {
    operands.get(index).and_then(PdfValue::as_f64)
}

fn warn_at(
    handler: &mut dyn ContentHandler,
    code: ExtractWarningCode,
    description: String,
    op_index: usize,
) {
    let mut warning = ExtractWarning::with_code(code, description);
    warning.operator_index = Some(op_index);
    handler.on_warning(warning);
}

/// Interpret a content stream and report raw words to the handler.
///
/// Never fails: malformed syntax ends the stream early and every other
/// problem is reported through [`ContentHandler::on_warning`].
///
/// # Arguments
///
/// * `table` - The object table (for resolving references)
/// * `stream_bytes` - Decoded content stream bytes
/// * `resources` - Resources dictionary for this scope
/// * `fonts` - Font lookup for `Tf`
/// * `handler` - Word and warning callback
/// * `options` - Resource limits and settings
/// * `depth` - Form XObject nesting depth (0 for page level)
/// * `gstate` - Current transformation list and q/Q stack
/// * `tstate` - Current text state
#[allow(clippy::too_many_arguments)]
pub fn interpret_content_stream(
    table: &ObjectTable,
    stream_bytes: &[u8],
    resources: &PdfDict,
    fonts: &mut dyn FontResolver,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    depth: usize,
    gstate: &mut InterpreterState,
    tstate: &mut TextState,
) {
    let mut cursor = ByteCursor::new(stream_bytes);
    let mut operands: Vec<PdfValue> = Vec::new();
    let mut run = WordRun::default();
    let mut effective_size = effective_font_size(gstate, tstate);
    // q/Q below this depth belong to the caller
    let floor = gstate.stack_depth();
    let mut op_index = 0usize;

    loop {
        let value = match crop_next(&mut cursor, true, false) {
            Ok(Some(value)) => value,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, offset = cursor.position(), "content stream ends in malformed syntax");
                warn_at(
                    handler,
                    ExtractWarningCode::MalformedObject,
                    format!("malformed content stream syntax: {e}"),
                    op_index,
                );
                break;
            }
        };
        let op = match value {
            PdfValue::OperatorTag(op) => op,
            // inline image data
            PdfValue::Stream(_) => continue,
            other => {
                operands.push(other);
                continue;
            }
        };

        match op.as_str() {
            "q" => gstate.save_state_with_text(tstate.save_snapshot()),
            "Q" => {
                if gstate.stack_depth() > floor {
                    run.flush(handler);
                    if let Some(snapshot) = gstate.restore_state_with_text() {
                        tstate.restore_snapshot(snapshot);
                    }
                    effective_size = effective_font_size(gstate, tstate);
                } else {
                    trace!(op_index, "ignoring unbalanced Q");
                }
            }
            "cm" => {
                let values: Vec<f64> = operands.iter().filter_map(PdfValue::as_f64).collect();
                if let Some(m) = Matrix::from_slice(&values) {
                    run.flush(handler);
                    gstate.concat_matrix(m);
                    effective_size = effective_font_size(gstate, tstate);
                }
            }

            "BT" => {
                run.flush(handler);
                tstate.begin_text();
                effective_size = effective_font_size(gstate, tstate);
            }
            "ET" => run.flush(handler),
            "Tf" => {
                if let (Some(name), Some(size)) = (
                    operands.first().and_then(PdfValue::as_name),
                    get_f64(&operands, 1),
                ) {
                    run.flush(handler);
                    let font = lookup_font(table, resources, fonts, name);
                    if font.is_none() {
                        warn!(font = name, "font resource not found");
                        let mut warning = ExtractWarning::with_code(
                            ExtractWarningCode::MissingFont,
                            format!("font /{name} not found in resources"),
                        );
                        warning.operator_index = Some(op_index);
                        warning.font_name = Some(name.to_string());
                        handler.on_warning(warning);
                    }
                    tstate.set_font(name.to_string(), size, font);
                    effective_size = effective_font_size(gstate, tstate);
                }
            }
            "Tm" => {
                let values: Vec<f64> = operands.iter().filter_map(PdfValue::as_f64).collect();
                if let Some(m) = Matrix::from_slice(&values) {
                    run.flush(handler);
                    tstate.set_text_matrix(m);
                    effective_size = effective_font_size(gstate, tstate);
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (get_f64(&operands, 0), get_f64(&operands, 1)) {
                    run.flush(handler);
                    if op == "TD" {
                        tstate.move_text_position_and_set_leading(tx, ty);
                    } else {
                        tstate.move_text_position(tx, ty);
                    }
                }
            }
            "T*" => {
                run.flush(handler);
                tstate.move_to_next_line();
            }
            "Tc" => {
                if let Some(v) = get_f64(&operands, 0) {
                    tstate.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = get_f64(&operands, 0) {
                    tstate.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = get_f64(&operands, 0) {
                    tstate.h_scaling = v;
                }
            }
            "TL" => {
                if let Some(v) = get_f64(&operands, 0) {
                    tstate.leading = v;
                }
            }
            "Tr" => {
                if let Some(mode) = operands
                    .first()
                    .and_then(PdfValue::as_i64)
                    .and_then(TextRenderMode::from_i64)
                {
                    tstate.render_mode = mode;
                }
            }
            "Ts" => {
                if let Some(v) = get_f64(&operands, 0) {
                    tstate.rise = v;
                }
            }

            "Tj" => {
                if let Some(string) = operands.last() {
                    show_string(string, &mut run, gstate, tstate, handler, options, effective_size);
                }
            }
            "'" => {
                run.flush(handler);
                tstate.move_to_next_line();
                if let Some(string) = operands.last() {
                    show_string(string, &mut run, gstate, tstate, handler, options, effective_size);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    run.flush(handler);
                    if let Some(aw) = get_f64(&operands, 0) {
                        tstate.word_spacing = aw;
                    }
                    if let Some(ac) = get_f64(&operands, 1) {
                        tstate.char_spacing = ac;
                    }
                    tstate.move_to_next_line();
                    show_string(
                        &operands[2],
                        &mut run,
                        gstate,
                        tstate,
                        handler,
                        options,
                        effective_size,
                    );
                }
            }
            "TJ" => {
                if let Some(items) = operands.last().and_then(PdfValue::as_array) {
                    for item in items {
                        match item {
                            PdfValue::LiteralString(_) | PdfValue::HexString(_) => show_string(
                                item,
                                &mut run,
                                gstate,
                                tstate,
                                handler,
                                options,
                                effective_size,
                            ),
                            other => {
                                if let Some(adjust) = other.as_f64() {
                                    apply_adjustment(adjust, &mut run, tstate, handler, options);
                                }
                            }
                        }
                    }
                }
            }

            "Do" => {
                if let Some(name) = operands.first().and_then(PdfValue::as_name) {
                    run.flush(handler);
                    handle_do(
                        table, resources, fonts, handler, options, depth, gstate, tstate, name,
                        op_index,
                    );
                }
            }

            known if IGNORED_OPERATORS.contains(&known) => {}
            unknown => {
                trace!(operator = unknown, op_index, "ignoring unknown operator");
                warn_at(
                    handler,
                    ExtractWarningCode::UnsupportedOperator,
                    format!("unknown operator {unknown}"),
                    op_index,
                );
            }
        }
        operands.clear();
        op_index += 1;
    }

    run.flush(handler);
}

/// Look up a `/Font` resource entry and resolve it.
fn lookup_font(
    table: &ObjectTable,
    resources: &PdfDict,
    fonts: &mut dyn FontResolver,
    name: &str,
) -> Option<Arc<PdfFont>> {
    let font_dict = resources
        .get("Font")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_dict)?;
    let entry = font_dict.get(name)?;
    fonts.resolve(name, entry)
}

/// Show one string operand, glyph by glyph. Non-string operands show
/// nothing.
fn show_string(
    string: &PdfValue,
    run: &mut WordRun,
    gstate: &InterpreterState,
    tstate: &mut TextState,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    effective_size: f64,
) {
    let Some(font) = tstate.font.clone() else {
        return;
    };
    let size = tstate.font_size;
    let h_scale = tstate.h_scale();
    let bottom = f64::from(font.descent()) * size + tstate.rise;
    let top = f64::from(font.cap_height()) * size + tstate.rise;
    let space_limit = options.tj_space_factor * f64::from(font.space_width()) * size.abs();
    let size_px = effective_size.round() as i32;

    for shown in font.shown_codes(string) {
        let code = shown.code;
        let w0 = f64::from(font.char_width(code));
        let is_space = shown.is_space;

        if is_space {
            run.flush(handler);
        } else {
            let glyph_w = w0 * size * h_scale;
            let tm = *tstate.text_matrix();
            let corners = [(0.0, bottom), (glyph_w, bottom), (0.0, top), (glyph_w, top)]
                .map(|(x, y)| gstate.to_device(&tm, x, y));
            if let Some(glyph_box) = Rect::from_points(corners) {
                run.push(&shown.text, glyph_box, tstate, &font, size_px);
            }
        }

        let mut tx = w0 * size + tstate.char_spacing;
        if font.is_word_space_code(code) {
            tx += tstate.word_spacing;
        }
        tstate.advance(tx * h_scale);

        if !is_space && tstate.char_spacing > space_limit {
            run.flush(handler);
        }
    }
}

/// Apply a numeric `TJ` element. A large enough move to the right ends the
/// current word.
fn apply_adjustment(
    adjust: f64,
    run: &mut WordRun,
    tstate: &mut TextState,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
) {
    let size = tstate.font_size;
    let tx = -adjust / 1000.0 * size;
    if let Some(font) = &tstate.font {
        let space_limit = options.tj_space_factor * f64::from(font.space_width()) * size.abs();
        if tx > space_limit {
            run.flush(handler);
        }
    }
    tstate.advance(tx * tstate.h_scale());
}

/// `Do`: replay a Form XObject. Images and unknown names are skipped.
#[allow(clippy::too_many_arguments)]
fn handle_do(
    table: &ObjectTable,
    resources: &PdfDict,
    fonts: &mut dyn FontResolver,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    depth: usize,
    gstate: &mut InterpreterState,
    tstate: &mut TextState,
    name: &str,
    op_index: usize,
) {
    let Some(stream) = resources
        .get("XObject")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_dict)
        .and_then(|xobjects| xobjects.get(name))
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_stream)
    else {
        trace!(xobject = name, "XObject not found");
        return;
    };
    let subtype = stream
        .dict
        .get("Subtype")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_name);
    if subtype != Some("Form") {
        return;
    }

    if depth + 1 > options.max_recursion_depth {
        warn!(xobject = name, depth, "form XObject nesting limit reached");
        warn_at(
            handler,
            ExtractWarningCode::ResourceLimitReached,
            format!(
                "form XObject /{name} exceeds nesting limit {}",
                options.max_recursion_depth
            ),
            op_index,
        );
        return;
    }

    let content = match decode_stream(stream, table, options.max_stream_bytes) {
        Ok(content) => content,
        Err(e) => {
            warn!(xobject = name, error = %e, "skipping undecodable form XObject");
            warn_at(
                handler,
                ExtractWarningCode::FilterFailure,
                format!("form XObject /{name}: {e}"),
                op_index,
            );
            return;
        }
    };
    let form_resources = stream
        .dict
        .get("Resources")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_dict)
        .unwrap_or(resources);
    let matrix = stream
        .dict
        .get("Matrix")
        .map(|v| dereference(v, table))
        .and_then(PdfValue::as_array)
        .and_then(|items| {
            let values: Vec<f64> = items.iter().filter_map(PdfValue::as_f64).collect();
            Matrix::from_slice(&values)
        });

    debug!(xobject = name, depth = depth + 1, bytes = content.len(), "entering form XObject");
    let saved_depth = gstate.stack_depth();
    gstate.save_state_with_text(tstate.save_snapshot());
    if let Some(m) = matrix {
        gstate.concat_matrix(m);
    }
    interpret_content_stream(
        table,
        &content,
        form_resources,
        fonts,
        handler,
        options,
        depth + 1,
        gstate,
        tstate,
    );
    while gstate.stack_depth() > saved_depth {
        if let Some(snapshot) = gstate.restore_state_with_text() {
            tstate.restore_snapshot(snapshot);
        }
    }
}

/// Interpret one content stream from a fresh state and return its raw,
/// unmerged words.
pub fn collect_raw_words(
    content: &[u8],
    resources: &PdfDict,
    table: &ObjectTable,
    fonts: &mut dyn FontResolver,
    options: &ExtractOptions,
) -> ExtractResult<Vec<PWord>> {
    let mut collector = WordCollector::new(options.collect_warnings);
    let mut gstate = InterpreterState::new();
    let mut tstate = TextState::new();
    interpret_content_stream(
        table,
        content,
        resources,
        fonts,
        &mut collector,
        options,
        0,
        &mut gstate,
        &mut tstate,
    );
    ExtractResult::with_warnings(collector.words, collector.warnings)
}

/// Words of one page content stream with default options.
///
/// Fonts are resolved on demand from `resources`. The raw words are merged
/// by the word assembler, consulting `tokenizer`, and normalized.
pub fn get_page_words<S>(
    content: &[u8],
    resources: &PdfDict,
    table: &ObjectTable,
    tokenizer: &S,
) -> Vec<PWord>
where
    S: WordSplitter + ?Sized,
{
    let options = ExtractOptions::default();
    let cache = FontCache::new();
    let mut fonts = PageFonts::new(&cache, table, options.max_stream_bytes);
    let raw = collect_raw_words(content, resources, table, &mut fonts, &options).value;
    let mut words = WordAssembler::default().assemble(raw, tokenizer);
    normalize_words(&mut words, options.unicode_norm);
    words
}
