use crate::accents;
use crate::geometry::Rect;
use crate::splitter::WordSplitter;

/// Identifies the font a word was drawn with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontRef {
    /// `/BaseFont` with any subset prefix removed (e.g. "Helvetica-Bold").
    pub base_name: String,
    /// Key under the page's `/Resources/Font` dictionary (e.g. "F1").
    pub resource_name: String,
    /// Object number and generation when the font is an indirect object.
    pub object_id: Option<(u32, u16)>,
    /// Whether the font's glyphs extend below the baseline.
    pub has_descent: bool,
}

/// A word extracted from a PDF page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PWord {
    /// The text content of this word.
    pub text: String,
    /// Bounding box in PDF user space.
    pub bbox: Rect,
    /// Effective font size after all transformations, rounded.
    pub font_size_px: i32,
    pub bold: bool,
    pub italic: bool,
    pub font: FontRef,
}

impl PWord {
    /// True when the box has positive width and height.
    pub fn has_valid_bbox(&self) -> bool {
        self.bbox.width() > 0.0 && self.bbox.height() > 0.0
    }
}

/// Tolerances for joining adjacent glyph runs.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Slack allowed when runs touch or overlap horizontally (default: 1.0).
    pub overlap_tolerance: f32,
    /// Fraction of an estimated space below which a gap is not a word break,
    /// used when the two pieces do not need a space between them (default: 0.67).
    pub narrow_space_factor: f32,
    /// Estimated space width as a fraction of the font size (default: 0.25).
    pub space_em: f32,
    /// Drop a word that repeats the previous one at the same position (default: true).
    ///
    /// Some producers fake bold text by drawing it twice.
    pub dedupe: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            overlap_tolerance: 1.0,
            narrow_space_factor: 0.67,
            space_em: 0.25,
            dedupe: true,
        }
    }
}

/// Merges raw glyph runs into final words.
#[derive(Debug, Clone, Default)]
pub struct WordAssembler {
    pub options: AssembleOptions,
}

impl WordAssembler {
    pub fn new(options: AssembleOptions) -> Self {
        Self { options }
    }

    /// Post-process raw words in emission order.
    ///
    /// Words with an empty box are dropped. Each remaining word is merged
    /// into the previous output word when the two share style, sit on the
    /// same line, are ordered left to right and the gap between them is
    /// small enough. A merge that would reduce the token count beyond the
    /// single join is rejected. A leading accent on the right word is fused
    /// with the last letter of the left word when Unicode has a precomposed
    /// form.
    pub fn assemble<S>(&self, raw: Vec<PWord>, splitter: &S) -> Vec<PWord>
    where
        S: WordSplitter + ?Sized,
    {
        let mut out: Vec<PWord> = Vec::with_capacity(raw.len());
        for word in raw {
            if !word.has_valid_bbox() {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if self.options.dedupe && is_duplicate(last, &word) {
                    continue;
                }
                if let Some(merged) = self.try_merge(last, &word, splitter) {
                    *last = merged;
                    continue;
                }
            }
            out.push(word);
        }
        out
    }

    fn try_merge<S>(&self, left: &PWord, right: &PWord, splitter: &S) -> Option<PWord>
    where
        S: WordSplitter + ?Sized,
    {
        let opts = &self.options;
        if left.bold != right.bold
            || left.italic != right.italic
            || left.font.has_descent != right.font.has_descent
        {
            return None;
        }

        let (l, r) = (&left.bbox, &right.bbox);
        if !l.contains_y(r.mid_y()) || !r.contains_y(l.mid_y()) {
            return None;
        }
        if l.right > r.right || l.right > r.left + opts.overlap_tolerance {
            return None;
        }

        let needs_space = splitter.needs_space(&left.text, &right.text);
        let tolerance = if needs_space {
            opts.overlap_tolerance
        } else {
            let space = opts.narrow_space_factor * opts.space_em * left.font_size_px as f32;
            opts.overlap_tolerance.max(space)
        };
        if r.left - l.right > tolerance {
            return None;
        }

        let joined = format!("{}{}", left.text, right.text);
        let separate = splitter.token_count(&left.text) + splitter.token_count(&right.text);
        if splitter.token_count(&joined) < separate.saturating_sub(usize::from(needs_space)) {
            return None;
        }

        Some(PWord {
            text: fuse_accent(&left.text, &right.text).unwrap_or(joined),
            bbox: l.union(r),
            font_size_px: left.font_size_px,
            bold: left.bold,
            italic: left.italic,
            font: left.font.clone(),
        })
    }
}

/// Join `left` and `right`, replacing the last letter of `left` and the
/// leading accent of `right` with their precomposed form.
fn fuse_accent(left: &str, right: &str) -> Option<String> {
    let mut right_chars = right.chars();
    let accent = right_chars.next()?;
    let base = left.chars().next_back()?;
    let fused = accents::fuse(base, accent)?;

    let mut text = String::with_capacity(left.len() + right.len());
    text.push_str(&left[..left.len() - base.len_utf8()]);
    text.push(fused);
    text.push_str(right_chars.as_str());
    Some(text)
}

fn is_duplicate(a: &PWord, b: &PWord) -> bool {
    const EPS: f32 = 0.5;
    a.text == b.text
        && (a.bbox.left - b.bbox.left).abs() <= EPS
        && (a.bbox.right - b.bbox.right).abs() <= EPS
        && (a.bbox.bottom - b.bbox.bottom).abs() <= EPS
        && (a.bbox.top - b.bbox.top).abs() <= EPS
}
