//! Text state for the content stream interpreter.
//!
//! Tracks the text object (BT/ET), the font selection (Tf), the spacing
//! parameters and the text and line matrices moved by Tm, Td, TD and T*.

use std::sync::Arc;

use pdfwords_core::Matrix;

use crate::font::PdfFont;

/// Text rendering mode (Tr operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderMode {
    /// Mode for a `Tr` operand; `None` outside 0..=7.
    pub fn from_i64(value: i64) -> Option<Self> {
        Some(match value {
            0 => Self::Fill,
            1 => Self::Stroke,
            2 => Self::FillStroke,
            3 => Self::Invisible,
            4 => Self::FillClip,
            5 => Self::StrokeClip,
            6 => Self::FillStrokeClip,
            7 => Self::Clip,
            _ => return None,
        })
    }
}

/// Text parameters that belong to the graphics state and follow q/Q.
///
/// The text and line matrices are not part of it.
#[derive(Debug, Clone)]
pub struct TextStateSnapshot {
    pub char_spacing: f64,
    pub word_spacing: f64,
    pub h_scaling: f64,
    pub leading: f64,
    pub font_name: String,
    pub font_size: f64,
    pub font: Option<Arc<PdfFont>>,
    pub render_mode: TextRenderMode,
    pub rise: f64,
}

/// Text state of one content stream.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Tc: extra space after every glyph.
    pub char_spacing: f64,
    /// Tw: extra space after each single-byte code 32.
    pub word_spacing: f64,
    /// Tz, as a percentage.
    pub h_scaling: f64,
    /// TL
    pub leading: f64,
    /// Resource name selected by Tf.
    pub font_name: String,
    /// Nominal size selected by Tf.
    pub font_size: f64,
    /// Font selected by Tf; `None` when the resource was missing.
    pub font: Option<Arc<PdfFont>>,
    pub render_mode: TextRenderMode,
    /// Ts
    pub rise: f64,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

impl TextState {
    pub fn new() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            font: None,
            render_mode: TextRenderMode::default(),
            rise: 0.0,
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
        }
    }

    pub fn text_matrix(&self) -> &Matrix {
        &self.text_matrix
    }

    pub fn line_matrix(&self) -> &Matrix {
        &self.line_matrix
    }

    /// Horizontal scaling as a fraction (1.0 = 100%).
    pub fn h_scale(&self) -> f64 {
        self.h_scaling / 100.0
    }

    /// `BT`: reset both matrices. The cm list is left alone.
    pub fn begin_text(&mut self) {
        self.text_matrix = Matrix::identity();
        self.line_matrix = Matrix::identity();
    }

    /// `Tf`
    pub fn set_font(&mut self, font_name: String, font_size: f64, font: Option<Arc<PdfFont>>) {
        self.font_name = font_name;
        self.font_size = font_size;
        self.font = font;
    }

    /// `Tm`: replace the text and line matrices.
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: offset from the start of the current line.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: like `Td`, and the leading becomes `-ty`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        self.move_text_position(0.0, -self.leading);
    }

    /// Move the caret along the baseline by `tx` text space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translation(tx, 0.0).concat(&self.text_matrix);
    }

    pub fn save_snapshot(&self) -> TextStateSnapshot {
        TextStateSnapshot {
            char_spacing: self.char_spacing,
            word_spacing: self.word_spacing,
            h_scaling: self.h_scaling,
            leading: self.leading,
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            font: self.font.clone(),
            render_mode: self.render_mode,
            rise: self.rise,
        }
    }

    pub fn restore_snapshot(&mut self, snapshot: TextStateSnapshot) {
        self.char_spacing = snapshot.char_spacing;
        self.word_spacing = snapshot.word_spacing;
        self.h_scaling = snapshot.h_scaling;
        self.leading = snapshot.leading;
        self.font_name = snapshot.font_name;
        self.font_size = snapshot.font_size;
        self.font = snapshot.font;
        self.render_mode = snapshot.render_mode;
        self.rise = snapshot.rise;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_matrix_approx(m: &Matrix, expected: [f64; 6]) {
        for (actual, expected) in m.to_array().into_iter().zip(expected) {
            assert_approx(actual, expected);
        }
    }

    #[test]
    fn render_mode_range() {
        assert_eq!(TextRenderMode::from_i64(3), Some(TextRenderMode::Invisible));
        assert_eq!(TextRenderMode::from_i64(7), Some(TextRenderMode::Clip));
        assert_eq!(TextRenderMode::from_i64(8), None);
        assert_eq!(TextRenderMode::from_i64(-1), None);
    }

    #[test]
    fn defaults() {
        let ts = TextState::new();
        assert_approx(ts.h_scale(), 1.0);
        assert_eq!(ts.font_name, "");
        assert_matrix_approx(ts.text_matrix(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn begin_text_resets_matrices() {
        let mut ts = TextState::new();
        ts.set_text_matrix(Matrix::new(2.0, 0.0, 0.0, 2.0, 50.0, 60.0));
        ts.begin_text();
        assert_matrix_approx(ts.text_matrix(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_matrix_approx(ts.line_matrix(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn td_is_relative_to_line_start() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(100.0, 700.0);
        ts.advance(30.0);
        ts.move_text_position(0.0, -14.0);
        assert_matrix_approx(ts.text_matrix(), [1.0, 0.0, 0.0, 1.0, 100.0, 686.0]);
    }

    #[test]
    fn td_scales_with_text_matrix() {
        let mut ts = TextState::new();
        ts.set_text_matrix(Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0));
        ts.move_text_position(5.0, 5.0);
        assert_matrix_approx(ts.text_matrix(), [2.0, 0.0, 0.0, 2.0, 20.0, 20.0]);
    }

    #[test]
    fn capital_td_sets_leading_for_t_star() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position_and_set_leading(0.0, -12.0);
        assert_approx(ts.leading, 12.0);
        ts.move_to_next_line();
        assert_matrix_approx(ts.text_matrix(), [1.0, 0.0, 0.0, 1.0, 0.0, -24.0]);
    }

    #[test]
    fn advance_moves_text_matrix_only() {
        let mut ts = TextState::new();
        ts.set_text_matrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 72.0, 700.0));
        ts.advance(12.5);
        assert_matrix_approx(ts.text_matrix(), [1.0, 0.0, 0.0, 1.0, 84.5, 700.0]);
        assert_matrix_approx(ts.line_matrix(), [1.0, 0.0, 0.0, 1.0, 72.0, 700.0]);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut ts = TextState::new();
        ts.set_font("F1".to_string(), 12.0, None);
        ts.char_spacing = 0.5;
        let saved = ts.save_snapshot();
        ts.set_font("F2".to_string(), 8.0, None);
        ts.char_spacing = 0.0;
        ts.rise = 3.0;
        ts.restore_snapshot(saved);
        assert_eq!(ts.font_name, "F1");
        assert_approx(ts.font_size, 12.0);
        assert_approx(ts.char_spacing, 0.5);
        assert_approx(ts.rise, 0.0);
    }
}
