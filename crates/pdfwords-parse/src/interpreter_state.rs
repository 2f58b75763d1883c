//! Graphics state stack for the content stream interpreter.
//!
//! The current transformation is kept as the list of matrices given to
//! `cm`, newest first, rather than as one folded matrix. `q` saves the
//! whole list together with the text parameters and `Q` restores both.

use pdfwords_core::Matrix;

use crate::text_state::TextStateSnapshot;

#[derive(Debug, Clone)]
struct SavedState {
    cm: Vec<Matrix>,
    text: TextStateSnapshot,
}

/// Transformation list plus the q/Q stack.
#[derive(Debug, Clone, Default)]
pub struct InterpreterState {
    cm: Vec<Matrix>,
    stack: Vec<SavedState>,
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`
    pub fn save_state_with_text(&mut self, text: TextStateSnapshot) {
        self.stack.push(SavedState {
            cm: self.cm.clone(),
            text,
        });
    }

    /// `Q`. Returns `None` on an unbalanced restore, leaving the state as is.
    pub fn restore_state_with_text(&mut self) -> Option<TextStateSnapshot> {
        let saved = self.stack.pop()?;
        self.cm = saved.cm;
        Some(saved.text)
    }

    /// `cm`: the new matrix goes to the front of the list.
    pub fn concat_matrix(&mut self, m: Matrix) {
        self.cm.insert(0, m);
    }

    /// Map a text space point through `text_matrix` and then every `cm`
    /// matrix from the front of the list to the back.
    pub fn to_device(&self, text_matrix: &Matrix, x: f64, y: f64) -> (f64, f64) {
        let start = text_matrix.transform_point(x, y);
        self.cm
            .iter()
            .fold(start, |(x, y), m| m.transform_point(x, y))
    }

    /// Product of the equivalent scale factors of every `cm` matrix.
    pub fn cm_scale(&self) -> f64 {
        self.cm.iter().map(Matrix::scale_factor).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_state::TextState;

    fn assert_point(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn empty_list_is_identity() {
        let gs = InterpreterState::new();
        assert_point(gs.to_device(&Matrix::identity(), 3.0, 4.0), (3.0, 4.0));
        assert!((gs.cm_scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cm_sequence_composes_newest_first() {
        let mut gs = InterpreterState::new();
        gs.concat_matrix(Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        gs.concat_matrix(Matrix::translation(10.0, 20.0));
        assert_point(gs.to_device(&Matrix::identity(), 0.0, 0.0), (20.0, 40.0));
        assert!((gs.cm_scale() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn text_matrix_applies_before_cm() {
        let mut gs = InterpreterState::new();
        gs.concat_matrix(Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        let tm = Matrix::translation(100.0, 700.0);
        assert_point(gs.to_device(&tm, 5.0, 0.0), (210.0, 1400.0));
    }

    #[test]
    fn q_and_q_restore_whole_list() {
        let mut gs = InterpreterState::new();
        let ts = TextState::new();
        gs.concat_matrix(Matrix::translation(1.0, 1.0));
        gs.save_state_with_text(ts.save_snapshot());
        gs.concat_matrix(Matrix::translation(5.0, 5.0));
        gs.concat_matrix(Matrix::translation(7.0, 7.0));
        assert_point(gs.to_device(&Matrix::identity(), 0.0, 0.0), (13.0, 13.0));
        assert_eq!(gs.stack_depth(), 1);

        assert!(gs.restore_state_with_text().is_some());
        assert_point(gs.to_device(&Matrix::identity(), 0.0, 0.0), (1.0, 1.0));
        assert_eq!(gs.stack_depth(), 0);
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut gs = InterpreterState::new();
        gs.concat_matrix(Matrix::translation(1.0, 1.0));
        assert!(gs.restore_state_with_text().is_none());
        assert_point(gs.to_device(&Matrix::identity(), 2.0, 0.0), (3.0, 1.0));
    }
}
