//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter reports every raw word it closes and every non-fatal
//! problem it meets through a [`ContentHandler`]. Raw words are unmerged
//! glyph runs; the word assembler in `pdfwords-core` joins them later.

use pdfwords_core::{ExtractWarning, PWord};

/// Receives the output of the content stream interpreter.
///
/// Both methods default to no-ops so a handler only implements what it
/// needs.
pub trait ContentHandler {
    /// Called when a glyph run ends at a space, an implicit space, a text
    /// positioning operator or the end of the stream.
    fn on_word(&mut self, _word: PWord) {}

    /// Called when a non-fatal warning is encountered during interpretation.
    ///
    /// The interpreter continues after every warning.
    fn on_warning(&mut self, _warning: ExtractWarning) {}
}

/// Handler that keeps raw words and, optionally, warnings in order.
#[derive(Debug, Default)]
pub struct WordCollector {
    pub words: Vec<PWord>,
    pub warnings: Vec<ExtractWarning>,
    collect_warnings: bool,
}

impl WordCollector {
    pub fn new(collect_warnings: bool) -> Self {
        Self {
            words: Vec::new(),
            warnings: Vec::new(),
            collect_warnings,
        }
    }
}

impl ContentHandler for WordCollector {
    fn on_word(&mut self, word: PWord) {
        self.words.push(word);
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        if self.collect_warnings {
            self.warnings.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwords_core::{ExtractWarningCode, FontRef, Rect};

    struct NoopHandler;
    impl ContentHandler for NoopHandler {}

    fn sample_word() -> PWord {
        PWord {
            text: "Hi".to_string(),
            bbox: Rect::new(100.0, 697.0, 113.0, 709.0),
            font_size_px: 12,
            bold: false,
            italic: false,
            font: FontRef {
                base_name: "Helvetica".to_string(),
                resource_name: "F1".to_string(),
                object_id: Some((4, 0)),
                has_descent: true,
            },
        }
    }

    #[test]
    fn noop_handler_accepts_everything() {
        let mut handler = NoopHandler;
        handler.on_word(sample_word());
        handler.on_warning(ExtractWarning::new("ignored"));
    }

    #[test]
    fn collector_keeps_order() {
        let mut collector = WordCollector::new(true);
        collector.on_word(sample_word());
        collector.on_word(PWord {
            text: "there".to_string(),
            ..sample_word()
        });
        let texts: Vec<&str> = collector.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi", "there"]);
    }

    #[test]
    fn collector_can_drop_warnings() {
        let mut quiet = WordCollector::new(false);
        quiet.on_warning(ExtractWarning::with_code(
            ExtractWarningCode::MissingFont,
            "font F9 not found",
        ));
        assert!(quiet.warnings.is_empty());

        let mut loud = WordCollector::new(true);
        loud.on_warning(ExtractWarning::with_code(
            ExtractWarningCode::MissingFont,
            "font F9 not found",
        ));
        assert_eq!(loud.warnings.len(), 1);
        assert_eq!(loud.warnings[0].code, ExtractWarningCode::MissingFont);
    }
}
