//! Linguistic word splitting used by the word assembler.
//!
//! The assembler asks a [`WordSplitter`] two questions: how many tokens a
//! piece of text contains, and whether two pieces would normally be written
//! with whitespace between them. Callers with a real language model can plug
//! in their own implementation; [`SimpleSplitter`] is a script-agnostic
//! default based on Unicode character classes.

use unicode_normalization::char::is_combining_mark;

/// Tokenizer oracle consulted when deciding whether two glyph runs merge.
pub trait WordSplitter {
    /// Split `text` into tokens.
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Number of tokens in `text`.
    fn token_count(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }

    /// True when `left` followed directly by `right` would fuse into one
    /// token, i.e. writing them as separate words needs a space.
    fn needs_space(&self, left: &str, right: &str) -> bool {
        match (left.chars().next_back(), right.chars().next()) {
            (Some(l), Some(r)) => is_word_char(l) && is_word_char(r),
            _ => false,
        }
    }
}

/// Letters, digits and combining marks.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

/// Default splitter.
///
/// - whitespace separates tokens and is dropped
/// - runs of letters, digits and combining marks form one token
/// - `.`, `,` and `'` between two word characters stay inside the token
///   (`3.14`, `1,000`, `don't`)
/// - every other character is a token of its own
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSplitter;

impl WordSplitter for SimpleSplitter {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let (start, c) = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }
            if !is_word_char(c) {
                let end = chars.get(i + 1).map_or(text.len(), |&(pos, _)| pos);
                tokens.push(&text[start..end]);
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < chars.len() {
                let c = chars[j].1;
                if is_word_char(c) {
                    j += 1;
                } else if matches!(c, '.' | ',' | '\'' | '\u{2019}')
                    && chars.get(j + 1).is_some_and(|&(_, n)| is_word_char(n))
                {
                    j += 2;
                } else {
                    break;
                }
            }
            let end = chars.get(j).map_or(text.len(), |&(pos, _)| pos);
            tokens.push(&text[start..end]);
            i = j;
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(SimpleSplitter.tokenize("hello  world\n"), vec!["hello", "world"]);
        assert!(SimpleSplitter.tokenize("   ").is_empty());
    }

    #[test]
    fn punctuation_is_its_own_token() {
        assert_eq!(
            SimpleSplitter.tokenize("Hello, world!"),
            vec!["Hello", ",", "world", "!"]
        );
        assert_eq!(SimpleSplitter.tokenize("(a)"), vec!["(", "a", ")"]);
    }

    #[test]
    fn numbers_and_contractions_stay_whole() {
        assert_eq!(SimpleSplitter.tokenize("pi 3.14"), vec!["pi", "3.14"]);
        assert_eq!(SimpleSplitter.tokenize("1,000."), vec!["1,000", "."]);
        assert_eq!(SimpleSplitter.tokenize("don't"), vec!["don't"]);
    }

    #[test]
    fn combining_marks_join_the_base_letter() {
        assert_eq!(SimpleSplitter.tokenize("cafe\u{0301} x"), vec!["cafe\u{0301}", "x"]);
        assert_eq!(SimpleSplitter.token_count("\u{0301}"), 1);
    }

    #[test]
    fn needs_space_between_word_characters() {
        assert!(SimpleSplitter.needs_space("co", "mma"));
        assert!(SimpleSplitter.needs_space("a", "\u{0301}"));
        assert!(!SimpleSplitter.needs_space("Hello", ","));
        assert!(!SimpleSplitter.needs_space("(", "x"));
        assert!(!SimpleSplitter.needs_space("", "x"));
    }
}
