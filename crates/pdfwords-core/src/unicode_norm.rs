//! Unicode normalization of word text.
//!
//! Glyph mappings differ between PDF producers: one writes `é` as a single
//! code point, another as `e` plus a combining accent, a third as a
//! ligature glyph. [`normalize_words`] brings assembled words to one form.

use std::borrow::Cow;

use unicode_normalization::{
    IsNormalized, UnicodeNormalization, is_nfc_quick, is_nfd_quick, is_nfkc_quick, is_nfkd_quick,
};

use crate::words::PWord;

/// Normalization form applied to word text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnicodeNorm {
    /// Leave text as decoded.
    #[default]
    None,
    /// Canonical composition (NFC).
    Nfc,
    /// Canonical decomposition (NFD).
    Nfd,
    /// Compatibility composition (NFKC). Folds ligatures and fullwidth forms.
    Nfkc,
    /// Compatibility decomposition (NFKD).
    Nfkd,
}

impl UnicodeNorm {
    /// Normalize `text`, borrowing it when it is already in this form.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let chars = text.chars();
        let quick = match self {
            UnicodeNorm::None => return Cow::Borrowed(text),
            UnicodeNorm::Nfc => is_nfc_quick(chars),
            UnicodeNorm::Nfd => is_nfd_quick(chars),
            UnicodeNorm::Nfkc => is_nfkc_quick(chars),
            UnicodeNorm::Nfkd => is_nfkd_quick(chars),
        };
        if quick == IsNormalized::Yes {
            return Cow::Borrowed(text);
        }
        Cow::Owned(match self {
            UnicodeNorm::None => text.to_string(),
            UnicodeNorm::Nfc => text.nfc().collect(),
            UnicodeNorm::Nfd => text.nfd().collect(),
            UnicodeNorm::Nfkc => text.nfkc().collect(),
            UnicodeNorm::Nfkd => text.nfkd().collect(),
        })
    }
}

/// Normalize the text of each word in place. Geometry and font
/// attributes are untouched.
pub fn normalize_words(words: &mut [PWord], norm: UnicodeNorm) {
    if norm == UnicodeNorm::None {
        return;
    }
    for word in words.iter_mut() {
        if let Cow::Owned(text) = norm.normalize(&word.text) {
            word.text = text;
        }
    }
}
