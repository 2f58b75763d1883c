//! Diacritic table used to fuse separately drawn accents with their base letter.
//!
//! Many producers draw an accented letter as the base glyph followed by a
//! standalone accent glyph. Both the combining form (U+0300 block) and the
//! spacing form (e.g. U+00B4 ACUTE ACCENT) appear in practice.

use unicode_normalization::char::compose;

/// One entry: the accent as it appears in text, its glyph name and the
/// combining mark it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accent {
    pub ch: char,
    pub name: &'static str,
    pub combining: char,
}

const fn accent(ch: char, name: &'static str, combining: char) -> Accent {
    Accent {
        ch,
        name,
        combining,
    }
}

static ACCENTS: &[Accent] = &[
    accent('\u{0300}', "grave", '\u{0300}'),
    accent('\u{0060}', "grave", '\u{0300}'),
    accent('\u{0301}', "acute", '\u{0301}'),
    accent('\u{00B4}', "acute", '\u{0301}'),
    accent('\u{0302}', "circumflex", '\u{0302}'),
    accent('\u{02C6}', "circumflex", '\u{0302}'),
    accent('\u{0303}', "tilde", '\u{0303}'),
    accent('\u{02DC}', "tilde", '\u{0303}'),
    accent('\u{0304}', "macron", '\u{0304}'),
    accent('\u{00AF}', "macron", '\u{0304}'),
    accent('\u{0306}', "breve", '\u{0306}'),
    accent('\u{02D8}', "breve", '\u{0306}'),
    accent('\u{0307}', "dotaccent", '\u{0307}'),
    accent('\u{02D9}', "dotaccent", '\u{0307}'),
    accent('\u{0308}', "dieresis", '\u{0308}'),
    accent('\u{00A8}', "dieresis", '\u{0308}'),
    accent('\u{030A}', "ring", '\u{030A}'),
    accent('\u{02DA}', "ring", '\u{030A}'),
    accent('\u{030B}', "hungarumlaut", '\u{030B}'),
    accent('\u{02DD}', "hungarumlaut", '\u{030B}'),
    accent('\u{030C}', "caron", '\u{030C}'),
    accent('\u{02C7}', "caron", '\u{030C}'),
    accent('\u{0327}', "cedilla", '\u{0327}'),
    accent('\u{00B8}', "cedilla", '\u{0327}'),
    accent('\u{0328}', "ogonek", '\u{0328}'),
    accent('\u{02DB}', "ogonek", '\u{0328}'),
];

/// Look up `ch` in the accent table.
pub fn lookup(ch: char) -> Option<&'static Accent> {
    ACCENTS.iter().find(|a| a.ch == ch)
}

/// Look up an accent by glyph name (`acute`, `dieresis`, ...).
pub fn by_name(name: &str) -> Option<&'static Accent> {
    ACCENTS.iter().find(|a| a.name == name)
}

/// Precomposed form of `base` carrying accent `accent_ch`, if Unicode has one.
///
/// ```
/// use pdfwords_core::accents::fuse;
/// assert_eq!(fuse('a', '\u{0301}'), Some('á'));
/// assert_eq!(fuse('c', '\u{00B8}'), Some('ç'));
/// assert_eq!(fuse('q', '\u{0301}'), None);
/// ```
pub fn fuse(base: char, accent_ch: char) -> Option<char> {
    let accent = lookup(accent_ch)?;
    compose(base, accent.combining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_combining_and_spacing_forms() {
        assert_eq!(lookup('\u{0308}').map(|a| a.name), Some("dieresis"));
        assert_eq!(lookup('\u{00A8}').map(|a| a.combining), Some('\u{0308}'));
        assert!(lookup('x').is_none());
    }

    #[test]
    fn fuse_common_latin_letters() {
        assert_eq!(fuse('e', '\u{0300}'), Some('è'));
        assert_eq!(fuse('o', '\u{00A8}'), Some('ö'));
        assert_eq!(fuse('n', '\u{02DC}'), Some('ñ'));
        assert_eq!(fuse('A', '\u{02DA}'), Some('Å'));
        assert_eq!(fuse('s', '\u{02C7}'), Some('š'));
    }

    #[test]
    fn by_name_finds_combining_form() {
        assert_eq!(by_name("caron").map(|a| a.combining), Some('\u{030C}'));
        assert!(by_name("slash").is_none());
    }

    #[test]
    fn fuse_rejects_impossible_combinations() {
        assert_eq!(fuse('x', '\u{0327}'), None);
        assert_eq!(fuse('a', 'b'), None);
    }

    #[test]
    fn every_entry_maps_to_a_combining_mark() {
        for a in ACCENTS {
            assert!(
                unicode_normalization::char::is_combining_mark(a.combining),
                "{} is not combining",
                a.name
            );
        }
    }
}
