//! Peekable byte cursor over a fully materialized buffer.
//!
//! End of input is an ordinary return value (`None`, a short slice, or
//! `false`); no operation here fails.

/// Returns `true` if `b` is a PDF whitespace character.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

/// Returns `true` if `b` is a PDF delimiter character.
pub fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Read position over a byte slice. The offset never exceeds the length.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to `pos`, clamped to the buffer length.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// The whole underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Byte `offset` positions ahead of the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    /// Up to `n` bytes ahead; shorter at end of input.
    pub fn peek_n(&self, n: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(n).min(self.data.len());
        &self.data[self.pos..end]
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.remaining().starts_with(prefix)
    }

    pub fn read(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Advance by up to `n` bytes.
    pub fn advance(&mut self, n: usize) {
        self.set_position(self.pos.saturating_add(n));
    }

    /// Skip whitespace. Returns `false` iff the input is exhausted afterwards.
    pub fn skip_space_or_eof(&mut self) -> bool {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                return true;
            }
            self.pos += 1;
        }
        false
    }

    /// Skip whitespace and `%` comments. Returns `false` at end of input.
    pub fn skip_space_and_comments(&mut self) -> bool {
        loop {
            if !self.skip_space_or_eof() {
                return false;
            }
            if self.peek() != Some(b'%') {
                return true;
            }
            while let Some(b) = self.peek() {
                if b == b'\n' || b == b'\r' {
                    break;
                }
                self.pos += 1;
            }
        }
    }

    /// Read one line including its terminator (`\n`, `\r` or `\r\n`).
    ///
    /// Returns `None` only when nothing is left to read.
    pub fn read_line(&mut self) -> Option<&'a [u8]> {
        if self.is_eof() {
            return None;
        }
        let start = self.pos;
        while let Some(b) = self.read() {
            match b {
                b'\n' => break,
                b'\r' => {
                    if self.peek() == Some(b'\n') {
                        self.pos += 1;
                    }
                    break;
                }
                _ => {}
            }
        }
        Some(&self.data[start..self.pos])
    }

    /// Read a run of bytes that are neither whitespace nor delimiters.
    pub fn read_regular(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    /// Offset of the next occurrence of `needle` at or after the cursor.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(self.pos);
        }
        self.remaining()
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| self.pos + i)
    }
}

/// Strip one trailing line terminator (`\r\n`, `\n` or `\r`).
pub fn trim_eol(line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\r\n") {
        rest
    } else if let Some(rest) = line.strip_suffix(b"\n") {
        rest
    } else if let Some(rest) = line.strip_suffix(b"\r") {
        rest
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_and_read() {
        let mut c = ByteCursor::new(b"ab");
        assert_eq!(c.peek(), Some(b'a'));
        assert_eq!(c.read(), Some(b'a'));
        assert_eq!(c.read(), Some(b'b'));
        assert_eq!(c.read(), None);
        assert_eq!(c.peek(), None);
        assert!(c.is_eof());
        assert_eq!(c.position(), 2);
    }

    #[test]
    fn peek_n_short_at_eof() {
        let mut c = ByteCursor::new(b"hello");
        c.advance(3);
        assert_eq!(c.peek_n(10), b"lo");
        assert_eq!(c.peek_n(1), b"l");
        c.advance(10);
        assert_eq!(c.peek_n(4), b"");
        assert_eq!(c.position(), 5);
    }

    #[test]
    fn skip_space_reports_eof() {
        let mut c = ByteCursor::new(b" \t\r\n x");
        assert!(c.skip_space_or_eof());
        assert_eq!(c.peek(), Some(b'x'));
        let mut c = ByteCursor::new(b"  \n");
        assert!(!c.skip_space_or_eof());
    }

    #[test]
    fn skip_comments() {
        let mut c = ByteCursor::new(b"% note\n  %another\r\n42");
        assert!(c.skip_space_and_comments());
        assert_eq!(c.peek(), Some(b'4'));
        let mut c = ByteCursor::new(b"% only a comment");
        assert!(!c.skip_space_and_comments());
    }

    #[test]
    fn read_line_keeps_terminators() {
        let mut c = ByteCursor::new(b"one\ntwo\r\nthree\rfour");
        assert_eq!(c.read_line(), Some(&b"one\n"[..]));
        assert_eq!(c.read_line(), Some(&b"two\r\n"[..]));
        assert_eq!(c.read_line(), Some(&b"three\r"[..]));
        assert_eq!(c.read_line(), Some(&b"four"[..]));
        assert_eq!(c.read_line(), None);
    }

    #[test]
    fn read_regular_stops_at_delimiters() {
        let mut c = ByteCursor::new(b"Tf/F1 12");
        assert_eq!(c.read_regular(), b"Tf");
        assert_eq!(c.peek(), Some(b'/'));
    }

    #[test]
    fn find_from_cursor() {
        let mut c = ByteCursor::new(b"endobj x endobj");
        c.advance(1);
        assert_eq!(c.find(b"endobj"), Some(9));
        assert_eq!(c.find(b"zzz"), None);
    }

    #[test]
    fn trim_eol_removes_one_terminator() {
        assert_eq!(trim_eol(b"abc\r\n"), b"abc");
        assert_eq!(trim_eol(b"abc\n\n"), b"abc\n");
        assert_eq!(trim_eol(b"abc\r"), b"abc");
        assert_eq!(trim_eol(b"abc"), b"abc");
    }

    #[test]
    fn set_position_is_clamped() {
        let mut c = ByteCursor::new(b"abc");
        c.set_position(99);
        assert_eq!(c.position(), 3);
        assert!(c.is_eof());
    }
}
