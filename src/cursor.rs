//! Byte cursor over a text run.
//!
//! Scanning is byte-oriented: every DText delimiter is ASCII, so positions
//! the cursor stops on after matching a delimiter are always character
//! boundaries of the underlying `str`.

use memchr::memchr;

use crate::Range;

/// A cursor for byte-by-byte scanning of a `str`.
///
/// # Example
/// ```
/// use dtext::cursor::Cursor;
///
/// let mut cursor = Cursor::new("h1. Title");
/// assert!(cursor.eat_ignore_case(b"H1"));
/// assert!(cursor.eat(b'.'));
/// assert_eq!(cursor.skip_spaces(), 1);
/// assert_eq!(cursor.rest(), b"Title");
/// ```
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    /// Create a cursor starting at an offset.
    #[inline]
    pub fn new_at(input: &'a str, offset: usize) -> Self {
        debug_assert!(offset <= input.len());
        Self {
            input: input.as_bytes(),
            pos: offset.min(input.len()),
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.input.len());
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    #[inline]
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Unconsumed bytes.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Consume `b` if it is next.
    #[inline]
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `word` if the input continues with it, ignoring ASCII case.
    #[inline]
    pub fn eat_ignore_case(&mut self, word: &[u8]) -> bool {
        if self.starts_with_ignore_case(word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn starts_with_ignore_case(&self, word: &[u8]) -> bool {
        let rest = self.rest();
        rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word)
    }

    /// Skip spaces and tabs; returns how many were skipped.
    #[inline]
    pub fn skip_spaces(&mut self) -> usize {
        self.skip_while(|b| b == b' ' || b == b'\t')
    }

    /// Skip bytes while `pred` holds; returns the count.
    #[inline]
    pub fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        self.pos - start
    }

    /// Absolute position of the next `b` at or after the cursor.
    #[inline]
    pub fn find(&self, b: u8) -> Option<usize> {
        memchr(b, self.rest()).map(|i| self.pos + i)
    }

    /// End of the current line (position of `\n`, or end of input).
    #[inline]
    pub fn line_end(&self) -> usize {
        self.find(b'\n').unwrap_or(self.input.len())
    }

    /// Bytes from `start` up to the cursor.
    #[inline]
    pub fn since(&self, start: usize) -> &'a [u8] {
        &self.input[start.min(self.pos)..self.pos]
    }

    /// Range from `start` to the cursor.
    #[inline]
    pub fn range_from(&self, start: usize) -> Range {
        Range::from_usize(start, self.pos)
    }
}
