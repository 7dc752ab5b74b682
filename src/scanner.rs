//! Input decoding and tokenization.
//!
//! Two lazy token streams share one tag recognizer:
//! - [`Lines`] yields logical lines classified by their line-start marker,
//!   consumed by the block parser.
//! - [`Tokens`] yields inline tokens for one text run, consumed by the
//!   inline parser.
//!
//! Lookahead is bounded everywhere (see [`crate::limits`]), so a failed
//! recognizer costs at most a window's worth of bytes.

use std::borrow::Cow;

use memchr::memchr;

use crate::cursor::Cursor;
use crate::limits::{MAX_INPUT_LEN, MAX_LINK_BODY_LEN, MAX_TAG_LEN};
use crate::Range;

/// Decode raw bytes into scannable text.
///
/// Invalid UTF-8 sequences become U+FFFD and line endings are normalized
/// to `\n`. Input past [`MAX_INPUT_LEN`] is dropped at a character boundary.
pub fn decode(input: &[u8]) -> Cow<'_, str> {
    let mut text = String::from_utf8_lossy(input);
    if text.contains('\r') {
        text = Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"));
    }
    if text.len() <= MAX_INPUT_LEN {
        return text;
    }

    let mut cut = MAX_INPUT_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    tracing::warn!(len = text.len(), cut, "input truncated");
    Cow::Owned(text[..cut].to_owned())
}

/// Known bracket tag names. `[expand]` is an alias of `[section]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Sup,
    Sub,
    Spoiler,
    Tn,
    Color,
    Url,
    Code,
    Nodtext,
    Quote,
    Section,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Hr,
}

impl TagKind {
    fn from_name(name: &[u8]) -> Option<Self> {
        let mut lower = [0u8; 8];
        if name.len() > lower.len() {
            return None;
        }
        for (dst, src) in lower.iter_mut().zip(name) {
            *dst = src.to_ascii_lowercase();
        }
        Some(match &lower[..name.len()] {
            b"b" => Self::Bold,
            b"i" => Self::Italic,
            b"u" => Self::Underline,
            b"s" => Self::Strike,
            b"sup" => Self::Sup,
            b"sub" => Self::Sub,
            b"spoiler" | b"spoilers" => Self::Spoiler,
            b"tn" => Self::Tn,
            b"color" => Self::Color,
            b"url" => Self::Url,
            b"code" => Self::Code,
            b"nodtext" => Self::Nodtext,
            b"quote" => Self::Quote,
            b"section" | b"expand" => Self::Section,
            b"table" => Self::Table,
            b"thead" => Self::Thead,
            b"tbody" => Self::Tbody,
            b"tr" => Self::Tr,
            b"th" => Self::Th,
            b"td" => Self::Td,
            b"hr" => Self::Hr,
            _ => return None,
        })
    }

    /// Tags that accept an `=argument`.
    fn takes_arg(self) -> bool {
        matches!(self, Self::Url | Self::Code | Self::Section | Self::Color)
    }

    /// Tags the block parser acts on when they start a line.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Code
                | Self::Nodtext
                | Self::Quote
                | Self::Section
                | Self::Table
                | Self::Spoiler
                | Self::Tn
                | Self::Hr
        )
    }
}

/// A recognized bracket tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub closing: bool,
    /// Text after `=`, if any.
    pub arg: Option<Range>,
    /// `[section,expanded]`
    pub expanded: bool,
    /// The whole tag, `[` through `]`.
    pub span: Range,
}

/// Recognize a bracket tag starting at `start` (which must hold `[`).
pub fn scan_tag(text: &str, start: usize) -> Option<Tag> {
    let mut cursor = Cursor::new_at(text, start);
    if !cursor.eat(b'[') {
        return None;
    }
    let closing = cursor.eat(b'/');

    let name_start = cursor.pos();
    cursor.skip_while(|b| b.is_ascii_alphabetic());
    let kind = TagKind::from_name(&text.as_bytes()[name_start..cursor.pos()])?;

    if closing {
        return cursor.eat(b']').then(|| Tag {
            kind,
            closing,
            arg: None,
            expanded: false,
            span: cursor.range_from(start),
        });
    }

    let expanded = kind == TagKind::Section && cursor.eat_ignore_case(b",expanded");

    let mut arg = None;
    if kind.takes_arg() && cursor.eat(b'=') {
        let arg_start = cursor.pos();
        let window = &cursor.rest()[..cursor.remaining().min(MAX_TAG_LEN)];
        let close = window.iter().position(|&b| b == b']' || b == b'\n')?;
        if window[close] != b']' || close == 0 {
            return None;
        }
        cursor.advance(close);
        arg = Some(cursor.range_from(arg_start));
    }

    cursor.eat(b']').then(|| Tag {
        kind,
        closing,
        arg,
        expanded,
        span: cursor.range_from(start),
    })
}

/// Find the closing tag of `kind` at or after `from`.
///
/// Returns the closer; content ends at `tag.span.start`.
pub fn find_closing_tag(text: &str, from: usize, kind: TagKind) -> Option<Tag> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(offset) = memchr(b'[', &bytes[pos..]) {
        let at = pos + offset;
        if bytes.get(at + 1) == Some(&b'/') {
            if let Some(tag) = scan_tag(text, at) {
                if tag.kind == kind {
                    return Some(tag);
                }
            }
        }
        pos = at + 1;
    }
    None
}

/// Line-start marker of a logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace only.
    Blank,
    /// `h1.` through `h6.`, optionally `h2#anchor.`
    Header {
        level: u8,
        id: Option<Range>,
        content: usize,
    },
    /// `*`, `**`... (unordered) or `# `, `## `... (ordered)
    ListItem {
        depth: usize,
        ordered: bool,
        content: usize,
    },
    /// `>` quoting prefix; `content` is past the `>` and one optional space.
    Quote { content: usize },
    /// A block-level bracket tag opens the line.
    Tag(Tag),
    Plain,
}

/// A logical line: a physical line, or what is left of one after the
/// block parser consumed a tag at its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    /// Start (before indentation) to end of line, newline excluded.
    pub range: Range,
    /// First non-space byte.
    pub indent_end: usize,
    /// The line starts a physical line.
    pub at_line_start: bool,
}

/// Lazy sequence of classified logical lines.
#[derive(Clone)]
pub struct Lines<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Resume scanning at `pos`, which becomes the start of the next
    /// logical line.
    pub fn skip_to(&mut self, pos: usize) {
        self.pos = pos.min(self.text.len());
    }
}

impl Iterator for Lines<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let end = Cursor::new_at(self.text, start).line_end();
        let at_line_start = start == 0 || self.text.as_bytes()[start - 1] == b'\n';
        self.pos = (end + 1).min(self.text.len());

        let (kind, indent_end) = classify(self.text, start, end, at_line_start);
        Some(Line {
            kind,
            range: Range::from_usize(start, end),
            indent_end,
            at_line_start,
        })
    }
}

fn classify(text: &str, start: usize, end: usize, at_line_start: bool) -> (LineKind, usize) {
    let line = &text[..end];
    let mut cursor = Cursor::new_at(line, start);
    cursor.skip_spaces();
    let indent_end = cursor.pos();

    let Some(first) = cursor.peek() else {
        return (LineKind::Blank, indent_end);
    };

    let kind = match first {
        b'[' => match scan_tag(text, indent_end) {
            Some(tag) if tag.kind.is_block() => LineKind::Tag(tag),
            _ => LineKind::Plain,
        },
        // Markers below only count on a fresh physical line.
        _ if !at_line_start => LineKind::Plain,
        b'h' | b'H' => classify_header(&mut cursor).unwrap_or(LineKind::Plain),
        b'*' => {
            let depth = cursor.skip_while(|b| b == b'*');
            cursor.skip_spaces();
            if cursor.is_eof() {
                LineKind::Plain
            } else {
                LineKind::ListItem {
                    depth,
                    ordered: false,
                    content: cursor.pos(),
                }
            }
        }
        b'#' => {
            let depth = cursor.skip_while(|b| b == b'#');
            if cursor.skip_spaces() == 0 || cursor.is_eof() {
                LineKind::Plain
            } else {
                LineKind::ListItem {
                    depth,
                    ordered: true,
                    content: cursor.pos(),
                }
            }
        }
        b'>' => {
            cursor.advance(1);
            cursor.eat(b' ');
            LineKind::Quote {
                content: cursor.pos(),
            }
        }
        _ => LineKind::Plain,
    };
    (kind, indent_end)
}

fn classify_header(cursor: &mut Cursor<'_>) -> Option<LineKind> {
    cursor.advance(1);
    let level = match cursor.bump()? {
        d @ b'1'..=b'6' => d - b'0',
        _ => return None,
    };

    let mut id = None;
    if cursor.eat(b'#') {
        let id_start = cursor.pos();
        cursor.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if cursor.pos() == id_start {
            return None;
        }
        id = Some(cursor.range_from(id_start));
    }

    if !cursor.eat(b'.') {
        return None;
    }
    if !matches!(cursor.peek(), None | Some(b' ') | Some(b'\t')) {
        return None;
    }
    cursor.skip_spaces();
    Some(LineKind::Header {
        level,
        id,
        content: cursor.pos(),
    })
}

/// Inline token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Newline,
    Tag(Tag),
    /// `` `code` `` or `[code]code[/code]`; holds the content.
    Code(Range),
    /// `[nodtext]...[/nodtext]`; holds the content.
    Literal(Range),
    WikiLink { title: Range, label: Option<Range> },
    PostSearch { tags: Range, label: Option<Range> },
    /// `"label":url` or `"label":[url]`
    NamedLink { label: Range, url: Range },
    /// `<https://...>` or `[url]https://...[/url]`; the URL is also the text.
    BareLink(Range),
    /// `[#name]`
    Anchor(Range),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range,
}

/// Bytes that may start a non-text token.
const SPECIAL: [bool; 256] = {
    let mut table = [false; 256];
    table[b'\n' as usize] = true;
    table[b'[' as usize] = true;
    table[b'{' as usize] = true;
    table[b'`' as usize] = true;
    table[b'"' as usize] = true;
    table[b'<' as usize] = true;
    table
};

/// Lazy sequence of inline tokens over one text run.
///
/// A special byte whose recognizer fails stays inside the surrounding
/// text token, so text tokens are maximal.
pub struct Tokens<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    pending: Option<Token>,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            pending: None,
        }
    }

    fn next_special(&self) -> Option<usize> {
        self.cursor
            .rest()
            .iter()
            .position(|&b| SPECIAL[b as usize])
            .map(|i| self.cursor.pos() + i)
    }

    fn recognize(&self, at: usize) -> Option<Token> {
        let bytes = self.text.as_bytes();
        let kind_at = |kind, end| {
            Some(Token {
                kind,
                span: Range::from_usize(at, end),
            })
        };

        match bytes[at] {
            b'\n' => kind_at(TokenKind::Newline, at + 1),
            b'[' if bytes.get(at + 1) == Some(&b'[') => {
                let (title, label, end) = scan_pair(self.text, at + 2, b']')?;
                kind_at(TokenKind::WikiLink { title, label }, end)
            }
            b'[' if bytes.get(at + 1) == Some(&b'#') => self.scan_anchor(at),
            b'[' => self.scan_tag_token(at),
            b'{' if bytes.get(at + 1) == Some(&b'{') => {
                let (tags, label, end) = scan_pair(self.text, at + 2, b'}')?;
                kind_at(TokenKind::PostSearch { tags, label }, end)
            }
            b'`' => {
                let close = line_window(bytes, at + 1, MAX_LINK_BODY_LEN)
                    .iter()
                    .position(|&b| b == b'`')?;
                if close == 0 {
                    return None;
                }
                kind_at(
                    TokenKind::Code(Range::from_usize(at + 1, at + 1 + close)),
                    at + close + 2,
                )
            }
            b'"' => self.scan_named_link(at),
            b'<' => {
                let inner = at + 1;
                let mut cursor = Cursor::new_at(self.text, inner);
                if !(cursor.starts_with_ignore_case(b"http://") || cursor.starts_with_ignore_case(b"https://")) {
                    return None;
                }
                let close = line_window(bytes, inner, MAX_LINK_BODY_LEN)
                    .iter()
                    .position(|&b| b == b'>' || b == b' ' || b == b'<' || b == b'"')?;
                cursor.advance(close);
                if !cursor.eat(b'>') {
                    return None;
                }
                kind_at(
                    TokenKind::BareLink(Range::from_usize(inner, inner + close)),
                    cursor.pos(),
                )
            }
            _ => None,
        }
    }

    fn scan_anchor(&self, at: usize) -> Option<Token> {
        let mut cursor = Cursor::new_at(self.text, at + 2);
        let name_start = cursor.pos();
        let len = cursor.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if len == 0 || len > MAX_TAG_LEN || !cursor.eat(b']') {
            return None;
        }
        Some(Token {
            kind: TokenKind::Anchor(Range::from_usize(name_start, name_start + len)),
            span: cursor.range_from(at),
        })
    }

    fn scan_tag_token(&self, at: usize) -> Option<Token> {
        let tag = scan_tag(self.text, at)?;
        let raw_body = |kind| {
            let body_start = tag.span.end_usize();
            match find_closing_tag(self.text, body_start, kind) {
                Some(closer) => (
                    Range::from_usize(body_start, closer.span.start_usize()),
                    closer.span.end,
                ),
                None => (
                    Range::from_usize(body_start, self.text.len()),
                    self.text.len() as u32,
                ),
            }
        };

        let (kind, end) = match tag.kind {
            TagKind::Code if !tag.closing => {
                let (body, end) = raw_body(TagKind::Code);
                (TokenKind::Code(body), end)
            }
            TagKind::Nodtext if !tag.closing => {
                let (body, end) = raw_body(TagKind::Nodtext);
                (TokenKind::Literal(body), end)
            }
            TagKind::Url if !tag.closing && tag.arg.is_none() => {
                let body_start = tag.span.end_usize();
                let window = line_window(self.text.as_bytes(), body_start, MAX_LINK_BODY_LEN + "[/url]".len());
                let mut window_end = body_start + window.len();
                while !self.text.is_char_boundary(window_end) {
                    window_end -= 1;
                }
                let closer = find_closing_tag(&self.text[..window_end], body_start, TagKind::Url)?;
                let body = Range::from_usize(body_start, closer.span.start_usize());
                if body.slice(self.text).trim().is_empty() {
                    return None;
                }
                (TokenKind::BareLink(body), closer.span.end)
            }
            _ => (TokenKind::Tag(tag), tag.span.end),
        };
        Some(Token {
            kind,
            span: Range::new(at as u32, end),
        })
    }

    fn scan_named_link(&self, at: usize) -> Option<Token> {
        let bytes = self.text.as_bytes();
        let label_start = at + 1;
        let close = line_window(bytes, label_start, MAX_LINK_BODY_LEN)
            .iter()
            .position(|&b| b == b'"')?;
        let label = Range::from_usize(label_start, label_start + close);
        if label.slice(self.text).trim().is_empty() {
            return None;
        }

        let mut cursor = Cursor::new_at(self.text, label_start + close + 1);
        if !cursor.eat(b':') {
            return None;
        }

        if cursor.eat(b'[') {
            let url_start = cursor.pos();
            let close = line_window(bytes, url_start, MAX_LINK_BODY_LEN)
                .iter()
                .position(|&b| b == b']')?;
            if close == 0 {
                return None;
            }
            cursor.advance(close + 1);
            return Some(Token {
                kind: TokenKind::NamedLink {
                    label,
                    url: Range::from_usize(url_start, url_start + close),
                },
                span: cursor.range_from(at),
            });
        }

        let url_start = cursor.pos();
        let scheme_len = if cursor.starts_with_ignore_case(b"https://") {
            8
        } else if cursor.starts_with_ignore_case(b"http://") {
            7
        } else if cursor.peek() == Some(b'/') {
            1
        } else {
            return None;
        };
        let url_end = scan_url(self.text, url_start);
        if url_end <= url_start + scheme_len && scheme_len > 1 {
            return None;
        }
        Some(Token {
            kind: TokenKind::NamedLink {
                label,
                url: Range::from_usize(url_start, url_end),
            },
            span: Range::from_usize(at, url_end),
        })
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if self.cursor.is_eof() {
            return None;
        }

        let start = self.cursor.pos();
        while let Some(at) = self.next_special() {
            if let Some(token) = self.recognize(at) {
                self.cursor.set_pos(token.span.end_usize());
                if at > start {
                    self.pending = Some(token);
                    return Some(Token {
                        kind: TokenKind::Text,
                        span: Range::from_usize(start, at),
                    });
                }
                return Some(token);
            }
            self.cursor.set_pos(at + 1);
        }

        self.cursor.set_pos(self.text.len());
        Some(Token {
            kind: TokenKind::Text,
            span: Range::from_usize(start, self.text.len()),
        })
    }
}

/// Bytes from `from` up to the end of the line, at most `max` of them.
fn line_window(bytes: &[u8], from: usize, max: usize) -> &[u8] {
    let rest = &bytes[from.min(bytes.len())..];
    let rest = &rest[..rest.len().min(max)];
    match memchr(b'\n', rest) {
        Some(nl) => &rest[..nl],
        None => rest,
    }
}

/// `[[title|label]]` / `{{tags|label}}` body starting at `from`.
/// Returns the main part, optional label, and the end past the closer.
fn scan_pair(text: &str, from: usize, close: u8) -> Option<(Range, Option<Range>, usize)> {
    let bytes = text.as_bytes();
    let window = line_window(bytes, from, MAX_LINK_BODY_LEN);
    let mut from_here = 0;
    let len = loop {
        let at = from_here + memchr(close, &window[from_here..])?;
        if window.get(at + 1) == Some(&close) {
            break at;
        }
        from_here = at + 1;
    };
    let body = &window[..len];
    if body.contains(&b'[') || body.contains(&b'{') {
        return None;
    }

    let (main, label) = match memchr(b'|', body) {
        Some(bar) => (
            Range::from_usize(from, from + bar),
            Some(Range::from_usize(from + bar + 1, from + len)),
        ),
        None => (Range::from_usize(from, from + len), None),
    };
    if main.slice(text).trim().is_empty() {
        return None;
    }
    let label = label.filter(|l| !l.slice(text).trim().is_empty());
    Some((main, label, from + len + 2))
}

/// End of a URL starting at `start`.
///
/// Consumes URL characters greedily, then trims trailing sentence
/// punctuation and closing brackets that have no opener inside the URL.
pub fn scan_url(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut end = start;
    while end < bytes.len() {
        match bytes[end] {
            b if b.is_ascii_whitespace() || b.is_ascii_control() => break,
            b'<' | b'>' | b'"' | b'`' | b'[' | b'{' => break,
            // U+3000..U+303F, CJK symbols and punctuation
            0xE3 if bytes.get(end + 1) == Some(&0x80) => break,
            _ => end += 1,
        }
    }

    let url = &bytes[start..end];
    let opens = url.iter().filter(|&&b| b == b'(').count();
    let mut closes = url.iter().filter(|&&b| b == b')').count();
    while end > start {
        let trim = match bytes[end - 1] {
            b'.' | b',' | b':' | b';' | b'!' | b'?' | b'\'' | b']' | b'}' => true,
            b')' if closes > opens => {
                closes -= 1;
                true
            }
            _ => false,
        };
        if !trim {
            break;
        }
        end -= 1;
    }
    end
}
