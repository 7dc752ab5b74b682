//! HTML output writer.
//!
//! Element and attribute names come from closed enums, so the writer can
//! only produce allowlisted markup. Every open element is tracked; closing
//! the wrong one, or finishing with elements still open, is an [`Error`].

use crate::error::{Error, Result};
use crate::escape;

/// Allowlisted HTML elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Blockquote,
    Pre,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Div,
    Strong,
    Em,
    U,
    S,
    Sup,
    Sub,
    Span,
    Code,
    A,
    Br,
    Hr,
}

impl Tag {
    pub const fn name(self) -> &'static str {
        match self {
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Blockquote => "blockquote",
            Tag::Pre => "pre",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Th => "th",
            Tag::Td => "td",
            Tag::Div => "div",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::U => "u",
            Tag::S => "s",
            Tag::Sup => "sup",
            Tag::Sub => "sub",
            Tag::Span => "span",
            Tag::Code => "code",
            Tag::A => "a",
            Tag::Br => "br",
            Tag::Hr => "hr",
        }
    }

    /// Heading element for a level, clamped to 1..=6.
    pub const fn heading(level: u8) -> Tag {
        match level {
            0 | 1 => Tag::H1,
            2 => Tag::H2,
            3 => Tag::H3,
            4 => Tag::H4,
            5 => Tag::H5,
            _ => Tag::H6,
        }
    }

    /// Elements written without a closing tag.
    pub const fn is_void(self) -> bool {
        matches!(self, Tag::Br | Tag::Hr)
    }
}

/// Allowlisted attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Class,
    Href,
    Id,
    DataId,
    Rel,
    /// Only ever given a validated `color:` declaration.
    Style,
}

impl Attr {
    pub const fn name(self) -> &'static str {
        match self {
            Attr::Class => "class",
            Attr::Href => "href",
            Attr::Id => "id",
            Attr::DataId => "data-id",
            Attr::Rel => "rel",
            Attr::Style => "style",
        }
    }
}

/// HTML output writer with pre-allocated buffer and an open-element stack.
///
/// # Example
/// ```
/// use dtext::render::{Attr, HtmlWriter, Tag};
///
/// let mut writer = HtmlWriter::with_capacity_for(64);
/// writer.open(Tag::P, &[]);
/// writer.open(Tag::Span, &[(Attr::Class, "tn")]);
/// writer.text("a < b");
/// writer.close(Tag::Span).unwrap();
/// writer.close(Tag::P).unwrap();
///
/// assert_eq!(writer.finish().unwrap(), r#"<p><span class="tn">a &lt; b</span></p>"#);
/// ```
pub struct HtmlWriter {
    out: Vec<u8>,
    open: Vec<Tag>,
}

impl HtmlWriter {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with pre-allocated capacity based on expected input size.
    ///
    /// Markup tends to grow by about a quarter when rendered.
    #[inline]
    pub fn with_capacity_for(input_len: usize) -> Self {
        Self::with_capacity(input_len + input_len / 4)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            open: Vec::new(),
        }
    }

    /// Write `<tag attr="value" ...>` and push it on the open stack.
    pub fn open(&mut self, tag: Tag, attrs: &[(Attr, &str)]) {
        self.start_tag(tag, attrs);
        if !tag.is_void() {
            self.open.push(tag);
        }
    }

    /// Write an element with no content or closing tag, like `<br>`.
    pub fn void(&mut self, tag: Tag, attrs: &[(Attr, &str)]) {
        self.start_tag(tag, attrs);
    }

    fn start_tag(&mut self, tag: Tag, attrs: &[(Attr, &str)]) {
        self.out.push(b'<');
        self.out.extend_from_slice(tag.name().as_bytes());
        for &(attr, value) in attrs {
            self.out.push(b' ');
            self.out.extend_from_slice(attr.name().as_bytes());
            self.out.extend_from_slice(b"=\"");
            escape::escape_html_into(&mut self.out, value.as_bytes());
            self.out.push(b'"');
        }
        self.out.push(b'>');
    }

    /// Close `tag`, which must be the innermost open element.
    pub fn close(&mut self, tag: Tag) -> Result<()> {
        match self.open.pop() {
            Some(open) if open == tag => {
                self.out.extend_from_slice(b"</");
                self.out.extend_from_slice(tag.name().as_bytes());
                self.out.push(b'>');
                Ok(())
            }
            Some(open) => Err(Error::MismatchedClose {
                expected: open.name(),
                found: tag.name(),
            }),
            None => Err(Error::CloseWithoutOpen(tag.name())),
        }
    }

    /// Write escaped text content.
    #[inline]
    pub fn text(&mut self, text: &str) {
        escape::escape_html_into(&mut self.out, text.as_bytes());
    }

    /// Write a raw newline, used between blocks in plain-text output.
    #[inline]
    pub fn newline(&mut self) {
        self.out.push(b'\n');
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Drop output written after `len`. Only text may be discarded.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.out.truncate(len);
    }

    /// Take the output; every opened element must have been closed.
    pub fn finish(self) -> Result<String> {
        if let Some(&innermost) = self.open.last() {
            return Err(Error::Unclosed {
                count: self.open.len(),
                innermost: innermost.name(),
            });
        }
        // SAFETY: only `str` content and ASCII markup are ever written, and
        // escaping replaces ASCII bytes with ASCII sequences.
        Ok(unsafe { String::from_utf8_unchecked(self.out) })
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_new() {
        let writer = HtmlWriter::new();
        assert!(writer.is_empty());
        assert!(writer.open.is_empty());
    }

    #[test]
    fn test_writer_capacity() {
        let writer = HtmlWriter::with_capacity_for(1000);
        assert!(writer.out.capacity() >= 1250);
    }

    #[test]
    fn test_writer_attributes_escaped() {
        let mut writer = HtmlWriter::new();
        writer.open(Tag::A, &[(Attr::Href, "/posts?tags=a\"b&c")]);
        writer.text("x");
        writer.close(Tag::A).unwrap();
        assert_eq!(writer.finish().unwrap(), "<a href=\"/posts?tags=a&quot;b&amp;c\">x</a>");
    }

    #[test]
    fn test_writer_multiple_attributes() {
        let mut writer = HtmlWriter::new();
        writer.open(Tag::Span, &[(Attr::Class, "dtext-color"), (Attr::Style, "color:#f00")]);
        writer.close(Tag::Span).unwrap();
        assert_eq!(
            writer.finish().unwrap(),
            "<span class=\"dtext-color\" style=\"color:#f00\"></span>"
        );
    }

    #[test]
    fn test_writer_void_elements() {
        let mut writer = HtmlWriter::new();
        writer.void(Tag::Br, &[]);
        writer.open(Tag::Hr, &[]);
        assert!(writer.open.is_empty());
        assert_eq!(writer.finish().unwrap(), "<br><hr>");
    }

    #[test]
    fn test_writer_heading_levels() {
        for level in 1..=6u8 {
            let mut writer = HtmlWriter::new();
            writer.open(Tag::heading(level), &[]);
            writer.close(Tag::heading(level)).unwrap();
            assert_eq!(writer.finish().unwrap(), format!("<h{level}></h{level}>"));
        }
        assert_eq!(Tag::heading(9), Tag::H6);
    }

    #[test]
    fn test_writer_mismatched_close() {
        let mut writer = HtmlWriter::new();
        writer.open(Tag::Strong, &[]);
        assert_eq!(
            writer.close(Tag::Em),
            Err(Error::MismatchedClose {
                expected: "strong",
                found: "em"
            })
        );
    }

    #[test]
    fn test_writer_close_without_open() {
        let mut writer = HtmlWriter::new();
        assert_eq!(writer.close(Tag::P), Err(Error::CloseWithoutOpen("p")));
    }

    #[test]
    fn test_writer_unclosed_at_finish() {
        let mut writer = HtmlWriter::new();
        writer.open(Tag::Ul, &[]);
        writer.open(Tag::Li, &[]);
        assert_eq!(
            writer.finish(),
            Err(Error::Unclosed {
                count: 2,
                innermost: "li"
            })
        );
    }
}
