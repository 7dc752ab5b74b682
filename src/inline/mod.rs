//! Inline parser for DText text runs.
//!
//! Works in one pass over the scanner's inline tokens:
//! 1. Plain text goes through the autolinker (URLs, mentions, id links).
//! 2. Span tags push and pop an explicit stack of open frames.
//! 3. Self-contained tokens (wiki links, code, named links) become nodes
//!    in the innermost open frame.
//!
//! Recovery from malformed nesting is deterministic: a closing tag closes
//! the nearest open frame of its kind, and frames opened after that one
//! degrade to their literal opening text. Frames still open at the end of
//! the run are closed innermost first.

mod autolink;
pub mod node;

pub use node::{Color, IdLinkKind, Inline, MediaKind, SpanKind, normalize_wiki_title, push_inline, push_text};

use smallvec::SmallVec;

use crate::limits::MAX_INLINE_NESTING;
use crate::scanner::{Tag, TagKind, TokenKind, Tokens};
use crate::Range;

/// Inline parser configuration, shared by every run of a document.
#[derive(Debug, Clone, Copy)]
pub struct InlineParser {
    /// Recognize `@name` mentions.
    mentions: bool,
}

impl InlineParser {
    pub fn new(mentions: bool) -> Self {
        Self { mentions }
    }

    /// Parse one text run into inline nodes.
    ///
    /// # Example
    /// ```
    /// use dtext::inline::{Inline, InlineParser, SpanKind};
    ///
    /// let nodes = InlineParser::new(true).parse("[b]hi[/b]");
    /// assert_eq!(
    ///     nodes,
    ///     vec![Inline::Span { kind: SpanKind::Bold, children: vec![Inline::Text("hi".into())] }]
    /// );
    /// ```
    pub fn parse(&self, run: &str) -> Vec<Inline> {
        RunParser::new(run, self.mentions, false).run()
    }
}

impl Default for InlineParser {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug)]
enum Opener {
    Span(SpanKind),
    Link(String),
    Color(Color),
}

/// An open span waiting for its closing tag.
#[derive(Debug)]
struct Frame {
    opener: Opener,
    /// The opening tag as written, restored if the frame degrades.
    literal: Range,
    children: Vec<Inline>,
}

impl Frame {
    fn into_node(self) -> Inline {
        match self.opener {
            Opener::Span(kind) => Inline::Span {
                kind,
                children: self.children,
            },
            Opener::Link(href) => Inline::Link {
                href,
                children: self.children,
            },
            Opener::Color(color) => Inline::Color {
                color,
                children: self.children,
            },
        }
    }
}

/// Per-run parsing context.
struct RunParser<'a> {
    text: &'a str,
    mentions: bool,
    /// Parsing a link label: link-like syntax stays literal.
    in_label: bool,
    open_links: usize,
    root: Vec<Inline>,
    stack: SmallVec<[Frame; 8]>,
}

impl<'a> RunParser<'a> {
    fn new(text: &'a str, mentions: bool, in_label: bool) -> Self {
        Self {
            text,
            mentions,
            in_label,
            open_links: 0,
            root: Vec::new(),
            stack: SmallVec::new(),
        }
    }

    fn run(mut self) -> Vec<Inline> {
        for token in Tokens::new(self.text) {
            self.token(token.kind, token.span);
        }

        while let Some(frame) = self.stack.pop() {
            tracing::trace!(literal = frame.literal.slice(self.text), "closing span at end of run");
            if matches!(frame.opener, Opener::Link(_)) {
                self.open_links -= 1;
            }
            let node = frame.into_node();
            push_inline(self.out(), node);
        }
        self.root
    }

    /// Children of the innermost open frame.
    fn out(&mut self) -> &mut Vec<Inline> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn in_link(&self) -> bool {
        self.in_label || self.open_links > 0
    }

    fn literal(&mut self, span: Range) {
        let text = span.slice(self.text);
        push_text(self.out(), text);
    }

    fn token(&mut self, kind: TokenKind, span: Range) {
        let text = self.text;
        match kind {
            TokenKind::Text if self.in_link() => self.literal(span),
            TokenKind::Text => {
                let mentions = self.mentions;
                autolink::scan(text, span, mentions, self.out());
            }
            TokenKind::Newline => self.out().push(Inline::LineBreak),
            TokenKind::Tag(tag) => self.tag(tag),
            TokenKind::Code(body) => {
                let code = body.slice(text).to_owned();
                self.out().push(Inline::Code(code));
            }
            TokenKind::Literal(body) => self.literal(body),

            // Links never nest.
            TokenKind::WikiLink { .. }
            | TokenKind::PostSearch { .. }
            | TokenKind::NamedLink { .. }
            | TokenKind::BareLink(_)
            | TokenKind::Anchor(_)
                if self.in_link() =>
            {
                self.literal(span)
            }

            TokenKind::WikiLink { title, label } => {
                let node = Inline::WikiLink {
                    title: title.slice(text).trim().to_owned(),
                    label: label.map(|l| l.slice(text).trim().to_owned()),
                };
                self.out().push(node);
            }
            TokenKind::PostSearch { tags, label } => {
                let node = Inline::PostSearch {
                    tags: tags.slice(text).trim().to_owned(),
                    label: label.map(|l| l.slice(text).trim().to_owned()),
                };
                self.out().push(node);
            }
            TokenKind::NamedLink { label, url } => {
                let children = RunParser::new(label.slice(text), self.mentions, true).run();
                let node = Inline::Link {
                    href: url.slice(text).trim().to_owned(),
                    children,
                };
                self.out().push(node);
            }
            TokenKind::BareLink(url) => {
                let url = url.slice(text).trim();
                let node = Inline::Link {
                    href: url.to_owned(),
                    children: vec![Inline::Text(url.to_owned())],
                };
                self.out().push(node);
            }
            TokenKind::Anchor(name) => {
                let node = Inline::Anchor(name.slice(text).to_ascii_lowercase());
                self.out().push(node);
            }
        }
    }

    fn tag(&mut self, tag: Tag) {
        let span_kind = match tag.kind {
            TagKind::Bold => Some(SpanKind::Bold),
            TagKind::Italic => Some(SpanKind::Italic),
            TagKind::Underline => Some(SpanKind::Underline),
            TagKind::Strike => Some(SpanKind::Strikethrough),
            TagKind::Sup => Some(SpanKind::Superscript),
            TagKind::Sub => Some(SpanKind::Subscript),
            TagKind::Spoiler => Some(SpanKind::Spoiler),
            TagKind::Tn => Some(SpanKind::TranslatorNote),
            TagKind::Url | TagKind::Color => None,
            // Block tags inside a run are text.
            _ => return self.literal(tag.span),
        };

        if tag.closing {
            return self.close(tag.kind, tag.span);
        }

        if self.stack.len() >= MAX_INLINE_NESTING {
            tracing::debug!(depth = self.stack.len(), "inline nesting limit reached");
            return self.literal(tag.span);
        }

        let opener = match (span_kind, tag.arg) {
            (Some(kind), _) => Opener::Span(kind),
            (None, Some(arg)) if tag.kind == TagKind::Color => match Color::parse(arg.slice(self.text)) {
                Some(color) => Opener::Color(color),
                None => return self.literal(tag.span),
            },
            (None, Some(href)) if !self.in_link() => {
                self.open_links += 1;
                Opener::Link(href.slice(self.text).trim().to_owned())
            }
            (None, _) => return self.literal(tag.span),
        };
        self.stack.push(Frame {
            opener,
            literal: tag.span,
            children: Vec::new(),
        });
    }

    fn close(&mut self, kind: TagKind, span: Range) {
        let matches = |frame: &Frame| match (&frame.opener, kind) {
            (Opener::Link(_), TagKind::Url) => true,
            (Opener::Color(_), TagKind::Color) => true,
            (Opener::Span(span_kind), _) => span_kind_of(kind) == Some(*span_kind),
            _ => false,
        };

        let Some(index) = self.stack.iter().rposition(matches) else {
            tracing::trace!(closer = span.slice(self.text), "closing tag with no opener");
            return self.literal(span);
        };

        // Frames opened after the match degrade to literal text.
        while self.stack.len() > index + 1 {
            let Some(frame) = self.stack.pop() else { break };
            tracing::debug!(
                literal = frame.literal.slice(self.text),
                "unclosed span inside closed span"
            );
            if matches!(frame.opener, Opener::Link(_)) {
                self.open_links -= 1;
            }
            let text = self.text;
            let out = self.out();
            push_text(out, frame.literal.slice(text));
            for child in frame.children {
                push_inline(out, child);
            }
        }

        if let Some(frame) = self.stack.pop() {
            if matches!(frame.opener, Opener::Link(_)) {
                self.open_links -= 1;
            }
            let node = frame.into_node();
            push_inline(self.out(), node);
        }
    }
}

fn span_kind_of(kind: TagKind) -> Option<SpanKind> {
    Some(match kind {
        TagKind::Bold => SpanKind::Bold,
        TagKind::Italic => SpanKind::Italic,
        TagKind::Underline => SpanKind::Underline,
        TagKind::Strike => SpanKind::Strikethrough,
        TagKind::Sup => SpanKind::Superscript,
        TagKind::Sub => SpanKind::Subscript,
        TagKind::Spoiler => SpanKind::Spoiler,
        TagKind::Tn => SpanKind::TranslatorNote,
        _ => return None,
    })
}
