//! dtext: a total, injection-safe DText to HTML transpiler.
//!
//! DText is a bracket-tag wiki markup (`[b]bold[/b]`, `[quote]`, `[[Wiki]]`,
//! `post #123`, ...). Every input renders: malformed markup degrades to
//! literal text, never to an error or to unbalanced HTML.
//!
//! # Pipeline
//! 1. [`scanner`] decodes the input and classifies lines and inline tokens.
//! 2. [`block::BlockParser`] builds the block tree.
//! 3. [`inline::InlineParser`] turns each text run into inline nodes.
//! 4. [`emit::Emitter`] walks the tree and writes allowlisted HTML.
//!
//! # Design Principles
//! - No regex: byte-level scanning with `memchr`
//! - Explicit per-call state, no globals
//! - Bounded nesting and lookahead: linear time on all inputs

pub mod block;
pub mod cursor;
pub mod emit;
pub mod error;
pub mod escape;
pub mod inline;
pub mod limits;
pub mod mode;
pub mod range;
pub mod render;
pub mod scanner;

pub use block::{BlockParser, Document};
pub use emit::Emitter;
pub use error::{Error, Result};
pub use inline::InlineParser;
pub use mode::{Options, References, Rendered};
pub use range::Range;
pub use render::HtmlWriter;

/// Render DText with options, returning HTML and the referenced entities.
///
/// Input bytes need not be valid UTF-8; invalid sequences are replaced.
///
/// # Example
/// ```
/// use dtext::Options;
///
/// let rendered = dtext::parse(b"hi @alice, see [[Tag Group]]", &Options::default()).unwrap();
/// assert!(rendered.html.starts_with("<p>hi <a class=\"dtext-link dtext-user-mention-link\""));
/// assert_eq!(rendered.references.mentions, ["alice"]);
/// assert_eq!(rendered.references.wiki_titles, ["tag_group"]);
/// ```
pub fn parse(input: &[u8], options: &Options) -> Result<Rendered> {
    let _span = tracing::debug_span!("dtext", len = input.len(), strip = options.strip, inline = options.inline)
        .entered();

    let text = scanner::decode(input);
    let inline = InlineParser::new(!options.disable_mentions);
    let mut emitter = Emitter::new(options, text.len());

    if options.inline {
        let nodes = inline.parse(text.trim());
        emitter.inline_run(&nodes)?;
    } else {
        let document = BlockParser::new(&text, inline).parse();
        emitter.document(&document)?;
    }
    emitter.finish()
}

/// Convert DText to HTML with default options.
///
/// # Example
/// ```
/// let html = dtext::to_html("h1. Hello\n\n[b]World[/b]").unwrap();
/// assert_eq!(html, "<h1>Hello</h1><p><strong>World</strong></p>");
/// ```
pub fn to_html(input: &str) -> Result<String> {
    parse(input.as_bytes(), &Options::default()).map(|rendered| rendered.html)
}

/// Render as a single inline run, without block structure or `<p>`.
///
/// ```
/// assert_eq!(dtext::parse_inline("h1. [i]x[/i]").unwrap(), "h1. <em>x</em>");
/// ```
pub fn parse_inline(input: &str) -> Result<String> {
    let options = Options {
        inline: true,
        ..Options::default()
    };
    parse(input.as_bytes(), &options).map(|rendered| rendered.html)
}

/// Render as escaped plain text, one line per block.
///
/// ```
/// assert_eq!(dtext::parse_strip("[b]a[/b]\n\n\"b\":/x").unwrap(), "a\nb");
/// ```
pub fn parse_strip(input: &str) -> Result<String> {
    let options = Options {
        strip: true,
        ..Options::default()
    };
    parse(input.as_bytes(), &options).map(|rendered| rendered.html)
}
