//! Document tree to HTML (or plain text).
//!
//! The emitter is the only place markup is produced. It validates hrefs,
//! spends the thumbnail budget and feeds the reference collector.

use crate::block::{Block, Document, List, ListKind, TableRow, TableSection};
use crate::error::{Error, Result};
use crate::escape::{encode_query, encode_query_keep_fragment, is_safe_href};
use crate::inline::{Color, IdLinkKind, Inline, SpanKind, normalize_wiki_title};
use crate::limits::MAX_EMIT_DEPTH;
use crate::mode::{Options, ReferenceCollector, Rendered, ThumbnailBudget};
use crate::render::{Attr, HtmlWriter, Tag};

const EMBED_CLASS: &str = "dtext-link dtext-id-link dtext-post-id-link thumb-placeholder-link";

/// Per-call emitter state.
pub struct Emitter {
    writer: HtmlWriter,
    strip: bool,
    colors: bool,
    thumbs: ThumbnailBudget,
    refs: ReferenceCollector,
    depth: usize,
    /// Strip mode: a leaf block has been written, so the next needs a `\n`.
    started: bool,
}

impl Emitter {
    pub fn new(options: &Options, input_len: usize) -> Self {
        Self {
            writer: HtmlWriter::with_capacity_for(input_len),
            strip: options.strip,
            colors: options.allow_color,
            thumbs: ThumbnailBudget::new(options.max_thumbs),
            refs: ReferenceCollector::new(),
            depth: 0,
            started: false,
        }
    }

    /// Emit a block document.
    pub fn document(&mut self, document: &Document) -> Result<()> {
        self.blocks(&document.blocks)
    }

    /// Emit a single inline run with no block wrapper.
    pub fn inline_run(&mut self, nodes: &[Inline]) -> Result<()> {
        if self.strip {
            self.strip_leaf(|e| e.strip_inlines(nodes))
        } else {
            self.inlines(nodes)
        }
    }

    pub fn finish(self) -> Result<Rendered> {
        Ok(Rendered {
            html: self.writer.finish()?,
            references: self.refs.finish(),
        })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_EMIT_DEPTH {
            return Err(Error::DepthExceeded(MAX_EMIT_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.enter()?;
            if self.strip {
                self.strip_block(block)?;
            } else {
                self.block(block)?;
            }
            self.leave();
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(content) => self.wrapped(Tag::P, &[], content),
            Block::Header { level, id, content } => {
                let tag = Tag::heading(*level);
                match id {
                    Some(id) => {
                        let id = format!("dtext-{id}");
                        self.wrapped(tag, &[(Attr::Id, id.as_str())], content)
                    }
                    None => self.wrapped(tag, &[], content),
                }
            }
            Block::List(list) => self.list(list),
            Block::Quote(children) => {
                self.writer.open(Tag::Blockquote, &[]);
                self.blocks(children)?;
                self.writer.close(Tag::Blockquote)
            }
            Block::Spoiler(children) => {
                self.writer.open(Tag::Div, &[(Attr::Class, "spoiler")]);
                self.blocks(children)?;
                self.writer.close(Tag::Div)
            }
            Block::Code { language, text } => {
                match language {
                    Some(language) => {
                        let class = format!("language-{language}");
                        self.writer.open(Tag::Pre, &[(Attr::Class, class.as_str())]);
                    }
                    None => self.writer.open(Tag::Pre, &[]),
                }
                self.writer.text(text);
                self.writer.close(Tag::Pre)
            }
            Block::Table(rows) => self.table(rows),
            Block::Section {
                title,
                expanded,
                body,
            } => {
                let (outer, arrow) = if *expanded {
                    ("expandable expanded", "section-arrow expanded")
                } else {
                    ("expandable", "section-arrow")
                };
                self.writer.open(Tag::Div, &[(Attr::Class, outer)]);
                self.writer.open(Tag::Div, &[(Attr::Class, "expandable-header")]);
                self.writer.open(Tag::Span, &[(Attr::Class, arrow)]);
                self.writer.close(Tag::Span)?;
                if !title.is_empty() {
                    self.wrapped(Tag::Span, &[], title)?;
                }
                self.writer.close(Tag::Div)?;
                self.writer.open(Tag::Div, &[(Attr::Class, "expandable-content")]);
                self.blocks(body)?;
                self.writer.close(Tag::Div)?;
                self.writer.close(Tag::Div)
            }
            Block::TranslatorNote(content) => self.wrapped(Tag::P, &[(Attr::Class, "tn")], content),
            Block::HorizontalRule => {
                self.writer.void(Tag::Hr, &[]);
                Ok(())
            }
            Block::RawText(text) => {
                self.writer.open(Tag::P, &[]);
                self.writer.text(text);
                self.writer.close(Tag::P)
            }
        }
    }

    fn wrapped(&mut self, tag: Tag, attrs: &[(Attr, &str)], content: &[Inline]) -> Result<()> {
        self.writer.open(tag, attrs);
        self.inlines(content)?;
        self.writer.close(tag)
    }

    fn list(&mut self, list: &List) -> Result<()> {
        let tag = match list.kind {
            ListKind::Unordered => Tag::Ul,
            ListKind::Ordered => Tag::Ol,
        };
        self.writer.open(tag, &[]);
        for item in &list.items {
            self.writer.open(Tag::Li, &[]);
            for child in &item.children {
                self.enter()?;
                match child {
                    // Tight: item text goes straight into the <li>.
                    Block::Paragraph(content) => self.inlines(content)?,
                    other => self.block(other)?,
                }
                self.leave();
            }
            self.writer.close(Tag::Li)?;
        }
        self.writer.close(tag)
    }

    fn table(&mut self, rows: &[TableRow]) -> Result<()> {
        self.writer.open(Tag::Table, &[(Attr::Class, "striped")]);
        let mut section: Option<TableSection> = None;
        for row in rows {
            if row.section != section {
                if let Some(open) = section {
                    self.writer.close(section_tag(open))?;
                }
                if let Some(next) = row.section {
                    self.writer.open(section_tag(next), &[]);
                }
                section = row.section;
            }

            self.writer.open(Tag::Tr, &[]);
            for cell in &row.cells {
                let tag = if cell.header { Tag::Th } else { Tag::Td };
                self.wrapped(tag, &[], &cell.content)?;
            }
            self.writer.close(Tag::Tr)?;
        }
        if let Some(open) = section {
            self.writer.close(section_tag(open))?;
        }
        self.writer.close(Tag::Table)
    }

    fn inlines(&mut self, nodes: &[Inline]) -> Result<()> {
        for node in nodes {
            self.enter()?;
            self.inline(node)?;
            self.leave();
        }
        Ok(())
    }

    fn inline(&mut self, node: &Inline) -> Result<()> {
        match node {
            Inline::Text(text) => self.writer.text(text),
            Inline::LineBreak => self.writer.void(Tag::Br, &[]),
            Inline::Span { kind, children } => {
                let (tag, class) = span_markup(*kind);
                match class {
                    Some(class) => self.writer.open(tag, &[(Attr::Class, class)]),
                    None => self.writer.open(tag, &[]),
                }
                self.inlines(children)?;
                self.writer.close(tag)?;
            }
            Inline::Code(code) => {
                self.writer.open(Tag::Code, &[]);
                self.writer.text(code);
                self.writer.close(Tag::Code)?;
            }
            Inline::Link { href, children } => self.link(href, children)?,
            Inline::Color { color, children } => self.color(color, children)?,
            Inline::Mention(name) => {
                self.refs.mention(name);
                let href = format!("/users?name={}", encode_query(name));
                self.writer.open(
                    Tag::A,
                    &[(Attr::Class, "dtext-link dtext-user-mention-link"), (Attr::Href, href.as_str())],
                );
                self.writer.text("@");
                self.writer.text(name);
                self.writer.close(Tag::A)?;
            }
            Inline::WikiLink { title, label } => {
                let display = label.as_deref().unwrap_or(title);
                let normalized = normalize_wiki_title(title);
                if normalized.is_empty() {
                    self.writer.text(display);
                    return Ok(());
                }
                self.refs.wiki_title(&normalized);
                let href = format!(
                    "/wiki_pages/show_or_new?title={}",
                    encode_query_keep_fragment(&normalized)
                );
                self.text_link("dtext-link dtext-wiki-link", &href, display)?;
            }
            Inline::PostSearch { tags, label } => {
                let display = label.as_deref().unwrap_or(tags);
                let href = format!("/posts?tags={}", encode_query(&tags.to_lowercase()));
                self.text_link("dtext-link dtext-post-search-link", &href, display)?;
            }
            Inline::IdLink { kind, id } => self.id_link(*kind, *id)?,
            Inline::MediaEmbed { id, kind } => {
                if self.thumbs.take() {
                    self.refs.post(*id);
                    let id = id.to_string();
                    let href = format!("/posts/{id}");
                    self.writer.open(
                        Tag::A,
                        &[(Attr::Class, EMBED_CLASS), (Attr::DataId, id.as_str()), (Attr::Href, href.as_str())],
                    );
                    self.writer.text("post #");
                    self.writer.text(&id);
                    self.writer.close(Tag::A)?;
                } else {
                    tracing::trace!(id, "thumbnail cap reached");
                    self.id_link(kind.fallback(), *id)?;
                }
            }
            Inline::Anchor(name) => {
                let id = encode_query(name);
                if !id.is_empty() {
                    self.writer.open(Tag::A, &[(Attr::Id, id.as_str())]);
                    self.writer.close(Tag::A)?;
                }
            }
        }
        Ok(())
    }

    fn link(&mut self, href: &str, children: &[Inline]) -> Result<()> {
        if !is_safe_href(href) {
            tracing::debug!(href, "link with disallowed href rendered as text");
            return self.inlines(children);
        }

        if href.starts_with('/') {
            self.writer
                .open(Tag::A, &[(Attr::Class, "dtext-link"), (Attr::Href, href)]);
        } else {
            self.writer.open(
                Tag::A,
                &[
                    (Attr::Rel, "nofollow"),
                    (Attr::Class, "dtext-link dtext-external-link"),
                    (Attr::Href, href),
                ],
            );
        }
        self.inlines(children)?;
        self.writer.close(Tag::A)
    }

    fn color(&mut self, color: &Color, children: &[Inline]) -> Result<()> {
        if !self.colors {
            return self.inlines(children);
        }
        match color {
            Color::Category(name) => {
                let class = format!("dtext-color-{name}");
                self.writer.open(Tag::Span, &[(Attr::Class, class.as_str())]);
            }
            Color::Css(value) => {
                let style = format!("color:{value}");
                self.writer
                    .open(Tag::Span, &[(Attr::Class, "dtext-color"), (Attr::Style, style.as_str())]);
            }
        }
        self.inlines(children)?;
        self.writer.close(Tag::Span)
    }

    fn text_link(&mut self, class: &str, href: &str, text: &str) -> Result<()> {
        self.writer.open(Tag::A, &[(Attr::Class, class), (Attr::Href, href)]);
        self.writer.text(text);
        self.writer.close(Tag::A)
    }

    fn id_link(&mut self, kind: IdLinkKind, id: u64) -> Result<()> {
        let href = format!("{}{id}", kind.path());
        let text = format!("{} #{id}", kind.keyword());
        self.text_link(kind.class(), &href, &text)
    }

    // Plain-text rendering.

    /// Write one leaf block, preceded by a newline if another came before.
    /// Leaves that produce no text leave no trace.
    fn strip_leaf(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let mark = self.writer.len();
        if self.started {
            self.writer.newline();
        }
        let text_start = self.writer.len();
        body(self)?;
        if self.writer.len() == text_start {
            self.writer.truncate(mark);
        } else {
            self.started = true;
        }
        Ok(())
    }

    fn strip_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(content) | Block::Header { content, .. } | Block::TranslatorNote(content) => {
                self.strip_leaf(|e| e.strip_inlines(content))
            }
            Block::List(list) => self.strip_list(list),
            Block::Quote(children) | Block::Spoiler(children) => self.blocks(children),
            Block::Code { text, .. } => self.strip_leaf(|e| {
                e.writer.text(text);
                Ok(())
            }),
            Block::RawText(text) => self.strip_leaf(|e| {
                e.writer.text(text);
                Ok(())
            }),
            Block::Table(rows) => {
                for row in rows {
                    self.strip_leaf(|e| {
                        for (i, cell) in row.cells.iter().enumerate() {
                            if i > 0 {
                                e.writer.text(" ");
                            }
                            e.strip_inlines(&cell.content)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            }
            Block::Section { title, body, .. } => {
                self.strip_leaf(|e| e.strip_inlines(title))?;
                self.blocks(body)
            }
            Block::HorizontalRule => Ok(()),
        }
    }

    fn strip_list(&mut self, list: &List) -> Result<()> {
        for item in &list.items {
            for child in &item.children {
                self.enter()?;
                self.strip_block(child)?;
                self.leave();
            }
        }
        Ok(())
    }

    fn strip_inlines(&mut self, nodes: &[Inline]) -> Result<()> {
        for node in nodes {
            self.enter()?;
            match node {
                Inline::Text(text) | Inline::Code(text) => self.writer.text(text),
                Inline::LineBreak => self.writer.text(" "),
                Inline::Span { children, .. }
                | Inline::Link { children, .. }
                | Inline::Color { children, .. } => self.strip_inlines(children)?,
                Inline::Mention(name) => {
                    self.refs.mention(name);
                    self.writer.text("@");
                    self.writer.text(name);
                }
                Inline::WikiLink { title, label } => {
                    self.refs.wiki_title(title);
                    self.writer.text(label.as_deref().unwrap_or(title));
                }
                Inline::PostSearch { tags, label } => {
                    self.writer.text(label.as_deref().unwrap_or(tags));
                }
                Inline::IdLink { kind, id } => {
                    self.writer.text(&format!("{} #{id}", kind.keyword()));
                }
                Inline::MediaEmbed { id, kind } => {
                    self.writer.text(&format!("{} #{id}", kind.fallback().keyword()));
                }
                Inline::Anchor(_) => {}
            }
            self.leave();
        }
        Ok(())
    }
}

fn section_tag(section: TableSection) -> Tag {
    match section {
        TableSection::Head => Tag::Thead,
        TableSection::Body => Tag::Tbody,
    }
}

fn span_markup(kind: SpanKind) -> (Tag, Option<&'static str>) {
    match kind {
        SpanKind::Bold => (Tag::Strong, None),
        SpanKind::Italic => (Tag::Em, None),
        SpanKind::Underline => (Tag::U, None),
        SpanKind::Strikethrough => (Tag::S, None),
        SpanKind::Superscript => (Tag::Sup, None),
        SpanKind::Subscript => (Tag::Sub, None),
        SpanKind::Spoiler => (Tag::Span, Some("spoiler")),
        SpanKind::TranslatorNote => (Tag::Span, Some("tn")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ListItem, TableCell};

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_owned())
    }

    fn emit(blocks: Vec<Block>, options: &Options) -> Rendered {
        let mut emitter = Emitter::new(options, 0);
        emitter.document(&Document { blocks }).unwrap();
        emitter.finish().unwrap()
    }

    fn html(blocks: Vec<Block>) -> String {
        emit(blocks, &Options::default()).html
    }

    #[test]
    fn test_paragraph_escaped() {
        assert_eq!(
            html(vec![Block::Paragraph(vec![text("<b>&'\"")])]),
            "<p>&lt;b&gt;&amp;&#39;&quot;</p>"
        );
    }

    #[test]
    fn test_unsafe_href_degrades() {
        let link = Inline::Link {
            href: "javascript:alert(1)".into(),
            children: vec![text("click")],
        };
        assert_eq!(html(vec![Block::Paragraph(vec![link])]), "<p>click</p>");
    }

    #[test]
    fn test_tight_list_items() {
        let list = List {
            kind: ListKind::Unordered,
            items: vec![ListItem {
                children: vec![Block::Paragraph(vec![text("a")])],
            }],
            depth: 1,
        };
        assert_eq!(html(vec![Block::List(list)]), "<ul><li>a</li></ul>");
    }

    #[test]
    fn test_table_sections_grouped() {
        let cell = |header, s: &str| TableCell {
            header,
            content: vec![text(s)],
        };
        let rows = vec![
            TableRow {
                section: Some(TableSection::Head),
                cells: vec![cell(true, "h")],
            },
            TableRow {
                section: Some(TableSection::Body),
                cells: vec![cell(false, "a")],
            },
            TableRow {
                section: Some(TableSection::Body),
                cells: vec![cell(false, "b")],
            },
        ];
        assert_eq!(
            html(vec![Block::Table(rows)]),
            "<table class=\"striped\"><thead><tr><th>h</th></tr></thead>\
             <tbody><tr><td>a</td></tr><tr><td>b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_embed_budget() {
        let embeds = (1..=3)
            .map(|id| Inline::MediaEmbed {
                id,
                kind: crate::inline::MediaKind::Post,
            })
            .collect();
        let options = Options {
            max_thumbs: 1,
            ..Options::default()
        };
        let rendered = emit(vec![Block::Paragraph(embeds)], &options);
        assert_eq!(rendered.html.matches("thumb-placeholder-link").count(), 1);
        assert_eq!(rendered.html.matches("dtext-post-id-link").count(), 3);
        assert_eq!(rendered.references.post_ids, [1]);
    }

    #[test]
    fn test_strip_separates_leaves() {
        let options = Options {
            strip: true,
            ..Options::default()
        };
        let blocks = vec![
            Block::Paragraph(vec![text("a"), Inline::LineBreak, text("b")]),
            Block::HorizontalRule,
            Block::Quote(vec![Block::Paragraph(vec![text("c")])]),
        ];
        assert_eq!(emit(blocks, &options).html, "a b\nc");
    }

    #[test]
    fn test_color_needs_opt_in() {
        let colored = |color| {
            vec![Block::Paragraph(vec![Inline::Color {
                color,
                children: vec![text("x")],
            }])]
        };
        let options = Options {
            allow_color: true,
            ..Options::default()
        };

        assert_eq!(html(colored(Color::Css("red".into()))), "<p>x</p>");
        assert_eq!(
            emit(colored(Color::Css("#0f0".into())), &options).html,
            "<p><span class=\"dtext-color\" style=\"color:#0f0\">x</span></p>"
        );
        assert_eq!(
            emit(colored(Color::Category("artist")), &options).html,
            "<p><span class=\"dtext-color-artist\">x</span></p>"
        );
    }

    #[test]
    fn test_section_markup() {
        let section = |expanded, title: Vec<Inline>| Block::Section {
            title,
            expanded,
            body: vec![Block::Paragraph(vec![text("b")])],
        };
        assert_eq!(
            html(vec![section(false, vec![text("T")])]),
            "<div class=\"expandable\"><div class=\"expandable-header\">\
             <span class=\"section-arrow\"></span><span>T</span></div>\
             <div class=\"expandable-content\"><p>b</p></div></div>"
        );
        assert_eq!(
            html(vec![section(true, Vec::new())]),
            "<div class=\"expandable expanded\"><div class=\"expandable-header\">\
             <span class=\"section-arrow expanded\"></span></div>\
             <div class=\"expandable-content\"><p>b</p></div></div>"
        );
    }

    #[test]
    fn test_translator_note_block() {
        assert_eq!(
            html(vec![Block::TranslatorNote(vec![text("n")])]),
            "<p class=\"tn\">n</p>"
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut node = text("x");
        for _ in 0..=MAX_EMIT_DEPTH {
            node = Inline::Span {
                kind: SpanKind::Bold,
                children: vec![node],
            };
        }
        let mut emitter = Emitter::new(&Options::default(), 0);
        assert_eq!(
            emitter.inline_run(&[node]),
            Err(Error::DepthExceeded(MAX_EMIT_DEPTH))
        );
    }
}
