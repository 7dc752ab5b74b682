//! Block parser implementation.

use memchr::memchr;
use smallvec::SmallVec;

use crate::cursor::Cursor;
use crate::escape::slug;
use crate::inline::{Inline, InlineParser};
use crate::limits::MAX_BLOCK_NESTING;
use crate::scanner::{self, Line, LineKind, Lines, Tag, TagKind};
use crate::Range;

use super::node::{Block, Document, List, ListItem, ListKind, TableCell, TableRow, TableSection};

/// An open bracket-tag container.
#[derive(Debug)]
enum ContainerKind {
    Quote,
    Spoiler,
    Section { title: Vec<Inline>, expanded: bool },
}

impl ContainerKind {
    fn tag(&self) -> TagKind {
        match self {
            ContainerKind::Quote => TagKind::Quote,
            ContainerKind::Spoiler => TagKind::Spoiler,
            ContainerKind::Section { .. } => TagKind::Section,
        }
    }
}

/// Index into `BlockParser::open` for container tag kinds.
fn slot(kind: TagKind) -> Option<usize> {
    match kind {
        TagKind::Quote => Some(0),
        TagKind::Spoiler => Some(1),
        TagKind::Section => Some(2),
        _ => None,
    }
}

#[derive(Debug)]
struct Container {
    kind: ContainerKind,
    blocks: Vec<Block>,
}

impl Container {
    fn into_block(self) -> Block {
        match self.kind {
            ContainerKind::Quote => Block::Quote(self.blocks),
            ContainerKind::Spoiler => Block::Spoiler(self.blocks),
            ContainerKind::Section { title, expanded } => Block::Section {
                title,
                expanded,
                body: self.blocks,
            },
        }
    }
}

/// An open list level.
#[derive(Debug)]
struct ListFrame {
    kind: ListKind,
    items: Vec<ListItem>,
}

/// Block parser state.
///
/// Owns the per-call block context: the open containers, the open list
/// levels and the pending paragraph. Leaf text is handed to the
/// [`InlineParser`] as soon as its block closes.
pub struct BlockParser<'a> {
    text: &'a str,
    lines: Lines<'a>,
    inline: InlineParser,
    /// Nesting contributed by enclosing `>` quotes.
    base_depth: usize,
    root: Vec<Block>,
    containers: Vec<Container>,
    /// Open quote, spoiler and section counts.
    open: [usize; 3],
    paragraph: Option<String>,
    lists: SmallVec<[ListFrame; 4]>,
}

impl<'a> BlockParser<'a> {
    /// Create a new block parser.
    pub fn new(text: &'a str, inline: InlineParser) -> Self {
        Self::nested(text, inline, 0)
    }

    fn nested(text: &'a str, inline: InlineParser, base_depth: usize) -> Self {
        Self {
            text,
            lines: Lines::new(text),
            inline,
            base_depth,
            root: Vec::new(),
            containers: Vec::new(),
            open: [0; 3],
            paragraph: None,
            lists: SmallVec::new(),
        }
    }

    /// Parse the whole input.
    pub fn parse(self) -> Document {
        Document {
            blocks: self.parse_blocks(),
        }
    }

    fn parse_blocks(mut self) -> Vec<Block> {
        while let Some(line) = self.lines.next() {
            self.line(line);
        }

        self.close_leaves();
        while let Some(container) = self.containers.pop() {
            tracing::debug!(tag = ?container.kind.tag(), "block context closed at end of input");
            let block = container.into_block();
            self.push_block(block);
        }
        self.root
    }

    fn depth(&self) -> usize {
        self.base_depth + self.containers.len() + self.lists.len()
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        match self.containers.last_mut() {
            Some(container) => &mut container.blocks,
            None => &mut self.root,
        }
    }

    fn push_block(&mut self, block: Block) {
        self.blocks_mut().push(block);
    }

    fn is_open(&self, kind: TagKind) -> bool {
        slot(kind).is_some_and(|i| self.open[i] > 0)
    }

    /// Continue scanning at `pos`; a blank remainder of its line is skipped.
    fn continue_at(&mut self, pos: usize) {
        let line_end = Cursor::new_at(self.text, pos).line_end();
        if self.text[pos..line_end].trim().is_empty() {
            self.lines.skip_to(line_end + 1);
        } else {
            self.lines.skip_to(pos);
        }
    }

    fn line(&mut self, line: Line) {
        let text = self.text;
        let line_end = line.range.end_usize();

        match line.kind {
            LineKind::Blank => self.close_leaves(),
            LineKind::Header { level, id, content } => {
                self.close_leaves();
                let end = self.segment_end(content, line_end);
                let block = Block::Header {
                    level,
                    id: id.and_then(|r| slug(r.slice(text))),
                    content: self.inline.parse(text[content..end].trim()),
                };
                self.push_block(block);
                self.continue_at(end);
            }
            LineKind::ListItem {
                depth,
                ordered,
                content,
            } => {
                self.close_paragraph();
                let end = self.segment_end(content, line_end);
                let kind = if ordered {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                };
                self.list_item(depth, kind, Range::from_usize(content, end));
                self.continue_at(end);
            }
            LineKind::Quote { content } => self.quote_prefix(content, line),
            LineKind::Tag(tag) => self.block_tag(tag, line),
            LineKind::Plain => self.plain(line),
        }
    }

    fn plain(&mut self, line: Line) {
        let line_end = line.range.end_usize();
        let start = line.indent_end;
        let end = match self.segment_end(start, line_end) {
            end if end > start => end,
            _ => line_end,
        };

        self.close_lists();
        let segment = self.text[start..end].trim_end();
        if !segment.is_empty() {
            match &mut self.paragraph {
                Some(paragraph) => {
                    if line.at_line_start {
                        paragraph.push('\n');
                    }
                    paragraph.push_str(segment);
                }
                None => self.paragraph = Some(segment.to_owned()),
            }
        }
        self.continue_at(end);
    }

    /// Where leaf text starting at `start` stops: the first closer of an
    /// open container, or `end`.
    fn segment_end(&self, start: usize, end: usize) -> usize {
        let text = &self.text[..end];
        let bytes = text.as_bytes();
        let mut pos = start;
        let mut inline_spoilers = 0usize;

        while let Some(offset) = memchr(b'[', &bytes[pos..]) {
            let at = pos + offset;
            let Some(tag) = scanner::scan_tag(text, at) else {
                pos = at + 1;
                continue;
            };

            match (tag.kind, tag.closing) {
                (TagKind::Quote | TagKind::Section, true) if self.is_open(tag.kind) => return at,
                (TagKind::Spoiler, false) => inline_spoilers += 1,
                (TagKind::Spoiler, true) if inline_spoilers > 0 => inline_spoilers -= 1,
                (TagKind::Spoiler, true) if self.is_open(TagKind::Spoiler) => return at,
                // Raw content: closers inside it do not count.
                (TagKind::Code | TagKind::Nodtext, false) => {
                    match scanner::find_closing_tag(text, tag.span.end_usize(), tag.kind) {
                        Some(closer) => {
                            pos = closer.span.end_usize();
                            continue;
                        }
                        None => return end,
                    }
                }
                _ => {}
            }
            pos = tag.span.end_usize();
        }
        end
    }

    fn block_tag(&mut self, tag: Tag, line: Line) {
        let text = self.text;
        let after = tag.span.end_usize();
        let rest_blank = text[after..line.range.end_usize()].trim().is_empty();

        match (tag.kind, tag.closing) {
            (TagKind::Code, false) => self.code_fence(tag),
            (TagKind::Nodtext, false) => self.nodtext_fence(tag),
            (TagKind::Table, false) => self.table_fence(tag),
            (TagKind::Quote, false) => self.open_container(ContainerKind::Quote, tag, line),
            (TagKind::Section, false) => {
                let title = tag
                    .arg
                    .map(|arg| self.inline.parse(arg.slice(text).trim()))
                    .unwrap_or_default();
                let kind = ContainerKind::Section {
                    title,
                    expanded: tag.expanded,
                };
                self.open_container(kind, tag, line);
            }
            (TagKind::Spoiler, false) if rest_blank => self.open_container(ContainerKind::Spoiler, tag, line),
            (TagKind::Tn, false) if rest_blank => self.tn_fence(tag),
            (TagKind::Hr, false) if rest_blank => {
                self.close_leaves();
                self.push_block(Block::HorizontalRule);
                self.continue_at(after);
            }
            (kind, true) if self.is_open(kind) => {
                self.close_until(kind);
                self.continue_at(after);
            }
            // A stray [/spoiler] or [/tn] may still close an inline span.
            (kind, true) if rest_blank && !matches!(kind, TagKind::Spoiler | TagKind::Tn) => {
                tracing::debug!(tag = ?kind, "stray block closer");
                self.close_leaves();
                self.push_block(Block::RawText(tag.span.slice(text).to_owned()));
            }
            _ => self.plain(line),
        }
    }

    fn open_container(&mut self, kind: ContainerKind, tag: Tag, line: Line) {
        if self.depth() >= MAX_BLOCK_NESTING {
            tracing::debug!(depth = self.depth(), "block nesting limit reached");
            return self.plain(line);
        }

        self.close_leaves();
        tracing::debug!(tag = ?tag.kind, depth = self.depth() + 1, "block context opened");
        if let Some(i) = slot(kind.tag()) {
            self.open[i] += 1;
        }
        self.containers.push(Container {
            kind,
            blocks: Vec::new(),
        });
        self.continue_at(tag.span.end_usize());
    }

    /// Close containers down to and including the innermost `kind`.
    fn close_until(&mut self, kind: TagKind) {
        self.close_leaves();
        while let Some(container) = self.containers.pop() {
            let found = container.kind.tag();
            if let Some(i) = slot(found) {
                self.open[i] -= 1;
            }
            if found != kind {
                tracing::debug!(tag = ?found, closer = ?kind, "block context closed by outer closer");
            }
            let block = container.into_block();
            self.push_block(block);
            if found == kind {
                break;
            }
        }
    }

    /// Raw body of a fence opened by `tag`, and the position after its closer.
    fn fence_body(&self, tag: &Tag) -> (Range, usize) {
        let text = self.text;
        let mut start = tag.span.end_usize();
        let line_end = Cursor::new_at(text, start).line_end();
        if text[start..line_end].trim().is_empty() {
            start = (line_end + 1).min(text.len());
        }

        let (mut end, resume) = match scanner::find_closing_tag(text, start, tag.kind) {
            Some(closer) => (closer.span.start_usize(), closer.span.end_usize()),
            None => {
                tracing::debug!(tag = ?tag.kind, "unterminated fence closed at end of input");
                (text.len(), text.len())
            }
        };
        if end > start && text.as_bytes()[end - 1] == b'\n' {
            end -= 1;
        }
        (Range::from_usize(start, end.max(start)), resume)
    }

    fn code_fence(&mut self, tag: Tag) {
        self.close_leaves();
        let text = self.text;
        let (body, resume) = self.fence_body(&tag);
        let language = tag
            .arg
            .map(|arg| arg.slice(text).trim())
            .filter(|lang| {
                !lang.is_empty()
                    && lang
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-'))
            })
            .map(str::to_ascii_lowercase);

        self.push_block(Block::Code {
            language,
            text: body.slice(text).to_owned(),
        });
        self.continue_at(resume);
    }

    fn nodtext_fence(&mut self, tag: Tag) {
        self.close_leaves();
        let (body, resume) = self.fence_body(&tag);
        if !body.is_empty() {
            let raw = body.slice(self.text).to_owned();
            self.push_block(Block::Paragraph(vec![Inline::Text(raw)]));
        }
        self.continue_at(resume);
    }

    fn tn_fence(&mut self, tag: Tag) {
        self.close_leaves();
        let (body, resume) = self.fence_body(&tag);
        let content = self.inline.parse(body.slice(self.text).trim());
        self.push_block(Block::TranslatorNote(content));
        self.continue_at(resume);
    }

    fn table_fence(&mut self, tag: Tag) {
        self.close_leaves();
        let (body, resume) = self.fence_body(&tag);
        let rows = self.table_rows(body);
        self.push_block(Block::Table(rows));
        self.continue_at(resume);
    }

    /// Structure tags inside `[table]`. Text outside cells is dropped.
    fn table_rows(&self, region: Range) -> Vec<TableRow> {
        let text = &self.text[..region.end_usize()];
        let bytes = text.as_bytes();
        let mut rows = Vec::new();
        let mut section = None;
        let mut row: Option<TableRow> = None;
        let mut pos = region.start_usize();

        while let Some(offset) = memchr(b'[', &bytes[pos..]) {
            let at = pos + offset;
            let Some(tag) = scanner::scan_tag(text, at) else {
                pos = at + 1;
                continue;
            };
            pos = tag.span.end_usize();

            match (tag.kind, tag.closing) {
                (TagKind::Thead, false) => {
                    rows.extend(row.take());
                    section = Some(TableSection::Head);
                }
                (TagKind::Tbody, false) => {
                    rows.extend(row.take());
                    section = Some(TableSection::Body);
                }
                (TagKind::Thead | TagKind::Tbody, true) => {
                    rows.extend(row.take());
                    section = None;
                }
                (TagKind::Tr, false) => {
                    rows.extend(row.take());
                    row = Some(TableRow {
                        section,
                        cells: Vec::new(),
                    });
                }
                (TagKind::Tr, true) => rows.extend(row.take()),
                (TagKind::Th | TagKind::Td, false) => {
                    let (content, next) = cell_extent(text, pos, tag.kind);
                    let cell = TableCell {
                        header: tag.kind == TagKind::Th,
                        content: self.inline.parse(content.slice(text).trim()),
                    };
                    row.get_or_insert_with(|| TableRow {
                        section,
                        cells: Vec::new(),
                    })
                    .cells
                    .push(cell);
                    pos = next;
                }
                _ => {}
            }
        }
        rows.extend(row.take());
        rows
    }

    /// Consecutive `>` lines become one quote, parsed as its own document.
    fn quote_prefix(&mut self, content: usize, line: Line) {
        if self.depth() >= MAX_BLOCK_NESTING {
            tracing::debug!(depth = self.depth(), "block nesting limit reached");
            return self.plain(line);
        }

        self.close_leaves();
        let text = self.text;
        let mut body = String::from(&text[content..line.range.end_usize()]);
        loop {
            let saved = self.lines.clone();
            match self.lines.next() {
                Some(Line {
                    kind: LineKind::Quote { content },
                    range,
                    ..
                }) => {
                    body.push('\n');
                    body.push_str(&text[content..range.end_usize()]);
                }
                _ => {
                    self.lines = saved;
                    break;
                }
            }
        }

        let blocks = BlockParser::nested(&body, self.inline, self.depth() + 1).parse_blocks();
        self.push_block(Block::Quote(blocks));
    }

    fn list_item(&mut self, depth: usize, kind: ListKind, content: Range) {
        let room = MAX_BLOCK_NESTING
            .saturating_sub(self.base_depth + self.containers.len())
            .max(1);
        let depth = depth.min(room);

        while self.lists.len() > depth {
            self.pop_list();
        }
        if self.lists.len() == depth && self.lists.last().is_some_and(|frame| frame.kind != kind) {
            self.pop_list();
        }
        while self.lists.len() < depth {
            if let Some(parent) = self.lists.last_mut() {
                if parent.items.is_empty() {
                    parent.items.push(ListItem::default());
                }
            }
            self.lists.push(ListFrame {
                kind,
                items: Vec::new(),
            });
        }

        let content = self.inline.parse(content.slice(self.text).trim());
        if let Some(frame) = self.lists.last_mut() {
            frame.items.push(ListItem {
                children: vec![Block::Paragraph(content)],
            });
        }
    }

    /// Close the innermost list level into its parent item.
    fn pop_list(&mut self) {
        let Some(frame) = self.lists.pop() else {
            return;
        };
        let list = Block::List(List {
            kind: frame.kind,
            items: frame.items,
            depth: self.lists.len() + 1,
        });
        match self.lists.last_mut() {
            Some(parent) => match parent.items.last_mut() {
                Some(item) => item.children.push(list),
                None => parent.items.push(ListItem { children: vec![list] }),
            },
            None => self.push_block(list),
        }
    }

    fn close_lists(&mut self) {
        while !self.lists.is_empty() {
            self.pop_list();
        }
    }

    fn close_paragraph(&mut self) {
        if let Some(paragraph) = self.paragraph.take() {
            let content = self.inline.parse(&paragraph);
            if !content.is_empty() {
                self.push_block(Block::Paragraph(content));
            }
        }
    }

    fn close_leaves(&mut self) {
        self.close_paragraph();
        self.close_lists();
    }
}

/// Extent of a table cell starting at `from`: up to its closer, or up to
/// the next structure tag, which closes it implicitly.
fn cell_extent(text: &str, from: usize, kind: TagKind) -> (Range, usize) {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(offset) = memchr(b'[', &bytes[pos..]) {
        let at = pos + offset;
        if let Some(tag) = scanner::scan_tag(text, at) {
            if matches!(
                tag.kind,
                TagKind::Td | TagKind::Th | TagKind::Tr | TagKind::Thead | TagKind::Tbody
            ) {
                let next = if tag.closing && tag.kind == kind {
                    tag.span.end_usize()
                } else {
                    at
                };
                return (Range::from_usize(from, at), next);
            }
        }
        pos = at + 1;
    }
    (Range::from_usize(from, text.len()), text.len())
}
