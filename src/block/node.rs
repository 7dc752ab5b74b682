//! Block node types.

use crate::inline::Inline;

/// Root of a parse: the top-level blocks in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub kind: ListKind,
    pub items: Vec<ListItem>,
    /// 1 for a top-level list.
    pub depth: usize,
}

/// A list item. Its leading paragraph renders without `<p>`; nested lists
/// follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSection {
    Head,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// `None` for rows outside `[thead]`/`[tbody]`.
    pub section: Option<TableSection>,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// `[th]` rather than `[td]`.
    pub header: bool,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Header {
        level: u8,
        /// Slugged anchor from `h2#anchor.`
        id: Option<String>,
        content: Vec<Inline>,
    },
    List(List),
    Quote(Vec<Block>),
    Spoiler(Vec<Block>),
    Code {
        language: Option<String>,
        text: String,
    },
    Table(Vec<TableRow>),
    /// `[section]` / `[expand]`
    Section {
        title: Vec<Inline>,
        expanded: bool,
        body: Vec<Block>,
    },
    /// `[tn]` alone on a line: a translator note paragraph.
    TranslatorNote(Vec<Inline>),
    HorizontalRule,
    /// A line that matched no structure, kept verbatim.
    RawText(String),
}
