//! Block-level parser for DText.
//!
//! The block parser is line-oriented and handles:
//! - Headers (`h1.` .. `h6.`, with optional `#anchor`)
//! - `*` and `#` lists
//! - `>` quote lines and `[quote]` containers
//! - `[section]`/`[expand]` and block `[spoiler]` containers
//! - `[code]`, `[nodtext]`, `[table]` and block `[tn]` fences
//! - `[hr]` rules
//! - Paragraphs

mod node;
mod parser;

pub use node::{Block, Document, List, ListItem, ListKind, TableCell, TableRow, TableSection};
pub use parser::BlockParser;
