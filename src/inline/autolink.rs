//! Autolinking inside plain text: bare URLs, `@mentions`, `keyword #id`
//! links and `thumb #id` media embeds.

use memchr::memchr;

use super::node::{IdLinkKind, Inline, MediaKind, push_inline, push_text};
use crate::cursor::Cursor;
use crate::limits::{MAX_ID_DIGITS, MAX_MENTION_LEN};
use crate::scanner::scan_url;
use crate::Range;

/// Split `range` of `text` into text and autolinked nodes.
pub(super) fn scan(text: &str, range: Range, mentions: bool, out: &mut Vec<Inline>) {
    // Never look past the token.
    let seg = &text[..range.end_usize()];
    let bytes = seg.as_bytes();
    let has_hash = memchr(b'#', &bytes[range.start_usize()..]).is_some();

    let mut pos = range.start_usize();
    let mut text_start = pos;
    while pos < bytes.len() {
        let b = bytes[pos];
        let prev = pos.checked_sub(1).map(|p| bytes[p]);

        let matched = match b {
            b'h' | b'H' if !prev.is_some_and(|p| p.is_ascii_alphanumeric()) => url(seg, pos),
            b'@' if mentions && word_boundary(prev) => mention(seg, pos),
            _ if has_hash && b.is_ascii_alphabetic() && word_boundary(prev) => id_link(seg, pos),
            _ => None,
        };

        match matched {
            Some((node, next)) => {
                push_text(out, &seg[text_start..pos]);
                push_inline(out, node);
                pos = next;
                text_start = next;
            }
            None => pos += 1,
        }
    }
    push_text(out, &seg[text_start..]);
}

/// Start of input, or a byte that cannot be part of a word.
fn word_boundary(prev: Option<u8>) -> bool {
    prev.is_none_or(|b| !(b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80))
}

fn url(seg: &str, at: usize) -> Option<(Inline, usize)> {
    let cursor = Cursor::new_at(seg, at);
    let scheme_len = if cursor.starts_with_ignore_case(b"https://") {
        8
    } else if cursor.starts_with_ignore_case(b"http://") {
        7
    } else {
        return None;
    };

    let end = scan_url(seg, at);
    if end <= at + scheme_len {
        return None;
    }
    let url = &seg[at..end];
    Some((
        Inline::Link {
            href: url.to_owned(),
            children: vec![Inline::Text(url.to_owned())],
        },
        end,
    ))
}

fn is_mention_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !matches!(
            c,
            '<' | '>' | '"' | '\'' | '[' | ']' | '{' | '}' | '(' | ')' | '`' | '@' | ',' | ';' | '&' | '|'
                | '\u{3000}'..='\u{303F}'
        )
}

fn mention(seg: &str, at: usize) -> Option<(Inline, usize)> {
    let start = at + 1;
    let mut end = start;
    for (i, c) in seg[start..].char_indices() {
        if !is_mention_char(c) {
            break;
        }
        end = start + i + c.len_utf8();
    }
    while end > start && matches!(seg.as_bytes()[end - 1], b'.' | b':' | b'!' | b'?') {
        end -= 1;
    }

    let name = &seg[start..end];
    let first = name.chars().next()?;
    if !(first.is_alphanumeric() || first == '_') || name.len() > MAX_MENTION_LEN {
        return None;
    }
    Some((Inline::Mention(name.to_owned()), end))
}

fn id_link(seg: &str, at: usize) -> Option<(Inline, usize)> {
    let mut cursor = Cursor::new_at(seg, at);
    if cursor.eat_ignore_case(b"thumb #") {
        let (id, end) = id_number(cursor)?;
        return Some((
            Inline::MediaEmbed {
                id,
                kind: MediaKind::Post,
            },
            end,
        ));
    }

    IdLinkKind::ALL.iter().find_map(|&kind| {
        let mut cursor = Cursor::new_at(seg, at);
        if !(cursor.eat_ignore_case(kind.keyword().as_bytes()) && cursor.eat_ignore_case(b" #")) {
            return None;
        }
        let (id, end) = id_number(cursor)?;
        Some((Inline::IdLink { kind, id }, end))
    })
}

fn id_number(mut cursor: Cursor<'_>) -> Option<(u64, usize)> {
    let start = cursor.pos();
    let digits = cursor.skip_while(|b| b.is_ascii_digit());
    if digits == 0 || digits > MAX_ID_DIGITS {
        return None;
    }
    if cursor.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }

    let mut id: u64 = 0;
    for &b in cursor.since(start) {
        id = id * 10 + u64::from(b - b'0');
    }
    Some((id, cursor.pos()))
}
