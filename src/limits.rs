//! DoS prevention constants.
//!
//! These limits keep every parse linear in the input size regardless of
//! how adversarial the markup is.

/// Maximum nesting depth for block containers (quotes, spoilers, sections,
/// `>` quoting and list depth combined)
pub const MAX_BLOCK_NESTING: usize = 512;

/// Maximum nesting depth for inline spans ([b], [i], [url=] ...)
pub const MAX_INLINE_NESTING: usize = 512;

/// Longest bracket tag the scanner will look at, `[` through `]`.
/// Longer candidates are literal text.
pub const MAX_TAG_LEN: usize = 256;

/// Longest `[[wiki]]` or `{{search}}` body.
pub const MAX_LINK_BODY_LEN: usize = 1024;

/// Maximum digits in an id link (`post #123`); keeps ids inside u64
pub const MAX_ID_DIGITS: usize = 18;

/// Longest username recognized after `@`
pub const MAX_MENTION_LEN: usize = 100;

/// Input bytes past this point are dropped before parsing
pub const MAX_INPUT_LEN: usize = 64 * 1024 * 1024;

/// Emitter recursion guard. The parser caps keep real trees well below it,
/// so crossing it means the tree was built wrong.
pub const MAX_EMIT_DEPTH: usize = MAX_BLOCK_NESTING * 2 + MAX_INLINE_NESTING + 16;
