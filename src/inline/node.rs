//! Inline node types.

/// Formatting span kinds, each opened by a bracket tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// `[b]` → `<strong>`
    Bold,
    /// `[i]` → `<em>`
    Italic,
    /// `[u]`
    Underline,
    /// `[s]`
    Strikethrough,
    /// `[spoiler]` → `<span class="spoiler">`
    Spoiler,
    /// `[sup]`
    Superscript,
    /// `[sub]`
    Subscript,
    /// `[tn]` → `<span class="tn">`
    TranslatorNote,
}

/// Kinds of `keyword #id` links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdLinkKind {
    Post,
    PostChanges,
    Flag,
    Note,
    Forum,
    Topic,
    Comment,
    Pool,
    User,
    Artist,
    Ban,
    Bur,
    Alias,
    Implication,
    ModAction,
    Record,
    Wiki,
    Set,
    Blip,
    Ticket,
    Takedown,
}

impl IdLinkKind {
    /// Every kind, longest keyword first where keywords share a prefix.
    pub const ALL: [IdLinkKind; 21] = [
        IdLinkKind::PostChanges,
        IdLinkKind::Post,
        IdLinkKind::Flag,
        IdLinkKind::Note,
        IdLinkKind::Forum,
        IdLinkKind::Topic,
        IdLinkKind::Comment,
        IdLinkKind::Pool,
        IdLinkKind::User,
        IdLinkKind::Artist,
        IdLinkKind::Ban,
        IdLinkKind::Bur,
        IdLinkKind::Alias,
        IdLinkKind::Implication,
        IdLinkKind::ModAction,
        IdLinkKind::Record,
        IdLinkKind::Wiki,
        IdLinkKind::Set,
        IdLinkKind::Blip,
        IdLinkKind::Ticket,
        IdLinkKind::Takedown,
    ];

    /// Keyword as written in markup and echoed in the link text.
    pub const fn keyword(self) -> &'static str {
        match self {
            IdLinkKind::Post => "post",
            IdLinkKind::PostChanges => "post changes",
            IdLinkKind::Flag => "flag",
            IdLinkKind::Note => "note",
            IdLinkKind::Forum => "forum",
            IdLinkKind::Topic => "topic",
            IdLinkKind::Comment => "comment",
            IdLinkKind::Pool => "pool",
            IdLinkKind::User => "user",
            IdLinkKind::Artist => "artist",
            IdLinkKind::Ban => "ban",
            IdLinkKind::Bur => "BUR",
            IdLinkKind::Alias => "alias",
            IdLinkKind::Implication => "implication",
            IdLinkKind::ModAction => "mod action",
            IdLinkKind::Record => "record",
            IdLinkKind::Wiki => "wiki",
            IdLinkKind::Set => "set",
            IdLinkKind::Blip => "blip",
            IdLinkKind::Ticket => "ticket",
            IdLinkKind::Takedown => "takedown",
        }
    }

    /// Path prefix the id is appended to.
    pub const fn path(self) -> &'static str {
        match self {
            IdLinkKind::Post => "/posts/",
            IdLinkKind::PostChanges => "/post_versions?search[post_id]=",
            IdLinkKind::Flag => "/post_flags/",
            IdLinkKind::Note => "/notes/",
            IdLinkKind::Forum => "/forum_posts/",
            IdLinkKind::Topic => "/forum_topics/",
            IdLinkKind::Comment => "/comments/",
            IdLinkKind::Pool => "/pools/",
            IdLinkKind::User => "/users/",
            IdLinkKind::Artist => "/artists/",
            IdLinkKind::Ban => "/bans/",
            IdLinkKind::Bur => "/bulk_update_requests/",
            IdLinkKind::Alias => "/tag_aliases/",
            IdLinkKind::Implication => "/tag_implications/",
            IdLinkKind::ModAction => "/mod_actions/",
            IdLinkKind::Record => "/user_feedbacks/",
            IdLinkKind::Wiki => "/wiki_pages/",
            IdLinkKind::Set => "/post_sets/",
            IdLinkKind::Blip => "/blips/",
            IdLinkKind::Ticket => "/tickets/",
            IdLinkKind::Takedown => "/takedowns/",
        }
    }

    /// Full class attribute of the rendered link.
    pub const fn class(self) -> &'static str {
        match self {
            IdLinkKind::Post => "dtext-link dtext-id-link dtext-post-id-link",
            IdLinkKind::PostChanges => "dtext-link dtext-id-link dtext-post-changes-for-id-link",
            IdLinkKind::Flag => "dtext-link dtext-id-link dtext-post-flag-id-link",
            IdLinkKind::Note => "dtext-link dtext-id-link dtext-note-id-link",
            IdLinkKind::Forum => "dtext-link dtext-id-link dtext-forum-post-id-link",
            IdLinkKind::Topic => "dtext-link dtext-id-link dtext-forum-topic-id-link",
            IdLinkKind::Comment => "dtext-link dtext-id-link dtext-comment-id-link",
            IdLinkKind::Pool => "dtext-link dtext-id-link dtext-pool-id-link",
            IdLinkKind::User => "dtext-link dtext-id-link dtext-user-id-link",
            IdLinkKind::Artist => "dtext-link dtext-id-link dtext-artist-id-link",
            IdLinkKind::Ban => "dtext-link dtext-id-link dtext-ban-id-link",
            IdLinkKind::Bur => "dtext-link dtext-id-link dtext-bulk-update-request-id-link",
            IdLinkKind::Alias => "dtext-link dtext-id-link dtext-tag-alias-id-link",
            IdLinkKind::Implication => "dtext-link dtext-id-link dtext-tag-implication-id-link",
            IdLinkKind::ModAction => "dtext-link dtext-id-link dtext-mod-action-id-link",
            IdLinkKind::Record => "dtext-link dtext-id-link dtext-user-feedback-id-link",
            IdLinkKind::Wiki => "dtext-link dtext-id-link dtext-wiki-page-id-link",
            IdLinkKind::Set => "dtext-link dtext-id-link dtext-set-id-link",
            IdLinkKind::Blip => "dtext-link dtext-id-link dtext-blip-id-link",
            IdLinkKind::Ticket => "dtext-link dtext-id-link dtext-ticket-id-link",
            IdLinkKind::Takedown => "dtext-link dtext-id-link dtext-takedown-id-link",
        }
    }
}

/// What a media embed points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaKind {
    /// `thumb #123`: a post thumbnail.
    Post,
}

impl MediaKind {
    /// The id link a capped embed falls back to.
    pub const fn fallback(self) -> IdLinkKind {
        match self {
            MediaKind::Post => IdLinkKind::Post,
        }
    }
}

/// Tag categories with a stylesheet colour class, as accepted in
/// `[color=...]`.
const COLOR_CATEGORIES: [&str; 15] = [
    "art", "artist", "char", "character", "copy", "copyright", "spec", "species", "gen", "general",
    "meta", "inv", "invalid", "lor", "lore",
];

/// Longest CSS colour keyword accepted.
const MAX_COLOR_NAME: usize = 20;

/// Argument of a `[color=...]` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// Tag category name, rendered as a `dtext-color-*` class.
    Category(&'static str),
    /// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or a keyword like `red`,
    /// rendered as an inline `color:` style.
    Css(String),
}

impl Color {
    /// Accept only forms that are safe inside a class or style attribute.
    ///
    /// ```
    /// use dtext::inline::Color;
    ///
    /// assert_eq!(Color::parse("Artist"), Some(Color::Category("artist")));
    /// assert_eq!(Color::parse("#FFaa00"), Some(Color::Css("#ffaa00".into())));
    /// assert_eq!(Color::parse("red;x:y"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(&name) = COLOR_CATEGORIES.iter().find(|&&name| name == value) {
            return Some(Color::Category(name));
        }

        let valid = match value.strip_prefix('#') {
            Some(hex) => matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit()),
            None => {
                (1..=MAX_COLOR_NAME).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_lowercase())
            }
        };
        valid.then_some(Color::Css(value))
    }
}

/// Inline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    LineBreak,
    Span {
        kind: SpanKind,
        children: Vec<Inline>,
    },
    /// Raw content, never parsed.
    Code(String),
    Link {
        href: String,
        children: Vec<Inline>,
    },
    /// `[color=...]`; rendered only when colours are allowed.
    Color {
        color: Color,
        children: Vec<Inline>,
    },
    Mention(String),
    WikiLink {
        title: String,
        label: Option<String>,
    },
    PostSearch {
        tags: String,
        label: Option<String>,
    },
    IdLink {
        kind: IdLinkKind,
        id: u64,
    },
    MediaEmbed {
        id: u64,
        kind: MediaKind,
    },
    /// `[#name]` → `<a id="name"></a>`
    Anchor(String),
}

/// Append text to `out`, merging with a trailing text node.
pub fn push_text(out: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(Inline::Text(last)) => last.push_str(text),
        _ => out.push(Inline::Text(text.to_owned())),
    }
}

/// Append a node, merging adjacent text.
pub fn push_inline(out: &mut Vec<Inline>, node: Inline) {
    match node {
        Inline::Text(text) => push_text(out, &text),
        node => out.push(node),
    }
}

/// Wiki title normalization: trimmed, lowercase, spaces to underscores.
///
/// ```
/// assert_eq!(dtext::inline::normalize_wiki_title("  Blue Eyes "), "blue_eyes");
/// ```
pub fn normalize_wiki_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}
