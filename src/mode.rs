//! Per-call configuration and the state it drives: the thumbnail budget and
//! the reference channel.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::inline::normalize_wiki_title;

/// Rendering options, consumed once at the start of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Plain-text output: no tags, blocks separated by newlines.
    pub strip: bool,
    /// Treat the whole input as one inline run; block syntax stays literal.
    pub inline: bool,
    /// Leave `@name` as literal text.
    pub disable_mentions: bool,
    /// Render `[color=...]` spans. When unset the tags are dropped and
    /// their content renders plain.
    pub allow_color: bool,
    /// Rich media embeds allowed per document. 0 disables them.
    pub max_thumbs: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strip: false,
            inline: false,
            disable_mentions: false,
            allow_color: false,
            max_thumbs: 25,
        }
    }
}

/// Running count of rich embeds left in this document.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailBudget {
    remaining: usize,
}

impl ThumbnailBudget {
    pub fn new(max_thumbs: usize) -> Self {
        Self {
            remaining: max_thumbs,
        }
    }

    /// Spend one embed. Returns `false` once the cap is reached.
    pub fn take(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                true
            }
            None => false,
        }
    }
}

/// Entities referenced by a document, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct References {
    /// Mentioned user names, as written.
    pub mentions: Vec<String>,
    /// Wiki titles, normalized (lowercase, spaces as `_`).
    pub wiki_titles: Vec<String>,
    /// Post ids of rich embeds, one entry per rendered embed.
    pub post_ids: Vec<u64>,
}

impl References {
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty() && self.wiki_titles.is_empty() && self.post_ids.is_empty()
    }
}

/// Builds [`References`] during the emitter walk.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    refs: References,
    mentions: FxHashSet<String>,
    wiki_titles: FxHashSet<String>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mention(&mut self, name: &str) {
        if self.mentions.insert(name.to_owned()) {
            self.refs.mentions.push(name.to_owned());
        }
    }

    /// Record a wiki title; it is normalized first.
    pub fn wiki_title(&mut self, title: &str) {
        let title = normalize_wiki_title(title);
        if !title.is_empty() && self.wiki_titles.insert(title.clone()) {
            self.refs.wiki_titles.push(title);
        }
    }

    /// Record a rendered embed. Repeats are kept.
    pub fn post(&mut self, id: u64) {
        self.refs.post_ids.push(id);
    }

    pub fn finish(self) -> References {
        self.refs
    }
}

/// Output of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// HTML fragment, or escaped plain text in strip mode.
    pub html: String,
    pub references: References,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.max_thumbs, 25);
        assert!(!options.strip && !options.inline && !options.disable_mentions);
        assert!(!options.allow_color);
    }

    #[test]
    fn test_budget_runs_out() {
        let mut budget = ThumbnailBudget::new(2);
        assert!(budget.take());
        assert!(budget.take());
        assert!(!budget.take());
        assert!(!budget.take());
    }

    #[test]
    fn test_zero_budget() {
        assert!(!ThumbnailBudget::new(0).take());
    }

    #[test]
    fn test_references_dedup_in_order() {
        let mut refs = ReferenceCollector::new();
        refs.mention("bob");
        refs.mention("alice");
        refs.mention("bob");
        refs.wiki_title("Tag Group");
        refs.wiki_title("tag_group");
        refs.post(3);
        refs.post(1);
        refs.post(3);

        let refs = refs.finish();
        assert_eq!(refs.mentions, ["bob", "alice"]);
        assert_eq!(refs.wiki_titles, ["tag_group"]);
        assert_eq!(refs.post_ids, [3, 1, 3]);
    }

    #[test]
    fn test_references_serialize() {
        let refs = References {
            mentions: vec!["bob".into()],
            wiki_titles: Vec::new(),
            post_ids: vec![7],
        };
        assert_eq!(
            serde_json::to_string(&refs).unwrap(),
            r#"{"mentions":["bob"],"wiki_titles":[],"post_ids":[7]}"#
        );
    }
}
