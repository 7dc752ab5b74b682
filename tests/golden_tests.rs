//! Golden corpus: fixed input/output pairs that lock down recovery policy.
//!
//! Cases live in `tests/golden.json`; flags default to `Options::default()`.

use dtext::{Options, parse};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct GoldenCase {
    name: String,
    input: String,
    html: String,
    #[serde(default)]
    strip: bool,
    #[serde(default)]
    inline: bool,
    #[serde(default)]
    disable_mentions: bool,
    #[serde(default)]
    allow_color: bool,
    max_thumbs: Option<usize>,
}

impl GoldenCase {
    fn options(&self) -> Options {
        let defaults = Options::default();
        Options {
            strip: self.strip,
            inline: self.inline,
            disable_mentions: self.disable_mentions,
            allow_color: self.allow_color,
            max_thumbs: self.max_thumbs.unwrap_or(defaults.max_thumbs),
        }
    }
}

fn load_cases() -> Vec<GoldenCase> {
    let json = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/golden.json"))
        .expect("Failed to read tests/golden.json");
    serde_json::from_str(&json).expect("Failed to parse golden.json")
}

#[test]
fn golden_corpus() {
    let cases = load_cases();
    assert!(!cases.is_empty());

    let mut failures = Vec::new();
    for case in &cases {
        let rendered = parse(case.input.as_bytes(), &case.options()).unwrap();
        if rendered.html != case.html {
            failures.push(format!(
                "{}\n  input:    {:?}\n  expected: {:?}\n  got:      {:?}",
                case.name, case.input, case.html, rendered.html
            ));
        }
    }
    assert!(failures.is_empty(), "{} golden case(s) failed:\n{}", failures.len(), failures.join("\n"));
}

#[test]
fn golden_output_is_stable() {
    for case in load_cases() {
        let options = case.options();
        let first = parse(case.input.as_bytes(), &options).unwrap();
        let second = parse(case.input.as_bytes(), &options).unwrap();
        assert_eq!(first, second, "{}", case.name);
    }
}
