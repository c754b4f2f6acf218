//! Text normalisation applied before chunking.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static PAGE_NUMBER_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\d+\s*\n").expect("page number regex is valid"));
static PAGE_OF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)page \d+ of \d+").expect("page-of regex is valid"));
static DOT_LEADERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{4,}").expect("dot leader regex is valid"));
static DASH_RULES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{4,}").expect("dash rule regex is valid"));
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex is valid"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex is valid"));
static PHONES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("us phone regex is valid"),
        Regex::new(r"\(\d{3}\)\s*\d{3}[-.]?\d{4}\b").expect("parenthesised phone regex is valid"),
        Regex::new(r"\+\d{1,3}\s?\d{1,14}\b").expect("international phone regex is valid"),
    ]
});
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("space regex is valid"));
static MULTI_BLANK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("blank line regex is valid"));
static ANY_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
static SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^a-zA-Z0-9\s.,;:!?'"\-()\[\]]"#).expect("special char regex is valid"));

#[derive(Debug, Clone)]
pub struct TextCleaner {
    pub remove_urls: bool,
    pub remove_emails: bool,
    pub remove_phone_numbers: bool,
    pub normalize_whitespace: bool,
    pub remove_special_chars: bool,
    /// Keep paragraph breaks when normalising whitespace.
    pub preserve_structure: bool,
    pub min_line_length: usize,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self {
            remove_urls: true,
            remove_emails: true,
            remove_phone_numbers: false,
            normalize_whitespace: true,
            remove_special_chars: false,
            preserve_structure: true,
            min_line_length: 10,
        }
    }
}

impl TextCleaner {
    /// Also strips phone numbers and special characters, and drops lines
    /// shorter than 20 characters.
    pub fn aggressive() -> Self {
        Self { remove_phone_numbers: true, remove_special_chars: true, min_line_length: 20, ..Self::default() }
    }

    pub fn clean(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let mut text = remove_pdf_artifacts(text);
        text = remove_headers_footers(&text);
        if self.remove_urls {
            text = URL.replace_all(&text, "").into_owned();
        }
        if self.remove_emails {
            text = EMAIL.replace_all(&text, "").into_owned();
        }
        if self.remove_phone_numbers {
            for re in PHONES.iter() {
                text = re.replace_all(&text, "").into_owned();
            }
        }
        if self.normalize_whitespace {
            text = if self.preserve_structure {
                let t = MULTI_SPACE.replace_all(&text, " ");
                MULTI_BLANK.replace_all(&t, "\n\n").into_owned()
            } else {
                ANY_WHITESPACE.replace_all(&text, " ").into_owned()
            };
        }
        if self.min_line_length > 0 {
            text = remove_short_lines(&text, self.min_line_length);
        }
        if self.remove_special_chars {
            text = SPECIAL.replace_all(&text, "").into_owned();
        }
        text.trim().to_string()
    }
}

fn remove_pdf_artifacts(text: &str) -> String {
    let text = text.replace('\u{c}', "\n");
    let text = PAGE_NUMBER_LINE.replace_all(&text, "\n");
    let text = PAGE_OF.replace_all(&text, "");
    let text = DOT_LEADERS.replace_all(&text, " ");
    DASH_RULES.replace_all(&text, " ").into_owned()
}

/// Drops short lines that repeat often enough to look like running
/// headers or footers.
fn remove_headers_footers(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 10 {
        return text.to_string();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in &lines {
        let l = line.trim();
        if l.chars().count() > 5 {
            *counts.entry(l).or_default() += 1;
        }
    }
    let threshold = (lines.len() / 20).max(3);
    let frequent: HashSet<&str> = counts.into_iter().filter(|(_, c)| *c >= threshold).map(|(l, _)| l).collect();
    lines
        .into_iter()
        .filter(|line| {
            let l = line.trim();
            !frequent.contains(l) || l.chars().count() > 50
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn remove_short_lines(text: &str, min_length: usize) -> String {
    text.split('\n')
        .filter(|line| {
            let l = line.trim();
            l.is_empty() || l.chars().count() >= min_length
        })
        .collect::<Vec<_>>()
        .join("\n")
}
