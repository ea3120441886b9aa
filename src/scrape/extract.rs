//! Pulling the latest event announcement out of the page markup.
//!
//! The promo page has no stable element structure to anchor on, so
//! extraction works over the rendered text: find the event date range
//! first, fall back to keyword-bearing content, give up (and let the
//! watcher log a structure change) when neither matches.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}\.\d{1,2}\.\d{4}\s+\d{1,2}:\d{2}\s*-\s*\d{1,2}:\d{2}")
        .expect("date range pattern is valid")
});

/// Lines carrying these mention the promo mechanics.
const PROMO_KEYWORDS: [&str; 5] = ["bonus", "navíc", "dobij", "kredit", "kč"];

/// Fallback relevance filter when no event date is on the page.
const CONTENT_KEYWORDS: [&str; 4] = ["kaktus", "dobíj", "kredit", "akce"];

#[derive(Debug, Clone, PartialEq)]
pub struct PageAnnouncement {
    pub title: String,
    pub body: String,
}

/// Extracts the current announcement from the page markup.
///
/// Returns `None` when the page no longer matches any known shape.
pub fn extract_announcement(html: &str) -> Option<PageAnnouncement> {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");

    if let Some(date_range) = DATE_RANGE.find(&text) {
        return Some(PageAnnouncement {
            title: format!("Dobíječka {}", date_range.as_str()),
            body: promo_body(&text),
        });
    }

    let content = matching_lines(&text, &CONTENT_KEYWORDS, 20, usize::MAX);
    if content.is_empty() {
        return None;
    }
    Some(PageAnnouncement {
        title: "Kaktus - aktuální nabídka".to_string(),
        body: content.join(" "),
    })
}

fn promo_body(text: &str) -> String {
    let lines = matching_lines(text, &PROMO_KEYWORDS, 10, 200);
    if lines.is_empty() {
        "Kaktus dobíjení akce".to_string()
    } else {
        lines.join(" ")
    }
}

fn matching_lines<'a>(
    text: &'a str,
    keywords: &[&str],
    min_len: usize,
    max_len: usize,
) -> Vec<&'a str> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let chars = line.chars().count();
            chars > min_len && chars < max_len
        })
        .filter(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .take(3)
        .collect()
}
