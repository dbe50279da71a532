//! # Parser
//!
//! Text extraction helpers for the story pipeline: paragraph text from article HTML,
//! ranked story entries from the HackerNews digest issues published on GitHub, and the
//! headline links of the Ben's Bites and BBC News front pages.

use std::sync::LazyLock;

use regex::Regex;
use story_datastore::Story;

use crate::error::ParseError;

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)\s*>").unwrap());

static DIGEST_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+)\.\s+\*\*\[(.+?)\]\((.+?)\)\*\*\n(\d+) points by .+? \| \[(\d+) comments\]\((.+?)\)",
    )
    .unwrap()
});

static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h3(?:\s[^>]*)?>(.*?)</h3\s*>").unwrap());

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#).unwrap());

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a(\s[^>]*)>(.*?)</a\s*>").unwrap());

static ATTR_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bhref\s*=\s*["']([^"']+)["']"#).unwrap());

static PROMO_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*["'][^"']*\bgs-c-promo-heading__title\b[^"']*["'][^>]*>(.*)"#)
        .unwrap()
});

/// A headline and the link it points to, as found in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    /// Raw `href`, possibly relative to the page
    pub href: String,
}

/// One ranked entry of a digest issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub points: u32,
    pub comments: u32,
    pub comments_url: String,
}

impl From<DigestEntry> for Story {
    fn from(entry: DigestEntry) -> Self {
        Story::new(entry.title, entry.url)
    }
}

/// Extracts the visible text of every `<p>` element, joined with single spaces.
///
/// Nested tags are stripped, common entities decoded and whitespace runs collapsed.
/// Paragraphs that end up empty are dropped.
pub fn extract_paragraphs(html: &str) -> String {
    let html = SCRIPT_RE.replace_all(html, " ");

    PARAGRAPH_RE
        .captures_iter(&html)
        .filter_map(|cap| cap.get(1))
        .map(|m| element_text(m.as_str()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the ranked entries out of a digest issue body.
///
/// A body that contains no entry at all is rejected, since that usually means the
/// issue format changed.
#[tracing::instrument(skip(body))]
pub fn parse_digest_issue(body: &str) -> Result<Vec<DigestEntry>, ParseError> {
    // GitHub bodies come back with CRLF line endings
    let body = body.replace("\r\n", "\n");

    let entries = DIGEST_ENTRY_RE
        .captures_iter(&body)
        .filter_map(|cap| {
            Some(DigestEntry {
                rank: cap[1].parse().ok()?,
                title: cap[2].trim().to_string(),
                url: cap[3].trim().to_string(),
                points: cap[4].parse().ok()?,
                comments: cap[5].parse().ok()?,
                comments_url: cap[6].trim().to_string(),
            })
        })
        .collect::<Vec<_>>();

    if entries.is_empty() {
        return Err(ParseError::Malformed(
            "No ranked entries found in digest issue body, format might have changed",
        ));
    }

    Ok(entries)
}

/// Headlines of the Ben's Bites news page: every `<h3>` holding a link.
///
/// The title is the full text of the heading, the link its first anchor.
#[tracing::instrument(skip(html))]
pub fn parse_bensbites_posts(html: &str) -> Result<Vec<Headline>, ParseError> {
    let headlines = H3_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let inner = cap.get(1)?.as_str();
            let href = HREF_RE.captures(inner)?.get(1)?.as_str().trim().to_string();
            let title = element_text(inner);
            (!title.is_empty()).then_some(Headline { title, href })
        })
        .collect::<Vec<_>>();

    if headlines.is_empty() {
        return Err(ParseError::Malformed(
            "No linked <h3> headlines found on Ben's Bites page, layout might have changed",
        ));
    }

    Ok(headlines)
}

/// Promo headlines of the BBC News front page.
///
/// Each promo is an anchor wrapping an element classed `gs-c-promo-heading__title`.
#[tracing::instrument(skip(html))]
pub fn parse_bbc_promos(html: &str) -> Result<Vec<Headline>, ParseError> {
    let html = SCRIPT_RE.replace_all(html, " ");

    let headlines = ANCHOR_RE
        .captures_iter(&html)
        .filter_map(|cap| {
            let href = ATTR_HREF_RE.captures(cap.get(1)?.as_str())?.get(1)?.as_str();
            let heading = PROMO_TITLE_RE.captures(cap.get(2)?.as_str())?.get(1)?.as_str();
            let title = element_text(heading);
            (!title.is_empty()).then(|| Headline {
                title,
                href: href.trim().to_string(),
            })
        })
        .collect::<Vec<_>>();

    if headlines.is_empty() {
        return Err(ParseError::Malformed(
            "No promo headlines found on BBC News page, layout might have changed",
        ));
    }

    Ok(headlines)
}

fn element_text(html: &str) -> String {
    collapse_whitespace(&decode_entities(&TAG_RE.replace_all(html, " ")))
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
