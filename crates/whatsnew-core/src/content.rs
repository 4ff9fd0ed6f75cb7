//! Article body rewriting.
//!
//! Feed descriptions are HTML fragments authored against the help centre, so
//! images and links are often root-relative. These helpers patch the markup
//! textually; nothing here parses or renders HTML.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ROOT_RELATIVE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(src|href)="/([^"]*)""#).expect("valid root-relative regex")
});

static ANCHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a\b([^>]*)>").expect("valid anchor regex"));

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b([^>]*)>").expect("valid img regex"));

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Decode HTML entities (`&amp;`, `&#8217;`, ...) in feed text.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Make root-relative `src="/..."` and `href="/..."` references absolute
/// against `host`. Protocol-relative references (`//cdn...`) are left alone.
pub fn rewrite_relative_urls(content: &str, host: &str) -> String {
    let host = host.trim_end_matches('/');
    ROOT_RELATIVE_REF
        .replace_all(content, |caps: &Captures| {
            let attr = &caps[1];
            let path = &caps[2];
            if path.starts_with('/') {
                caps[0].to_string()
            } else {
                format!(r#"{attr}="{host}/{path}""#)
            }
        })
        .into_owned()
}

/// Add `target="_blank"` to anchors that do not declare a target.
pub fn open_links_in_new_tab(content: &str) -> String {
    add_attribute(&ANCHOR_TAG, content, "<a", "target", r#"target="_blank""#)
}

/// Add `loading="lazy"` to images that do not declare a loading strategy.
pub fn lazy_load_images(content: &str) -> String {
    add_attribute(&IMG_TAG, content, "<img", "loading", r#"loading="lazy""#)
}

/// Remove every `<img>` tag, for compact previews.
pub fn strip_images(content: &str) -> String {
    IMG_TAG.replace_all(content, "").into_owned()
}

/// Plain-text card preview of at most `max_chars` characters.
///
/// Images are stripped first so their markup never leaks into the text, then
/// the remaining tags are removed and whitespace collapsed. Truncated text
/// ends in `...`.
pub fn preview_text(content: &str, max_chars: usize) -> String {
    let without_images = strip_images(content);
    let text = ANY_TAG.replace_all(&without_images, " ");
    let words: Vec<&str> = text.split_whitespace().collect();
    let flat = words.join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Full description treatment applied during aggregation.
pub fn prepare_description(raw: &str, host: &str) -> String {
    let decoded = decode_entities(raw);
    open_links_in_new_tab(&rewrite_relative_urls(&decoded, host))
}

fn add_attribute(tag: &Regex, content: &str, open: &str, name: &str, attr: &str) -> String {
    let rewritten: Cow<'_, str> = tag.replace_all(content, |caps: &Captures| {
        let inner = &caps[1];
        if inner.to_ascii_lowercase().contains(&format!("{name}=")) {
            return caps[0].to_string();
        }
        match inner.strip_suffix('/') {
            Some(body) => format!("{open}{} {attr} />", body.trim_end()),
            None => format!("{open}{inner} {attr}>"),
        }
    });
    rewritten.into_owned()
}
