//! Rewrites article markdown and derives the plain-text strings used for
//! previews and page metadata.

use std::{collections::HashSet, sync::LazyLock};

use log::warn;
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

use crate::images::ImageRegistry;

/// Sentences of this many characters or fewer are not worth a description.
const MIN_SENTENCE_LENGTH: usize = 10;
/// How far past the cut an excerpt may grow to close a link.
const LINK_LOOKAHEAD: usize = 100;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect($re));
    };
}

pattern!(RELATIVE_IMAGE, r"!\[([^\]]*)\]\(\./images/([^)\s]+)\)");
pattern!(IMAGE_TARGET, r#"!\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#);
pattern!(LINK_AT_START, r"\A\[[^\]]*\]\([^)\n]*\)");
pattern!(FRONT_MATTER, r"(?s)\A---[ \t]*\r?\n(?:.*?\r?\n)?---[ \t]*(?:\r?\n|\z)");
pattern!(PARAGRAPH_BREAK, r"\r?\n[ \t]*\r?\n");

pattern!(MD_IMAGE, r"!\[[^\]]*\]\([^)]*\)");
pattern!(MD_LINK, r"\[([^\]]*)\]\([^)]*\)");
pattern!(MD_CODE_FENCE, r"(?m)^[ \t]*(?:```|~~~).*\r?$");
pattern!(MD_RULE, r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*\r?$");
pattern!(MD_LIST_MARKER, r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]+");
pattern!(MD_HEADING, r"#{1,6}\s+");
pattern!(MD_QUOTE, r"(?m)^[ \t]*>[ \t]?");
pattern!(MD_BOLD_STAR, r"\*\*(.+?)\*\*");
pattern!(MD_BOLD_UNDERSCORE, r"__(.+?)__");
pattern!(MD_ITALIC_STAR, r"\*([^*\n]+)\*");
pattern!(MD_ITALIC_UNDERSCORE, r"\b_([^_\n]+)_\b");
pattern!(MD_INLINE_CODE, r"`([^`]+)`");
pattern!(WHITESPACE, r"\s+");

/// Points `![alt](./images/<name>)` at the registry's URL for `<name>`.
///
/// Unknown names are left as written.
pub(crate) fn rewrite_image_paths(body: &str, registry: &ImageRegistry) -> String {
    RELATIVE_IMAGE
        .replace_all(body, |caps: &Captures| {
            let name = &caps[2];
            match registry.url_for(name) {
                Some(url) => format!("![{}]({url})", &caps[1]),
                None => {
                    warn!("Image not found: {name}");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Markdown reduced to a single line of plain text.
pub(crate) fn clean_markdown(content: &str) -> String {
    let text = FRONT_MATTER.replace(content, "");
    let text = MD_IMAGE.replace_all(&text, "");
    let text = MD_LINK.replace_all(&text, "${1}");
    let text = MD_CODE_FENCE.replace_all(&text, "");
    let text = MD_RULE.replace_all(&text, "");
    let text = MD_LIST_MARKER.replace_all(&text, "");
    let text = MD_HEADING.replace_all(&text, "");
    let text = MD_QUOTE.replace_all(&text, "");
    let text = MD_BOLD_STAR.replace_all(&text, "${1}");
    let text = MD_BOLD_UNDERSCORE.replace_all(&text, "${1}");
    let text = MD_ITALIC_STAR.replace_all(&text, "${1}");
    let text = MD_ITALIC_UNDERSCORE.replace_all(&text, "${1}");
    let text = MD_INLINE_CODE.replace_all(&text, "${1}");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DescriptionOptions {
    pub max_length: usize,
    /// Sentence-built descriptions shorter than this fall back to a prefix.
    pub min_length: usize,
}

impl DescriptionOptions {
    pub fn new(max_length: usize) -> Self {
        let max_length = max_length.max(1);
        Self {
            max_length,
            min_length: max_length / 3,
        }
    }
}

impl Default for DescriptionOptions {
    fn default() -> Self {
        Self::new(300)
    }
}

/// Plain-text summary of at most `options.max_length` characters.
pub(crate) fn create_clean_description(
    content: &str,
    author: &str,
    options: DescriptionOptions,
) -> String {
    let text = clean_markdown(content);
    let max = options.max_length;

    let mut description = String::new();
    let mut length = 0;
    let sentences = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_LENGTH);
    for sentence in sentences {
        let sentence_length = sentence.chars().count();
        let separator = if description.is_empty() { 0 } else { 2 };
        if length + separator + sentence_length > max {
            break;
        }
        if separator > 0 {
            description.push_str(". ");
        }
        description.push_str(sentence);
        length += separator + sentence_length;
    }

    if description.is_empty() || length < options.min_length {
        description = truncate_at_word(&text, max, options.min_length).to_string();
    }
    if description.is_empty() {
        description = truncate_chars(&format!("Read this article by {author}"), max)
            .trim_end()
            .to_string();
    }
    description
}

/// First paragraph of `content` as markdown, cut to about `max_length`
/// characters without leaving a link half written.
pub(crate) fn create_markdown_excerpt(content: &str, max_length: usize) -> String {
    let stripped = FRONT_MATTER.replace(content, "");
    let paragraph = PARAGRAPH_BREAK
        .split(stripped.trim())
        .next()
        .unwrap_or_default();
    if paragraph.chars().count() <= max_length {
        return paragraph.to_string();
    }

    let cut = byte_offset(paragraph, max_length);
    let mut end = cut;
    if let Some(start) = paragraph[..cut].rfind('[') {
        if let Some(link) = LINK_AT_START.find(&paragraph[start..]) {
            let link_end = start + link.end();
            if link_end > cut {
                end = if paragraph[cut..link_end].chars().count() <= LINK_LOOKAHEAD {
                    link_end
                } else if paragraph[..start].ends_with('!') {
                    start - 1
                } else {
                    start
                };
            }
        }
    }

    let truncated = paragraph[..end].trim_end();
    if truncated.len() < paragraph.len() {
        format!("{truncated}...")
    } else {
        truncated.to_string()
    }
}

/// URL of the first usable image, made absolute against `domain`.
pub(crate) fn extract_first_image(
    content: &str,
    registry: &ImageRegistry,
    domain: &str,
) -> Option<String> {
    let targets: Vec<&str> = IMAGE_TARGET
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if let Some(url) = targets.iter().find(|t| registry.contains_url(t)) {
        return Some(absolute_url(domain, url));
    }
    if let Some(url) = targets
        .iter()
        .filter_map(|t| t.strip_prefix("./images/"))
        .find_map(|name| registry.url_for(name))
    {
        return Some(absolute_url(domain, url));
    }
    targets
        .iter()
        .find(|t| is_absolute(t) || t.starts_with('/'))
        .map(|t| absolute_url(domain, t))
}

/// External link targets in order of first appearance, without repeats.
pub(crate) fn collect_links(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    Parser::new(content)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) if is_absolute(&dest_url) => {
                Some(dest_url.into_string())
            }
            _ => None,
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

pub(crate) fn absolute_url(domain: &str, path: &str) -> String {
    if is_absolute(path) {
        path.to_string()
    } else if let Some(rest) = path.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!(
            "{}/{}",
            domain.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

fn truncate_chars(s: &str, chars: usize) -> &str {
    &s[..byte_offset(s, chars)]
}

// cuts back to the last whole word, unless that would leave too little
fn truncate_at_word(text: &str, max: usize, min: usize) -> &str {
    let prefix = truncate_chars(text, max).trim_end();
    if prefix.len() == text.len() {
        return prefix;
    }
    match prefix.rfind(' ') {
        Some(space) if prefix[..space].chars().count() > min => prefix[..space].trim_end(),
        _ => prefix,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn registry() -> ImageRegistry {
        ImageRegistry::from_map(BTreeMap::from([
            ("arm.png".to_string(), "/assets/thoughts/images/arm.png".to_string()),
            ("cell.jpg".to_string(), "/assets/thoughts/images/cell.jpg".to_string()),
        ]))
    }

    fn has_unterminated_link(s: &str) -> bool {
        s.match_indices("](")
            .any(|(i, _)| !s[i..].contains(')'))
    }

    #[test]
    fn rewrites_known_images_only() {
        let body = "intro\n\n![Robot arm](./images/arm.png)\n\n![gone](./images/missing.png) end";
        let out = rewrite_image_paths(body, &registry());
        assert_eq!(
            out,
            "intro\n\n![Robot arm](/assets/thoughts/images/arm.png)\n\n![gone](./images/missing.png) end"
        );
    }

    #[test]
    fn clean_markdown_strips_syntax() {
        let text = "# Title\n\nSome **bold**, *italic* and `code`.\n\n---\n\n\
                    - a [link](https://x.y) here\n1. ![img](/a.png) numbered\n\
                    > quoted __strong__ _em_";
        assert_eq!(
            clean_markdown(text),
            "Title Some bold, italic and code. a link here numbered quoted strong em"
        );
    }

    #[test]
    fn description_locks_short_boundary() {
        let raw = "---\ntitle: Test\ndate: 2024-01-01\n---\nHello **world**. This is great.";
        let description = create_clean_description(raw, "Jane Doe", DescriptionOptions::new(20));
        assert_eq!(description, "Hello world");
    }

    #[test]
    fn description_accumulates_whole_sentences() {
        let content = "Robots are changing how factories work today. \
                       Small teams can now automate tasks that used to need whole lines! \
                       Is that a good thing for everyone involved? \
                       This last sentence will not fit in the limit at all.";
        let description =
            create_clean_description(content, "Jane Doe", DescriptionOptions::new(160));
        assert_eq!(
            description,
            "Robots are changing how factories work today. \
             Small teams can now automate tasks that used to need whole lines. \
             Is that a good thing for everyone involved"
        );
        assert!(description.chars().count() <= 160);
    }

    #[test]
    fn description_falls_back_to_word_prefix() {
        let description = create_clean_description(
            "Short one. Tiny. Ok.",
            "Jane Doe",
            DescriptionOptions::new(12),
        );
        assert_eq!(description, "Short one.");

        let untouched = create_clean_description(
            "Short one. Tiny. Ok.",
            "Jane Doe",
            DescriptionOptions::new(300),
        );
        assert_eq!(untouched, "Short one. Tiny. Ok.");
    }

    #[test]
    fn description_is_never_empty() {
        let description = create_clean_description(
            "![only](/an/image.png)",
            "Jane Doe",
            DescriptionOptions::default(),
        );
        assert_eq!(description, "Read this article by Jane Doe");

        let tiny = create_clean_description("", "Jane Doe", DescriptionOptions::new(8));
        assert_eq!(tiny, "Read thi");
    }

    #[test]
    fn description_respects_max_and_has_no_markdown() {
        let content = "## Heading\n\n![pic](./images/arm.png) A [linked](https://a.b) \
                       [![badge](https://ci.example/badge.svg)](https://ci.example/run) \
                       **bold** claim about *something* very `important` indeed. "
            .repeat(20);
        for max in [20, 150, 300] {
            let description =
                create_clean_description(&content, "Jane", DescriptionOptions::new(max));
            assert!(description.chars().count() <= max, "{max}: {description}");
            for token in ["![", "](", "##", "**", "`"] {
                assert!(!description.contains(token), "{token} in {description}");
            }
            assert!(!description.contains('*'));
        }
    }

    #[test]
    fn linked_image_leaves_no_empty_link() {
        let content = "[![CI badge](https://ci.example/badge.svg)](https://ci.example/run) \
                       The build is green again and everything passes now.";
        let description = create_clean_description(content, "Jane", DescriptionOptions::default());
        assert_eq!(
            description,
            "The build is green again and everything passes now."
        );
    }

    #[test]
    fn excerpt_short_paragraph_is_verbatim() {
        let content =
            "---\ntitle: x\n---\n\nFirst *paragraph* with [a link](https://a.b).\n\nSecond.";
        assert_eq!(
            create_markdown_excerpt(content, 200),
            "First *paragraph* with [a link](https://a.b)."
        );
    }

    #[test]
    fn excerpt_truncates_with_ellipsis() {
        let content = "abcdefghij klmnopqrst uvwxyz";
        assert_eq!(create_markdown_excerpt(content, 10), "abcdefghij...");
    }

    #[test]
    fn excerpt_extends_to_close_link() {
        let content = "Read [the paper](https://example.com/paper) for details.";
        // cut lands inside the link text
        let excerpt = create_markdown_excerpt(content, 10);
        assert_eq!(excerpt, "Read [the paper](https://example.com/paper)...");
        // cut lands inside the url
        let excerpt = create_markdown_excerpt(content, 25);
        assert_eq!(excerpt, "Read [the paper](https://example.com/paper)...");
    }

    #[test]
    fn excerpt_drops_link_too_long_to_close() {
        let url = format!("https://example.com/{}", "x".repeat(150));
        let content = format!("See [this]({url}) later on.");
        let excerpt = create_markdown_excerpt(&content, 15);
        assert_eq!(excerpt, "See...");
        assert!(!has_unterminated_link(&excerpt));
    }

    #[test]
    fn excerpt_never_leaves_dangling_links() {
        let content =
            "A [b](https://b.example) c [dd](https://d.example/long/path) e ![f](/img/f.png) g.";
        for max in 1..content.len() {
            let excerpt = create_markdown_excerpt(content, max);
            assert!(!has_unterminated_link(&excerpt), "{max}: {excerpt}");
        }
    }

    #[test]
    fn excerpt_closes_link_wrapped_across_lines() {
        let content = "Intro words here and a [link whose text\nwraps onto a new line]\
                       (https://example.com/some/long/path) after.";
        for max in 1..content.chars().count() {
            let excerpt = create_markdown_excerpt(content, max);
            assert!(!has_unterminated_link(&excerpt), "{max}: {excerpt}");
        }
        assert_eq!(
            create_markdown_excerpt(content, 80),
            "Intro words here and a [link whose text\nwraps onto a new line]\
             (https://example.com/some/long/path)..."
        );
    }

    #[test]
    fn first_image_prefers_registry_assets() {
        let content = "![ext](https://cdn.example/x.png) ![arm](/assets/thoughts/images/arm.png)";
        assert_eq!(
            extract_first_image(content, &registry(), "https://site.example"),
            Some("https://site.example/assets/thoughts/images/arm.png".to_string())
        );
    }

    #[test]
    fn first_image_resolves_relative_and_absolute() {
        let domain = "https://site.example/";
        assert_eq!(
            extract_first_image("![c](./images/cell.jpg)", &registry(), domain),
            Some("https://site.example/assets/thoughts/images/cell.jpg".to_string())
        );
        assert_eq!(
            extract_first_image("![x](/static/x.png \"title\")", &registry(), domain),
            Some("https://site.example/static/x.png".to_string())
        );
        assert_eq!(
            extract_first_image("![x](https://cdn.example/x.png)", &registry(), domain),
            Some("https://cdn.example/x.png".to_string())
        );
        assert_eq!(
            extract_first_image("![x](./images/unknown.png)", &registry(), domain),
            None
        );
        assert_eq!(
            extract_first_image("no images [here](https://a.b)", &registry(), domain),
            None
        );
    }

    #[test]
    fn collects_external_links_once() {
        let content = "See [a](https://a.example) and [b](https://b.example).\n\n\
                       Again [a](https://a.example), ![img](https://img.example/i.png), \
                       [local](/thoughts/other) and <https://c.example>.";
        assert_eq!(
            collect_links(content),
            ["https://a.example", "https://b.example", "https://c.example"]
        );
    }
}
