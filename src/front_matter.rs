use std::{collections::HashMap, sync::LazyLock};

use log::warn;
use regex::{Regex, RegexBuilder};
use serde_yaml::Value;

// pandoc-style metadata block at the very top of the file
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z")
        .dot_matches_new_line(true)
        .build()
        .expect("front matter pattern")
});

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FrontMatter {
    pub attributes: HashMap<String, String>,
    pub body: String,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Splits `raw` into its YAML header and the markdown body.
///
/// Only scalar values are kept as attributes. A header that cannot be read
/// is treated as absent: the attributes are empty but the body still starts
/// after the closing `---`.
pub(crate) fn parse_front_matter(raw: &str) -> FrontMatter {
    let Some(caps) = HEADER_PATTERN.captures(raw) else {
        return FrontMatter {
            attributes: HashMap::new(),
            body: raw.to_string(),
        };
    };
    let header = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str()).to_string();

    FrontMatter {
        attributes: parse_header(header).unwrap_or_default(),
        body,
    }
}

fn parse_header(header: &str) -> Option<HashMap<String, String>> {
    let mapping = match serde_yaml::from_str::<Value>(header) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(Value::Null) => return Some(HashMap::new()),
        Ok(_) => {
            warn!("Front matter is not a mapping. ignoring the whole header...");
            return None;
        }
        Err(e) => {
            warn!("Malformed front matter ({e}). ignoring the whole header...");
            return None;
        }
    };

    let attributes = mapping
        .into_iter()
        .filter_map(|(key, value)| Some((scalar(key)?, scalar(value)?)))
        .collect();
    Some(attributes)
}

// lists and nested tables have no attribute form
fn scalar(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_date() {
        let fm = parse_front_matter("---\ntitle: Test\ndate: 2024-01-01\n---\nHello **world**.");
        assert_eq!(fm.get("title"), Some("Test"));
        assert_eq!(fm.get("date"), Some("2024-01-01"));
        assert_eq!(fm.body, "Hello **world**.");
    }

    #[test]
    fn keeps_colons_in_values_and_strips_quotes() {
        let fm = parse_front_matter("---\ntitle: \"Robots: a primer\"\n---\nbody\n");
        assert_eq!(fm.get("title"), Some("Robots: a primer"));
        assert_eq!(fm.body, "body\n");
    }

    #[test]
    fn without_header_the_whole_input_is_body() {
        let fm = parse_front_matter("# Heading\n\n---\ntext");
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, "# Heading\n\n---\ntext");
    }

    #[test]
    fn malformed_header_yields_no_attributes() {
        let fm = parse_front_matter("---\ntitle: Ok\nthis line is broken\n---\nBody");
        assert!(fm.attributes.is_empty());
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn list_fields_keep_the_rest_of_the_header() {
        let fm = parse_front_matter(
            "---\ntitle: Rust Notes\ntags:\n  - rust\n  - web\ndate: 2024-02-02\n---\nBody",
        );
        assert_eq!(fm.get("title"), Some("Rust Notes"));
        assert_eq!(fm.get("date"), Some("2024-02-02"));
        assert_eq!(fm.get("tags"), None);
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn comments_and_numbers() {
        let fm = parse_front_matter("---\n# draft\ntitle: 1984\ndraft: false\n---\nBody");
        assert_eq!(fm.get("title"), Some("1984"));
        assert_eq!(fm.get("draft"), Some("false"));
    }

    #[test]
    fn crlf_and_empty_values() {
        let fm = parse_front_matter("---\r\ntitle:\r\ndate: 2023-05-06\r\n---\r\nBody");
        assert_eq!(fm.get("title"), None);
        assert_eq!(fm.get("date"), Some("2023-05-06"));
        assert_eq!(fm.body, "Body");
    }
}
