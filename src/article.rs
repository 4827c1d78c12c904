use std::{borrow::Borrow, cmp::Ordering};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{front_matter::FrontMatter, images::ImageRegistry, transform::rewrite_image_paths};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Article {
    pub slug: String,
    pub title: String,
    /// ISO-8601 date from the front matter, or empty.
    pub date: String,
    pub body: String,
    /// `body` with image references resolved through the registry.
    pub content: String,
}

impl Article {
    pub fn new(slug: &str, front_matter: FrontMatter, registry: &ImageRegistry) -> Self {
        let title = front_matter
            .get("title")
            .map(str::to_string)
            .unwrap_or_else(|| humanize_slug(slug));
        let date = front_matter.get("date").unwrap_or("").to_string();
        let content = rewrite_image_paths(&front_matter.body, registry);

        Self {
            slug: slug.to_string(),
            title,
            date,
            body: front_matter.body,
            content,
        }
    }

    pub fn published_on(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

pub(crate) fn humanize_slug(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Accepts `YYYY-MM-DD` as well as full timestamps starting with one.
pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// newest first. zero-padded ISO dates compare correctly as strings, and an
// empty date is the smallest string so undated articles end up last.
pub(crate) fn sort_article<T: Borrow<Article>>(a: &T, b: &T) -> Ordering {
    b.borrow().date.cmp(&a.borrow().date)
}

pub(crate) fn sort_articles<T: Borrow<Article>>(articles: &mut [T]) {
    articles.sort_by(sort_article);
}
