use serde::Serialize;

use crate::{article::Article, cache::LinkMeta, config::SiteConfig};

/// An article as it appears in a listing.
#[derive(Serialize, Debug)]
pub(super) struct PostSummary<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    /// Rendered preview of the excerpt.
    pub excerpt: String,
}

/// One entry of an article's references section.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub(super) struct Reference {
    pub url: String,
    #[serde(flatten)]
    pub meta: Option<LinkMeta>,
}

#[derive(Serialize, Debug)]
pub(super) struct ArticlePageData<'a> {
    pub site: &'a SiteConfig,
    pub head: String,
    pub article: &'a Article,
    pub body: String,
    pub references: Vec<Reference>,
}

#[derive(Serialize, Debug)]
pub(super) struct ListPageData<'a> {
    pub site: &'a SiteConfig,
    pub head: String,
    pub posts: Vec<PostSummary<'a>>,
}

#[derive(Serialize, Debug)]
pub(super) struct SitePageData<'a> {
    pub site: &'a SiteConfig,
    pub head: String,
}
