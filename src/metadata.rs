//! Page metadata for the SEO layer: everything that ends up in `<head>`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    article::Article,
    config::SiteConfig,
    images::ImageRegistry,
    transform::{absolute_url, create_clean_description, extract_first_image, DescriptionOptions},
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PageType {
    Website,
    Article,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Website => "website",
            PageType::Article => "article",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageMetadata {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    pub page_type: PageType,
    pub published_time: Option<String>,
    pub author: String,
}

/// Which top-level page a website-typed record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SitePage {
    Home,
    Thoughts,
    NotFound,
}

pub(crate) fn compose_article(
    article: &Article,
    site: &SiteConfig,
    registry: &ImageRegistry,
) -> PageMetadata {
    let domain = site.domain();
    let description = create_clean_description(
        &article.content,
        site.author(),
        DescriptionOptions::new(site.description_max_length),
    );
    let image = extract_first_image(&article.content, registry, domain)
        .unwrap_or_else(|| default_image(site));

    PageMetadata {
        title: format!("{} - {}", article.title, site.name),
        description,
        image,
        url: format!("{domain}/thoughts/{}", article.slug),
        page_type: PageType::Article,
        published_time: Some(article.date.clone()).filter(|d| !d.is_empty()),
        author: site.author().to_string(),
    }
}

pub(crate) fn compose_site_page(page: SitePage, site: &SiteConfig) -> PageMetadata {
    let domain = site.domain();
    let (title, description, url) = match page {
        SitePage::Home => (
            site.name.clone(),
            site.description.clone(),
            format!("{domain}/"),
        ),
        SitePage::Thoughts => (
            format!("Thoughts - {}", site.name),
            site.thoughts_description.clone(),
            format!("{domain}/thoughts"),
        ),
        SitePage::NotFound => (
            "Article Not Found".to_string(),
            "The requested article could not be found.".to_string(),
            format!("{domain}/404"),
        ),
    };
    let description = if description.is_empty() {
        format!("Personal website of {}.", site.author())
    } else {
        description
    };

    PageMetadata {
        title,
        description,
        image: default_image(site),
        url,
        page_type: PageType::Website,
        published_time: None,
        author: site.author().to_string(),
    }
}

/// schema.org JSON-LD for the page.
pub(crate) fn structured_data(
    meta: &PageMetadata,
    site: &SiteConfig,
    page: Option<SitePage>,
) -> Value {
    let person = json!({ "@type": "Person", "name": meta.author });
    match (meta.page_type, page) {
        (PageType::Article, _) => json!({
            "@context": "https://schema.org",
            "@type": "Article",
            "headline": meta.title,
            "description": meta.description,
            "image": meta.image,
            "author": person,
            "publisher": { "@type": "Person", "name": site.name },
            "datePublished": meta.published_time,
            "dateModified": meta.published_time,
            "mainEntityOfPage": { "@type": "WebPage", "@id": meta.url },
        }),
        (PageType::Website, Some(SitePage::Home)) => {
            let mut data = json!({
                "@context": "https://schema.org",
                "@type": "Person",
                "name": site.author(),
                "url": meta.url,
                "sameAs": site.profile.social.iter().map(|s| s.url.as_str()).collect::<Vec<_>>(),
            });
            if !site.profile.job_title.is_empty() {
                data["jobTitle"] = json!(site.profile.job_title);
            }
            if !site.profile.works_for.is_empty() {
                data["worksFor"] = json!({
                    "@type": "Organization",
                    "name": site.profile.works_for,
                });
            }
            data
        }
        (PageType::Website, _) => json!({
            "@context": "https://schema.org",
            "@type": "WebSite",
            "name": site.name,
            "url": meta.url,
            "description": meta.description,
            "author": person,
        }),
    }
}

fn default_image(site: &SiteConfig) -> String {
    absolute_url(site.domain(), &site.default_image)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{config::SocialLink, front_matter::parse_front_matter};

    fn site() -> SiteConfig {
        let mut site = SiteConfig {
            name: "Jane Doe".to_string(),
            url: "https://jane.example/".to_string(),
            description_max_length: 150,
            ..SiteConfig::default()
        };
        site.profile.job_title = "Chief Technology Officer".to_string();
        site.profile.works_for = "Acme Robotics".to_string();
        site.profile.social = vec![SocialLink {
            label: "GitHub".to_string(),
            url: "https://github.com/jane".to_string(),
        }];
        site
    }

    fn registry() -> ImageRegistry {
        ImageRegistry::from_map(BTreeMap::from([(
            "arm.png".to_string(),
            "/assets/thoughts/images/arm.png".to_string(),
        )]))
    }

    fn article(raw: &str) -> Article {
        Article::new("robot-arms", parse_front_matter(raw), &registry())
    }

    #[test]
    fn article_metadata_from_content() {
        let article = article(
            "---\ntitle: Robot Arms\ndate: 2024-05-01\n---\n\
             ![arm](./images/arm.png)\n\nCheap robot arms are finally good enough for small shops.",
        );
        let meta = compose_article(&article, &site(), &registry());

        assert_eq!(meta.title, "Robot Arms - Jane Doe");
        assert_eq!(meta.url, "https://jane.example/thoughts/robot-arms");
        assert_eq!(meta.image, "https://jane.example/assets/thoughts/images/arm.png");
        assert_eq!(
            meta.description,
            "Cheap robot arms are finally good enough for small shops"
        );
        assert_eq!(meta.page_type, PageType::Article);
        assert_eq!(meta.published_time.as_deref(), Some("2024-05-01"));
        assert_eq!(meta, compose_article(&article, &site(), &registry()));
    }

    #[test]
    fn article_without_image_or_date_uses_defaults() {
        let article = article("Just text here, nothing more to it.");
        let meta = compose_article(&article, &site(), &registry());
        assert_eq!(meta.title, "robot arms - Jane Doe");
        assert_eq!(meta.image, "https://jane.example/og-image.png");
        assert_eq!(meta.published_time, None);
        assert!(!meta.url.contains('?'));
    }

    #[test]
    fn site_pages() {
        let home = compose_site_page(SitePage::Home, &site());
        assert_eq!(home.url, "https://jane.example/");
        assert_eq!(home.page_type, PageType::Website);
        assert_eq!(home.description, "Personal website of Jane Doe.");

        let thoughts = compose_site_page(SitePage::Thoughts, &site());
        assert_eq!(thoughts.url, "https://jane.example/thoughts");
        assert_eq!(thoughts.title, "Thoughts - Jane Doe");
    }

    #[test]
    fn structured_data_shapes() {
        let site = site();
        let article = article("---\ndate: 2024-05-01\n---\nBody text of the article.");
        let meta = compose_article(&article, &site, &registry());
        let data = structured_data(&meta, &site, None);
        assert_eq!(data["@type"], "Article");
        assert_eq!(data["headline"], "robot arms - Jane Doe");
        assert_eq!(data["datePublished"], "2024-05-01");
        assert_eq!(data["mainEntityOfPage"]["@id"], "https://jane.example/thoughts/robot-arms");

        let home = compose_site_page(SitePage::Home, &site);
        let data = structured_data(&home, &site, Some(SitePage::Home));
        assert_eq!(data["@type"], "Person");
        assert_eq!(data["jobTitle"], "Chief Technology Officer");
        assert_eq!(data["worksFor"]["name"], "Acme Robotics");
        assert_eq!(data["sameAs"][0], "https://github.com/jane");

        let thoughts = compose_site_page(SitePage::Thoughts, &site);
        assert_eq!(structured_data(&thoughts, &site, Some(SitePage::Thoughts))["@type"], "WebSite");
    }
}
