use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SocialLink {
    pub label: String,
    pub url: String,
}

/// About-me content of the home page.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct Profile {
    pub job_title: String,
    pub works_for: String,
    pub location: String,
    pub bio: Vec<String>,
    pub social: Vec<SocialLink>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct SiteConfig {
    /// Shown as the site name and used as the default author.
    pub name: String,
    pub author: String,
    /// Canonical origin, e.g. `https://example.com`.
    pub url: String,
    pub description: String,
    pub thoughts_description: String,
    pub keywords: Vec<String>,
    /// Social preview image when an article has none (relative to `url`).
    pub default_image: String,
    pub twitter: Option<String>,
    pub locale: String,
    pub theme_color: String,
    pub image_url_prefix: String,
    pub description_max_length: usize,
    pub excerpt_max_length: usize,
    pub profile: Profile,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "My Site".to_string(),
            author: String::new(),
            url: "http://localhost".to_string(),
            description: String::new(),
            thoughts_description: String::new(),
            keywords: vec![],
            default_image: "/og-image.png".to_string(),
            twitter: None,
            locale: "en_US".to_string(),
            theme_color: "#8B4513".to_string(),
            image_url_prefix: "/assets/thoughts/images".to_string(),
            description_max_length: 300,
            excerpt_max_length: 200,
            profile: Profile::default(),
        }
    }
}

impl SiteConfig {
    /// Reads `path` if present; `SITE_NAME` and `SITE_URL` override it.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: SiteConfig = if path.exists() {
            let fd = File::open(path).with_context(|| format!("opening {path:?}"))?;
            serde_json::from_reader(BufReader::new(fd))
                .with_context(|| format!("parsing {path:?}"))?
        } else {
            info!("Site config({path:?}) does not exist. using defaults...");
            SiteConfig::default()
        };

        if let Ok(name) = std::env::var("SITE_NAME") {
            config.name = name;
        }
        if let Ok(url) = std::env::var("SITE_URL") {
            config.url = url;
        }
        Ok(config)
    }

    pub fn author(&self) -> &str {
        if self.author.is_empty() {
            &self.name
        } else {
            &self.author
        }
    }

    pub fn domain(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
