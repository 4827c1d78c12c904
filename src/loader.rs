use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::{debug, info};
use rayon::prelude::*;

use crate::{
    article::{sort_articles, Article},
    error::ContentError,
    front_matter::parse_front_matter,
    images::ImageRegistry,
    manifest::Manifest,
};

pub(crate) const ARTICLE_EXTENSION: &str = "md";

/// Where raw article markdown comes from.
pub(crate) trait ContentSource: Sync {
    /// Raw text of `<slug>.md`.
    fn read(&self, slug: &str) -> Result<String, ContentError>;

    /// Every slug this source can serve, sorted.
    fn slugs(&self) -> Result<Vec<String>, ContentError>;
}

/// Markdown files under one or more content directories.
#[derive(Debug, Clone)]
pub(crate) struct FsSource {
    roots: Vec<PathBuf>,
}

impl FsSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// slug → file, rejecting a slug that appears under two roots.
    pub fn files(&self) -> Result<BTreeMap<String, PathBuf>, ContentError> {
        let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();
        for root in self.roots.iter() {
            for (slug, path) in list_markdown(root)? {
                if let Some(first) = files.get(&slug) {
                    return Err(ContentError::DuplicateSlug {
                        slug,
                        first: first.clone(),
                        second: path,
                    });
                }
                files.insert(slug, path);
            }
        }
        Ok(files)
    }
}

impl ContentSource for FsSource {
    fn read(&self, slug: &str) -> Result<String, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::NotFound(slug.to_string()));
        }
        // same lookup as listing, so a duplicated slug fails here too
        let path = self
            .files()?
            .remove(slug)
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))?;

        debug!("Reading {path:?}...");
        std::fs::read_to_string(&path).map_err(|e| ContentError::io(path, e))
    }

    fn slugs(&self) -> Result<Vec<String>, ContentError> {
        Ok(self.files()?.into_keys().collect())
    }
}

/// Articles read into memory ahead of time.
#[derive(Debug, Default, Clone)]
pub(crate) struct BundleSource {
    files: BTreeMap<String, String>,
}

impl BundleSource {
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, ContentError> {
        let mut files = BTreeMap::new();
        for (slug, path) in manifest.articles.iter() {
            let raw = std::fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
            files.insert(slug.clone(), raw);
        }
        info!("Bundled {} articles", files.len());
        Ok(Self { files })
    }

    #[cfg(test)]
    pub fn from_files(files: BTreeMap<String, String>) -> Self {
        Self { files }
    }
}

impl ContentSource for BundleSource {
    fn read(&self, slug: &str) -> Result<String, ContentError> {
        self.files
            .get(slug)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))
    }

    fn slugs(&self) -> Result<Vec<String>, ContentError> {
        Ok(self.files.keys().cloned().collect())
    }
}

pub(crate) fn load_article(
    source: &dyn ContentSource,
    slug: &str,
    registry: &ImageRegistry,
) -> Result<Article, ContentError> {
    let raw = source.read(slug)?;
    Ok(Article::new(slug, parse_front_matter(&raw), registry))
}

/// Loads every article concurrently, newest first.
pub(crate) fn load_articles(
    source: &dyn ContentSource,
    registry: &ImageRegistry,
) -> Result<Vec<Article>, ContentError> {
    let slugs = source.slugs()?;
    let mut articles = slugs
        .par_iter()
        .map(|slug| load_article(source, slug, registry))
        .collect::<Result<Vec<_>, _>>()?;
    sort_articles(&mut articles);
    Ok(articles)
}

/// `(slug, path)` of every `*.md` file directly inside `dir`.
pub(crate) fn list_markdown(dir: &Path) -> Result<Vec<(String, PathBuf)>, ContentError> {
    if !dir.is_dir() {
        info!("Content directory({dir:?}) does not exist. ignoring...");
        return Ok(vec![]);
    }

    let mut files = vec![];
    for entry in std::fs::read_dir(dir).map_err(|e| ContentError::io(dir, e))? {
        let entry = entry.map_err(|e| ContentError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != ARTICLE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            files.push((stem.to_string_lossy().to_string(), path));
        }
    }
    files.sort();
    Ok(files)
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains(['/', '\\']) && !slug.starts_with('.')
}
