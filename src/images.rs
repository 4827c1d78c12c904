use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use log::info;

use crate::error::ContentError;

/// Maps a bare image filename to the URL it is served from.
#[derive(Debug, Default, Clone)]
pub(crate) struct ImageRegistry {
    urls: BTreeMap<String, String>,
    known: HashSet<String>,
}

impl ImageRegistry {
    pub fn from_map(urls: BTreeMap<String, String>) -> Self {
        let known = urls.values().cloned().collect();
        Self { urls, known }
    }

    /// Registers every regular file of `dir` under `<url_prefix>/<name>`.
    pub fn scan(dir: &Path, url_prefix: &str) -> Result<Self, ContentError> {
        if !dir.is_dir() {
            info!("Image directory({dir:?}) does not exist. ignoring...");
            return Ok(Self::default());
        }

        let prefix = url_prefix.trim_end_matches('/');
        let mut urls = BTreeMap::new();
        for entry in std::fs::read_dir(dir).map_err(|e| ContentError::io(dir, e))? {
            let entry = entry.map_err(|e| ContentError::io(dir, e))?;
            let meta = entry.metadata().map_err(|e| ContentError::io(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            urls.insert(name.clone(), format!("{prefix}/{name}"));
        }

        Ok(Self::from_map(urls))
    }

    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.urls.get(name).map(String::as_str)
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.known.contains(url)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}
