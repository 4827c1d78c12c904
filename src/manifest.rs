use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::ContentError, images::ImageRegistry, loader::FsSource};

/// Build-time list of every article file and image URL, so that rendering
/// needs no directory scanning.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Manifest {
    pub articles: BTreeMap<String, PathBuf>,
    pub images: BTreeMap<String, String>,
}

impl Manifest {
    pub fn scan(
        content_dirs: &[PathBuf],
        images_dir: &Path,
        image_url_prefix: &str,
    ) -> Result<Self, ContentError> {
        let articles = FsSource::new(content_dirs.to_vec()).files()?;
        let images = ImageRegistry::scan(images_dir, image_url_prefix)?;
        Ok(Self {
            articles,
            images: images.as_map().clone(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let fd = File::open(path).map_err(|e| ContentError::io(path, e))?;
        serde_json::from_reader(BufReader::new(fd)).map_err(|source| ContentError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ContentError> {
        let fd = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| ContentError::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(fd), self).map_err(|source| {
            ContentError::Manifest {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn registry(&self) -> ImageRegistry {
        ImageRegistry::from_map(self.images.clone())
    }
}
