use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    cache::{LinkMetaCache, LinkMetaFetcher},
    config::SiteConfig,
};

pub(crate) struct Context {
    pub out_dir: PathBuf,
    pub public_dir: PathBuf,
    pub images_dir: PathBuf,

    pub site: SiteConfig,

    pub handlebars: handlebars::Handlebars<'static>,
    pub link_cache: Mutex<LinkMetaCache>,
    pub fetcher: Box<dyn LinkMetaFetcher>,
}

impl Context {
    pub fn link_cache(&self) -> MutexGuard<'_, LinkMetaCache> {
        self.link_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
