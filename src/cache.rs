//! Link metadata (title, publisher, date) for the references section,
//! cached on disk between builds.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use webpage::{Webpage, WebpageOptions};

pub(crate) const DEFAULT_TTL_DAYS: i64 = 30;
pub(crate) const DEFAULT_CAPACITY: usize = 500;
const FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkMeta {
    pub title: String,
    pub publisher: String,
    pub date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CachedLinkMeta {
    meta: LinkMeta,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct LinkMetaCache {
    entries: HashMap<String, CachedLinkMeta>,
    ttl: Duration,
    capacity: usize,
}

impl Default for LinkMetaCache {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_TTL_DAYS), DEFAULT_CAPACITY)
    }
}

impl LinkMetaCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut cache = Self::default();
        if path.exists() {
            let fd = File::open(path)?;
            let reader = BufReader::new(fd);
            cache.entries = serde_json::from_reader(reader).map_err(|e| anyhow!(e))?;
        } else {
            info!("Cache file({path:?}) does not exist. ignoring...");
        }
        Ok(cache)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let fd = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let writer = BufWriter::new(fd);
        serde_json::to_writer_pretty(writer, &self.entries)?;

        Ok(())
    }

    /// Fresh entry for `url`; expired entries count as missing.
    pub fn get(&self, url: &str, now: DateTime<Utc>) -> Option<&LinkMeta> {
        self.entries
            .get(url)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| &entry.meta)
    }

    pub fn insert(&mut self, url: &str, meta: LinkMeta, now: DateTime<Utc>) {
        self.entries.insert(
            url.to_string(),
            CachedLinkMeta {
                meta,
                fetched_at: now,
            },
        );
        self.evict(now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // expired entries first, then the oldest until within capacity
    fn evict(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(url, _)| url.clone())
            else {
                break;
            };
            debug!("Evicting {oldest} from link cache");
            self.entries.remove(&oldest);
        }
    }
}

pub(crate) trait LinkMetaFetcher: Sync {
    fn fetch(&self, url: &str) -> Option<LinkMeta>;
}

fn fetch_options() -> WebpageOptions {
    let mut options = WebpageOptions::default();
    // some sites only serve OGP to crawlers
    options.useragent = "bot".to_string();
    options.timeout = std::time::Duration::from_secs(FETCH_TIMEOUT_SECS);
    options
}

/// Reads Open Graph data from the live page.
pub(crate) struct WebpageFetcher;

impl LinkMetaFetcher for WebpageFetcher {
    fn fetch(&self, url: &str) -> Option<LinkMeta> {
        debug!("Fetching {url}...");
        let webpage = match Webpage::from_url(url, fetch_options()) {
            Ok(webpage) => webpage,
            Err(e) => {
                warn!("Failed to fetch {url}: {e}");
                return None;
            }
        };

        let html = webpage.html;
        let og = &html.opengraph.properties;
        let title = og
            .get("title")
            .cloned()
            .or(html.title.clone())
            .filter(|t| !t.is_empty())?;
        let publisher = og
            .get("site_name")
            .cloned()
            .unwrap_or_else(|| host_of(url).to_string());
        let date = ["article:published_time", "published_time", "date"]
            .iter()
            .find_map(|key| og.get(*key).or_else(|| html.meta.get(*key)))
            .cloned();

        Some(LinkMeta {
            title,
            publisher,
            date,
        })
    }
}

/// Never touches the network; only cached metadata is used.
pub(crate) struct OfflineFetcher;

impl LinkMetaFetcher for OfflineFetcher {
    fn fetch(&self, _url: &str) -> Option<LinkMeta> {
        None
    }
}

/// Metadata for every url that has any, fetching the uncached ones
/// concurrently and caching what succeeds.
pub(crate) fn resolve_links(
    urls: &[String],
    cache: &mut LinkMetaCache,
    fetcher: &dyn LinkMetaFetcher,
    now: DateTime<Utc>,
) -> HashMap<String, LinkMeta> {
    let mut results = HashMap::new();
    let mut uncached = vec![];
    for url in urls {
        match cache.get(url, now) {
            Some(meta) => {
                results.insert(url.clone(), meta.clone());
            }
            None => uncached.push(url),
        }
    }
    if uncached.is_empty() {
        return results;
    }

    let fetched: Vec<(&String, Option<LinkMeta>)> = uncached
        .par_iter()
        .map(|url| (*url, fetcher.fetch(url)))
        .collect();
    for (url, meta) in fetched {
        if let Some(meta) = meta {
            cache.insert(url, meta.clone(), now);
            results.insert(url.clone(), meta);
        }
    }
    results
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    host.strip_prefix("www.").unwrap_or(host)
}
