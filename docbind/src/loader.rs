//! Page loading with a content-addressed local cache.
//!
//! A page is looked up in the [`PageStore`] under the SHA-256 of its absolute
//! URL. On a miss the [`Fetcher`] is asked (with retries) and the text is
//! stored once. A fetch that keeps failing aborts the run.

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

static SEL_INTERNAL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.reference.internal").unwrap());

/// A loaded documentation page.
#[derive(Debug)]
pub struct Page {
    /// Identifier as requested, relative to the base URL or absolute
    pub id: String,
    pub url: String,
    pub html: Html,
    pub text: String,
}

impl Page {
    pub fn new(id: &str, url: &str, text: String) -> Self {
        Page {
            id: id.to_string(),
            url: url.to_string(),
            html: Html::parse_document(&text),
            text,
        }
    }
}

// -- Storage -------------------------------------------------------------------

/// Key/value storage for cached page text.
pub trait PageStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, text: &str) -> Result<()>;
}

/// One file per page in a cache directory.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache directory: {}", dir.display()))?;
        Ok(DirStore { dir })
    }
}

impl PageStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.dir.join(key);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cached page {}", path.display()))?;
        Ok(Some(text))
    }

    fn put(&mut self, key: &str, text: &str) -> Result<()> {
        let path = self.dir.join(key);
        fs::write(&path, text)
            .with_context(|| format!("failed to write cached page {}", path.display()))
    }
}

/// In-memory store.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pages: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with the page for `url`.
    pub fn insert(&mut self, url: &str, text: &str) {
        self.pages.insert(cache_key(url), text.to_string());
    }
}

#[cfg(test)]
impl PageStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.pages.get(key).cloned())
    }

    fn put(&mut self, key: &str, text: &str) -> Result<()> {
        self.pages.insert(key.to_string(), text.to_string());
        Ok(())
    }
}

// -- Fetching ------------------------------------------------------------------

/// Retrieves page text for an absolute URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<String>,
{
    fn fetch(&self, url: &str) -> Result<String> {
        self(url)
    }
}

/// Blocking HTTP GET.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        HttpFetcher { timeout }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .with_context(|| format!("GET {}", url))?;
        response
            .into_string()
            .with_context(|| format!("failed to read response body of {}", url))
    }
}

/// Never touches the network.
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        bail!("page is not cached and network access is disabled: {}", url)
    }
}

// -- Loader --------------------------------------------------------------------

/// Cache file name for an absolute URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}.html", hasher.finalize())
}

pub struct Loader {
    base_url: String,
    store: Box<dyn PageStore>,
    fetcher: Box<dyn Fetcher>,
    retries: u32,
    backoff: Duration,
}

impl Loader {
    pub fn new(base_url: &str, store: Box<dyn PageStore>, fetcher: Box<dyn Fetcher>) -> Self {
        Loader {
            base_url: base_url.to_string(),
            store,
            fetcher,
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    /// Absolute URL of a page identifier.
    pub fn resolve(&self, id: &str) -> String {
        if id.starts_with("http://") || id.starts_with("https://") {
            id.to_string()
        } else {
            format!("{}{}", self.base_url, id)
        }
    }

    /// Load one page, from the cache when possible.
    pub fn load(&mut self, id: &str) -> Result<Page> {
        info!("Loading: {}", id);
        let url = self.resolve(id);
        let key = cache_key(&url);
        let text = match self.store.get(&key)? {
            Some(text) => text,
            None => {
                let text = self.fetch_with_retry(&url)?;
                self.store.put(&key, &text)?;
                text
            }
        };
        Ok(Page::new(id, &url, text))
    }

    /// Load an overview page and return the generated pages it links to, in
    /// link order, each at most once. The linked pages are loaded by the
    /// caller one at a time.
    pub fn overview_pages(&mut self, id: &str) -> Result<Vec<String>> {
        let overview = self.load(id)?;
        let links = overview_links(&overview.html);
        debug!("{} links on {}", links.len(), id);
        Ok(links)
    }

    fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url) {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    warn!("fetch of {} failed ({:#}), retrying in {:?}", url, e, delay);
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to fetch {} after {} attempts", url, attempt + 1))
                }
            }
        }
    }
}

/// Relative links to generated pages, fragment dropped, first occurrence kept.
pub fn overview_links(html: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    html.select(&SEL_INTERNAL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("generated"))
        .map(|href| href.split('#').next().unwrap_or(href).to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
