//! HTTP access to the cars listing endpoint, with an in-process response cache.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use common::listing::{ListingPage, ListingRequest};
use dashmap::DashMap;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::ListingConfig;


/// Anything that can answer a listing request. The HTTP client is the real
/// one; tests and other transports plug in here.
pub trait ListingSource: Send + Sync + 'static {
    fn fetch_listings(&self, request: &ListingRequest) -> impl Future<Output = anyhow::Result<ListingPage>> + Send;

    /// Same as `fetch_listings`, but must not answer from a cache.
    fn fetch_listings_fresh(&self, request: &ListingRequest) -> impl Future<Output = anyhow::Result<ListingPage>> + Send {
        self.fetch_listings(request)
    }
}


struct CachedPage {
    fetched_at: Instant,
    page: ListingPage,
}

pub struct CarsApiClient {
    http: reqwest::Client,
    api_url: String,
    cache_ttl: Duration,
    cache_capacity: usize,
    cache: DashMap<String, CachedPage>,
}

impl CarsApiClient {
    pub fn new(config: &ListingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            cache_ttl: config.cache_ttl,
            cache_capacity: config.cache_capacity,
            cache: DashMap::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(&ListingConfig::from_env())
    }

    pub fn listings_url(&self) -> String {
        format!("{}/cars", self.api_url)
    }

    pub fn request_url(&self, request: &ListingRequest) -> anyhow::Result<Url> {
        Ok(Url::parse_with_params(&self.listings_url(), request.query_pairs())?)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Answers from the cache while the entry is younger than the TTL.
    pub async fn fetch(&self, request: &ListingRequest) -> anyhow::Result<ListingPage> {
        let url = self.request_url(request)?;
        let query_hash = sha256::digest(url.as_str());
        let cached = self
            .cache
            .get(&query_hash)
            .map(|entry| (entry.fetched_at.elapsed() < self.cache_ttl).then(|| entry.page.clone()));
        match cached {
            Some(Some(page)) => {
                debug!(%query_hash, "listing cache hit");
                return Ok(page);
            }
            Some(None) => {
                debug!(%query_hash, "listing cache entry expired");
                self.cache.remove(&query_hash);
            }
            None => debug!(%query_hash, "listing cache miss"),
        }
        self.download(url, query_hash).await
    }

    /// Always goes to the backend, then replaces the cached entry.
    pub async fn fetch_fresh(&self, request: &ListingRequest) -> anyhow::Result<ListingPage> {
        let url = self.request_url(request)?;
        let query_hash = sha256::digest(url.as_str());
        self.download(url, query_hash).await
    }

    async fn download(&self, url: Url, query_hash: String) -> anyhow::Result<ListingPage> {
        let t0 = Instant::now();
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        let response_txt = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            warn!(%url, %status, "listing request failed");
            anyhow::bail!("Error: {}: {}", status, response_txt);
        }
        let page: ListingPage = serde_json::from_str(&response_txt)?;
        info!(
            %url,
            records = page.data.len(),
            total_pages = page.pagination.total_pages,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetched listings"
        );

        self.store(query_hash, page.clone());
        Ok(page)
    }

    fn store(&self, query_hash: String, page: ListingPage) {
        if self.cache_ttl.is_zero() || self.cache_capacity == 0 {
            return;
        }
        if !self.cache.contains_key(&query_hash) && self.cache.len() >= self.cache_capacity {
            self.cache.retain(|_, entry| entry.fetched_at.elapsed() < self.cache_ttl);
        }
        if !self.cache.contains_key(&query_hash) && self.cache.len() >= self.cache_capacity {
            let oldest = self.cache.iter().min_by_key(|entry| entry.fetched_at).map(|entry| entry.key().clone());
            if let Some(oldest) = oldest {
                debug!(query_hash = %oldest, "evicting oldest listing cache entry");
                self.cache.remove(&oldest);
            }
        }
        self.cache.insert(query_hash, CachedPage { fetched_at: Instant::now(), page });
    }
}

impl ListingSource for CarsApiClient {
    async fn fetch_listings(&self, request: &ListingRequest) -> anyhow::Result<ListingPage> {
        self.fetch(request).await
    }

    async fn fetch_listings_fresh(&self, request: &ListingRequest) -> anyhow::Result<ListingPage> {
        self.fetch_fresh(request).await
    }
}
