//! Environment configuration for the listing client.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use common::listing_const::{DEBOUNCE_MS, PAGE_SIZE};
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ListingConfig {
    /// Base URL of the REST API, without the `/cars` suffix.
    pub api_url: String,
    pub page_size: u64,
    pub debounce: Duration,
    /// How long a cached response may be served again. Zero disables the cache.
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: PAGE_SIZE,
            debounce: Duration::from_millis(DEBOUNCE_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ListingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; missing or invalid values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url: String = try_load(&lookup, "CARS_API_URL", DEFAULT_API_URL.to_string());
        let page_size: u64 = try_load(&lookup, "LISTING_PAGE_SIZE", PAGE_SIZE);
        let debounce_ms: u64 = try_load(&lookup, "LISTING_DEBOUNCE_MS", DEBOUNCE_MS);
        let cache_ttl_secs: u64 = try_load(&lookup, "LISTING_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS);
        let cache_capacity: usize = try_load(&lookup, "LISTING_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY);

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            debounce: Duration::from_millis(debounce_ms),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(ListingConfig::from_lookup(|_| None), ListingConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ListingConfig::from_lookup(lookup_from(&[
            ("CARS_API_URL", "https://cars.example.vn/api/"),
            ("LISTING_PAGE_SIZE", "24"),
            ("LISTING_DEBOUNCE_MS", "250"),
            ("LISTING_CACHE_TTL_SECS", "0"),
            ("LISTING_CACHE_CAPACITY", "8"),
        ]));
        assert_eq!(config.api_url, "https://cars.example.vn/api");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.cache_capacity, 8);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = ListingConfig::from_lookup(lookup_from(&[("LISTING_PAGE_SIZE", "lots"), ("LISTING_DEBOUNCE_MS", "-3")]));
        assert_eq!(config.page_size, PAGE_SIZE);
        assert_eq!(config.debounce, Duration::from_millis(DEBOUNCE_MS));
    }
}
