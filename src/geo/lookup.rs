// src/geo/lookup.rs
// =============================================================================
// This module answers "is this visitor geo-exempt?" for a client IP.
//
// How it works:
// 1. Look the IP up in an in-memory cache (entries live for hours, not
//    seconds: countries rarely change for an address)
// 2. On a miss, ask an HTTP geo-IP service for the country code
// 3. Exempt if the country is in the configured set
//
// Failure policy: any network or parsing problem means "not exempt". The
// rewriter then nofollows normally, which is the safe default.
//
// The service must answer GET {endpoint}/{ip} with JSON containing a
// `countryCode` field (ip-api.com's format).
//
// Rust concepts:
// - async/await: the lookup is network I/O
// - Mutex<HashMap>: the cache is shared by concurrent lookups; the lock is
//   never held across an .await
// =============================================================================

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// Geo-lookup section of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Base URL of the geo-IP service
    pub endpoint: String,
    /// ISO country codes whose visitors are exempt from nofollow
    pub exempt_countries: Vec<String>,
    /// How long a resolved country is trusted
    pub ttl_hours: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://ip-api.com/json".to_string(),
            exempt_countries: Vec::new(),
            ttl_hours: 12,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountryResponse {
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedCountry {
    country: String,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct GeoLookup {
    client: Client,
    endpoint: String,
    exempt_countries: HashSet<String>,
    ttl: Duration,
    cache: Mutex<HashMap<IpAddr, CachedCountry>>,
}

impl GeoLookup {
    pub fn new(settings: &GeoSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            exempt_countries: settings
                .exempt_countries
                .iter()
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            ttl: Duration::from_secs(settings.ttl_hours.saturating_mul(60 * 60)),
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub async fn is_geo_exempt(&self, ip: IpAddr) -> bool {
        if self.exempt_countries.is_empty() {
            return false;
        }

        match self.country_of(ip).await {
            Some(country) => self.exempt_countries.contains(&country),
            None => false,
        }
    }

    // Upper-case country code for `ip`, from cache or the service.
    pub async fn country_of(&self, ip: IpAddr) -> Option<String> {
        if ip.is_loopback() || ip.is_unspecified() {
            return None;
        }
        if let Some(country) = self.cached(ip) {
            return Some(country);
        }

        match self.fetch_country(ip).await {
            Ok(country) => {
                self.remember(ip, &country);
                Some(country)
            }
            Err(e) => {
                log::warn!("geo lookup for {ip} failed: {e}");
                None
            }
        }
    }

    // Stores a known country for `ip`, as if the service had returned it.
    // Stale entries for other addresses are dropped on the way in, so the
    // cache holds at most one TTL window of visitors.
    pub fn remember(&self, ip: IpAddr, country: &str) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        cache.insert(
            ip,
            CachedCountry {
                country: country.trim().to_ascii_uppercase(),
                fetched_at: Instant::now(),
            },
        );
    }

    fn cached(&self, ip: IpAddr) -> Option<String> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match cache.get(&ip) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.country.clone()),
            Some(_) => {
                cache.remove(&ip);
                None
            }
            None => None,
        }
    }

    async fn fetch_country(&self, ip: IpAddr) -> Result<String> {
        let url = format!("{}/{}", self.endpoint, ip);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        let body: CountryResponse = response.json().await?;
        body.country_code
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("response has no countryCode"))
    }
}
