//! Commodity price lookup.
//!
//! Proxies an Agmarknet-style daily price feed. The upstream batch is cached
//! for a short while and filtered locally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rawmate_common::config::MarketPricesConfig;
use rawmate_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Unit the feed reports prices in.
pub const PRICE_UNIT: &str = "Rs./Quintal";

/// Lookup parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MarketPriceQuery {
    pub state: Option<String>,
    /// Matched against the feed's `district`.
    pub city: Option<String>,
    pub commodity: Option<String>,
}

impl MarketPriceQuery {
    fn require(&self) -> AppResult<(&str, &str, &str)> {
        fn field(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        match (field(&self.state), field(&self.city), field(&self.commodity)) {
            (Some(state), Some(city), Some(commodity)) => Ok((state, city, commodity)),
            _ => Err(AppError::Validation(
                "State, city, and commodity are required.".to_string(),
            )),
        }
    }
}

/// One market's prices for a commodity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub commodity: String,
    pub market: String,
    pub min_price: f64,
    pub max_price: f64,
    pub modal_price: f64,
    pub unit: &'static str,
}

/// Prices arrive as strings or numbers depending on the resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A row of the upstream feed.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    #[serde(default)]
    state: String,
    #[serde(default)]
    district: String,
    #[serde(default)]
    market: String,
    #[serde(default)]
    commodity: String,
    min_price: Option<PriceValue>,
    max_price: Option<PriceValue>,
    modal_price: Option<PriceValue>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    records: Vec<PriceRecord>,
}

fn same(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Rows matching state, district and commodity exactly, ignoring case.
///
/// Rows without parseable prices are dropped.
#[must_use]
pub fn filter_prices(
    records: &[PriceRecord],
    state: &str,
    city: &str,
    commodity: &str,
) -> Vec<MarketPrice> {
    records
        .iter()
        .filter(|r| same(&r.state, state) && same(&r.district, city) && same(&r.commodity, commodity))
        .filter_map(|r| {
            let price = |v: &Option<PriceValue>| v.as_ref().and_then(PriceValue::as_f64);
            Some(MarketPrice {
                commodity: r.commodity.clone(),
                market: r.market.clone(),
                min_price: price(&r.min_price)?,
                max_price: price(&r.max_price)?,
                modal_price: price(&r.modal_price)?,
                unit: PRICE_UNIT,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Arc<Vec<PriceRecord>>,
    expires_at: Instant,
}

/// Market price service.
#[derive(Clone)]
pub struct MarketPriceService {
    config: MarketPricesConfig,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<CacheEntry>>>,
}

impl MarketPriceService {
    /// Create a new market price service.
    pub fn new(config: MarketPricesConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Prices of a commodity in the markets of one district.
    pub async fn lookup(&self, query: &MarketPriceQuery) -> AppResult<Vec<MarketPrice>> {
        let (state, city, commodity) = query.require()?;

        let records = self.records().await?;
        let prices = filter_prices(&records, state, city, commodity);

        if prices.is_empty() {
            return Err(AppError::NotFound(format!(
                "No market prices found for {commodity} in {city}, {state}."
            )));
        }

        Ok(prices)
    }

    async fn records(&self) -> AppResult<Arc<Vec<PriceRecord>>> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref()
                && entry.expires_at > Instant::now()
            {
                return Ok(Arc::clone(&entry.records));
            }
        }

        let records = Arc::new(self.fetch().await?);

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            records: Arc::clone(&records),
            expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
        });

        Ok(records)
    }

    async fn fetch(&self) -> AppResult<Vec<PriceRecord>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Market price API key is not configured".to_string()))?;

        let limit = self.config.fetch_limit.to_string();
        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[("api-key", api_key), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Market price request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Market price API error: {status} - {body}"
            )));
        }

        let feed: FeedResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Failed to parse market price response: {e}"))
        })?;

        tracing::debug!(records = feed.records.len(), "Fetched market prices");
        Ok(feed.records)
    }
}
