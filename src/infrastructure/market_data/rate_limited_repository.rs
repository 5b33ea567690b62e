use crate::domain::errors::MarketDataError;
use crate::domain::ml::PricePoint;
use crate::domain::ports::{HistoricalDataSource, QuoteProvider};
use crate::domain::quote::Quote;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

pub const DEFAULT_MIN_CALL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

/// Gates a [`QuoteProvider`] behind a minimum call spacing and serves
/// recent results from memory.
///
/// Callers that arrive inside the spacing window wait their turn rather
/// than fail.
pub struct RateLimitedQuoteRepository {
    provider: Arc<dyn QuoteProvider>,
    min_interval: Duration,
    cache_ttl: Duration,
    last_call: Mutex<Option<Instant>>,
    quotes: RwLock<HashMap<String, CacheEntry<Quote>>>,
    histories: RwLock<HashMap<String, CacheEntry<Arc<Vec<PricePoint>>>>>,
}

impl RateLimitedQuoteRepository {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self::with_limits(provider, DEFAULT_MIN_CALL_INTERVAL, DEFAULT_CACHE_TTL)
    }

    pub fn with_limits(
        provider: Arc<dyn QuoteProvider>,
        min_interval: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            min_interval,
            cache_ttl,
            last_call: Mutex::new(None),
            quotes: RwLock::new(HashMap::new()),
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Latest quote, from cache when younger than the TTL.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        if let Some(quote) = self.cached(&self.quotes, symbol) {
            debug!("RateLimitedQuoteRepository: Cache hit for {} quote", symbol);
            return Ok(quote);
        }

        let mut last_call = self.last_call.lock().await;
        // Another caller may have filled the entry while we queued.
        if let Some(quote) = self.cached(&self.quotes, symbol) {
            return Ok(quote);
        }
        self.respect_rate_limit(&mut last_call).await;
        let quote = self.provider.fetch_quote(symbol).await?;
        self.store(&self.quotes, symbol, quote.clone());
        Ok(quote)
    }

    /// Drop cached entries so the next read goes upstream.
    pub fn invalidate(&self, symbol: &str) {
        self.quotes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(symbol);
        self.histories
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(symbol);
    }

    /// Sleeps out the remaining spacing. The caller holds the upstream lock
    /// until its fetch has been stored.
    async fn respect_rate_limit(&self, last_call: &mut Option<Instant>) {
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                info!(
                    "RateLimitedQuoteRepository: Waiting {:?} before next upstream call",
                    wait
                );
                tokio::time::sleep(wait).await;
            }
        }
        *last_call = Some(Instant::now());
    }

    fn cached<T: Clone>(
        &self,
        cache: &RwLock<HashMap<String, CacheEntry<T>>>,
        symbol: &str,
    ) -> Option<T> {
        let cache = cache.read().unwrap_or_else(|e| e.into_inner());
        cache
            .get(symbol)
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.value.clone())
    }

    fn store<T>(&self, cache: &RwLock<HashMap<String, CacheEntry<T>>>, symbol: &str, value: T) {
        cache.write().unwrap_or_else(|e| e.into_inner()).insert(
            symbol.to_string(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl HistoricalDataSource for RateLimitedQuoteRepository {
    async fn get_history(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError> {
        if let Some(history) = self.cached(&self.histories, symbol) {
            debug!("RateLimitedQuoteRepository: Cache hit for {} history", symbol);
            return Ok(history.as_ref().clone());
        }

        let mut last_call = self.last_call.lock().await;
        if let Some(history) = self.cached(&self.histories, symbol) {
            return Ok(history.as_ref().clone());
        }
        self.respect_rate_limit(&mut last_call).await;
        let mut history = self.provider.fetch_daily_series(symbol).await?;
        history.sort_by_key(|p| p.timestamp);
        let history = Arc::new(history);
        self.store(&self.histories, symbol, Arc::clone(&history));
        Ok(history.as_ref().clone())
    }
}
