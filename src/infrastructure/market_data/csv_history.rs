//! File-backed price history
//!
//! Reads `timestamp,open,high,low,close,volume` rows, one file per symbol.

use crate::domain::errors::MarketDataError;
use crate::domain::ml::PricePoint;
use crate::domain::ports::QuoteProvider;
use crate::domain::quote::Quote;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load and chronologically sort a price history CSV.
pub fn load_price_history(path: &Path) -> Result<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open price history {:?}", path))?;

    let mut points = Vec::new();
    for (line, row) in reader.deserialize::<PricePoint>().enumerate() {
        let point = row.with_context(|| format!("Invalid row {} in {:?}", line + 2, path))?;
        if !is_valid_point(&point) {
            anyhow::bail!(
                "Negative or non-numeric price/volume at row {} in {:?}",
                line + 2,
                path
            );
        }
        points.push(point);
    }
    points.sort_by_key(|p| p.timestamp);

    info!("Loaded {} price points from {:?}", points.len(), path);
    Ok(points)
}

fn is_valid_point(point: &PricePoint) -> bool {
    [point.open, point.high, point.low, point.close, point.volume]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
}

/// Quote provider over a directory holding `<SYMBOL>.csv` files, or over a
/// single file served for any symbol.
pub struct CsvQuoteProvider {
    directory: PathBuf,
    single_file: Option<PathBuf>,
}

impl CsvQuoteProvider {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            single_file: None,
        }
    }

    pub fn single_file(path: PathBuf) -> Self {
        Self {
            directory: PathBuf::new(),
            single_file: Some(path),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match &self.single_file {
            Some(path) => path.clone(),
            None => self.directory.join(format!("{}.csv", symbol.to_uppercase())),
        }
    }

    fn read(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(MarketDataError::NotFound {
                symbol: symbol.to_string(),
            });
        }
        load_price_history(&path).map_err(|e| {
            let io_failure = e
                .downcast_ref::<csv::Error>()
                .is_some_and(|err| err.is_io_error());
            if io_failure {
                MarketDataError::Upstream {
                    reason: format!("{:#}", e),
                }
            } else {
                MarketDataError::InvalidData {
                    symbol: symbol.to_string(),
                    reason: format!("{:#}", e),
                }
            }
        })
    }
}

#[async_trait]
impl QuoteProvider for CsvQuoteProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let history = self.read(symbol)?;
        let last = history.last().ok_or_else(|| MarketDataError::NotFound {
            symbol: symbol.to_string(),
        })?;
        let previous_close = history
            .len()
            .checked_sub(2)
            .map(|i| history[i].close)
            .unwrap_or(last.open);
        let change = last.close - previous_close;

        Ok(Quote {
            symbol: symbol.to_uppercase(),
            price: last.close,
            change,
            change_percent: if previous_close != 0.0 {
                change / previous_close * 100.0
            } else {
                0.0
            },
            day_high: last.high,
            day_low: last.low,
            open: last.open,
            previous_close,
            volume: last.volume.max(0.0).round() as u64,
        })
    }

    async fn fetch_daily_series(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError> {
        self.read(symbol)
    }
}
