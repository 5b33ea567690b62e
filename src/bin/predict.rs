//! StockTracker Predict - headless forecast runner
//!
//! Runs one routed 7-day prediction for a symbol from a CSV price history
//! and prints the result as JSON.
//!
//! # Usage
//! ```sh
//! cargo run --bin predict -- --symbol AAPL --history data/AAPL.csv --battery 15
//! ```
//!
//! # Environment Variables
//! - `ML_API_BASE_URL` - Prediction backend (default: http://10.0.2.2:8000)
//! - `ML_MODEL_PATH` - On-device ONNX model (default: models/trend_model.onnx)
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use stocktracker::application::ml::{HybridMlRouter, OnnxTrendPredictor};
use stocktracker::application::prediction_service::PredictionService;
use stocktracker::config::Config;
use stocktracker::domain::device::{DeviceStatus, NetworkTransport};
use stocktracker::infrastructure::market_data::{CsvQuoteProvider, RateLimitedQuoteRepository};
use stocktracker::infrastructure::{CloudMlClient, DeviceStatusMonitor};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    Wifi,
    Ethernet,
    Cellular,
    CellularUnmetered,
    None,
}

impl From<TransportArg> for NetworkTransport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Wifi => NetworkTransport::Wifi,
            TransportArg::Ethernet => NetworkTransport::Ethernet,
            TransportArg::Cellular => NetworkTransport::Cellular { unmetered: false },
            TransportArg::CellularUnmetered => NetworkTransport::Cellular { unmetered: true },
            TransportArg::None => NetworkTransport::None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a hybrid cloud/on-device price forecast")]
struct Args {
    /// Ticker symbol to forecast
    #[arg(short, long)]
    symbol: String,

    /// CSV file (timestamp,open,high,low,close,volume) or a directory of <SYMBOL>.csv files
    #[arg(long)]
    history: PathBuf,

    /// Simulated battery level in percent
    #[arg(long, default_value_t = 100)]
    battery: u8,

    /// Simulated network transport
    #[arg(long, value_enum, default_value_t = TransportArg::Wifi)]
    transport: TransportArg,

    /// Never call the cloud backend
    #[arg(long)]
    on_device_only: bool,

    /// Return the cloud error instead of falling back to the on-device model
    #[arg(long)]
    no_fallback: bool,

    /// Seed for the on-device path jitter
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    info!("StockTracker Predict {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let mut policy = config.ml.routing_policy();
    if args.on_device_only {
        policy.prefer_cloud = false;
    }
    if args.no_fallback {
        policy.allow_on_device_fallback = false;
    }
    info!(
        "Configuration loaded: backend={}, model={:?}, policy={:?}",
        config.ml.api_base_url, config.ml.model_path, policy
    );

    let provider = if args.history.is_dir() {
        CsvQuoteProvider::new(args.history.clone())
    } else {
        CsvQuoteProvider::single_file(args.history.clone())
    };
    let repository = Arc::new(RateLimitedQuoteRepository::with_limits(
        Arc::new(provider),
        config.market_data.min_call_interval(),
        config.market_data.cache_ttl(),
    ));

    let transport: NetworkTransport = args.transport.into();
    let device = Arc::new(DeviceStatusMonitor::new(DeviceStatus {
        network_available: transport != NetworkTransport::None,
        battery_percent: args.battery.min(100),
        transport,
    }));

    let cloud = Arc::new(CloudMlClient::new(
        config.ml.api_base_url.clone(),
        config.ml.http_timeout(),
    ));
    let predictor = Arc::new(OnnxTrendPredictor::new(config.ml.model_path.clone()));

    let mut router = HybridMlRouter::new(cloud.clone(), predictor, device);
    if let Some(seed) = args.seed {
        router = router.with_seed(seed);
    }

    let service = PredictionService::new(repository, Arc::new(router), cloud, policy)
        .with_min_history(config.market_data.prediction_min_history);

    let result = service
        .predict(&args.symbol)
        .await
        .with_context(|| format!("Prediction failed for {}", args.symbol))?;

    if result.source.is_degraded() {
        warn!("Result for {} came from a degraded path ({})", args.symbol, result.source);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
