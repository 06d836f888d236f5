use anyhow::Result;
use litefeed_rs::prelude::{BatchDriver, CsvStore, IngestConfig, LiteFinanceClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Candle collector
// Sweeps the configured symbol x timeframe matrix once and merges results into csv_data/

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = IngestConfig::from_env()?;
    info!(
        "Starting collector: {} symbols x {} timeframes into {}",
        config.symbols.len(),
        config.timeframes.len(),
        config.output_dir.display()
    );

    let client = LiteFinanceClient::new(&config)?;
    let store = CsvStore::new(config.output_dir.clone());
    let driver = BatchDriver::new(config, client, store);

    let report = driver.run().await;
    info!("{}", report.format());

    Ok(())
}
