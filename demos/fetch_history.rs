//! Fetch a historical candle series and append it to a CSV file.
//!
//! Usage: cargo run --example fetch_history -- BTCUSDT 1m "March 13, 2020" "May 10, 2020 7pm"
//!
//! Credentials are optional for market data; when `BINANCE_API_KEY` and
//! `BINANCE_SECRET_KEY` are set (directly or via `.env`) they are attached.

use robotrader::{ClientConfig, Credentials, CsvSink, FetchConfig, HistoricalFetcher, RestClient};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info,robotrader=debug"))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let symbol = args.first().map(String::as_str).unwrap_or("BTCUSDT");
    let interval = args.get(1).map(String::as_str).unwrap_or("1m");
    let start = args.get(2).map(String::as_str);
    let end = args.get(3).map(String::as_str);

    let config = match Credentials::from_env() {
        Ok(credentials) => ClientConfig::with_credentials(credentials),
        Err(_) => ClientConfig::default(),
    };
    let client = RestClient::new(config)?;

    let fetcher = HistoricalFetcher::with_config(client, FetchConfig::default());
    let series = fetcher.fetch(symbol, interval, start, end).await?;

    println!(
        "Fetched {} candles ({} contiguous)",
        series.len(),
        if series.is_contiguous() { "all" } else { "not" }
    );

    let sink = CsvSink::new("historical_data.csv");
    let rows = sink.write(&series)?;
    println!("Wrote {} rows to {}", rows, sink.path().display());

    Ok(())
}
