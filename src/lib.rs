pub mod auth;
pub mod client;
pub mod config;
mod error;
pub mod fetcher;
pub mod interval;
pub mod model;
pub mod storage;
pub mod time;

pub use auth::{Params, Signer};
pub use client::RestClient;
pub use config::{ClientConfig, Credentials};
pub use error::{Result, RoboError};
pub use fetcher::{CandleQuery, CandleSource, FetchConfig, HistoricalFetcher, PageThrottle};
pub use interval::Interval;
pub use model::{
    Candle, Order, OrderRequest, OrderSide, OrderType, Series, TimeInForce, Trade,
};
pub use storage::CsvSink;
