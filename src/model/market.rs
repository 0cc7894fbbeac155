use serde::{Deserialize, Deserializer, Serialize};

/// Response of `/api/v3/time`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: i64,
}

/// Response of `/api/v3/avgPrice`: mean price over the last `mins` minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AveragePrice {
    pub mins: u32,
    #[serde(deserialize_with = "decimal_string")]
    pub price: f64,
}

/// Response of `/api/v3/ticker/price`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(deserialize_with = "decimal_string")]
    pub price: f64,
}

/// One public trade from `/api/v3/historicalTrades`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    #[serde(deserialize_with = "decimal_string")]
    pub price: f64,
    #[serde(deserialize_with = "decimal_string")]
    pub qty: f64,
    #[serde(deserialize_with = "decimal_string")]
    pub quote_qty: f64,
    pub time: i64,
    pub is_buyer_maker: bool,
    #[serde(default)]
    pub is_best_match: bool,
}

// Prices arrive as JSON strings ("0.01634000").
fn decimal_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}
