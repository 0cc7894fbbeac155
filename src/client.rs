use crate::auth::{Params, Signer};
use crate::config::ClientConfig;
use crate::error::RoboError;
use crate::fetcher::{CandleQuery, CandleSource};
use crate::model::{
    AveragePrice, Candle, CandleRaw, Order, OrderRequest, ServerTime, TickerPrice, Trade,
};
use crate::time::now_ms;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn, Instrument};
use url::Url;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

const TIME_PATH: &str = "api/v3/time";
const AVG_PRICE_PATH: &str = "api/v3/avgPrice";
const TICKER_PRICE_PATH: &str = "api/v3/ticker/price";
const KLINES_PATH: &str = "api/v3/klines";
const HISTORICAL_TRADES_PATH: &str = "api/v3/historicalTrades";
const ALL_ORDERS_PATH: &str = "api/v3/allOrders";
const OPEN_ORDERS_PATH: &str = "api/v3/openOrders";
const ORDER_PATH: &str = "api/v3/order";
const TEST_ORDER_PATH: &str = "api/v3/order/test";

/// Error body returned with non-success statuses, e.g.
/// `{ "code": -1121, "msg": "Invalid symbol." }`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// REST client for the exchange's `/api/v3` endpoints.
///
/// Parameters are built fresh for every call; the client holds no
/// per-request state.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    signer: Option<Signer>,
    test_orders: bool,
}

impl RestClient {
    /// Validates the config up front: a bad URL or blank key fails here,
    /// before any request.
    pub fn new(config: ClientConfig) -> Result<Self, RoboError> {
        let base_url = config.validate()?;
        let signer = config
            .secret_key
            .as_deref()
            .map(|secret| Signer::new(secret).map(|s| s.with_recv_window(config.recv_window_ms)))
            .transpose()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
            signer,
            test_orders: config.test_orders,
        })
    }

    /// Client for public market data only.
    pub fn public() -> Result<Self, RoboError> {
        Self::new(ClientConfig::default())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_server_time(&self) -> Result<i64, RoboError> {
        let time: ServerTime = self.send(Method::GET, TIME_PATH, Params::new()).await?;
        Ok(time.server_time)
    }

    pub async fn get_average_price(&self, symbol: &str) -> Result<AveragePrice, RoboError> {
        let params = Params::new().with("symbol", symbol);
        self.send(Method::GET, AVG_PRICE_PATH, params).await
    }

    pub async fn get_ticker_price(&self, symbol: &str) -> Result<TickerPrice, RoboError> {
        let params = Params::new().with("symbol", symbol);
        self.send(Method::GET, TICKER_PRICE_PATH, params).await
    }

    /// One page of klines. Bounds are inclusive.
    pub async fn get_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>, RoboError> {
        let span = tracing::info_span!(
            "get_candles",
            symbol = %query.symbol,
            interval = %query.interval,
        );

        async move {
            let params = Params::new()
                .with("symbol", &query.symbol)
                .with("interval", query.interval)
                .with("limit", query.limit)
                .with_opt("startTime", query.start_time)
                .with_opt("endTime", query.end_time);

            let raw: Vec<CandleRaw> = self.send(Method::GET, KLINES_PATH, params).await?;
            let candles = raw
                .into_iter()
                .map(Candle::try_from)
                .collect::<Result<Vec<_>, _>>()?;

            debug!(count = candles.len(), "fetched klines batch");
            Ok::<_, RoboError>(candles)
        }
        .instrument(span)
        .await
    }

    /// Older public trades, oldest first, starting at `from_id` when given.
    /// Unsigned, but the exchange wants the API key header.
    pub async fn get_historical_trades(
        &self,
        symbol: &str,
        limit: Option<u32>,
        from_id: Option<u64>,
    ) -> Result<Vec<Trade>, RoboError> {
        if self.api_key.is_none() {
            return Err(RoboError::config("api key required for historical trades"));
        }
        let params = Params::new()
            .with("symbol", symbol)
            .with_opt("limit", limit)
            .with_opt("fromId", from_id);
        self.send(Method::GET, HISTORICAL_TRADES_PATH, params).await
    }

    /// Every order on the account for `symbol`. Signed.
    pub async fn get_all_orders(&self, symbol: &str) -> Result<Vec<Order>, RoboError> {
        let params = Params::new().with("symbol", symbol);
        self.send_signed(Method::GET, ALL_ORDERS_PATH, params).await
    }

    /// Open orders for `symbol`, or for every symbol when `None`. Signed.
    pub async fn get_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, RoboError> {
        let params = Params::new().with_opt("symbol", symbol);
        self.send_signed(Method::GET, OPEN_ORDERS_PATH, params).await
    }

    /// Submit an order. Goes to the test endpoint unless the client was
    /// configured with live orders.
    ///
    /// The request is validated before it is signed; an invalid quantity or a
    /// missing price never reaches the network.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value, RoboError> {
        let params = order.to_params()?;
        let path = if self.test_orders {
            TEST_ORDER_PATH
        } else {
            ORDER_PATH
        };
        debug!(symbol = %order.symbol, side = %order.side, order_type = %order.order_type, path, "placing order");
        self.send_signed(Method::POST, path, params).await
    }

    fn endpoint(&self, path: &str, params: &Params) -> Result<Url, RoboError> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            // Sent verbatim so the query matches what was signed.
            url.set_query(Some(&params.to_query_string()));
        }
        Ok(url)
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<T, RoboError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| RoboError::config("secret key required for signed endpoint"))?;
        if self.api_key.is_none() {
            return Err(RoboError::config("api key required for signed endpoint"));
        }

        let params = signer.signed(params, now_ms())?;
        self.send(method, path, params).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<T, RoboError> {
        let url = self.endpoint(path, &params)?;
        debug!(%method, path, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = api_error(status, &body);
            warn!(%status, path, "request rejected: {}", error);
            return Err(error);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn api_error(status: StatusCode, body: &str) -> RoboError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { code, msg }) => RoboError::Api { status, code, msg },
        Err(_) => RoboError::Api {
            status,
            code: 0,
            msg: body.chars().take(200).collect(),
        },
    }
}

impl CandleSource for RestClient {
    async fn get_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>, RoboError> {
        RestClient::get_candles(self, query).await
    }

    async fn get_server_time(&self) -> Result<i64, RoboError> {
        RestClient::get_server_time(self).await
    }
}
