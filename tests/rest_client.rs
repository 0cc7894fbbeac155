use robotrader::auth::{generate_signature, Params};
use robotrader::{
    ClientConfig, Credentials, FetchConfig, HistoricalFetcher, OrderRequest, OrderSide,
    RestClient, RoboError,
};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{header, method, path, query_param},
    Match, Mock, MockServer, Request, ResponseTemplate,
};

const API_KEY: &str = "test-api-key";
const SECRET: &str = "test-secret-key";
const HOUR: i64 = 3_600_000;

/// Helper: start a mock server and a client pointed at it.
async fn setup() -> (MockServer, RestClient) {
    let mock_server = MockServer::start().await;
    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .credentials(Credentials::new(API_KEY, SECRET))
        .build();
    let client = RestClient::new(config).unwrap();
    (mock_server, client)
}

fn kline(open_time: i64, width: i64) -> serde_json::Value {
    json!([
        open_time,
        "29000.00",
        "29500.00",
        "28800.00",
        "29200.00",
        "1000.00",
        open_time + width - 1,
        "29000000.00",
        5000,
        "500.00",
        "14500000.00",
        "0"
    ])
}

/// Accepts a request only if its `signature` is the HMAC of everything before it.
struct ValidSignature;

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let Some(query) = request.url.query() else {
            return false;
        };
        let Some((payload, signature)) = query.rsplit_once("&signature=") else {
            return false;
        };
        let params = payload.split('&').fold(Params::new(), |params, pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            params.with(k, v)
        });
        generate_signature(&params, SECRET).ok().as_deref() == Some(signature)
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_candles_sends_bounds_and_api_key() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1h"))
        .and(query_param("limit", "2"))
        .and(query_param("startTime", "0"))
        .and(query_param("endTime", "7200000"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([kline(0, HOUR), kline(HOUR, HOUR)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = robotrader::CandleQuery {
        symbol: "BTCUSDT".to_string(),
        interval: "1h".parse().unwrap(),
        limit: 2,
        start_time: Some(0),
        end_time: Some(7_200_000),
    };
    let candles = client.get_candles(&query).await.unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open_time, 0);
    assert_eq!(candles[0].close_time, 3_599_999);
    assert!((candles[0].close - 29200.0).abs() < 1e-6);
    assert_eq!(candles[1].trade_count, 5000);
}

#[tokio::test]
async fn test_api_error_is_surfaced() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .mount(&mock_server)
        .await;

    let err = client.get_ticker_price("NOPE").await.unwrap_err();
    assert!(err.is_transient());
    match err {
        RoboError::Api { status, code, msg } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(code, -1121);
            assert_eq!(msg, "Invalid symbol.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_prices_and_server_time() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serverTime": 1_609_459_200_000_i64})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/avgPrice"))
        .and(query_param("symbol", "XRPUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mins": 5, "price": "0.51230000"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .and(query_param("symbol", "XRPUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"symbol": "XRPUSDT", "price": "0.51300000"})))
        .mount(&mock_server)
        .await;

    assert_eq!(client.get_server_time().await.unwrap(), 1_609_459_200_000);
    let avg = client.get_average_price("XRPUSDT").await.unwrap();
    assert!((avg.price - 0.5123).abs() < 1e-9);
    let ticker = client.get_ticker_price("XRPUSDT").await.unwrap();
    assert_eq!(ticker.symbol, "XRPUSDT");
    assert!((ticker.price - 0.513).abs() < 1e-9);
}

#[tokio::test]
async fn test_historical_trades_sends_key_and_query() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/historicalTrades"))
        .and(query_param("symbol", "XRPUSDT"))
        .and(query_param("limit", "2"))
        .and(query_param("fromId", "28457"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 28457,
                "price": "0.51230000",
                "qty": "120.00000000",
                "quoteQty": "61.47600000",
                "time": 1_609_459_200_000_i64,
                "isBuyerMaker": true,
                "isBestMatch": true
            },
            {
                "id": 28458,
                "price": "0.51240000",
                "qty": "10.00000000",
                "quoteQty": "5.12400000",
                "time": 1_609_459_200_500_i64,
                "isBuyerMaker": false,
                "isBestMatch": true
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trades = client
        .get_historical_trades("XRPUSDT", Some(2), Some(28457))
        .await
        .unwrap();

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].id, 28457);
    assert!((trades[1].price - 0.5124).abs() < 1e-9);
    assert!(!trades[1].is_buyer_maker);
}

// ---------------------------------------------------------------------------
// Paginated history over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetcher_paginates_over_http() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("startTime", "0"))
        .and(query_param("endTime", "7200000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([kline(0, HOUR), kline(HOUR, HOUR)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("startTime", "7200000"))
        .and(query_param("endTime", "14400000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            kline(2 * HOUR, HOUR),
            kline(3 * HOUR, HOUR)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FetchConfig::builder().limit(2).unthrottled().build();
    let fetcher = HistoricalFetcher::with_config(client, config);
    let series = fetcher
        .fetch_range("BTCUSDT", "1h".parse().unwrap(), Some(0), Some(4 * HOUR))
        .await
        .unwrap();

    assert_eq!(series.len(), 4);
    assert!(series.is_contiguous());
    assert_eq!(series.last().unwrap().open_time, 3 * HOUR);
}

#[tokio::test]
async fn test_fetcher_start_only_uses_server_time() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serverTime": HOUR + 1_234})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("startTime", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([kline(0, HOUR)])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FetchConfig::builder().limit(1000).unthrottled().build();
    let fetcher = HistoricalFetcher::with_config(client, config);
    let series = fetcher
        .fetch_range("BTCUSDT", "1h".parse().unwrap(), Some(0), None)
        .await
        .unwrap();

    assert_eq!(series.len(), 1);
}

// ---------------------------------------------------------------------------
// Signed endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_all_orders_is_signed() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/allOrders"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("recvWindow", "5000"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "symbol": "BTCUSDT",
            "orderId": 7,
            "clientOrderId": "abc",
            "price": "30000.00",
            "origQty": "0.01",
            "executedQty": "0.00",
            "status": "NEW",
            "timeInForce": "GTC",
            "type": "LIMIT",
            "side": "BUY",
            "time": 1_609_459_200_000_i64
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orders = client.get_all_orders("BTCUSDT").await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, 7);
    assert_eq!(orders[0].status, "NEW");
}

#[tokio::test]
async fn test_open_orders_always_issues_request() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/openOrders"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    assert!(client.get_open_orders(None).await.unwrap().is_empty());
    assert!(client.get_open_orders(Some("BTCUSDT")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_place_order_hits_test_endpoint() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/order/test"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("side", "SELL"))
        .and(query_param("type", "LIMIT"))
        .and(query_param("timeInForce", "GTC"))
        .and(query_param("quantity", "0.25"))
        .and(query_param("price", "31000"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let order = OrderRequest::limit("BTCUSDT", OrderSide::Sell, 0.25, 31000.0);
    let response = client.place_order(&order).await.unwrap();
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn test_invalid_order_never_reaches_server() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, -1.0);
    let err = client.place_order(&order).await.unwrap_err();
    assert!(err.is_config());
}
