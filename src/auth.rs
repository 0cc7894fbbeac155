use crate::error::RoboError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window sent with every signed request.
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// Ordered request parameters.
///
/// The exchange verifies the signature over the query string exactly as
/// sent, so pairs keep their insertion order and are never sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// Append a pair only when `value` is present.
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.push(key, v);
        }
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as `k1=v1&k2=v2` in insertion order.
    pub fn to_query_string(&self) -> String {
        stringify_params(self)
    }
}

/// Concatenate `key=value` pairs with `&`, in insertion order.
pub fn stringify_params(params: &Params) -> String {
    let mut out = String::new();
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// HMAC-SHA256 of the serialized params, keyed by `secret`, as lowercase hex.
pub fn generate_signature(params: &Params, secret: &str) -> Result<String, RoboError> {
    if secret.trim().is_empty() {
        return Err(RoboError::config("secret key is empty"));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RoboError::config(format!("invalid secret key: {}", e)))?;
    mac.update(stringify_params(params).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signs account-endpoint parameters with a fixed secret.
#[derive(Clone)]
pub struct Signer {
    secret: String,
    recv_window_ms: u64,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"***")
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}

impl Signer {
    /// Fails if the secret is empty, so a bad setup is caught before any request.
    pub fn new(secret: impl Into<String>) -> Result<Self, RoboError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(RoboError::config("secret key is empty"));
        }
        Ok(Self {
            secret,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        })
    }

    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    pub fn recv_window_ms(&self) -> u64 {
        self.recv_window_ms
    }

    pub fn sign(&self, params: &Params) -> Result<String, RoboError> {
        generate_signature(params, &self.secret)
    }

    /// Append `timestamp` and `recvWindow`, then the signature over everything.
    pub fn signed(&self, params: Params, timestamp_ms: i64) -> Result<Params, RoboError> {
        let params = params
            .with("timestamp", timestamp_ms)
            .with("recvWindow", self.recv_window_ms);
        let signature = self.sign(&params)?;
        Ok(params.with("signature", signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    #[test]
    fn test_stringify_keeps_insertion_order() {
        let params = Params::new()
            .with("symbol", "XRPUSDT")
            .with("interval", "1h")
            .with("limit", 2);
        assert_eq!(stringify_params(&params), "symbol=XRPUSDT&interval=1h&limit=2");
        assert_eq!(stringify_params(&Params::new()), "");
        assert_eq!(stringify_params(&Params::new().with("a", "1")), "a=1");
    }

    #[test]
    fn test_known_signature() {
        let params = Params::new()
            .with("symbol", "LTCBTC")
            .with("side", "BUY")
            .with("type", "LIMIT")
            .with("timeInForce", "GTC")
            .with("quantity", "1")
            .with("price", "0.1")
            .with("recvWindow", "5000")
            .with("timestamp", "1499827319559");

        let sig = generate_signature(&params, SECRET).unwrap();
        assert_eq!(
            sig,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let params = Params::new().with("symbol", "BTCUSDT").with("timestamp", 1);
        let a = generate_signature(&params, "key").unwrap();
        let b = generate_signature(&params, "key").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        let ab = Params::new().with("a", "1").with("b", "2");
        let ba = Params::new().with("b", "2").with("a", "1");
        assert_ne!(
            generate_signature(&ab, "key").unwrap(),
            generate_signature(&ba, "key").unwrap()
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        let params = Params::new().with("a", "1");
        assert!(generate_signature(&params, "").unwrap_err().is_config());
        assert!(Signer::new("   ").unwrap_err().is_config());
    }

    #[test]
    fn test_signed_params_layout() {
        let signer = Signer::new("key").unwrap();
        let params = signer
            .signed(Params::new().with("symbol", "BTCUSDT"), 1_600_000_000_000)
            .unwrap();

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["symbol", "timestamp", "recvWindow", "signature"]);
        assert_eq!(params.get("timestamp"), Some("1600000000000"));
        assert_eq!(params.get("recvWindow"), Some("5000"));

        // The signature covers every pair that precedes it.
        let unsigned = Params::new()
            .with("symbol", "BTCUSDT")
            .with("timestamp", 1_600_000_000_000_i64)
            .with("recvWindow", 5000);
        assert_eq!(
            params.get("signature").unwrap(),
            signer.sign(&unsigned).unwrap()
        );
    }

    #[test]
    fn test_custom_recv_window() {
        let signer = Signer::new("key").unwrap().with_recv_window(10_000);
        let params = signer.signed(Params::new(), 42).unwrap();
        assert_eq!(params.get("recvWindow"), Some("10000"));
        assert!(format!("{:?}", signer).contains("***"));
    }
}
