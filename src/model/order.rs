use crate::auth::Params;
use crate::error::RoboError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    StopLoss,
    StopLossLimit,
    TakeProfit,
    TakeProfitLimit,
    LimitMaker,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::StopLoss => "STOP_LOSS",
            Self::StopLossLimit => "STOP_LOSS_LIMIT",
            Self::TakeProfit => "TAKE_PROFIT",
            Self::TakeProfitLimit => "TAKE_PROFIT_LIMIT",
            Self::LimitMaker => "LIMIT_MAKER",
        }
    }

    const fn needs_price(&self) -> bool {
        matches!(
            self,
            Self::Limit | Self::StopLossLimit | Self::TakeProfitLimit | Self::LimitMaker
        )
    }

    const fn needs_time_in_force(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLossLimit | Self::TakeProfitLimit)
    }

    const fn needs_stop_price(&self) -> bool {
        matches!(
            self,
            Self::StopLoss | Self::StopLossLimit | Self::TakeProfit | Self::TakeProfitLimit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

impl TimeInForce {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gtc => "GTC",
            Self::Ioc => "IOC",
            Self::Fok => "FOK",
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(OrderSide, OrderType, TimeInForce);

/// A new order. `quantity` is always required.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: Option<f64>,
    pub time_in_force: Option<TimeInForce>,
    pub stop_price: Option<f64>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            time_in_force: None,
            stop_price: None,
        }
    }

    /// Good-till-cancelled limit order.
    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
            stop_price: None,
        }
    }

    pub fn with_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }

    pub fn with_stop_price(mut self, stop_price: f64) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn validate(&self) -> Result<(), RoboError> {
        if self.symbol.trim().is_empty() {
            return Err(RoboError::config("order symbol is empty"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(RoboError::config(format!(
                "order quantity must be positive, got {}",
                self.quantity
            )));
        }
        check_positive("price", self.price)?;
        check_positive("stop price", self.stop_price)?;

        if self.order_type.needs_price() && self.price.is_none() {
            return Err(RoboError::config(format!(
                "{} order requires a price",
                self.order_type
            )));
        }
        if self.order_type.needs_time_in_force() && self.time_in_force.is_none() {
            return Err(RoboError::config(format!(
                "{} order requires a time in force",
                self.order_type
            )));
        }
        if self.order_type.needs_stop_price() && self.stop_price.is_none() {
            return Err(RoboError::config(format!(
                "{} order requires a stop price",
                self.order_type
            )));
        }
        Ok(())
    }

    /// Validated, unsigned parameters in the order the exchange documents them.
    pub fn to_params(&self) -> Result<Params, RoboError> {
        self.validate()?;
        Ok(Params::new()
            .with("symbol", &self.symbol)
            .with("side", self.side)
            .with("type", self.order_type)
            .with_opt("timeInForce", self.time_in_force)
            .with("quantity", self.quantity)
            .with_opt("price", self.price)
            .with_opt("stopPrice", self.stop_price))
    }
}

fn check_positive(name: &str, value: Option<f64>) -> Result<(), RoboError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(RoboError::config(format!(
            "order {} must be positive, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

/// An order as reported by `allOrders` / `openOrders`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: String,
    pub price: String,
    pub orig_qty: String,
    pub executed_qty: String,
    pub status: String,
    #[serde(default)]
    pub time_in_force: Option<String>,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    #[serde(default)]
    pub time: i64,
}
