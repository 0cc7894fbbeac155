pub mod candle;
pub mod market;
pub mod order;
pub mod series;

pub use candle::{Candle, CandleRaw, CANDLE_COLUMNS};
pub use market::{AveragePrice, ServerTime, TickerPrice, Trade};
pub use order::{Order, OrderRequest, OrderSide, OrderType, TimeInForce};
pub use series::Series;
