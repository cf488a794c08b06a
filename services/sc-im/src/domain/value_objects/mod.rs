//! 值对象

mod ids;
mod stock_key;

pub use ids::{MaterialId, MovementId, ReservationId, StockRecordId};
pub use stock_key::StockKey;
