//! 领域实体

mod reservation;
mod stock_movement;
mod stock_record;

pub use reservation::Reservation;
pub use stock_movement::StockMovement;
pub use stock_record::StockRecord;
