//! 领域枚举

mod movement_type;
mod reservation_status;
mod reservation_type;
mod stock_record_status;

pub use movement_type::MovementType;
pub use reservation_status::ReservationStatus;
pub use reservation_type::ReservationType;
pub use stock_record_status::StockRecordStatus;
