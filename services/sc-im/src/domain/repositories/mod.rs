//! 仓储接口

mod stock_query_repository;

pub use stock_query_repository::{
    MovementFilter, ReservationFilter, StockQueryRepository, StockRecordFilter,
};
