//! 应用查询

mod reservation_queries;
mod stock_queries;

pub use reservation_queries::{GetReservationQuery, ListActiveReservationsQuery};
pub use stock_queries::{
    AvailableStockQuery, GetStockRecordQuery, IsAvailableQuery, ListBatchesQuery,
    ListLowStockQuery, ListMovementsQuery, ListOverStockQuery, ListStockRecordsQuery,
    PlanFifoAllocationQuery,
};
