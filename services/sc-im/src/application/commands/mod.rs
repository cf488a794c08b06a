//! 应用命令

mod reservation_commands;
mod stock_commands;

pub use reservation_commands::{
    CancelReservationCommand, ReleaseReservationCommand, ReserveStockCommand,
};
pub use stock_commands::{
    AdjustStockCommand, BlockStockRecordCommand, IssueStockCommand, IssueStockFifoCommand,
    MarkRecordForDeletionCommand, ReceiveStockCommand, SetStockLevelsCommand,
    TransferStockCommand, UnblockStockRecordCommand,
};
