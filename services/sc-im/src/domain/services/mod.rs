//! 领域服务

pub mod fifo;

pub use fifo::{plan_allocation, BatchAllocation};
