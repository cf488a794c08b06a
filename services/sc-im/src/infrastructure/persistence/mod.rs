//! Persistence implementations

mod converters;
mod memory;
mod migrations;
mod postgres;
mod rows;

pub use memory::{InMemoryStockStore, InMemoryStockUnitOfWork};
pub use migrations::migrations;
pub use postgres::{
    PostgresStockQueryRepository, PostgresStockUnitOfWork, PostgresStockUnitOfWorkFactory,
};
