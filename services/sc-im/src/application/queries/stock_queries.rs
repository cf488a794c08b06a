//! 库存查询

use common::types::{Pagination, TenantId};

use crate::domain::repositories::{MovementFilter, StockRecordFilter};
use crate::domain::value_objects::{MaterialId, StockKey};

/// 获取库存记录查询
#[derive(Debug, Clone)]
pub struct GetStockRecordQuery {
    pub tenant_id: TenantId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
}

impl GetStockRecordQuery {
    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 可用库存查询
///
/// 汇总 (物料, 工厂, 库存地点) 范围内全部活跃记录的可用数量。
#[derive(Debug, Clone)]
pub struct AvailableStockQuery {
    pub tenant_id: TenantId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
}

impl AvailableStockQuery {
    pub fn scope(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}

/// 可用性检查查询
#[derive(Debug, Clone)]
pub struct IsAvailableQuery {
    pub tenant_id: TenantId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub quantity: i64,
}

impl IsAvailableQuery {
    pub fn scope(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}

/// 批次列表查询
#[derive(Debug, Clone)]
pub struct ListBatchesQuery {
    pub tenant_id: TenantId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
}

impl ListBatchesQuery {
    pub fn scope(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}

/// 库存记录列表查询
#[derive(Debug, Clone)]
pub struct ListStockRecordsQuery {
    pub tenant_id: TenantId,
    pub filter: StockRecordFilter,
    pub pagination: Pagination,
}

/// 低水位库存查询
#[derive(Debug, Clone)]
pub struct ListLowStockQuery {
    pub tenant_id: TenantId,
    pub plant: Option<String>,
}

/// 超水位库存查询
#[derive(Debug, Clone)]
pub struct ListOverStockQuery {
    pub tenant_id: TenantId,
    pub plant: Option<String>,
}

/// 库存流水列表查询
#[derive(Debug, Clone)]
pub struct ListMovementsQuery {
    pub tenant_id: TenantId,
    pub filter: MovementFilter,
    pub pagination: Pagination,
}

/// FIFO 分配预演查询
///
/// 只计算分配计划,不加锁不扣减,结果可直接丢弃。
#[derive(Debug, Clone)]
pub struct PlanFifoAllocationQuery {
    pub tenant_id: TenantId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub quantity: i64,
}

impl PlanFifoAllocationQuery {
    pub fn scope(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}
