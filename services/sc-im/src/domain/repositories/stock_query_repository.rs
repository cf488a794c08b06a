//! 库存查询仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{PagedResult, Pagination, TenantId};
use errors::AppResult;

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::enums::MovementType;
use crate::domain::value_objects::{MaterialId, ReservationId, StockKey};

/// 库存记录查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct StockRecordFilter {
    pub material_id: Option<MaterialId>,
    pub plant: Option<String>,
}

/// 库存流水查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub material_id: Option<MaterialId>,
    pub plant: Option<String>,
    pub batch_number: Option<String>,
    pub movement_type: Option<MovementType>,
    pub document_number: Option<String>,
    pub posted_from: Option<DateTime<Utc>>,
    pub posted_to: Option<DateTime<Utc>>,
}

/// 活跃预留查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub material_id: Option<MaterialId>,
    pub plant: Option<String>,
}

/// 库存查询仓储
///
/// 无事务语义的读取接口,供查询场景直接走连接池。
/// 除流水外,所有查询默认排除标记删除的记录。
#[async_trait]
pub trait StockQueryRepository: Send + Sync {
    /// 按库存键查询单条记录
    async fn find_record(
        &self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>>;

    /// 查询范围内 (物料 + 工厂 + 库存地点) 的全部记录,FIFO 顺序
    ///
    /// 键的批次维度被忽略。
    async fn find_records_in_scope(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>>;

    /// 分页查询库存记录
    async fn list_records(
        &self,
        tenant_id: &TenantId,
        filter: &StockRecordFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockRecord>>;

    /// 查询范围内的批次记录,按批次日期升序、同日期按记录 ID 升序
    async fn list_batches(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>>;

    /// 范围内活跃记录的可用库存合计
    async fn available_stock(&self, tenant_id: &TenantId, scope: &StockKey) -> AppResult<i64>;

    /// 现有库存不高于最低水位的记录
    async fn list_low_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>>;

    /// 现有库存高于最高水位的记录
    async fn list_over_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>>;

    /// 分页查询库存流水,按过账时间倒序
    async fn list_movements(
        &self,
        tenant_id: &TenantId,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockMovement>>;

    /// 按 ID 查询预留
    async fn find_reservation(
        &self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>>;

    /// 查询仍持有数量的预留,按创建时间先后排列
    async fn list_active_reservations(
        &self,
        tenant_id: &TenantId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>>;

    /// 查询已过期但仍持有数量的预留,跨租户,供清理任务使用
    async fn list_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Reservation>>;
}
