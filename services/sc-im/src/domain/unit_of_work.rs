//! Unit of Work 模式
//!
//! 库存变更的原子性边界: 同一业务操作内的读取、校验、写入
//! 必须发生在同一个 UnitOfWork 中,提交即生效,中途失败整体回滚。
//! 带 for_update 的读取在数据库实现中对行加锁,
//! 库存记录因此成为并发控制的天然单位。

use async_trait::async_trait;
use common::types::TenantId;
use errors::AppResult;

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::value_objects::{ReservationId, StockKey, StockRecordId};

/// 库存 Unit of Work
///
/// # 使用示例
///
/// ```ignore
/// let mut uow = uow_factory.begin().await?;
///
/// let mut record = uow
///     .find_record_for_update(&tenant_id, &key)
///     .await?
///     .ok_or(InventoryError::RecordNotFound)?;
/// record.issue(quantity)?;
///
/// uow.update_record(&record).await?;
/// uow.insert_movement(&movement).await?;
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait StockUnitOfWork: Send {
    /// 按库存键锁定并读取记录
    async fn find_record_for_update(
        &mut self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>>;

    /// 按 ID 锁定并读取记录
    async fn find_record_by_id_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &StockRecordId,
    ) -> AppResult<Option<StockRecord>>;

    /// 锁定并读取范围内 (物料 + 工厂 + 库存地点) 的全部记录
    ///
    /// 键的批次维度被忽略,返回该范围内所有批次及无批次记录,
    /// 按 FIFO 顺序排列。FIFO 出库以此一次锁定整个消耗范围。
    async fn find_records_in_scope_for_update(
        &mut self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>>;

    /// 插入新记录
    async fn insert_record(&mut self, record: &StockRecord) -> AppResult<()>;

    /// 更新记录
    async fn update_record(&mut self, record: &StockRecord) -> AppResult<()>;

    /// 追加一条流水
    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()>;

    /// 锁定并读取预留
    async fn find_reservation_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>>;

    /// 插入新预留
    async fn insert_reservation(&mut self, reservation: &Reservation) -> AppResult<()>;

    /// 更新预留
    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<()>;

    /// 提交事务
    ///
    /// 成功时所有更改一并持久化,失败时自动回滚。
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait StockUnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn StockUnitOfWork>>;
}
