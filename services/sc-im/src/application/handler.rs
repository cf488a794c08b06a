//! Business logic handler

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::types::PagedResult;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::enums::MovementType;
use crate::domain::repositories::StockQueryRepository;
use crate::domain::services::fifo::{self, BatchAllocation};
use crate::domain::unit_of_work::{StockUnitOfWork, StockUnitOfWorkFactory};
use crate::error::InventoryError;
use crate::infrastructure::observability::metrics;

use super::commands::*;
use super::queries::*;

/// 库存转移结果,两条流水共享同一单据号
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub issue: StockMovement,
    pub receipt: StockMovement,
}

pub struct ServiceHandler {
    uow_factory: Arc<dyn StockUnitOfWorkFactory>,
    query_repo: Arc<dyn StockQueryRepository>,
}

impl ServiceHandler {
    pub fn new(
        uow_factory: Arc<dyn StockUnitOfWorkFactory>,
        query_repo: Arc<dyn StockQueryRepository>,
    ) -> Self {
        Self {
            uow_factory,
            query_repo,
        }
    }

    // ========== 库存移动 ==========

    /// 入库
    ///
    /// 目标记录不存在时按库存键懒创建,带成本的入库更新移动平均成本。
    pub async fn receive_stock(&self, cmd: ReceiveStockCommand) -> AppResult<StockMovement> {
        info!(
            "Receiving stock: material {} plant {} qty {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let key = cmd.stock_key();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定或开立库存记录
        let (mut record, is_new) = match uow.find_record_for_update(&cmd.tenant_id, &key).await? {
            Some(record) => {
                record.ensure_operational()?;
                (record, false)
            }
            None => (
                StockRecord::open(
                    cmd.tenant_id,
                    key,
                    cmd.batch_date,
                    cmd.expiry_date,
                    Some(cmd.user_id),
                ),
                true,
            ),
        };

        // 3. 记账并开具流水
        let stock_before = record.quantity_on_hand();
        record.receive(cmd.quantity, cmd.unit_cost)?;
        record.touch(cmd.user_id);

        let movement = StockMovement::post(
            &record,
            cmd.movement_type,
            cmd.document_number.clone(),
            cmd.quantity,
            stock_before,
            cmd.unit_cost,
            cmd.remarks.clone(),
            Some(cmd.user_id),
        );

        // 4. 持久化
        if is_new {
            uow.insert_record(&record).await?;
        } else {
            uow.update_record(&record).await?;
        }
        uow.insert_movement(&movement).await?;
        uow.commit().await?;
        metrics::record_movement_posted(cmd.movement_type, true);

        info!(
            "Stock received: record {} now {}",
            record.id().0,
            record.quantity_on_hand()
        );
        Ok(movement)
    }

    /// 出库
    ///
    /// 只消耗可用库存,预留数量不受影响;库存不足时整体失败。
    pub async fn issue_stock(&self, cmd: IssueStockCommand) -> AppResult<StockMovement> {
        info!(
            "Issuing stock: material {} plant {} qty {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let key = cmd.stock_key();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定库存记录
        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.ensure_operational()?;

        // 3. 扣减并开具流水,出库成本取记录当前移动平均成本
        let stock_before = record.quantity_on_hand();
        record.issue(cmd.quantity)?;
        record.touch(cmd.user_id);

        let movement = StockMovement::post(
            &record,
            cmd.movement_type,
            cmd.document_number.clone(),
            -cmd.quantity,
            stock_before,
            record.average_cost(),
            cmd.remarks.clone(),
            Some(cmd.user_id),
        );

        // 4. 持久化
        uow.update_record(&record).await?;
        uow.insert_movement(&movement).await?;
        uow.commit().await?;
        metrics::record_movement_posted(cmd.movement_type, false);

        info!(
            "Stock issued: record {} now {}",
            record.id().0,
            record.quantity_on_hand()
        );
        Ok(movement)
    }

    /// FIFO 出库
    ///
    /// 一次锁定范围内全部记录,按批次日期先进先出逐批扣减,
    /// 每个批次一条流水,总量不足时整体失败,不产生部分扣减。
    pub async fn issue_stock_fifo(
        &self,
        cmd: IssueStockFifoCommand,
    ) -> AppResult<Vec<StockMovement>> {
        info!(
            "Issuing stock FIFO: material {} plant {} qty {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let scope = cmd.scope();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定范围内全部记录并计算分配计划
        let mut records = uow
            .find_records_in_scope_for_update(&cmd.tenant_id, &scope)
            .await?;
        let plan = fifo::plan_allocation(cmd.quantity, &records)?;

        // 3. 按计划逐批扣减
        let mut movements = Vec::with_capacity(plan.len());
        for allocation in &plan {
            let record = records
                .iter_mut()
                .find(|record| record.id() == &allocation.stock_record_id)
                .ok_or_else(|| AppError::internal("分配计划引用了未锁定的库存记录"))?;

            let stock_before = record.quantity_on_hand();
            record.issue(allocation.quantity)?;
            record.touch(cmd.user_id);

            let movement = StockMovement::post(
                record,
                cmd.movement_type,
                cmd.document_number.clone(),
                -allocation.quantity,
                stock_before,
                record.average_cost(),
                cmd.remarks.clone(),
                Some(cmd.user_id),
            );

            uow.update_record(record).await?;
            uow.insert_movement(&movement).await?;
            movements.push(movement);
        }

        uow.commit().await?;
        for _ in &movements {
            metrics::record_movement_posted(cmd.movement_type, false);
        }
        metrics::record_fifo_batches_consumed(movements.len() as u64);

        info!(
            "Stock issued FIFO: {} batches consumed for document {}",
            movements.len(),
            cmd.document_number
        );
        Ok(movements)
    }

    /// 库存转移
    ///
    /// 源出库与目标入库在同一事务内完成,目标不存在时懒创建,
    /// 入库携带源记录的移动平均成本。任何一腿失败整体回滚。
    pub async fn transfer_stock(&self, cmd: TransferStockCommand) -> AppResult<TransferResult> {
        info!(
            "Transferring stock: material {} {} -> {} qty {} for tenant: {}",
            cmd.material_id.0, cmd.from_plant, cmd.to_plant, cmd.quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let from_key = cmd.from_key();
        let to_key = cmd.to_key();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定源记录
        let mut source = uow
            .find_record_for_update(&cmd.tenant_id, &from_key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        source.ensure_operational()?;

        // 3. 锁定或开立目标记录
        let (mut destination, destination_is_new) =
            match uow.find_record_for_update(&cmd.tenant_id, &to_key).await? {
                Some(record) => {
                    record.ensure_operational()?;
                    (record, false)
                }
                None => (
                    StockRecord::open(cmd.tenant_id, to_key, None, None, Some(cmd.user_id)),
                    true,
                ),
            };

        // 4. 源出库
        let source_before = source.quantity_on_hand();
        source.issue(cmd.quantity)?;
        source.touch(cmd.user_id);
        let transfer_cost = source.average_cost();

        let issue_movement = StockMovement::post(
            &source,
            MovementType::Transfer,
            cmd.document_number.clone(),
            -cmd.quantity,
            source_before,
            transfer_cost,
            cmd.remarks.clone(),
            Some(cmd.user_id),
        );

        // 5. 目标入库,携带源平均成本
        let destination_before = destination.quantity_on_hand();
        destination.receive(cmd.quantity, transfer_cost)?;
        destination.touch(cmd.user_id);

        let receipt_movement = StockMovement::post(
            &destination,
            MovementType::Transfer,
            cmd.document_number.clone(),
            cmd.quantity,
            destination_before,
            transfer_cost,
            cmd.remarks.clone(),
            Some(cmd.user_id),
        );

        // 6. 持久化
        uow.update_record(&source).await?;
        if destination_is_new {
            uow.insert_record(&destination).await?;
        } else {
            uow.update_record(&destination).await?;
        }
        uow.insert_movement(&issue_movement).await?;
        uow.insert_movement(&receipt_movement).await?;
        uow.commit().await?;
        metrics::record_movement_posted(MovementType::Transfer, false);
        metrics::record_movement_posted(MovementType::Transfer, true);
        metrics::record_transfer_completed();

        info!(
            "Stock transferred: {} from record {} to record {}",
            cmd.quantity,
            source.id().0,
            destination.id().0
        );
        Ok(TransferResult {
            issue: issue_movement,
            receipt: receipt_movement,
        })
    }

    /// 库存调整
    ///
    /// 调整到绝对数量,差额为正走入库、为负走出库,
    /// 差额为零时不产生流水。调低不能侵占预留数量。
    pub async fn adjust_stock(&self, cmd: AdjustStockCommand) -> AppResult<Option<StockMovement>> {
        info!(
            "Adjusting stock: material {} plant {} to {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.new_quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let key = cmd.stock_key();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定库存记录
        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.ensure_operational()?;

        // 3. 计算差额,零差额直接返回
        let delta = cmd.new_quantity - record.quantity_on_hand();
        if delta == 0 {
            uow.rollback().await?;
            info!("Adjustment is a no-op: record {}", record.id().0);
            return Ok(None);
        }

        let stock_before = record.quantity_on_hand();
        if delta > 0 {
            record.receive(delta, None)?;
        } else {
            record.issue(-delta)?;
        }
        record.touch(cmd.user_id);

        let movement = StockMovement::post(
            &record,
            cmd.movement_type,
            cmd.document_number.clone(),
            delta,
            stock_before,
            record.average_cost(),
            cmd.remarks.clone(),
            Some(cmd.user_id),
        );

        // 4. 持久化
        uow.update_record(&record).await?;
        uow.insert_movement(&movement).await?;
        uow.commit().await?;
        metrics::record_movement_posted(cmd.movement_type, delta > 0);

        info!(
            "Stock adjusted: record {} delta {} now {}",
            record.id().0,
            delta,
            record.quantity_on_hand()
        );
        Ok(Some(movement))
    }

    // ========== 记录管理 ==========

    /// 设置库存水位
    pub async fn set_stock_levels(&self, cmd: SetStockLevelsCommand) -> AppResult<StockRecord> {
        info!(
            "Setting stock levels: material {} plant {} min {:?} max {:?}",
            cmd.material_id.0, cmd.plant, cmd.min_stock_level, cmd.max_stock_level
        );

        let key = cmd.stock_key();
        let mut uow = self.uow_factory.begin().await?;

        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.set_stock_levels(cmd.min_stock_level, cmd.max_stock_level)?;
        record.touch(cmd.user_id);

        uow.update_record(&record).await?;
        uow.commit().await?;
        Ok(record)
    }

    /// 冻结库存记录
    pub async fn block_stock_record(&self, cmd: BlockStockRecordCommand) -> AppResult<()> {
        info!(
            "Blocking stock record: material {} plant {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.tenant_id.0
        );

        let key = cmd.stock_key();
        let mut uow = self.uow_factory.begin().await?;

        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.block()?;
        record.touch(cmd.user_id);

        uow.update_record(&record).await?;
        uow.commit().await?;
        Ok(())
    }

    /// 解冻库存记录
    pub async fn unblock_stock_record(&self, cmd: UnblockStockRecordCommand) -> AppResult<()> {
        info!(
            "Unblocking stock record: material {} plant {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.tenant_id.0
        );

        let key = cmd.stock_key();
        let mut uow = self.uow_factory.begin().await?;

        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.unblock()?;
        record.touch(cmd.user_id);

        uow.update_record(&record).await?;
        uow.commit().await?;
        Ok(())
    }

    /// 标记删除库存记录
    ///
    /// 墓碑化只打标不删行,流水保持引用;仍有预留时拒绝。
    pub async fn mark_record_for_deletion(
        &self,
        cmd: MarkRecordForDeletionCommand,
    ) -> AppResult<()> {
        info!(
            "Marking stock record for deletion: material {} plant {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.tenant_id.0
        );

        let key = cmd.stock_key();
        let mut uow = self.uow_factory.begin().await?;

        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.mark_for_deletion()?;
        record.touch(cmd.user_id);

        uow.update_record(&record).await?;
        uow.commit().await?;
        Ok(())
    }

    // ========== 预留 ==========

    /// 预留库存
    ///
    /// 在目标记录上检查可用数量并抬高预留,预留单号系统生成。
    pub async fn reserve_stock(&self, cmd: ReserveStockCommand) -> AppResult<Reservation> {
        info!(
            "Reserving stock: material {} plant {} qty {} for tenant: {}",
            cmd.material_id.0, cmd.plant, cmd.quantity, cmd.tenant_id.0
        );

        // 1. 验证命令
        cmd.validate()?;
        let key = cmd.stock_key();

        let mut uow = self.uow_factory.begin().await?;

        // 2. 锁定记录并检查可用数量
        let mut record = uow
            .find_record_for_update(&cmd.tenant_id, &key)
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        record.ensure_operational()?;
        record.reserve(cmd.quantity)?;
        record.touch(cmd.user_id);

        // 3. 开立预留
        let reservation = Reservation::open(
            &record,
            cmd.reservation_type,
            cmd.quantity,
            cmd.reference_number.clone(),
            cmd.expires_at,
            Some(cmd.user_id),
        );

        uow.update_record(&record).await?;
        uow.insert_reservation(&reservation).await?;
        uow.commit().await?;
        metrics::record_reservation_created(cmd.reservation_type);

        info!(
            "Stock reserved: {} qty {} on record {}",
            reservation.reservation_number(),
            cmd.quantity,
            record.id().0
        );
        Ok(reservation)
    }

    /// 释放预留
    ///
    /// 未指定数量时释放全部剩余,释放的数量回到记录可用池。
    pub async fn release_reservation(
        &self,
        cmd: ReleaseReservationCommand,
    ) -> AppResult<Reservation> {
        info!(
            "Releasing reservation: {} qty {:?} for tenant: {}",
            cmd.reservation_id.0, cmd.quantity, cmd.tenant_id.0
        );

        let mut uow = self.uow_factory.begin().await?;

        // 1. 锁定预留
        let mut reservation = uow
            .find_reservation_for_update(&cmd.tenant_id, &cmd.reservation_id)
            .await?
            .ok_or(InventoryError::ReservationNotFound)?;

        // 2. 计算释放数量并更新预留
        let quantity = cmd.quantity.unwrap_or_else(|| reservation.remaining());
        reservation.release(quantity)?;
        reservation.touch(cmd.user_id);

        // 3. 将数量交还记录
        let mut record = uow
            .find_record_by_id_for_update(&cmd.tenant_id, reservation.stock_record_id())
            .await?
            .ok_or_else(|| AppError::internal("预留引用的库存记录不存在"))?;
        record.release_reserved(quantity)?;
        record.touch(cmd.user_id);

        uow.update_reservation(&reservation).await?;
        uow.update_record(&record).await?;
        uow.commit().await?;
        metrics::record_reservation_released(reservation.status().is_closed());

        info!(
            "Reservation released: {} qty {} remaining {}",
            reservation.reservation_number(),
            quantity,
            reservation.remaining()
        );
        Ok(reservation)
    }

    /// 取消预留
    ///
    /// 返还全部剩余数量并进入 Cancelled 终止状态。
    pub async fn cancel_reservation(
        &self,
        cmd: CancelReservationCommand,
    ) -> AppResult<Reservation> {
        info!(
            "Cancelling reservation: {} for tenant: {}",
            cmd.reservation_id.0, cmd.tenant_id.0
        );

        let mut uow = self.uow_factory.begin().await?;

        let mut reservation = uow
            .find_reservation_for_update(&cmd.tenant_id, &cmd.reservation_id)
            .await?
            .ok_or(InventoryError::ReservationNotFound)?;

        let remaining = reservation.cancel()?;
        reservation.touch(cmd.user_id);

        if remaining > 0 {
            let mut record = uow
                .find_record_by_id_for_update(&cmd.tenant_id, reservation.stock_record_id())
                .await?
                .ok_or_else(|| AppError::internal("预留引用的库存记录不存在"))?;
            record.release_reserved(remaining)?;
            record.touch(cmd.user_id);
            uow.update_record(&record).await?;
        }

        uow.update_reservation(&reservation).await?;
        uow.commit().await?;
        metrics::record_reservation_cancelled();

        info!(
            "Reservation cancelled: {} returned {}",
            reservation.reservation_number(),
            remaining
        );
        Ok(reservation)
    }

    /// 清理过期预留
    ///
    /// 逐条取消已过期仍持有数量的预留,单条独立事务,
    /// 失败只记日志不中断整批。返回成功清理的条数。
    pub async fn release_expired_reservations(&self, limit: u32) -> AppResult<u32> {
        let now = Utc::now();
        let expired = self.query_repo.list_expired_reservations(now, limit).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        info!("Releasing {} expired reservations", expired.len());
        let mut released = 0u32;
        for candidate in expired {
            match self.cancel_expired_reservation(&candidate, now).await {
                Ok(true) => released += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    "Failed to release expired reservation {}: {}",
                    candidate.id().0,
                    e
                ),
            }
        }
        metrics::record_reservations_expired(released as u64);
        Ok(released)
    }

    async fn cancel_expired_reservation(
        &self,
        candidate: &Reservation,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut uow = self.uow_factory.begin().await?;

        let reservation = uow
            .find_reservation_for_update(candidate.tenant_id(), candidate.id())
            .await?;
        let mut reservation = match reservation {
            Some(reservation) => reservation,
            None => return Ok(false),
        };

        // 事务内复核,避免与手工释放或取消竞争
        if reservation.status().is_closed() || !reservation.is_expired(now) {
            uow.rollback().await?;
            return Ok(false);
        }

        let remaining = reservation.cancel()?;
        if remaining > 0 {
            let mut record = uow
                .find_record_by_id_for_update(reservation.tenant_id(), reservation.stock_record_id())
                .await?
                .ok_or_else(|| AppError::internal("预留引用的库存记录不存在"))?;
            record.release_reserved(remaining)?;
            uow.update_record(&record).await?;
        }
        uow.update_reservation(&reservation).await?;
        uow.commit().await?;

        info!(
            "Expired reservation cancelled: {} returned {}",
            reservation.reservation_number(),
            remaining
        );
        Ok(true)
    }

    // ========== 查询 ==========

    /// 获取库存记录
    pub async fn get_stock_record(&self, query: GetStockRecordQuery) -> AppResult<StockRecord> {
        let record = self
            .query_repo
            .find_record(&query.tenant_id, &query.stock_key())
            .await?
            .ok_or(InventoryError::RecordNotFound)?;
        Ok(record)
    }

    /// 范围内可用库存合计
    pub async fn available_stock(&self, query: AvailableStockQuery) -> AppResult<i64> {
        self.query_repo
            .available_stock(&query.tenant_id, &query.scope())
            .await
    }

    /// 可用性检查
    pub async fn is_available(&self, query: IsAvailableQuery) -> AppResult<bool> {
        if query.quantity <= 0 {
            return Err(InventoryError::InvalidQuantity {
                quantity: query.quantity,
            }
            .into());
        }
        let available = self
            .query_repo
            .available_stock(&query.tenant_id, &query.scope())
            .await?;
        Ok(available >= query.quantity)
    }

    /// 批次列表,FIFO 顺序
    pub async fn list_batches(&self, query: ListBatchesQuery) -> AppResult<Vec<StockRecord>> {
        self.query_repo
            .list_batches(&query.tenant_id, &query.scope())
            .await
    }

    /// 分页查询库存记录
    pub async fn list_stock_records(
        &self,
        query: ListStockRecordsQuery,
    ) -> AppResult<PagedResult<StockRecord>> {
        self.query_repo
            .list_records(&query.tenant_id, &query.filter, query.pagination)
            .await
    }

    /// 低水位库存
    pub async fn list_low_stock(&self, query: ListLowStockQuery) -> AppResult<Vec<StockRecord>> {
        self.query_repo
            .list_low_stock(&query.tenant_id, query.plant.as_deref())
            .await
    }

    /// 超水位库存
    pub async fn list_over_stock(&self, query: ListOverStockQuery) -> AppResult<Vec<StockRecord>> {
        self.query_repo
            .list_over_stock(&query.tenant_id, query.plant.as_deref())
            .await
    }

    /// 分页查询库存流水
    pub async fn list_movements(
        &self,
        query: ListMovementsQuery,
    ) -> AppResult<PagedResult<StockMovement>> {
        self.query_repo
            .list_movements(&query.tenant_id, &query.filter, query.pagination)
            .await
    }

    /// 获取预留
    pub async fn get_reservation(&self, query: GetReservationQuery) -> AppResult<Reservation> {
        let reservation = self
            .query_repo
            .find_reservation(&query.tenant_id, &query.reservation_id)
            .await?
            .ok_or(InventoryError::ReservationNotFound)?;
        Ok(reservation)
    }

    /// 活跃预留列表,按创建先后排列
    pub async fn list_active_reservations(
        &self,
        query: ListActiveReservationsQuery,
    ) -> AppResult<Vec<Reservation>> {
        self.query_repo
            .list_active_reservations(&query.tenant_id, &query.filter)
            .await
    }

    /// FIFO 分配预演
    ///
    /// 基于当前快照计算分配计划,不加锁不扣减;
    /// 实际出库时可用数量可能已经变化。
    pub async fn plan_fifo_allocation(
        &self,
        query: PlanFifoAllocationQuery,
    ) -> AppResult<Vec<BatchAllocation>> {
        let records = self
            .query_repo
            .find_records_in_scope(&query.tenant_id, &query.scope())
            .await?;
        let plan = fifo::plan_allocation(query.quantity, &records)?;
        Ok(plan)
    }
}
