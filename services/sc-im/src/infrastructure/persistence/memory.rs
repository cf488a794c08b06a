//! 内存持久化实现
//!
//! 单进程内存存储,供集成测试与本地演示使用。
//! 工作单元持有全局互斥锁并在副本上修改,提交时整体写回:
//! begin 即加锁,commit 或 rollback 释放。事务彼此串行,
//! 单条记录上的观察结果与数据库实现的行锁语义一致。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{PagedResult, Pagination, TenantId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::repositories::{
    MovementFilter, ReservationFilter, StockQueryRepository, StockRecordFilter,
};
use crate::domain::services::fifo::fifo_order;
use crate::domain::unit_of_work::{StockUnitOfWork, StockUnitOfWorkFactory};
use crate::domain::value_objects::{ReservationId, StockKey, StockRecordId};

#[derive(Debug, Clone, Default)]
struct StoreState {
    records: Vec<StockRecord>,
    movements: Vec<StockMovement>,
    reservations: Vec<Reservation>,
}

/// 内存库存存储
///
/// 同时实现 [`StockUnitOfWorkFactory`] 与 [`StockQueryRepository`],
/// 一个实例即可驱动完整的 [`crate::application::ServiceHandler`]。
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key_matches(record: &StockRecord, tenant_id: &TenantId, key: &StockKey) -> bool {
    record.tenant_id() == tenant_id && record.key() == key
}

fn scope_matches(record: &StockRecord, tenant_id: &TenantId, scope: &StockKey) -> bool {
    record.tenant_id() == tenant_id
        && record.key().material_id() == scope.material_id()
        && record.key().plant() == scope.plant()
        && record.key().storage_location() == scope.storage_location()
}

// ============================================================================
// StockUnitOfWork 实现
// ============================================================================

pub struct InMemoryStockUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
}

#[async_trait]
impl StockUnitOfWork for InMemoryStockUnitOfWork {
    async fn find_record_for_update(
        &mut self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>> {
        Ok(self
            .staged
            .records
            .iter()
            .find(|record| key_matches(record, tenant_id, key))
            .cloned())
    }

    async fn find_record_by_id_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &StockRecordId,
    ) -> AppResult<Option<StockRecord>> {
        Ok(self
            .staged
            .records
            .iter()
            .find(|record| record.id() == id && record.tenant_id() == tenant_id)
            .cloned())
    }

    async fn find_records_in_scope_for_update(
        &mut self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let mut records: Vec<StockRecord> = self
            .staged
            .records
            .iter()
            .filter(|record| scope_matches(record, tenant_id, scope))
            .cloned()
            .collect();
        records.sort_by(fifo_order);
        Ok(records)
    }

    async fn insert_record(&mut self, record: &StockRecord) -> AppResult<()> {
        self.staged.records.push(record.clone());
        Ok(())
    }

    async fn update_record(&mut self, record: &StockRecord) -> AppResult<()> {
        let slot = self
            .staged
            .records
            .iter_mut()
            .find(|existing| existing.id() == record.id())
            .ok_or_else(|| AppError::not_found("库存记录不存在".to_string()))?;
        *slot = record.clone();
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        self.staged.movements.push(movement.clone());
        Ok(())
    }

    async fn find_reservation_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>> {
        Ok(self
            .staged
            .reservations
            .iter()
            .find(|reservation| reservation.id() == id && reservation.tenant_id() == tenant_id)
            .cloned())
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        self.staged.reservations.push(reservation.clone());
        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        let slot = self
            .staged
            .reservations
            .iter_mut()
            .find(|existing| existing.id() == reservation.id())
            .ok_or_else(|| AppError::not_found("预留不存在".to_string()))?;
        *slot = reservation.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryStockUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl StockUnitOfWorkFactory for InMemoryStockStore {
    async fn begin(&self) -> AppResult<Box<dyn StockUnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryStockUnitOfWork { guard, staged }))
    }
}

// ============================================================================
// StockQueryRepository 实现
// ============================================================================

#[async_trait]
impl StockQueryRepository for InMemoryStockStore {
    async fn find_record(
        &self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .find(|record| {
                key_matches(record, tenant_id, key) && !record.status().is_marked_for_deletion()
            })
            .cloned())
    }

    async fn find_records_in_scope(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<StockRecord> = state
            .records
            .iter()
            .filter(|record| {
                scope_matches(record, tenant_id, scope) && !record.status().is_marked_for_deletion()
            })
            .cloned()
            .collect();
        records.sort_by(fifo_order);
        Ok(records)
    }

    async fn list_records(
        &self,
        tenant_id: &TenantId,
        filter: &StockRecordFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockRecord>> {
        let state = self.state.lock().await;
        let mut items: Vec<StockRecord> = state
            .records
            .iter()
            .filter(|record| {
                record.tenant_id() == tenant_id
                    && !record.status().is_marked_for_deletion()
                    && filter
                        .material_id
                        .map_or(true, |m| *record.key().material_id() == m)
                    && filter
                        .plant
                        .as_deref()
                        .map_or(true, |p| record.key().plant() == p)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.key()
                .plant()
                .cmp(b.key().plant())
                .then_with(|| a.key().material_id().cmp(b.key().material_id()))
                .then_with(|| a.key().storage_location().cmp(&b.key().storage_location()))
                .then_with(|| a.key().batch_number().cmp(&b.key().batch_number()))
        });

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok(PagedResult::new(items, total, &pagination))
    }

    async fn list_batches(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<StockRecord> = state
            .records
            .iter()
            .filter(|record| {
                scope_matches(record, tenant_id, scope)
                    && record.key().batch_number().is_some()
                    && !record.status().is_marked_for_deletion()
            })
            .cloned()
            .collect();
        records.sort_by(fifo_order);
        Ok(records)
    }

    async fn available_stock(&self, tenant_id: &TenantId, scope: &StockKey) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|record| scope_matches(record, tenant_id, scope) && record.status().is_active())
            .map(|record| record.available())
            .sum())
    }

    async fn list_low_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|record| {
                record.tenant_id() == tenant_id
                    && plant.map_or(true, |p| record.key().plant() == p)
                    && record.is_below_min_level()
                    && !record.status().is_marked_for_deletion()
            })
            .cloned()
            .collect())
    }

    async fn list_over_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|record| {
                record.tenant_id() == tenant_id
                    && plant.map_or(true, |p| record.key().plant() == p)
                    && record.is_above_max_level()
                    && !record.status().is_marked_for_deletion()
            })
            .cloned()
            .collect())
    }

    async fn list_movements(
        &self,
        tenant_id: &TenantId,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockMovement>> {
        let state = self.state.lock().await;
        let mut items: Vec<StockMovement> = state
            .movements
            .iter()
            .filter(|movement| {
                movement.tenant_id() == tenant_id
                    && filter
                        .material_id
                        .map_or(true, |m| *movement.material_id() == m)
                    && filter
                        .plant
                        .as_deref()
                        .map_or(true, |p| movement.plant() == p)
                    && filter
                        .batch_number
                        .as_deref()
                        .map_or(true, |b| movement.batch_number() == Some(b))
                    && filter
                        .movement_type
                        .map_or(true, |t| movement.movement_type() == t)
                    && filter
                        .document_number
                        .as_deref()
                        .map_or(true, |d| movement.document_number() == d)
                    && filter.posted_from.map_or(true, |t| movement.posted_at() >= t)
                    && filter.posted_to.map_or(true, |t| movement.posted_at() <= t)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.posted_at()
                .cmp(&a.posted_at())
                .then_with(|| b.id().cmp(a.id()))
        });

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok(PagedResult::new(items, total, &pagination))
    }

    async fn find_reservation(
        &self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .iter()
            .find(|reservation| reservation.id() == id && reservation.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list_active_reservations(
        &self,
        tenant_id: &TenantId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut items: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|reservation| {
                reservation.tenant_id() == tenant_id
                    && reservation.status().is_open()
                    && filter
                        .material_id
                        .map_or(true, |m| *reservation.material_id() == m)
                    && filter
                        .plant
                        .as_deref()
                        .map_or(true, |p| reservation.plant() == p)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.audit_info()
                .created_at
                .cmp(&b.audit_info().created_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(items)
    }

    async fn list_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut items: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|reservation| reservation.status().is_open() && reservation.is_expired(now))
            .cloned()
            .collect();
        items.sort_by_key(|reservation| reservation.expires_at());
        items.truncate(limit as usize);
        Ok(items)
    }
}
