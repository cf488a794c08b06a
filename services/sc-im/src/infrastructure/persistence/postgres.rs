//! PostgreSQL 持久化实现

use adapter_postgres::TransactionManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::{PagedResult, Pagination, TenantId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::enums::{ReservationStatus, StockRecordStatus};
use crate::domain::repositories::{
    MovementFilter, ReservationFilter, StockQueryRepository, StockRecordFilter,
};
use crate::domain::unit_of_work::{StockUnitOfWork, StockUnitOfWorkFactory};
use crate::domain::value_objects::{ReservationId, StockKey, StockRecordId};

use super::converters::{reservation_from_row, stock_movement_from_row, stock_record_from_row};
use super::rows::{ReservationRow, StockMovementRow, StockRecordRow};

const STOCK_RECORD_COLUMNS: &str = r#"
    id, tenant_id, material_id, plant, storage_location, batch_number,
    quantity_on_hand, quantity_reserved, quantity_in_transit, quantity_in_production,
    min_stock_level, max_stock_level, average_cost,
    batch_date, expiry_date, last_movement_at, status,
    created_at, created_by, updated_at, updated_by
"#;

const STOCK_MOVEMENT_COLUMNS: &str = r#"
    id, tenant_id, stock_record_id, material_id, plant, storage_location, batch_number,
    movement_type, document_number, quantity_delta, stock_before, stock_after,
    unit_cost, remarks, posted_at, posted_by
"#;

const RESERVATION_COLUMNS: &str = r#"
    id, tenant_id, reservation_number, stock_record_id, material_id, plant, storage_location,
    reservation_type, status, quantity_reserved, quantity_released, reference_number,
    expires_at, created_at, created_by, updated_at, updated_by
"#;

// ============================================================================
// StockUnitOfWork 实现
// ============================================================================

/// 事务内的库存工作单元
///
/// 持有一个数据库事务,for_update 读取对行加锁直到提交或回滚。
pub struct PostgresStockUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockUnitOfWork for PostgresStockUnitOfWork {
    async fn find_record_for_update(
        &mut self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>> {
        let row = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
              AND batch_number IS NOT DISTINCT FROM $5
            FOR UPDATE
            "#
        ))
        .bind(tenant_id.0)
        .bind(key.material_id().0)
        .bind(key.plant())
        .bind(key.storage_location())
        .bind(key.batch_number())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(row.map(stock_record_from_row))
    }

    async fn find_record_by_id_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &StockRecordId,
    ) -> AppResult<Option<StockRecord>> {
        let row = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#
        ))
        .bind(id.0)
        .bind(tenant_id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(row.map(stock_record_from_row))
    }

    async fn find_records_in_scope_for_update(
        &mut self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
            ORDER BY batch_date ASC NULLS LAST, id ASC
            FOR UPDATE
            "#
        ))
        .bind(tenant_id.0)
        .bind(scope.material_id().0)
        .bind(scope.plant())
        .bind(scope.storage_location())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_record_from_row).collect())
    }

    async fn insert_record(&mut self, record: &StockRecord) -> AppResult<()> {
        let created_by = record.audit_info().created_by.as_ref().map(|u| u.0);
        let updated_by = record.audit_info().updated_by.as_ref().map(|u| u.0);

        sqlx::query(
            r#"
            INSERT INTO stock_records (
                id, tenant_id, material_id, plant, storage_location, batch_number,
                quantity_on_hand, quantity_reserved, quantity_in_transit, quantity_in_production,
                min_stock_level, max_stock_level, average_cost,
                batch_date, expiry_date, last_movement_at, status,
                created_at, created_by, updated_at, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(record.id().0)
        .bind(record.tenant_id().0)
        .bind(record.key().material_id().0)
        .bind(record.key().plant())
        .bind(record.key().storage_location())
        .bind(record.key().batch_number())
        .bind(record.quantity_on_hand())
        .bind(record.quantity_reserved())
        .bind(record.quantity_in_transit())
        .bind(record.quantity_in_production())
        .bind(record.min_stock_level())
        .bind(record.max_stock_level())
        .bind(record.average_cost())
        .bind(record.batch_date())
        .bind(record.expiry_date())
        .bind(record.last_movement_at())
        .bind(i16::from(record.status()))
        .bind(record.audit_info().created_at)
        .bind(created_by)
        .bind(record.audit_info().updated_at)
        .bind(updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("保存库存记录失败: {}", e)))?;

        Ok(())
    }

    async fn update_record(&mut self, record: &StockRecord) -> AppResult<()> {
        let updated_by = record.audit_info().updated_by.as_ref().map(|u| u.0);

        let result = sqlx::query(
            r#"
            UPDATE stock_records SET
                quantity_on_hand = $1,
                quantity_reserved = $2,
                quantity_in_transit = $3,
                quantity_in_production = $4,
                min_stock_level = $5,
                max_stock_level = $6,
                average_cost = $7,
                expiry_date = $8,
                last_movement_at = $9,
                status = $10,
                updated_at = $11,
                updated_by = $12
            WHERE id = $13 AND tenant_id = $14
            "#,
        )
        .bind(record.quantity_on_hand())
        .bind(record.quantity_reserved())
        .bind(record.quantity_in_transit())
        .bind(record.quantity_in_production())
        .bind(record.min_stock_level())
        .bind(record.max_stock_level())
        .bind(record.average_cost())
        .bind(record.expiry_date())
        .bind(record.last_movement_at())
        .bind(i16::from(record.status()))
        .bind(record.audit_info().updated_at)
        .bind(updated_by)
        .bind(record.id().0)
        .bind(record.tenant_id().0)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("更新库存记录失败: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("库存记录不存在".to_string()));
        }

        Ok(())
    }

    async fn insert_movement(&mut self, movement: &StockMovement) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, stock_record_id, material_id, plant, storage_location, batch_number,
                movement_type, document_number, quantity_delta, stock_before, stock_after,
                unit_cost, remarks, posted_at, posted_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16
            )
            "#,
        )
        .bind(movement.id().0)
        .bind(movement.tenant_id().0)
        .bind(movement.stock_record_id().map(|id| id.0))
        .bind(movement.material_id().0)
        .bind(movement.plant())
        .bind(movement.storage_location())
        .bind(movement.batch_number())
        .bind(i16::from(movement.movement_type()))
        .bind(movement.document_number())
        .bind(movement.quantity_delta())
        .bind(movement.stock_before())
        .bind(movement.stock_after())
        .bind(movement.unit_cost())
        .bind(movement.remarks())
        .bind(movement.posted_at())
        .bind(movement.posted_by().map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("保存库存流水失败: {}", e)))?;

        Ok(())
    }

    async fn find_reservation_for_update(
        &mut self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM stock_reservations
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#
        ))
        .bind(id.0)
        .bind(tenant_id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("查询预留失败: {}", e)))?;

        Ok(row.map(reservation_from_row))
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        let created_by = reservation.audit_info().created_by.as_ref().map(|u| u.0);
        let updated_by = reservation.audit_info().updated_by.as_ref().map(|u| u.0);

        sqlx::query(
            r#"
            INSERT INTO stock_reservations (
                id, tenant_id, reservation_number, stock_record_id, material_id, plant,
                storage_location, reservation_type, status, quantity_reserved, quantity_released,
                reference_number, expires_at, created_at, created_by, updated_at, updated_by
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
            )
            "#,
        )
        .bind(reservation.id().0)
        .bind(reservation.tenant_id().0)
        .bind(reservation.reservation_number())
        .bind(reservation.stock_record_id().0)
        .bind(reservation.material_id().0)
        .bind(reservation.plant())
        .bind(reservation.storage_location())
        .bind(i16::from(reservation.reservation_type()))
        .bind(i16::from(reservation.status()))
        .bind(reservation.quantity_reserved())
        .bind(reservation.quantity_released())
        .bind(reservation.reference_number())
        .bind(reservation.expires_at())
        .bind(reservation.audit_info().created_at)
        .bind(created_by)
        .bind(reservation.audit_info().updated_at)
        .bind(updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("保存预留失败: {}", e)))?;

        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        let updated_by = reservation.audit_info().updated_by.as_ref().map(|u| u.0);

        let result = sqlx::query(
            r#"
            UPDATE stock_reservations SET
                status = $1,
                quantity_released = $2,
                expires_at = $3,
                updated_at = $4,
                updated_by = $5
            WHERE id = $6 AND tenant_id = $7
            "#,
        )
        .bind(i16::from(reservation.status()))
        .bind(reservation.quantity_released())
        .bind(reservation.expires_at())
        .bind(reservation.audit_info().updated_at)
        .bind(updated_by)
        .bind(reservation.id().0)
        .bind(reservation.tenant_id().0)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("更新预留失败: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("预留不存在".to_string()));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::database(format!("提交事务失败: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::database(format!("回滚事务失败: {}", e)))
    }
}

/// PostgreSQL Unit of Work 工厂
pub struct PostgresStockUnitOfWorkFactory {
    tx_manager: TransactionManager,
}

impl PostgresStockUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool),
        }
    }
}

#[async_trait]
impl StockUnitOfWorkFactory for PostgresStockUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn StockUnitOfWork>> {
        let tx = self.tx_manager.begin().await?;
        Ok(Box::new(PostgresStockUnitOfWork { tx }))
    }
}

// ============================================================================
// StockQueryRepository 实现
// ============================================================================

pub struct PostgresStockQueryRepository {
    pool: PgPool,
}

impl PostgresStockQueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockQueryRepository for PostgresStockQueryRepository {
    async fn find_record(
        &self,
        tenant_id: &TenantId,
        key: &StockKey,
    ) -> AppResult<Option<StockRecord>> {
        let row = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
              AND batch_number IS NOT DISTINCT FROM $5
              AND status <> $6
            "#
        ))
        .bind(tenant_id.0)
        .bind(key.material_id().0)
        .bind(key.plant())
        .bind(key.storage_location())
        .bind(key.batch_number())
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(row.map(stock_record_from_row))
    }

    async fn find_records_in_scope(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
              AND status <> $5
            ORDER BY batch_date ASC NULLS LAST, id ASC
            "#
        ))
        .bind(tenant_id.0)
        .bind(scope.material_id().0)
        .bind(scope.plant())
        .bind(scope.storage_location())
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_record_from_row).collect())
    }

    async fn list_records(
        &self,
        tenant_id: &TenantId,
        filter: &StockRecordFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockRecord>> {
        let material_id = filter.material_id.map(|id| id.0);

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM stock_records
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::text IS NULL OR plant = $3)
              AND status <> $4
            "#,
        )
        .bind(tenant_id.0)
        .bind(material_id)
        .bind(filter.plant.as_deref())
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录总数失败: {}", e)))?;

        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::text IS NULL OR plant = $3)
              AND status <> $4
            ORDER BY plant ASC, material_id ASC,
                     storage_location ASC NULLS FIRST, batch_number ASC NULLS FIRST
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(tenant_id.0)
        .bind(material_id)
        .bind(filter.plant.as_deref())
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录列表失败: {}", e)))?;

        let items: Vec<StockRecord> = rows.into_iter().map(stock_record_from_row).collect();
        Ok(PagedResult::new(items, total.0 as u64, &pagination))
    }

    async fn list_batches(
        &self,
        tenant_id: &TenantId,
        scope: &StockKey,
    ) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
              AND batch_number IS NOT NULL
              AND status <> $5
            ORDER BY batch_date ASC NULLS LAST, id ASC
            "#
        ))
        .bind(tenant_id.0)
        .bind(scope.material_id().0)
        .bind(scope.plant())
        .bind(scope.storage_location())
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询批次列表失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_record_from_row).collect())
    }

    async fn available_stock(&self, tenant_id: &TenantId, scope: &StockKey) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(quantity_on_hand - quantity_reserved), 0)::bigint
            FROM stock_records
            WHERE tenant_id = $1 AND material_id = $2 AND plant = $3
              AND storage_location IS NOT DISTINCT FROM $4
              AND status = $5
            "#,
        )
        .bind(tenant_id.0)
        .bind(scope.material_id().0)
        .bind(scope.plant())
        .bind(scope.storage_location())
        .bind(i16::from(StockRecordStatus::Active))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询可用库存失败: {}", e)))?;

        Ok(result.0)
    }

    async fn list_low_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR plant = $2)
              AND min_stock_level IS NOT NULL
              AND quantity_on_hand <= min_stock_level
              AND status <> $3
            ORDER BY plant ASC, material_id ASC
            "#
        ))
        .bind(tenant_id.0)
        .bind(plant)
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询低水位库存失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_record_from_row).collect())
    }

    async fn list_over_stock(
        &self,
        tenant_id: &TenantId,
        plant: Option<&str>,
    ) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecordRow>(&format!(
            r#"
            SELECT {STOCK_RECORD_COLUMNS}
            FROM stock_records
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR plant = $2)
              AND max_stock_level IS NOT NULL
              AND quantity_on_hand > max_stock_level
              AND status <> $3
            ORDER BY plant ASC, material_id ASC
            "#
        ))
        .bind(tenant_id.0)
        .bind(plant)
        .bind(i16::from(StockRecordStatus::MarkedForDeletion))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询超水位库存失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_record_from_row).collect())
    }

    async fn list_movements(
        &self,
        tenant_id: &TenantId,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockMovement>> {
        let material_id = filter.material_id.map(|id| id.0);
        let movement_type = filter.movement_type.map(i16::from);

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM stock_movements
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::text IS NULL OR plant = $3)
              AND ($4::text IS NULL OR batch_number = $4)
              AND ($5::smallint IS NULL OR movement_type = $5)
              AND ($6::text IS NULL OR document_number = $6)
              AND ($7::timestamptz IS NULL OR posted_at >= $7)
              AND ($8::timestamptz IS NULL OR posted_at <= $8)
            "#,
        )
        .bind(tenant_id.0)
        .bind(material_id)
        .bind(filter.plant.as_deref())
        .bind(filter.batch_number.as_deref())
        .bind(movement_type)
        .bind(filter.document_number.as_deref())
        .bind(filter.posted_from)
        .bind(filter.posted_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存流水总数失败: {}", e)))?;

        let rows = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {STOCK_MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::text IS NULL OR plant = $3)
              AND ($4::text IS NULL OR batch_number = $4)
              AND ($5::smallint IS NULL OR movement_type = $5)
              AND ($6::text IS NULL OR document_number = $6)
              AND ($7::timestamptz IS NULL OR posted_at >= $7)
              AND ($8::timestamptz IS NULL OR posted_at <= $8)
            ORDER BY posted_at DESC, id DESC
            LIMIT $9 OFFSET $10
            "#
        ))
        .bind(tenant_id.0)
        .bind(material_id)
        .bind(filter.plant.as_deref())
        .bind(filter.batch_number.as_deref())
        .bind(movement_type)
        .bind(filter.document_number.as_deref())
        .bind(filter.posted_from)
        .bind(filter.posted_to)
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存流水失败: {}", e)))?;

        let items: Vec<StockMovement> = rows.into_iter().map(stock_movement_from_row).collect();
        Ok(PagedResult::new(items, total.0 as u64, &pagination))
    }

    async fn find_reservation(
        &self,
        tenant_id: &TenantId,
        id: &ReservationId,
    ) -> AppResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM stock_reservations
            WHERE id = $1 AND tenant_id = $2
            "#
        ))
        .bind(id.0)
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询预留失败: {}", e)))?;

        Ok(row.map(reservation_from_row))
    }

    async fn list_active_reservations(
        &self,
        tenant_id: &TenantId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>> {
        let material_id = filter.material_id.map(|id| id.0);

        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM stock_reservations
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR material_id = $2)
              AND ($3::text IS NULL OR plant = $3)
              AND status IN ($4, $5)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(tenant_id.0)
        .bind(material_id)
        .bind(filter.plant.as_deref())
        .bind(i16::from(ReservationStatus::Reserved))
        .bind(i16::from(ReservationStatus::PartiallyReleased))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询活跃预留失败: {}", e)))?;

        Ok(rows.into_iter().map(reservation_from_row).collect())
    }

    async fn list_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM stock_reservations
            WHERE expires_at IS NOT NULL AND expires_at <= $1
              AND status IN ($2, $3)
            ORDER BY expires_at ASC
            LIMIT $4
            "#
        ))
        .bind(now)
        .bind(i16::from(ReservationStatus::Reserved))
        .bind(i16::from(ReservationStatus::PartiallyReleased))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询过期预留失败: {}", e)))?;

        Ok(rows.into_iter().map(reservation_from_row).collect())
    }
}
