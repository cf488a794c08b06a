//! 数据库行到领域对象的转换

use common::types::{AuditInfo, TenantId, UserId};
use uuid::Uuid;

use crate::domain::entities::{Reservation, StockMovement, StockRecord};
use crate::domain::enums::{MovementType, ReservationStatus, ReservationType, StockRecordStatus};
use crate::domain::value_objects::{
    MaterialId, MovementId, ReservationId, StockKey, StockRecordId,
};

use super::rows::{ReservationRow, StockMovementRow, StockRecordRow};

/// 将 StockRecordRow 转换为 StockRecord
pub fn stock_record_from_row(row: StockRecordRow) -> StockRecord {
    let key = StockKey::from_parts(
        MaterialId::from_uuid(row.material_id),
        row.plant,
        row.storage_location,
        row.batch_number,
    );

    let audit_info = build_audit_info(
        row.created_at,
        row.created_by,
        row.updated_at,
        row.updated_by,
    );

    StockRecord::from_parts(
        StockRecordId::from_uuid(row.id),
        TenantId::from_uuid(row.tenant_id),
        key,
        row.quantity_on_hand,
        row.quantity_reserved,
        row.quantity_in_transit,
        row.quantity_in_production,
        row.min_stock_level,
        row.max_stock_level,
        row.average_cost,
        row.batch_date,
        row.expiry_date,
        row.last_movement_at,
        StockRecordStatus::from(row.status),
        audit_info,
    )
}

/// 将 StockMovementRow 转换为 StockMovement
pub fn stock_movement_from_row(row: StockMovementRow) -> StockMovement {
    StockMovement::from_parts(
        MovementId::from_uuid(row.id),
        TenantId::from_uuid(row.tenant_id),
        row.stock_record_id.map(StockRecordId::from_uuid),
        MaterialId::from_uuid(row.material_id),
        row.plant,
        row.storage_location,
        row.batch_number,
        MovementType::from(row.movement_type),
        row.document_number,
        row.quantity_delta,
        row.stock_before,
        row.stock_after,
        row.unit_cost,
        row.remarks,
        row.posted_at,
        row.posted_by.map(UserId::from_uuid),
    )
}

/// 将 ReservationRow 转换为 Reservation
pub fn reservation_from_row(row: ReservationRow) -> Reservation {
    let audit_info = build_audit_info(
        row.created_at,
        row.created_by,
        row.updated_at,
        row.updated_by,
    );

    Reservation::from_parts(
        ReservationId::from_uuid(row.id),
        TenantId::from_uuid(row.tenant_id),
        row.reservation_number,
        StockRecordId::from_uuid(row.stock_record_id),
        MaterialId::from_uuid(row.material_id),
        row.plant,
        row.storage_location,
        ReservationType::from(row.reservation_type),
        ReservationStatus::from(row.status),
        row.quantity_reserved,
        row.quantity_released,
        row.reference_number,
        row.expires_at,
        audit_info,
    )
}

/// 构建 AuditInfo
fn build_audit_info(
    created_at: chrono::DateTime<chrono::Utc>,
    created_by: Option<Uuid>,
    updated_at: chrono::DateTime<chrono::Utc>,
    updated_by: Option<Uuid>,
) -> AuditInfo {
    AuditInfo {
        created_at,
        created_by: created_by.map(UserId::from_uuid),
        updated_at,
        updated_by: updated_by.map(UserId::from_uuid),
    }
}
