//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 库存记录数据库行
#[derive(Debug, FromRow)]
pub struct StockRecordRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub material_id: Uuid,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    pub quantity_in_transit: i64,
    pub quantity_in_production: i64,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub average_cost: Option<rust_decimal::Decimal>,
    pub batch_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 库存流水数据库行
#[derive(Debug, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub stock_record_id: Option<Uuid>,
    pub material_id: Uuid,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    pub movement_type: i16,
    pub document_number: String,
    pub quantity_delta: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub unit_cost: Option<rust_decimal::Decimal>,
    pub remarks: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub posted_by: Option<Uuid>,
}

/// 预留数据库行
#[derive(Debug, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_number: String,
    pub stock_record_id: Uuid,
    pub material_id: Uuid,
    pub plant: String,
    pub storage_location: Option<String>,
    pub reservation_type: i16,
    pub status: i16,
    pub quantity_reserved: i64,
    pub quantity_released: i64,
    pub reference_number: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}
