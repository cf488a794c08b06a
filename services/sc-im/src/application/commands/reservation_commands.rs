//! 预留命令

use chrono::{DateTime, Utc};
use common::types::{TenantId, UserId};
use errors::AppResult;

use crate::domain::enums::ReservationType;
use crate::domain::value_objects::{MaterialId, ReservationId, StockKey};
use crate::error::InventoryError;

/// 预留库存命令
#[derive(Debug, Clone)]
pub struct ReserveStockCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub reservation_type: ReservationType,
    pub quantity: i64,
    /// 调用方关联单号
    pub reference_number: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ReserveStockCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.quantity <= 0 {
            return Err(InventoryError::InvalidQuantity {
                quantity: self.quantity,
            }
            .into());
        }
        if self.plant.is_empty() {
            return Err(errors::AppError::validation("工厂不能为空"));
        }
        if self.reference_number.is_empty() {
            return Err(errors::AppError::validation("关联单号不能为空"));
        }
        Ok(())
    }

    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}

/// 释放预留命令
///
/// quantity 为 None 时释放全部剩余数量。
#[derive(Debug, Clone)]
pub struct ReleaseReservationCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub reservation_id: ReservationId,
    pub quantity: Option<i64>,
}

/// 取消预留命令
#[derive(Debug, Clone)]
pub struct CancelReservationCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub reservation_id: ReservationId,
}
