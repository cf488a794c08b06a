//! 预留聚合根

use chrono::{DateTime, Utc};
use common::types::{AuditInfo, TenantId, UserId};
use common::utils;
use domain_core::{AggregateRoot, Entity};
use serde::{Deserialize, Serialize};

use crate::domain::entities::StockRecord;
use crate::domain::enums::{ReservationStatus, ReservationType};
use crate::domain::value_objects::{MaterialId, ReservationId, StockRecordId};
use crate::error::InventoryError;

/// 预留单号前缀
const RESERVATION_NUMBER_PREFIX: &str = "RS";

/// 库存预留聚合根
///
/// 对单条库存记录可用数量的命名占用。预留不改变现有库存,
/// 只在记录上抬高预留数量;释放与取消将数量交还可用池。
/// reference_number 为调用方的业务关联单号 (销售订单、生产订单等)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    tenant_id: TenantId,
    /// 系统生成的预留单号
    reservation_number: String,
    stock_record_id: StockRecordId,
    material_id: MaterialId,
    plant: String,
    storage_location: Option<String>,
    reservation_type: ReservationType,
    status: ReservationStatus,
    /// 预留总量
    quantity_reserved: i64,
    /// 已释放数量
    quantity_released: i64,
    /// 调用方关联单号
    reference_number: String,
    /// 预留失效时间,到期由清理任务取消
    expires_at: Option<DateTime<Utc>>,
    audit_info: AuditInfo,
}

impl Reservation {
    /// 在记录上开立预留
    ///
    /// 数量校验由记录的 reserve 完成,本方法只负责构造。
    pub fn open(
        record: &StockRecord,
        reservation_type: ReservationType,
        quantity: i64,
        reference_number: String,
        expires_at: Option<DateTime<Utc>>,
        created_by: Option<UserId>,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            tenant_id: *record.tenant_id(),
            reservation_number: utils::document_number(RESERVATION_NUMBER_PREFIX),
            stock_record_id: *record.id(),
            material_id: *record.key().material_id(),
            plant: record.key().plant().to_string(),
            storage_location: record.key().storage_location().map(str::to_string),
            reservation_type,
            status: ReservationStatus::Reserved,
            quantity_reserved: quantity,
            quantity_released: 0,
            reference_number,
            expires_at,
            audit_info: AuditInfo::new(created_by),
        }
    }

    /// 从持久化数据重建
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReservationId,
        tenant_id: TenantId,
        reservation_number: String,
        stock_record_id: StockRecordId,
        material_id: MaterialId,
        plant: String,
        storage_location: Option<String>,
        reservation_type: ReservationType,
        status: ReservationStatus,
        quantity_reserved: i64,
        quantity_released: i64,
        reference_number: String,
        expires_at: Option<DateTime<Utc>>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            tenant_id,
            reservation_number,
            stock_record_id,
            material_id,
            plant,
            storage_location,
            reservation_type,
            status,
            quantity_reserved,
            quantity_released,
            reference_number,
            expires_at,
            audit_info,
        }
    }

    // ========== 访问器 ==========

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn reservation_number(&self) -> &str {
        &self.reservation_number
    }

    pub fn stock_record_id(&self) -> &StockRecordId {
        &self.stock_record_id
    }

    pub fn material_id(&self) -> &MaterialId {
        &self.material_id
    }

    pub fn plant(&self) -> &str {
        &self.plant
    }

    pub fn storage_location(&self) -> Option<&str> {
        self.storage_location.as_deref()
    }

    pub fn reservation_type(&self) -> ReservationType {
        self.reservation_type
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn quantity_released(&self) -> i64 {
        self.quantity_released
    }

    /// 剩余持有数量 = 预留总量 - 已释放数量
    pub fn remaining(&self) -> i64 {
        self.quantity_reserved - self.quantity_released
    }

    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    // ========== 业务方法 ==========

    /// 释放部分或全部剩余数量
    ///
    /// 释放到零转为 Released,否则转为 PartiallyReleased。
    pub fn release(&mut self, quantity: i64) -> Result<(), InventoryError> {
        if self.status.is_closed() {
            return Err(InventoryError::ReservationClosed {
                status: self.status,
            });
        }
        let remaining = self.remaining();
        if quantity <= 0 || quantity > remaining {
            return Err(InventoryError::InvalidReleaseQuantity {
                remaining,
                requested: quantity,
            });
        }
        self.quantity_released += quantity;
        self.status = if self.remaining() == 0 {
            ReservationStatus::Released
        } else {
            ReservationStatus::PartiallyReleased
        };
        self.audit_info.update(None);
        Ok(())
    }

    /// 取消预留,返还全部剩余数量
    ///
    /// 与完全释放不同,取消表示需求消失,进入独立的终止状态。
    /// 返回取消时的剩余数量,供调用方回写记录。
    pub fn cancel(&mut self) -> Result<i64, InventoryError> {
        if self.status.is_closed() {
            return Err(InventoryError::ReservationClosed {
                status: self.status,
            });
        }
        let remaining = self.remaining();
        self.quantity_released = self.quantity_reserved;
        self.status = ReservationStatus::Cancelled;
        self.audit_info.update(None);
        Ok(remaining)
    }

    /// 是否已过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Reservation {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::StockKey;
    use chrono::Duration;

    fn test_reservation(quantity: i64) -> Reservation {
        let key = StockKey::new(MaterialId::new(), "P100");
        let mut record = StockRecord::open(TenantId::new(), key, None, None, None);
        record.receive(100, None).unwrap();
        record.reserve(quantity).unwrap();
        Reservation::open(
            &record,
            ReservationType::SalesOrder,
            quantity,
            "SO-2024-001".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn test_partial_then_full_release() {
        let mut reservation = test_reservation(10);
        assert_eq!(reservation.status(), ReservationStatus::Reserved);

        reservation.release(4).unwrap();
        assert_eq!(reservation.status(), ReservationStatus::PartiallyReleased);
        assert_eq!(reservation.remaining(), 6);

        reservation.release(6).unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Released);
        assert_eq!(reservation.remaining(), 0);
    }

    #[test]
    fn test_release_beyond_remaining_fails() {
        let mut reservation = test_reservation(10);
        reservation.release(4).unwrap();

        let err = reservation.release(7).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InvalidReleaseQuantity {
                remaining: 6,
                requested: 7
            }
        ));
        assert_eq!(reservation.remaining(), 6);
    }

    #[test]
    fn test_release_non_positive_fails() {
        let mut reservation = test_reservation(10);
        assert!(reservation.release(0).is_err());
        assert!(reservation.release(-2).is_err());
    }

    #[test]
    fn test_cancel_returns_remaining() {
        let mut reservation = test_reservation(10);
        reservation.release(3).unwrap();

        let returned = reservation.cancel().unwrap();
        assert_eq!(returned, 7);
        assert_eq!(reservation.status(), ReservationStatus::Cancelled);
        assert_eq!(reservation.remaining(), 0);
    }

    #[test]
    fn test_closed_reservation_rejects_further_operations() {
        let mut reservation = test_reservation(5);
        reservation.cancel().unwrap();

        assert!(matches!(
            reservation.release(1),
            Err(InventoryError::ReservationClosed {
                status: ReservationStatus::Cancelled
            })
        ));
        assert!(reservation.cancel().is_err());
    }

    #[test]
    fn test_fully_released_is_distinct_from_cancelled() {
        let mut released = test_reservation(5);
        released.release(5).unwrap();
        assert_eq!(released.status(), ReservationStatus::Released);

        let mut cancelled = test_reservation(5);
        cancelled.cancel().unwrap();
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
    }

    #[test]
    fn test_expiry_check() {
        let key = StockKey::new(MaterialId::new(), "P100");
        let mut record = StockRecord::open(TenantId::new(), key, None, None, None);
        record.receive(10, None).unwrap();
        record.reserve(5).unwrap();

        let now = Utc::now();
        let reservation = Reservation::open(
            &record,
            ReservationType::Transfer,
            5,
            "TR-001".to_string(),
            Some(now - Duration::minutes(1)),
            None,
        );
        assert!(reservation.is_expired(now));

        let open_ended = test_reservation(5);
        assert!(!open_ended.is_expired(now));
    }

    #[test]
    fn test_reservation_number_generated() {
        let reservation = test_reservation(5);
        assert!(reservation.reservation_number().starts_with("RS-"));
    }
}
