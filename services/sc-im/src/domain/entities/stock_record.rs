//! 库存记录聚合根

use chrono::{DateTime, Utc};
use common::types::{AuditInfo, TenantId};
use domain_core::{AggregateRoot, Entity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::enums::StockRecordStatus;
use crate::domain::value_objects::{StockKey, StockRecordId};
use crate::error::InventoryError;

/// 移动平均成本保留的小数位数
const AVERAGE_COST_SCALE: u32 = 6;

/// 库存记录聚合根
///
/// 以库存键 (物料, 工厂, 库存地点?, 批次?) 为粒度的权威数量记录,
/// 同时也是并发控制的锁定单位。所有数量变更必须在同一事务内
/// 先锁定记录再校验、写入,并伴随一条不可变流水。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockRecordId,
    tenant_id: TenantId,
    key: StockKey,
    /// 现有库存
    quantity_on_hand: i64,
    /// 预留数量,0 <= reserved <= on_hand
    quantity_reserved: i64,
    /// 在途数量
    quantity_in_transit: i64,
    /// 在制数量
    quantity_in_production: i64,
    /// 最低库存水位
    min_stock_level: Option<i64>,
    /// 最高库存水位
    max_stock_level: Option<i64>,
    /// 移动平均成本
    average_cost: Option<Decimal>,
    /// 批次日期,FIFO 排序依据
    batch_date: Option<DateTime<Utc>>,
    /// 批次失效日期
    expiry_date: Option<DateTime<Utc>>,
    /// 最近一次库存移动时间
    last_movement_at: Option<DateTime<Utc>>,
    status: StockRecordStatus,
    audit_info: AuditInfo,
}

impl StockRecord {
    /// 开立一条零数量的库存记录
    ///
    /// 批次记录未指定批次日期时以开立时间补齐,保证 FIFO 可排序。
    pub fn open(
        tenant_id: TenantId,
        key: StockKey,
        batch_date: Option<DateTime<Utc>>,
        expiry_date: Option<DateTime<Utc>>,
        created_by: Option<common::types::UserId>,
    ) -> Self {
        let batch_date = if key.is_batch_key() {
            batch_date.or_else(|| Some(Utc::now()))
        } else {
            batch_date
        };

        Self {
            id: StockRecordId::new(),
            tenant_id,
            key,
            quantity_on_hand: 0,
            quantity_reserved: 0,
            quantity_in_transit: 0,
            quantity_in_production: 0,
            min_stock_level: None,
            max_stock_level: None,
            average_cost: None,
            batch_date,
            expiry_date,
            last_movement_at: None,
            status: StockRecordStatus::Active,
            audit_info: AuditInfo::new(created_by),
        }
    }

    /// 从持久化数据重建
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: StockRecordId,
        tenant_id: TenantId,
        key: StockKey,
        quantity_on_hand: i64,
        quantity_reserved: i64,
        quantity_in_transit: i64,
        quantity_in_production: i64,
        min_stock_level: Option<i64>,
        max_stock_level: Option<i64>,
        average_cost: Option<Decimal>,
        batch_date: Option<DateTime<Utc>>,
        expiry_date: Option<DateTime<Utc>>,
        last_movement_at: Option<DateTime<Utc>>,
        status: StockRecordStatus,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            tenant_id,
            key,
            quantity_on_hand,
            quantity_reserved,
            quantity_in_transit,
            quantity_in_production,
            min_stock_level,
            max_stock_level,
            average_cost,
            batch_date,
            expiry_date,
            last_movement_at,
            status,
            audit_info,
        }
    }

    // ========== 访问器 ==========

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn key(&self) -> &StockKey {
        &self.key
    }

    pub fn quantity_on_hand(&self) -> i64 {
        self.quantity_on_hand
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn quantity_in_transit(&self) -> i64 {
        self.quantity_in_transit
    }

    pub fn quantity_in_production(&self) -> i64 {
        self.quantity_in_production
    }

    /// 可用库存 = 现有库存 - 预留数量
    pub fn available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }

    pub fn min_stock_level(&self) -> Option<i64> {
        self.min_stock_level
    }

    pub fn max_stock_level(&self) -> Option<i64> {
        self.max_stock_level
    }

    pub fn average_cost(&self) -> Option<Decimal> {
        self.average_cost
    }

    pub fn batch_date(&self) -> Option<DateTime<Utc>> {
        self.batch_date
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    pub fn last_movement_at(&self) -> Option<DateTime<Utc>> {
        self.last_movement_at
    }

    pub fn status(&self) -> StockRecordStatus {
        self.status
    }

    // ========== 业务方法 ==========

    /// 校验记录可以参与新的库存业务
    pub fn ensure_operational(&self) -> Result<(), InventoryError> {
        match self.status {
            StockRecordStatus::Active => Ok(()),
            StockRecordStatus::Blocked => Err(InventoryError::RecordBlocked),
            StockRecordStatus::MarkedForDeletion => Err(InventoryError::RecordMarkedForDeletion),
        }
    }

    /// 入库
    ///
    /// 带单位成本的入库按数量加权更新移动平均成本;
    /// 原数量为零或原平均成本缺失时直接采用本次成本。
    pub fn receive(
        &mut self,
        quantity: i64,
        unit_cost: Option<Decimal>,
    ) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        let new_on_hand = self
            .quantity_on_hand
            .checked_add(quantity)
            .ok_or(InventoryError::QuantityOverflow)?;

        if let Some(cost) = unit_cost {
            self.average_cost = Some(match self.average_cost {
                Some(old_cost) if self.quantity_on_hand > 0 => {
                    let old_quantity = Decimal::from(self.quantity_on_hand);
                    let in_quantity = Decimal::from(quantity);
                    ((old_cost * old_quantity + cost * in_quantity)
                        / (old_quantity + in_quantity))
                        .round_dp(AVERAGE_COST_SCALE)
                }
                _ => cost,
            });
        }

        self.quantity_on_hand = new_on_hand;
        self.touch_movement();
        Ok(())
    }

    /// 出库
    ///
    /// 只允许消耗可用库存,预留部分不受普通出库影响。
    pub fn issue(&mut self, quantity: i64) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        let available = self.available();
        if quantity > available {
            return Err(InventoryError::InsufficientStock {
                available,
                requested: quantity,
            });
        }
        self.quantity_on_hand -= quantity;
        self.touch_movement();
        Ok(())
    }

    /// 预留可用库存
    pub fn reserve(&mut self, quantity: i64) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        let available = self.available();
        if quantity > available {
            return Err(InventoryError::InsufficientStock {
                available,
                requested: quantity,
            });
        }
        self.quantity_reserved += quantity;
        self.audit_info.update(None);
        Ok(())
    }

    /// 释放预留数量,库存回到可用状态
    pub fn release_reserved(&mut self, quantity: i64) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if quantity > self.quantity_reserved {
            return Err(InventoryError::InvalidReleaseQuantity {
                remaining: self.quantity_reserved,
                requested: quantity,
            });
        }
        self.quantity_reserved -= quantity;
        self.audit_info.update(None);
        Ok(())
    }

    /// 设置库存水位
    pub fn set_stock_levels(
        &mut self,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<(), InventoryError> {
        let negative = min.is_some_and(|v| v < 0) || max.is_some_and(|v| v < 0);
        let inverted = matches!((min, max), (Some(lo), Some(hi)) if lo > hi);
        if negative || inverted {
            return Err(InventoryError::InvalidStockLevels { min, max });
        }
        self.min_stock_level = min;
        self.max_stock_level = max;
        self.audit_info.update(None);
        Ok(())
    }

    /// 冻结
    pub fn block(&mut self) -> Result<(), InventoryError> {
        if !self.status.can_block() {
            return match self.status {
                StockRecordStatus::MarkedForDeletion => {
                    Err(InventoryError::RecordMarkedForDeletion)
                }
                _ => Err(InventoryError::RecordBlocked),
            };
        }
        self.status = StockRecordStatus::Blocked;
        self.audit_info.update(None);
        Ok(())
    }

    /// 解冻
    pub fn unblock(&mut self) -> Result<(), InventoryError> {
        if !self.status.can_unblock() {
            return match self.status {
                StockRecordStatus::MarkedForDeletion => {
                    Err(InventoryError::RecordMarkedForDeletion)
                }
                _ => Ok(()),
            };
        }
        self.status = StockRecordStatus::Active;
        self.audit_info.update(None);
        Ok(())
    }

    /// 标记删除
    ///
    /// 墓碑化只打标不删行,历史流水保持对记录的引用。
    /// 仍有预留数量时拒绝,避免遗留无法释放的占用。
    pub fn mark_for_deletion(&mut self) -> Result<(), InventoryError> {
        if !self.status.can_mark_for_deletion() {
            return Err(InventoryError::RecordMarkedForDeletion);
        }
        if self.quantity_reserved > 0 {
            return Err(InventoryError::ReservedStockRemains {
                reserved: self.quantity_reserved,
            });
        }
        self.status = StockRecordStatus::MarkedForDeletion;
        self.audit_info.update(None);
        Ok(())
    }

    /// 低于最低水位
    pub fn is_below_min_level(&self) -> bool {
        self.min_stock_level
            .is_some_and(|min| self.quantity_on_hand <= min)
    }

    /// 高于最高水位
    pub fn is_above_max_level(&self) -> bool {
        self.max_stock_level
            .is_some_and(|max| self.quantity_on_hand > max)
    }

    fn touch_movement(&mut self) {
        self.last_movement_at = Some(Utc::now());
        self.audit_info.update(None);
    }
}

impl Entity for StockRecord {
    type Id = StockRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for StockRecord {
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
    use crate::domain::value_objects::MaterialId;
    use rust_decimal_macros::dec;

    fn test_record() -> StockRecord {
        let key = StockKey::new(MaterialId::new(), "P100").with_storage_location("SL01");
        StockRecord::open(TenantId::new(), key, None, None, None)
    }

    #[test]
    fn test_receive_then_issue_round_trip() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        assert_eq!(record.quantity_on_hand(), 10);
        record.issue(10).unwrap();
        assert_eq!(record.quantity_on_hand(), 0);
        assert!(record.last_movement_at().is_some());
    }

    #[test]
    fn test_issue_rejects_more_than_available() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        record.reserve(4).unwrap();

        let err = record.issue(7).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                available: 6,
                requested: 7
            }
        ));
        // 失败的出库不得改变任何数量
        assert_eq!(record.quantity_on_hand(), 10);
        assert_eq!(record.quantity_reserved(), 4);
    }

    #[test]
    fn test_issue_rejects_non_positive_quantity() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        assert!(matches!(
            record.issue(0),
            Err(InventoryError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            record.issue(-3),
            Err(InventoryError::InvalidQuantity { quantity: -3 })
        ));
    }

    #[test]
    fn test_moving_average_cost() {
        let mut record = test_record();
        record.receive(10, Some(dec!(2.00))).unwrap();
        assert_eq!(record.average_cost(), Some(dec!(2.00)));

        record.receive(10, Some(dec!(4.00))).unwrap();
        assert_eq!(record.quantity_on_hand(), 20);
        assert_eq!(record.average_cost(), Some(dec!(3.00)));
    }

    #[test]
    fn test_receive_without_cost_keeps_average() {
        let mut record = test_record();
        record.receive(10, Some(dec!(2.50))).unwrap();
        record.receive(5, None).unwrap();
        assert_eq!(record.average_cost(), Some(dec!(2.50)));
    }

    #[test]
    fn test_receive_adopts_cost_when_empty() {
        let mut record = test_record();
        record.receive(3, None).unwrap();
        assert_eq!(record.average_cost(), None);

        // 已有数量但无平均成本时直接采用本次成本
        record.receive(2, Some(dec!(5.00))).unwrap();
        assert_eq!(record.average_cost(), Some(dec!(5.00)));
    }

    #[test]
    fn test_reserve_and_release() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        record.reserve(6).unwrap();
        assert_eq!(record.available(), 4);

        record.release_reserved(2).unwrap();
        assert_eq!(record.quantity_reserved(), 4);
        assert_eq!(record.available(), 6);

        let err = record.release_reserved(5).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InvalidReleaseQuantity {
                remaining: 4,
                requested: 5
            }
        ));
    }

    #[test]
    fn test_reserve_beyond_available_fails() {
        let mut record = test_record();
        record.receive(5, None).unwrap();
        record.reserve(3).unwrap();
        assert!(matches!(
            record.reserve(3),
            Err(InventoryError::InsufficientStock {
                available: 2,
                requested: 3
            })
        ));
    }

    #[test]
    fn test_stock_level_validation() {
        let mut record = test_record();
        record.set_stock_levels(Some(10), Some(100)).unwrap();
        assert_eq!(record.min_stock_level(), Some(10));

        assert!(record.set_stock_levels(Some(100), Some(10)).is_err());
        assert!(record.set_stock_levels(Some(-1), None).is_err());
    }

    #[test]
    fn test_low_and_over_stock_checks() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        record.set_stock_levels(Some(10), Some(15)).unwrap();
        assert!(record.is_below_min_level());
        assert!(!record.is_above_max_level());

        record.receive(10, None).unwrap();
        assert!(!record.is_below_min_level());
        assert!(record.is_above_max_level());
    }

    #[test]
    fn test_block_rejects_operations() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        record.block().unwrap();
        assert!(matches!(
            record.ensure_operational(),
            Err(InventoryError::RecordBlocked)
        ));

        record.unblock().unwrap();
        assert!(record.ensure_operational().is_ok());
    }

    #[test]
    fn test_mark_for_deletion_requires_no_reservations() {
        let mut record = test_record();
        record.receive(10, None).unwrap();
        record.reserve(3).unwrap();

        let err = record.mark_for_deletion().unwrap_err();
        assert!(matches!(
            err,
            InventoryError::ReservedStockRemains { reserved: 3 }
        ));

        record.release_reserved(3).unwrap();
        record.mark_for_deletion().unwrap();
        assert!(record.status().is_marked_for_deletion());
        assert!(matches!(
            record.ensure_operational(),
            Err(InventoryError::RecordMarkedForDeletion)
        ));
    }

    #[test]
    fn test_batch_record_defaults_batch_date() {
        let key = StockKey::new(MaterialId::new(), "P100").with_batch_number("B-001");
        let record = StockRecord::open(TenantId::new(), key, None, None, None);
        assert!(record.batch_date().is_some());

        let plain = test_record();
        assert!(plain.batch_date().is_none());
    }
}
