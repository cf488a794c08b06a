//! 库存流水实体

use chrono::{DateTime, Utc};
use common::types::{TenantId, UserId};
use domain_core::Entity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entities::StockRecord;
use crate::domain::enums::MovementType;
use crate::domain::value_objects::{MaterialId, MovementId, StockRecordId};

/// 库存流水
///
/// 每次数量变更产生的不可变凭证,创建后不再修改。
/// 单据号由调用方提供用于业务关联,同一业务单据的多条流水
/// (如转移的两腿、FIFO 出库的各批次) 共享同一单据号。
/// 库存记录被物理删除时流水保留,记录引用置空。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    id: MovementId,
    tenant_id: TenantId,
    stock_record_id: Option<StockRecordId>,
    material_id: MaterialId,
    plant: String,
    storage_location: Option<String>,
    batch_number: Option<String>,
    movement_type: MovementType,
    /// 调用方单据号
    document_number: String,
    /// 带符号数量增量,负值为出库
    quantity_delta: i64,
    /// 变更前现有库存
    stock_before: i64,
    /// 变更后现有库存
    stock_after: i64,
    /// 单位成本,入库为采购成本,出库为记录当时的移动平均成本
    unit_cost: Option<Decimal>,
    remarks: Option<String>,
    posted_at: DateTime<Utc>,
    posted_by: Option<UserId>,
}

impl StockMovement {
    /// 针对已完成数量变更的记录开具流水
    ///
    /// 在记录变更之后调用,变更后数量从记录上取得。
    #[allow(clippy::too_many_arguments)]
    pub fn post(
        record: &StockRecord,
        movement_type: MovementType,
        document_number: String,
        quantity_delta: i64,
        stock_before: i64,
        unit_cost: Option<Decimal>,
        remarks: Option<String>,
        posted_by: Option<UserId>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            tenant_id: *record.tenant_id(),
            stock_record_id: Some(*record.id()),
            material_id: *record.key().material_id(),
            plant: record.key().plant().to_string(),
            storage_location: record.key().storage_location().map(str::to_string),
            batch_number: record.key().batch_number().map(str::to_string),
            movement_type,
            document_number,
            quantity_delta,
            stock_before,
            stock_after: record.quantity_on_hand(),
            unit_cost,
            remarks,
            posted_at: Utc::now(),
            posted_by,
        }
    }

    /// 从持久化数据重建
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: MovementId,
        tenant_id: TenantId,
        stock_record_id: Option<StockRecordId>,
        material_id: MaterialId,
        plant: String,
        storage_location: Option<String>,
        batch_number: Option<String>,
        movement_type: MovementType,
        document_number: String,
        quantity_delta: i64,
        stock_before: i64,
        stock_after: i64,
        unit_cost: Option<Decimal>,
        remarks: Option<String>,
        posted_at: DateTime<Utc>,
        posted_by: Option<UserId>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            stock_record_id,
            material_id,
            plant,
            storage_location,
            batch_number,
            movement_type,
            document_number,
            quantity_delta,
            stock_before,
            stock_after,
            unit_cost,
            remarks,
            posted_at,
            posted_by,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn stock_record_id(&self) -> Option<&StockRecordId> {
        self.stock_record_id.as_ref()
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

    pub fn batch_number(&self) -> Option<&str> {
        self.batch_number.as_deref()
    }

    pub fn movement_type(&self) -> MovementType {
        self.movement_type
    }

    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    pub fn quantity_delta(&self) -> i64 {
        self.quantity_delta
    }

    pub fn stock_before(&self) -> i64 {
        self.stock_before
    }

    pub fn stock_after(&self) -> i64 {
        self.stock_after
    }

    pub fn unit_cost(&self) -> Option<Decimal> {
        self.unit_cost
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at
    }

    pub fn posted_by(&self) -> Option<&UserId> {
        self.posted_by.as_ref()
    }

    /// 是否为入库流水
    pub fn is_receipt(&self) -> bool {
        self.quantity_delta > 0
    }
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::StockKey;
    use rust_decimal_macros::dec;

    #[test]
    fn test_post_captures_record_snapshot() {
        let key = StockKey::new(MaterialId::new(), "P100").with_batch_number("B-001");
        let mut record = StockRecord::open(TenantId::new(), key, None, None, None);
        record.receive(10, Some(dec!(2.00))).unwrap();

        let movement = StockMovement::post(
            &record,
            MovementType::Purchase,
            "PO-2024-001".to_string(),
            10,
            0,
            Some(dec!(2.00)),
            None,
            None,
        );

        assert_eq!(movement.stock_record_id(), Some(record.id()));
        assert_eq!(movement.batch_number(), Some("B-001"));
        assert_eq!(movement.quantity_delta(), 10);
        assert_eq!(movement.stock_before(), 0);
        assert_eq!(movement.stock_after(), 10);
        assert!(movement.is_receipt());
    }

    #[test]
    fn test_issue_movement_has_negative_delta() {
        let key = StockKey::new(MaterialId::new(), "P100");
        let mut record = StockRecord::open(TenantId::new(), key, None, None, None);
        record.receive(10, None).unwrap();
        let before = record.quantity_on_hand();
        record.issue(4).unwrap();

        let movement = StockMovement::post(
            &record,
            MovementType::Sale,
            "SO-2024-042".to_string(),
            -4,
            before,
            None,
            None,
            None,
        );

        assert_eq!(movement.quantity_delta(), -4);
        assert_eq!(movement.stock_before(), 10);
        assert_eq!(movement.stock_after(), 6);
        assert!(!movement.is_receipt());
    }
}
