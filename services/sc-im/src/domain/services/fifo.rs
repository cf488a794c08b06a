//! FIFO 批次分配

use std::cmp::Ordering;

use domain_core::Entity;

use crate::domain::entities::StockRecord;
use crate::domain::value_objects::StockRecordId;
use crate::error::InventoryError;

/// 单条批次分配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAllocation {
    pub stock_record_id: StockRecordId,
    pub batch_number: Option<String>,
    pub quantity: i64,
}

/// FIFO 排序: 批次日期升序,无批次日期的记录排最后,同日期按记录 ID 升序。
///
/// 记录 ID 为 UUIDv7,同日期批次因此按创建先后消耗,排序全序且确定。
pub fn fifo_order(a: &StockRecord, b: &StockRecord) -> Ordering {
    match (a.batch_date(), b.batch_date()) {
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.id().cmp(b.id())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id().cmp(b.id()),
    }
}

/// 计算 FIFO 分配计划
///
/// 从给定记录集中按先进先出贪心分配请求数量:
/// 只考虑活跃且有可用库存的记录,最老批次优先,耗尽再取下一批。
/// 总可用不足时整体失败,不产生部分计划。
/// 本函数是纯计算,不修改任何记录;调用方丢弃计划没有副作用。
pub fn plan_allocation(
    requested: i64,
    records: &[StockRecord],
) -> Result<Vec<BatchAllocation>, InventoryError> {
    if requested <= 0 {
        return Err(InventoryError::InvalidQuantity {
            quantity: requested,
        });
    }

    let mut candidates: Vec<&StockRecord> = records
        .iter()
        .filter(|record| record.status().is_active() && record.available() > 0)
        .collect();
    candidates.sort_by(|a, b| fifo_order(a, b));

    let total_available: i64 = candidates.iter().map(|record| record.available()).sum();
    if total_available < requested {
        return Err(InventoryError::InsufficientStock {
            available: total_available,
            requested,
        });
    }

    let mut plan = Vec::new();
    let mut remaining = requested;
    for record in candidates {
        if remaining == 0 {
            break;
        }
        let quantity = remaining.min(record.available());
        plan.push(BatchAllocation {
            stock_record_id: *record.id(),
            batch_number: record.key().batch_number().map(str::to_string),
            quantity,
        });
        remaining -= quantity;
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{MaterialId, StockKey};
    use chrono::{Duration, Utc};
    use common::types::TenantId;

    fn batch_record(
        tenant_id: TenantId,
        material_id: MaterialId,
        batch: &str,
        age_days: i64,
        quantity: i64,
    ) -> StockRecord {
        let key = StockKey::new(material_id, "P100").with_batch_number(batch);
        let mut record = StockRecord::open(
            tenant_id,
            key,
            Some(Utc::now() - Duration::days(age_days)),
            None,
            None,
        );
        if quantity > 0 {
            record.receive(quantity, None).unwrap();
        }
        record
    }

    #[test]
    fn test_allocates_oldest_batch_first() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        // B1 较老,应先被耗尽
        let b1 = batch_record(tenant_id, material_id, "B1", 10, 5);
        let b2 = batch_record(tenant_id, material_id, "B2", 5, 5);
        let records = vec![b2, b1];

        let plan = plan_allocation(7, &records).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_number.as_deref(), Some("B1"));
        assert_eq!(plan[0].quantity, 5);
        assert_eq!(plan[1].batch_number.as_deref(), Some("B2"));
        assert_eq!(plan[1].quantity, 2);
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        let b1 = batch_record(tenant_id, material_id, "B1", 10, 5);
        let b2 = batch_record(tenant_id, material_id, "B2", 5, 5);
        let records = vec![b1, b2];

        let first = plan_allocation(7, &records).unwrap();
        let second = plan_allocation(7, &records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_total_fails_whole() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        let records = vec![
            batch_record(tenant_id, material_id, "B1", 10, 3),
            batch_record(tenant_id, material_id, "B2", 5, 3),
        ];

        let err = plan_allocation(10, &records).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                available: 6,
                requested: 10
            }
        ));
    }

    #[test]
    fn test_reserved_stock_is_not_allocatable() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        let mut record = batch_record(tenant_id, material_id, "B1", 10, 10);
        record.reserve(6).unwrap();
        let records = vec![record];

        // 现有 10 但可用仅 4
        let err = plan_allocation(5, &records).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                available: 4,
                requested: 5
            }
        ));

        let plan = plan_allocation(4, &records).unwrap();
        assert_eq!(plan[0].quantity, 4);
    }

    #[test]
    fn test_blocked_and_empty_records_skipped() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        let mut blocked = batch_record(tenant_id, material_id, "B1", 10, 5);
        blocked.block().unwrap();
        let empty = batch_record(tenant_id, material_id, "B2", 8, 0);
        let open = batch_record(tenant_id, material_id, "B3", 5, 5);
        let records = vec![blocked, empty, open];

        let plan = plan_allocation(5, &records).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_number.as_deref(), Some("B3"));
    }

    #[test]
    fn test_dateless_records_sort_last() {
        let tenant_id = TenantId::new();
        let material_id = MaterialId::new();
        let dated = batch_record(tenant_id, material_id, "B1", 1, 5);
        let key = StockKey::new(material_id, "P100");
        let mut dateless = StockRecord::open(tenant_id, key, None, None, None);
        dateless.receive(5, None).unwrap();
        let records = vec![dateless, dated];

        let plan = plan_allocation(6, &records).unwrap();
        assert_eq!(plan[0].batch_number.as_deref(), Some("B1"));
        assert_eq!(plan[0].quantity, 5);
        assert_eq!(plan[1].batch_number, None);
        assert_eq!(plan[1].quantity, 1);
    }

    #[test]
    fn test_non_positive_request_rejected() {
        let records = vec![];
        assert!(matches!(
            plan_allocation(0, &records),
            Err(InventoryError::InvalidQuantity { quantity: 0 })
        ));
    }
}
