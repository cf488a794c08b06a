//! 库存键值对象

use serde::{Deserialize, Serialize};

use super::MaterialId;

/// 库存键
///
/// 唯一确定一条库存记录: (物料, 工厂, 库存地点?, 批次?)。
/// 库存地点与批次为 None 和为具体值时是不同的键,
/// 同一物料的散装记录与批次记录互相独立。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    material_id: MaterialId,
    plant: String,
    storage_location: Option<String>,
    batch_number: Option<String>,
}

impl StockKey {
    pub fn new(material_id: MaterialId, plant: impl Into<String>) -> Self {
        Self {
            material_id,
            plant: plant.into(),
            storage_location: None,
            batch_number: None,
        }
    }

    pub fn with_storage_location(mut self, storage_location: impl Into<String>) -> Self {
        self.storage_location = Some(storage_location.into());
        self
    }

    pub fn with_batch_number(mut self, batch_number: impl Into<String>) -> Self {
        self.batch_number = Some(batch_number.into());
        self
    }

    pub fn from_parts(
        material_id: MaterialId,
        plant: String,
        storage_location: Option<String>,
        batch_number: Option<String>,
    ) -> Self {
        Self {
            material_id,
            plant,
            storage_location,
            batch_number,
        }
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

    /// 是否为批次记录的键
    pub fn is_batch_key(&self) -> bool {
        self.batch_number.is_some()
    }

    /// 去掉批次维度后的键,FIFO 分配按此范围取数
    pub fn scope(&self) -> StockKey {
        StockKey {
            material_id: self.material_id,
            plant: self.plant.clone(),
            storage_location: self.storage_location.clone(),
            batch_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_and_batchless_keys_are_distinct() {
        let material_id = MaterialId::new();
        let plain = StockKey::new(material_id, "P100");
        let batched = StockKey::new(material_id, "P100").with_batch_number("B-001");
        assert_ne!(plain, batched);
        assert!(!plain.is_batch_key());
        assert!(batched.is_batch_key());
    }

    #[test]
    fn test_scope_drops_batch_dimension() {
        let material_id = MaterialId::new();
        let key = StockKey::new(material_id, "P100")
            .with_storage_location("SL01")
            .with_batch_number("B-001");
        let scope = key.scope();
        assert_eq!(scope.storage_location(), Some("SL01"));
        assert_eq!(scope.batch_number(), None);
    }
}
