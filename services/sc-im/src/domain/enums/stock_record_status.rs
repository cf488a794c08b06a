//! 库存记录状态枚举

use serde::{Deserialize, Serialize};

/// 库存记录状态
///
/// MarkedForDeletion 为墓碑状态:记录保留历史引用,
/// 查询默认排除,新的库存移动与预留一律拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockRecordStatus {
    /// 活跃
    #[default]
    Active,
    /// 冻结
    Blocked,
    /// 标记删除
    MarkedForDeletion,
}

impl StockRecordStatus {
    /// 是否可以冻结
    pub fn can_block(&self) -> bool {
        matches!(self, StockRecordStatus::Active)
    }

    /// 是否可以解冻
    pub fn can_unblock(&self) -> bool {
        matches!(self, StockRecordStatus::Blocked)
    }

    /// 是否可以标记删除
    pub fn can_mark_for_deletion(&self) -> bool {
        !matches!(self, StockRecordStatus::MarkedForDeletion)
    }

    /// 是否为活跃状态
    pub fn is_active(&self) -> bool {
        matches!(self, StockRecordStatus::Active)
    }

    /// 是否已标记删除
    pub fn is_marked_for_deletion(&self) -> bool {
        matches!(self, StockRecordStatus::MarkedForDeletion)
    }
}

impl From<i16> for StockRecordStatus {
    fn from(value: i16) -> Self {
        match value {
            1 => StockRecordStatus::Active,
            2 => StockRecordStatus::Blocked,
            3 => StockRecordStatus::MarkedForDeletion,
            _ => StockRecordStatus::Active,
        }
    }
}

impl From<StockRecordStatus> for i16 {
    fn from(status: StockRecordStatus) -> Self {
        match status {
            StockRecordStatus::Active => 1,
            StockRecordStatus::Blocked => 2,
            StockRecordStatus::MarkedForDeletion => 3,
        }
    }
}
