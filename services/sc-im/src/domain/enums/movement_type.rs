//! 库存移动类型枚举

use serde::{Deserialize, Serialize};

/// 库存移动类型
///
/// 标识一条库存流水的业务来源。正负方向由流水的数量增量决定,
/// 移动类型只约束该类型允许出现的方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementType {
    /// 采购入库
    #[default]
    Purchase,
    /// 销售出库
    Sale,
    /// 退货入库
    Return,
    /// 库存调整
    Adjustment,
    /// 库存转移
    Transfer,
    /// 盘点
    StockTaking,
    /// 生产领料
    ProductionConsumption,
    /// 生产完工入库
    ProductionCompletion,
    /// 报废
    Scrap,
    /// 期初建账
    OpeningBalance,
}

impl MovementType {
    /// 返回稳定的字符串标识,用于日志与指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Return => "return",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
            MovementType::StockTaking => "stock_taking",
            MovementType::ProductionConsumption => "production_consumption",
            MovementType::ProductionCompletion => "production_completion",
            MovementType::Scrap => "scrap",
            MovementType::OpeningBalance => "opening_balance",
        }
    }

    /// 是否允许作为入库类型
    pub fn can_receive(&self) -> bool {
        matches!(
            self,
            MovementType::Purchase
                | MovementType::Return
                | MovementType::ProductionCompletion
                | MovementType::OpeningBalance
        )
    }

    /// 是否允许作为出库类型
    pub fn can_issue(&self) -> bool {
        matches!(
            self,
            MovementType::Sale | MovementType::ProductionConsumption | MovementType::Scrap
        )
    }
}

impl From<i16> for MovementType {
    fn from(value: i16) -> Self {
        match value {
            1 => MovementType::Purchase,
            2 => MovementType::Sale,
            3 => MovementType::Return,
            4 => MovementType::Adjustment,
            5 => MovementType::Transfer,
            6 => MovementType::StockTaking,
            7 => MovementType::ProductionConsumption,
            8 => MovementType::ProductionCompletion,
            9 => MovementType::Scrap,
            10 => MovementType::OpeningBalance,
            _ => MovementType::Adjustment,
        }
    }
}

impl From<MovementType> for i16 {
    fn from(movement_type: MovementType) -> Self {
        match movement_type {
            MovementType::Purchase => 1,
            MovementType::Sale => 2,
            MovementType::Return => 3,
            MovementType::Adjustment => 4,
            MovementType::Transfer => 5,
            MovementType::StockTaking => 6,
            MovementType::ProductionConsumption => 7,
            MovementType::ProductionCompletion => 8,
            MovementType::Scrap => 9,
            MovementType::OpeningBalance => 10,
        }
    }
}
