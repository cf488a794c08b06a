//! 预留类型枚举

use serde::{Deserialize, Serialize};

/// 预留类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationType {
    /// 销售订单预留
    SalesOrder,
    /// 生产订单预留
    ProductionOrder,
    /// 转移预留
    Transfer,
    /// 其他
    #[default]
    Other,
}

impl ReservationType {
    /// 返回稳定的字符串标识,用于日志与指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationType::SalesOrder => "sales_order",
            ReservationType::ProductionOrder => "production_order",
            ReservationType::Transfer => "transfer",
            ReservationType::Other => "other",
        }
    }
}

impl From<i16> for ReservationType {
    fn from(value: i16) -> Self {
        match value {
            1 => ReservationType::SalesOrder,
            2 => ReservationType::ProductionOrder,
            3 => ReservationType::Transfer,
            4 => ReservationType::Other,
            _ => ReservationType::Other,
        }
    }
}

impl From<ReservationType> for i16 {
    fn from(reservation_type: ReservationType) -> Self {
        match reservation_type {
            ReservationType::SalesOrder => 1,
            ReservationType::ProductionOrder => 2,
            ReservationType::Transfer => 3,
            ReservationType::Other => 4,
        }
    }
}
