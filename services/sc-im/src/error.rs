//! 库存领域错误
//!
//! 领域层与应用层返回的业务错误,统一在此定义并映射为 AppError。
//! 业务失败(库存不足、记录冻结等)是预期结果,不是异常。

use errors::AppError;
use thiserror::Error;

use crate::domain::enums::ReservationStatus;

/// 库存业务错误
#[derive(Debug, Error)]
pub enum InventoryError {
    /// 数量必须为正数
    #[error("数量必须为正数: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// 库存记录不存在
    #[error("库存记录不存在")]
    RecordNotFound,

    /// 可用库存不足
    #[error("可用库存不足: 可用 {available}, 请求 {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// 库存记录已冻结
    #[error("库存记录已冻结,禁止库存移动")]
    RecordBlocked,

    /// 库存记录已标记删除
    #[error("库存记录已标记删除,禁止新的库存移动")]
    RecordMarkedForDeletion,

    /// 仍有预留,无法标记删除
    #[error("库存记录仍有 {reserved} 个预留数量,无法标记删除")]
    ReservedStockRemains { reserved: i64 },

    /// 数量运算溢出
    #[error("库存数量超出可表示范围")]
    QuantityOverflow,

    /// 库存水位设置无效
    #[error("库存水位无效: 最低 {min:?}, 最高 {max:?}")]
    InvalidStockLevels { min: Option<i64>, max: Option<i64> },

    /// 预留不存在
    #[error("预留不存在")]
    ReservationNotFound,

    /// 预留已关闭
    #[error("预留已关闭: {status:?}")]
    ReservationClosed { status: ReservationStatus },

    /// 释放数量无效
    #[error("释放数量无效: 剩余 {remaining}, 请求 {requested}")]
    InvalidReleaseQuantity { remaining: i64, requested: i64 },
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match &err {
            InventoryError::InvalidQuantity { .. }
            | InventoryError::InvalidReleaseQuantity { .. }
            | InventoryError::InvalidStockLevels { .. }
            | InventoryError::QuantityOverflow => AppError::validation(err.to_string()),
            InventoryError::RecordNotFound | InventoryError::ReservationNotFound => {
                AppError::not_found(err.to_string())
            }
            InventoryError::InsufficientStock { .. }
            | InventoryError::RecordBlocked
            | InventoryError::RecordMarkedForDeletion
            | InventoryError::ReservedStockRemains { .. }
            | InventoryError::ReservationClosed { .. } => {
                AppError::failed_precondition(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_failed_precondition() {
        let err = InventoryError::InsufficientStock {
            available: 3,
            requested: 10,
        };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::FailedPrecondition(_)));
        assert_eq!(app_err.status_code(), 412);
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let app_err: AppError = InventoryError::RecordNotFound.into();
        assert!(matches!(app_err, AppError::NotFound(_)));
    }

    #[test]
    fn test_invalid_quantity_maps_to_validation() {
        let err = InventoryError::InvalidQuantity { quantity: -5 };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Validation(_)));
        assert!(app_err.to_string().contains("-5"));
    }

    #[test]
    fn test_reservation_closed_maps_to_failed_precondition() {
        let err = InventoryError::ReservationClosed {
            status: ReservationStatus::Cancelled,
        };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::FailedPrecondition(_)));
    }
}
