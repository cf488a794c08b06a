//! 库存移动命令

use chrono::{DateTime, Utc};
use common::types::{TenantId, UserId};
use errors::AppResult;
use rust_decimal::Decimal;

use crate::domain::enums::MovementType;
use crate::domain::value_objects::{MaterialId, StockKey};
use crate::error::InventoryError;

/// 入库命令
#[derive(Debug, Clone)]
pub struct ReceiveStockCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    pub quantity: i64,
    pub unit_cost: Option<Decimal>,
    pub movement_type: MovementType,
    /// 调用方单据号
    pub document_number: String,
    /// 批次日期,仅在首次开立批次记录时生效
    pub batch_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl ReceiveStockCommand {
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
        if self.document_number.is_empty() {
            return Err(errors::AppError::validation("单据号不能为空"));
        }
        if !self.movement_type.can_receive() {
            return Err(errors::AppError::validation("该移动类型不允许入库"));
        }
        if self.unit_cost.is_some_and(|cost| cost < Decimal::ZERO) {
            return Err(errors::AppError::validation("单位成本不能为负数"));
        }
        Ok(())
    }

    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 出库命令
#[derive(Debug, Clone)]
pub struct IssueStockCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub document_number: String,
    pub remarks: Option<String>,
}

impl IssueStockCommand {
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
        if self.document_number.is_empty() {
            return Err(errors::AppError::validation("单据号不能为空"));
        }
        if !self.movement_type.can_issue() {
            return Err(errors::AppError::validation("该移动类型不允许出库"));
        }
        Ok(())
    }

    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// FIFO 出库命令
///
/// 在 (物料, 工厂, 库存地点) 范围内按批次日期先进先出消耗,
/// 每消耗一个批次产生一条流水,共享同一单据号。
#[derive(Debug, Clone)]
pub struct IssueStockFifoCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub document_number: String,
    pub remarks: Option<String>,
}

impl IssueStockFifoCommand {
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
        if self.document_number.is_empty() {
            return Err(errors::AppError::validation("单据号不能为空"));
        }
        if !self.movement_type.can_issue() {
            return Err(errors::AppError::validation("该移动类型不允许出库"));
        }
        Ok(())
    }

    pub fn scope(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            None,
        )
    }
}

/// 库存转移命令
///
/// 源记录出库、目标记录入库在同一事务内完成,
/// 目标入库携带源记录的移动平均成本。
#[derive(Debug, Clone)]
pub struct TransferStockCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub from_plant: String,
    pub from_storage_location: Option<String>,
    pub from_batch_number: Option<String>,
    pub to_plant: String,
    pub to_storage_location: Option<String>,
    pub to_batch_number: Option<String>,
    pub quantity: i64,
    pub document_number: String,
    pub remarks: Option<String>,
}

impl TransferStockCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.quantity <= 0 {
            return Err(InventoryError::InvalidQuantity {
                quantity: self.quantity,
            }
            .into());
        }
        if self.from_plant.is_empty() || self.to_plant.is_empty() {
            return Err(errors::AppError::validation("工厂不能为空"));
        }
        if self.document_number.is_empty() {
            return Err(errors::AppError::validation("单据号不能为空"));
        }
        if self.from_key() == self.to_key() {
            return Err(errors::AppError::validation("转移的源和目标不能相同"));
        }
        Ok(())
    }

    pub fn from_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.from_plant.clone(),
            self.from_storage_location.clone(),
            self.from_batch_number.clone(),
        )
    }

    pub fn to_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.to_plant.clone(),
            self.to_storage_location.clone(),
            self.to_batch_number.clone(),
        )
    }
}

/// 库存调整命令
///
/// 将现有库存调整到给定绝对数量,差额走入库或出库路径。
/// 数量不变时不产生任何变更。
#[derive(Debug, Clone)]
pub struct AdjustStockCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    /// 目标绝对数量
    pub new_quantity: i64,
    /// 调整来源,限调整或盘点
    pub movement_type: MovementType,
    pub document_number: String,
    pub remarks: Option<String>,
}

impl AdjustStockCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.new_quantity < 0 {
            return Err(errors::AppError::validation("目标数量不能为负数"));
        }
        if self.plant.is_empty() {
            return Err(errors::AppError::validation("工厂不能为空"));
        }
        if self.document_number.is_empty() {
            return Err(errors::AppError::validation("单据号不能为空"));
        }
        if !matches!(
            self.movement_type,
            MovementType::Adjustment | MovementType::StockTaking
        ) {
            return Err(errors::AppError::validation("调整只允许调整或盘点类型"));
        }
        Ok(())
    }

    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 设置库存水位命令
#[derive(Debug, Clone)]
pub struct SetStockLevelsCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
}

impl SetStockLevelsCommand {
    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 冻结库存记录命令
#[derive(Debug, Clone)]
pub struct BlockStockRecordCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
}

impl BlockStockRecordCommand {
    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 解冻库存记录命令
#[derive(Debug, Clone)]
pub struct UnblockStockRecordCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
}

impl UnblockStockRecordCommand {
    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}

/// 标记删除库存记录命令
#[derive(Debug, Clone)]
pub struct MarkRecordForDeletionCommand {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub material_id: MaterialId,
    pub plant: String,
    pub storage_location: Option<String>,
    pub batch_number: Option<String>,
}

impl MarkRecordForDeletionCommand {
    pub fn stock_key(&self) -> StockKey {
        StockKey::from_parts(
            self.material_id,
            self.plant.clone(),
            self.storage_location.clone(),
            self.batch_number.clone(),
        )
    }
}
