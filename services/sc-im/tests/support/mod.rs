//! 集成测试支撑
//!
//! 所有集成测试通过内存存储驱动完整的 ServiceHandler。

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::types::{TenantId, UserId};

use sc_im::application::commands::{
    IssueStockCommand, ReceiveStockCommand, ReserveStockCommand,
};
use sc_im::application::queries::GetStockRecordQuery;
use sc_im::application::ServiceHandler;
use sc_im::domain::enums::{MovementType, ReservationType};
use sc_im::domain::value_objects::MaterialId;
use sc_im::infrastructure::persistence::InMemoryStockStore;

pub const PLANT: &str = "P100";

pub struct TestContext {
    pub handler: Arc<ServiceHandler>,
    pub tenant_id: TenantId,
    pub user_id: UserId,
}

pub fn test_context() -> TestContext {
    let store = Arc::new(InMemoryStockStore::new());
    let handler = Arc::new(ServiceHandler::new(store.clone(), store));
    TestContext {
        handler,
        tenant_id: TenantId::new(),
        user_id: UserId::new(),
    }
}

pub fn receive_command(
    ctx: &TestContext,
    material_id: MaterialId,
    quantity: i64,
) -> ReceiveStockCommand {
    ReceiveStockCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        material_id,
        plant: PLANT.to_string(),
        storage_location: None,
        batch_number: None,
        quantity,
        unit_cost: None,
        movement_type: MovementType::Purchase,
        document_number: "PO-0001".to_string(),
        batch_date: None,
        expiry_date: None,
        remarks: None,
    }
}

pub fn receive_batch_command(
    ctx: &TestContext,
    material_id: MaterialId,
    batch_number: &str,
    batch_date: DateTime<Utc>,
    quantity: i64,
) -> ReceiveStockCommand {
    let mut cmd = receive_command(ctx, material_id, quantity);
    cmd.batch_number = Some(batch_number.to_string());
    cmd.batch_date = Some(batch_date);
    cmd
}

pub fn issue_command(
    ctx: &TestContext,
    material_id: MaterialId,
    quantity: i64,
) -> IssueStockCommand {
    IssueStockCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        material_id,
        plant: PLANT.to_string(),
        storage_location: None,
        batch_number: None,
        quantity,
        movement_type: MovementType::Sale,
        document_number: "SO-0001".to_string(),
        remarks: None,
    }
}

pub fn reserve_command(
    ctx: &TestContext,
    material_id: MaterialId,
    quantity: i64,
    reference_number: &str,
) -> ReserveStockCommand {
    ReserveStockCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        material_id,
        plant: PLANT.to_string(),
        storage_location: None,
        reservation_type: ReservationType::SalesOrder,
        quantity,
        reference_number: reference_number.to_string(),
        expires_at: None,
    }
}

pub fn get_record_query(ctx: &TestContext, material_id: MaterialId) -> GetStockRecordQuery {
    GetStockRecordQuery {
        tenant_id: ctx.tenant_id,
        material_id,
        plant: PLANT.to_string(),
        storage_location: None,
        batch_number: None,
    }
}
