//! 库存转移集成测试

mod support;

use common::types::Pagination;
use errors::AppError;
use rust_decimal_macros::dec;
use sc_im::application::commands::{BlockStockRecordCommand, TransferStockCommand};
use sc_im::application::queries::{GetStockRecordQuery, ListMovementsQuery};
use sc_im::domain::enums::MovementType;
use sc_im::domain::repositories::MovementFilter;
use sc_im::domain::value_objects::MaterialId;

use support::*;

fn transfer_command(
    ctx: &TestContext,
    material_id: MaterialId,
    quantity: i64,
) -> TransferStockCommand {
    TransferStockCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        material_id,
        from_plant: PLANT.to_string(),
        from_storage_location: None,
        from_batch_number: None,
        to_plant: "P200".to_string(),
        to_storage_location: None,
        to_batch_number: None,
        quantity,
        document_number: "TR-0001".to_string(),
        remarks: None,
    }
}

fn destination_query(ctx: &TestContext, material_id: MaterialId) -> GetStockRecordQuery {
    GetStockRecordQuery {
        tenant_id: ctx.tenant_id,
        material_id,
        plant: "P200".to_string(),
        storage_location: None,
        batch_number: None,
    }
}

#[tokio::test]
async fn test_transfer_moves_quantity_and_carries_cost() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    let mut receive = receive_command(&ctx, material_id, 10);
    receive.unit_cost = Some(dec!(2.50));
    ctx.handler.receive_stock(receive).await.unwrap();

    let result = ctx
        .handler
        .transfer_stock(transfer_command(&ctx, material_id, 4))
        .await
        .unwrap();

    assert_eq!(result.issue.quantity_delta(), -4);
    assert_eq!(result.issue.movement_type(), MovementType::Transfer);
    assert_eq!(result.receipt.quantity_delta(), 4);
    assert_eq!(result.receipt.plant(), "P200");
    assert_eq!(result.issue.document_number(), result.receipt.document_number());
    assert_eq!(result.issue.unit_cost(), Some(dec!(2.50)));

    let source = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(source.quantity_on_hand(), 6);

    // 目标懒创建并继承源移动平均成本
    let destination = ctx
        .handler
        .get_stock_record(destination_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(destination.quantity_on_hand(), 4);
    assert_eq!(destination.average_cost(), Some(dec!(2.50)));
}

#[tokio::test]
async fn test_transfer_both_legs_share_document() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 10))
        .await
        .unwrap();
    ctx.handler
        .transfer_stock(transfer_command(&ctx, material_id, 4))
        .await
        .unwrap();

    let page = ctx
        .handler
        .list_movements(ListMovementsQuery {
            tenant_id: ctx.tenant_id,
            filter: MovementFilter {
                document_number: Some("TR-0001".to_string()),
                ..Default::default()
            },
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let net: i64 = page.items.iter().map(|m| m.quantity_delta()).sum();
    assert_eq!(net, 0);
}

#[tokio::test]
async fn test_transfer_to_blocked_destination_rolls_back() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 10))
        .await
        .unwrap();

    let mut seed_destination = receive_command(&ctx, material_id, 1);
    seed_destination.plant = "P200".to_string();
    ctx.handler.receive_stock(seed_destination).await.unwrap();
    ctx.handler
        .block_stock_record(BlockStockRecordCommand {
            tenant_id: ctx.tenant_id,
            user_id: ctx.user_id,
            material_id,
            plant: "P200".to_string(),
            storage_location: None,
            batch_number: None,
        })
        .await
        .unwrap();

    let err = ctx
        .handler
        .transfer_stock(transfer_command(&ctx, material_id, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));

    // 两腿同一事务,源记录必须原封不动
    let source = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(source.quantity_on_hand(), 10);

    let page = ctx
        .handler
        .list_movements(ListMovementsQuery {
            tenant_id: ctx.tenant_id,
            filter: MovementFilter {
                document_number: Some("TR-0001".to_string()),
                ..Default::default()
            },
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_transfer_insufficient_source_leaves_destination_uncreated() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 3))
        .await
        .unwrap();

    let err = ctx
        .handler
        .transfer_stock(transfer_command(&ctx, material_id, 99))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));

    let err = ctx
        .handler
        .get_stock_record(destination_query(&ctx, material_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
