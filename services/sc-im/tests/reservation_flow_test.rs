//! 预留生命周期集成测试

mod support;

use chrono::{Duration, Utc};
use domain_core::Entity;
use errors::AppError;
use sc_im::application::commands::{
    CancelReservationCommand, MarkRecordForDeletionCommand, ReleaseReservationCommand,
};
use sc_im::application::queries::{GetReservationQuery, ListActiveReservationsQuery};
use sc_im::domain::enums::ReservationStatus;
use sc_im::domain::repositories::ReservationFilter;
use sc_im::domain::value_objects::{MaterialId, ReservationId};

use support::*;

fn release_cmd(
    ctx: &TestContext,
    reservation_id: ReservationId,
    quantity: Option<i64>,
) -> ReleaseReservationCommand {
    ReleaseReservationCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        reservation_id,
        quantity,
    }
}

#[tokio::test]
async fn test_reserve_holds_stock_against_issue() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 15))
        .await
        .unwrap();

    let reservation = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 10, "SO-100"))
        .await
        .unwrap();
    assert!(reservation.reservation_number().starts_with("RS"));
    assert_eq!(reservation.status(), ReservationStatus::Reserved);
    assert_eq!(reservation.remaining(), 10);

    let record = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(record.quantity_reserved(), 10);
    assert_eq!(record.available(), 5);

    // 可用只剩 5,出 6 必须失败
    let err = ctx
        .handler
        .issue_stock(issue_command(&ctx, material_id, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));

    ctx.handler
        .issue_stock(issue_command(&ctx, material_id, 5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_partial_then_full_release() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 15))
        .await
        .unwrap();
    let reservation = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 10, "SO-100"))
        .await
        .unwrap();
    let reservation_id = *reservation.id();

    let partial = ctx
        .handler
        .release_reservation(release_cmd(&ctx, reservation_id, Some(4)))
        .await
        .unwrap();
    assert_eq!(partial.status(), ReservationStatus::PartiallyReleased);
    assert_eq!(partial.remaining(), 6);

    let record = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(record.quantity_reserved(), 6);
    assert_eq!(record.available(), 9);

    // 不带数量时释放全部剩余
    let full = ctx
        .handler
        .release_reservation(release_cmd(&ctx, reservation_id, None))
        .await
        .unwrap();
    assert_eq!(full.status(), ReservationStatus::Released);
    assert_eq!(full.remaining(), 0);

    let record = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(record.quantity_reserved(), 0);

    // 终止状态上的再次释放被拒绝
    let err = ctx
        .handler
        .release_reservation(release_cmd(&ctx, reservation_id, Some(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));
}

#[tokio::test]
async fn test_release_more_than_remaining_fails() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 15))
        .await
        .unwrap();
    let reservation = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 10, "SO-100"))
        .await
        .unwrap();

    let err = ctx
        .handler
        .release_reservation(release_cmd(&ctx, *reservation.id(), Some(11)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // 失败不影响预留与记录
    let unchanged = ctx
        .handler
        .get_reservation(GetReservationQuery {
            tenant_id: ctx.tenant_id,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap();
    assert_eq!(unchanged.remaining(), 10);
}

#[tokio::test]
async fn test_cancel_returns_remaining_quantity() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 15))
        .await
        .unwrap();
    let reservation = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 10, "SO-100"))
        .await
        .unwrap();
    let reservation_id = *reservation.id();

    ctx.handler
        .release_reservation(release_cmd(&ctx, reservation_id, Some(3)))
        .await
        .unwrap();

    let cancelled = ctx
        .handler
        .cancel_reservation(CancelReservationCommand {
            tenant_id: ctx.tenant_id,
            user_id: ctx.user_id,
            reservation_id,
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
    assert_eq!(cancelled.remaining(), 0);

    let record = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(record.quantity_reserved(), 0);
    assert_eq!(record.quantity_on_hand(), 15);
}

#[tokio::test]
async fn test_reserve_requires_existing_record() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    let err = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 5, "SO-100"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_reserve_more_than_available_fails() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 8))
        .await
        .unwrap();
    ctx.handler
        .reserve_stock(reserve_command(&ctx, material_id, 5, "SO-100"))
        .await
        .unwrap();

    let err = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 4, "SO-101"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));
}

#[tokio::test]
async fn test_active_reservation_listing() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 20))
        .await
        .unwrap();
    let first = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 5, "SO-100"))
        .await
        .unwrap();
    let second = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 5, "SO-101"))
        .await
        .unwrap();

    ctx.handler
        .release_reservation(release_cmd(&ctx, *first.id(), None))
        .await
        .unwrap();

    let active = ctx
        .handler
        .list_active_reservations(ListActiveReservationsQuery {
            tenant_id: ctx.tenant_id,
            filter: ReservationFilter {
                material_id: Some(material_id),
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), second.id());
}

#[tokio::test]
async fn test_expired_reservations_swept() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 20))
        .await
        .unwrap();

    let mut expired_cmd = reserve_command(&ctx, material_id, 6, "SO-100");
    expired_cmd.expires_at = Some(Utc::now() - Duration::hours(1));
    let expired = ctx.handler.reserve_stock(expired_cmd).await.unwrap();

    let mut living_cmd = reserve_command(&ctx, material_id, 4, "SO-101");
    living_cmd.expires_at = Some(Utc::now() + Duration::hours(1));
    ctx.handler.reserve_stock(living_cmd).await.unwrap();

    let released = ctx
        .handler
        .release_expired_reservations(50)
        .await
        .unwrap();
    assert_eq!(released, 1);

    let swept = ctx
        .handler
        .get_reservation(GetReservationQuery {
            tenant_id: ctx.tenant_id,
            reservation_id: *expired.id(),
        })
        .await
        .unwrap();
    assert_eq!(swept.status(), ReservationStatus::Cancelled);

    // 未到期的预留保持占用
    let record = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap();
    assert_eq!(record.quantity_reserved(), 4);

    // 再次清理没有可处理的对象
    let released = ctx
        .handler
        .release_expired_reservations(50)
        .await
        .unwrap();
    assert_eq!(released, 0);
}

#[tokio::test]
async fn test_mark_for_deletion_requires_zero_reserved() {
    let ctx = test_context();
    let material_id = MaterialId::new();

    ctx.handler
        .receive_stock(receive_command(&ctx, material_id, 10))
        .await
        .unwrap();
    let reservation = ctx
        .handler
        .reserve_stock(reserve_command(&ctx, material_id, 5, "SO-100"))
        .await
        .unwrap();

    let mark_cmd = MarkRecordForDeletionCommand {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        material_id,
        plant: PLANT.to_string(),
        storage_location: None,
        batch_number: None,
    };

    let err = ctx
        .handler
        .mark_record_for_deletion(mark_cmd.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));

    ctx.handler
        .cancel_reservation(CancelReservationCommand {
            tenant_id: ctx.tenant_id,
            user_id: ctx.user_id,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap();

    ctx.handler.mark_record_for_deletion(mark_cmd).await.unwrap();

    // 墓碑对查询不可见,也不再接受新的移动
    let err = ctx
        .handler
        .get_stock_record(get_record_query(&ctx, material_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx
        .handler
        .receive_stock(receive_command(&ctx, material_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));
}
