//! 预留查询

use common::types::TenantId;

use crate::domain::repositories::ReservationFilter;
use crate::domain::value_objects::ReservationId;

/// 获取预留查询
#[derive(Debug, Clone)]
pub struct GetReservationQuery {
    pub tenant_id: TenantId,
    pub reservation_id: ReservationId,
}

/// 活跃预留列表查询
#[derive(Debug, Clone)]
pub struct ListActiveReservationsQuery {
    pub tenant_id: TenantId,
    pub filter: ReservationFilter,
}
