//! 预留状态枚举

use serde::{Deserialize, Serialize};

/// 预留状态
///
/// Reserved -> PartiallyReleased -> Released 为正常生命周期,
/// Cancelled 为独立的终止状态,与完全释放区分开。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationStatus {
    /// 已预留
    #[default]
    Reserved,
    /// 部分释放
    PartiallyReleased,
    /// 已释放
    Released,
    /// 已取消
    Cancelled,
}

impl ReservationStatus {
    /// 是否仍持有预留数量
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Reserved | ReservationStatus::PartiallyReleased
        )
    }

    /// 是否为终止状态
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }
}

impl From<i16> for ReservationStatus {
    fn from(value: i16) -> Self {
        match value {
            1 => ReservationStatus::Reserved,
            2 => ReservationStatus::PartiallyReleased,
            3 => ReservationStatus::Released,
            4 => ReservationStatus::Cancelled,
            _ => ReservationStatus::Reserved,
        }
    }
}

impl From<ReservationStatus> for i16 {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Reserved => 1,
            ReservationStatus::PartiallyReleased => 2,
            ReservationStatus::Released => 3,
            ReservationStatus::Cancelled => 4,
        }
    }
}
