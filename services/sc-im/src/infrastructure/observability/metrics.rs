//! 库存业务指标记录

use metrics::counter;

use crate::domain::enums::{MovementType, ReservationType};

// ============================================================================
// 库存移动 Metrics
// ============================================================================

/// 记录一条已过账的库存流水
pub fn record_movement_posted(movement_type: MovementType, is_receipt: bool) {
    let labels = [
        ("movement_type", movement_type.as_str().to_string()),
        ("direction", if is_receipt { "receipt" } else { "issue" }.to_string()),
    ];
    counter!("sc_im_movements_posted_total", &labels).increment(1);
}

/// 记录一次 FIFO 出库消耗的批次数
pub fn record_fifo_batches_consumed(count: u64) {
    counter!("sc_im_fifo_batches_consumed_total").increment(count);
}

/// 记录一次完成的库存转移
pub fn record_transfer_completed() {
    counter!("sc_im_transfers_completed_total").increment(1);
}

// ============================================================================
// 预留 Metrics
// ============================================================================

/// 记录预留创建
pub fn record_reservation_created(reservation_type: ReservationType) {
    let labels = [("reservation_type", reservation_type.as_str().to_string())];
    counter!("sc_im_reservations_created_total", &labels).increment(1);
}

/// 记录预留释放,区分部分与完全释放
pub fn record_reservation_released(full: bool) {
    let labels = [("full", full.to_string())];
    counter!("sc_im_reservations_released_total", &labels).increment(1);
}

/// 记录预留取消
pub fn record_reservation_cancelled() {
    counter!("sc_im_reservations_cancelled_total").increment(1);
}

/// 记录过期预留清理数量
pub fn record_reservations_expired(count: u64) {
    counter!("sc_im_reservations_expired_total").increment(count);
}
