//! 实体与聚合根基础 trait

use common::{AuditInfo, UserId};

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 聚合根 trait
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;

    /// 记录本次变更的操作者
    fn touch(&mut self, user: UserId) {
        self.audit_info_mut().update(Some(user));
    }
}
