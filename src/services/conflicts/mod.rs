//! 课表冲突检测与排课服务

pub mod detect;
pub mod schedule;

pub use detect::{detect_conflicts, intervals_overlap};

use std::sync::Arc;

use crate::errors::{GradeFlowError, Result};
use crate::models::timetable::{
    entities::{RecordedSlotConflict, ScheduledSlot},
    requests::ScheduleSlotRequest,
};
use crate::models::users::entities::Actor;
use crate::storage::Storage;

/// 冲突处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    // 存在冲突即拒绝
    #[default]
    Strict,
    // 照常创建并记录冲突，等待复核
    Advisory,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Strict => write!(f, "strict"),
            ConflictPolicy::Advisory => write!(f, "advisory"),
        }
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ConflictPolicy::Strict),
            "advisory" => Ok(ConflictPolicy::Advisory),
            _ => Err(format!(
                "Invalid conflict mode: {s}. Supported: strict, advisory"
            )),
        }
    }
}

pub struct TimetableService {
    storage: Arc<dyn Storage>,
    policy: ConflictPolicy,
    allow_override: bool,
}

impl TimetableService {
    pub fn new(storage: Arc<dyn Storage>, policy: ConflictPolicy, allow_override: bool) -> Self {
        Self {
            storage,
            policy,
            allow_override,
        }
    }

    pub(crate) fn get_storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// 排课
    pub async fn schedule_slot(
        &self,
        actor: Actor,
        req: ScheduleSlotRequest,
    ) -> Result<ScheduledSlot> {
        schedule::schedule_slot(self, actor, req).await
    }

    /// 调课（不与自身比较）
    pub async fn reschedule_slot(
        &self,
        actor: Actor,
        slot_id: i64,
        req: ScheduleSlotRequest,
    ) -> Result<ScheduledSlot> {
        schedule::reschedule_slot(self, actor, slot_id, req).await
    }

    /// 删除时段
    pub async fn remove_slot(&self, actor: Actor, slot_id: i64) -> Result<()> {
        schedule::remove_slot(self, actor, slot_id).await
    }

    /// 列出未复核的冲突
    pub async fn list_slot_conflicts(&self) -> Result<Vec<RecordedSlotConflict>> {
        self.storage.list_slot_conflicts(true).await
    }

    /// 标记冲突为已复核
    pub async fn resolve_slot_conflict(&self, conflict_id: i64) -> Result<()> {
        if self.storage.resolve_slot_conflict(conflict_id).await? {
            Ok(())
        } else {
            Err(GradeFlowError::not_found(format!(
                "冲突记录 {conflict_id} 不存在"
            )))
        }
    }

    /// 按策略决定本次请求是否允许带冲突写入
    fn conflicts_allowed(&self, req: &ScheduleSlotRequest) -> Result<bool> {
        match self.policy {
            ConflictPolicy::Advisory => Ok(true),
            ConflictPolicy::Strict if !req.force_override => Ok(false),
            ConflictPolicy::Strict if self.allow_override => Ok(true),
            ConflictPolicy::Strict => Err(GradeFlowError::validation(
                "当前配置不允许强制排课 (timetable.allow_override = false)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("strict".parse::<ConflictPolicy>(), Ok(ConflictPolicy::Strict));
        assert_eq!(
            " Advisory ".parse::<ConflictPolicy>(),
            Ok(ConflictPolicy::Advisory)
        );
        assert!("lenient".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::Advisory.to_string(), "advisory");
    }
}
