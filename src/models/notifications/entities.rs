use serde::{Deserialize, Serialize};

use crate::models::users::entities::UserRole;

// 通知类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    GradeSubmitted,         // 成绩已提交待审核
    GradeValidated,         // 成绩已审核
    GradeRejected,          // 成绩被驳回
    GradeRevisionRequested, // 成绩被要求修订
    GradeReopened,          // 已审核成绩被重新打开
    BulletinEligible,       // 学生可生成成绩单
    TimetableConflict,      // 课表冲突待复核
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::GradeSubmitted => "grade_submitted",
            NotificationType::GradeValidated => "grade_validated",
            NotificationType::GradeRejected => "grade_rejected",
            NotificationType::GradeRevisionRequested => "grade_revision_requested",
            NotificationType::GradeReopened => "grade_reopened",
            NotificationType::BulletinEligible => "bulletin_eligible",
            NotificationType::TimetableConflict => "timetable_conflict",
        };
        write!(f, "{s}")
    }
}

/// 发给某个角色的通知
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notice {
    pub role: UserRole,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

/// 审计记录
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEntry {
    pub actor_id: i64,
    pub action: String,
    pub target_id: i64,
    pub details: serde_json::Value,
}
