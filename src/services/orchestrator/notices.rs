//! 状态流转对应的通知与审计内容

use serde_json::json;

use crate::models::bulletins::entities::BulletinScope;
use crate::models::grades::{entities::GradeStatus, responses::CommittedTransition};
use crate::models::notifications::entities::{AuditEntry, Notice, NotificationType};
use crate::models::timetable::entities::ScheduledSlot;
use crate::models::users::entities::{Actor, UserRole};

fn grade_metadata(transition: &CommittedTransition) -> serde_json::Value {
    let record = &transition.record;
    json!({
        "grade_id": record.id,
        "student_id": record.student_id,
        "course_id": record.course_id,
        "submitted_by": record.submitted_by,
        "from": transition.from,
        "to": transition.to,
    })
}

fn notice(
    role: UserRole,
    notification_type: NotificationType,
    title: &str,
    message: String,
    metadata: &serde_json::Value,
) -> Notice {
    Notice {
        role,
        notification_type,
        title: title.to_string(),
        message,
        metadata: metadata.clone(),
    }
}

/// 一次流转需要发出的通知
pub fn for_transition(transition: &CommittedTransition) -> Vec<Notice> {
    let record = &transition.record;
    let metadata = grade_metadata(transition);

    match (transition.from, transition.to) {
        (_, GradeStatus::PendingValidation) => vec![notice(
            UserRole::DepartmentHead,
            NotificationType::GradeSubmitted,
            "成绩待审核",
            format!(
                "课程 {} 学生 {} 的成绩已提交，等待审核",
                record.course_id, record.student_id
            ),
            &metadata,
        )],
        (_, GradeStatus::Validated) => vec![notice(
            UserRole::Student,
            NotificationType::GradeValidated,
            "成绩已审核",
            format!("课程 {} 的成绩 {} 已审核通过", record.course_id, record.value),
            &metadata,
        )],
        (_, GradeStatus::Rejected) => vec![notice(
            UserRole::Teacher,
            NotificationType::GradeRejected,
            "成绩被驳回",
            format!(
                "成绩 {} 被驳回: {}",
                record.id,
                record.rejection_comment.as_deref().unwrap_or_default()
            ),
            &metadata,
        )],
        (GradeStatus::PendingValidation, GradeStatus::InRevision) => vec![notice(
            UserRole::Teacher,
            NotificationType::GradeRevisionRequested,
            "成绩需要修订",
            format!(
                "成绩 {} 需要修订: {}",
                record.id,
                record.rejection_comment.as_deref().unwrap_or_default()
            ),
            &metadata,
        )],
        (GradeStatus::Validated, GradeStatus::InRevision) => {
            let message = format!("课程 {} 的已审核成绩 {} 被重新打开", record.course_id, record.id);
            vec![
                notice(
                    UserRole::Teacher,
                    NotificationType::GradeReopened,
                    "成绩被重新打开",
                    message.clone(),
                    &metadata,
                ),
                notice(
                    UserRole::Student,
                    NotificationType::GradeReopened,
                    "成绩被重新打开",
                    message,
                    &metadata,
                ),
            ]
        }
        _ => Vec::new(),
    }
}

/// 学生本学期成绩全部审核完毕
pub fn bulletin_eligible(student_id: i64, scope: &BulletinScope) -> Notice {
    Notice {
        role: UserRole::Director,
        notification_type: NotificationType::BulletinEligible,
        title: "可生成成绩单".to_string(),
        message: format!(
            "学生 {} 在 {} {} 的成绩已全部审核，可以生成成绩单",
            student_id, scope.academic_year, scope.term
        ),
        metadata: json!({
            "student_id": student_id,
            "program_id": scope.program_id,
            "term": scope.term,
            "academic_year": scope.academic_year,
        }),
    }
}

/// 带冲突写入的时段，通知管理员复核
pub fn timetable_conflict(scheduled: &ScheduledSlot) -> Option<Notice> {
    if scheduled.conflicts.is_empty() {
        return None;
    }
    let conflicts: Vec<serde_json::Value> = scheduled
        .conflicts
        .iter()
        .map(|c| json!({ "dimension": c.dimension, "slot_id": c.conflicting_slot.id }))
        .collect();

    Some(Notice {
        role: UserRole::Admin,
        notification_type: NotificationType::TimetableConflict,
        title: "课表冲突待复核".to_string(),
        message: format!(
            "时段 {} 与 {} 个已有时段冲突",
            scheduled.slot.id,
            scheduled.conflicts.len()
        ),
        metadata: json!({ "slot_id": scheduled.slot.id, "conflicts": conflicts }),
    })
}

pub fn audit(actor: Actor, action: &str, target_id: i64, details: serde_json::Value) -> AuditEntry {
    AuditEntry {
        actor_id: actor.id,
        action: action.to_string(),
        target_id,
        details,
    }
}

pub fn transition_audit(actor: Actor, action: &str, transition: &CommittedTransition) -> AuditEntry {
    let mut details = grade_metadata(transition);
    details["actor_role"] = json!(actor.role);
    audit(actor, action, transition.record.id, details)
}
