//! 状态机的公共校验与提交步骤

use chrono::{DateTime, Utc};
use tracing::info;

use super::GradeWorkflowService;
use crate::errors::{GradeFlowError, Result};
use crate::models::grades::{
    entities::{GradeRecord, GradeStatus},
    requests::{GradeTransition, TransitionStamp},
    responses::CommittedTransition,
};
use crate::models::users::entities::{Actor, UserRole};

pub(super) async fn load_record(service: &GradeWorkflowService, grade_id: i64) -> Result<GradeRecord> {
    service
        .get_storage()
        .get_grade_record_by_id(grade_id)
        .await?
        .ok_or_else(|| GradeFlowError::not_found(format!("成绩记录 {grade_id} 不存在")))
}

/// 当前状态必须属于 `from`，且转换表允许到达 `target`
pub(super) fn ensure_transition(
    record: &GradeRecord,
    from: &[GradeStatus],
    target: GradeStatus,
) -> Result<()> {
    if !from.contains(&record.status) || !record.status.can_transition_to(target) {
        return Err(GradeFlowError::state_transition(format!(
            "成绩 {} 当前状态为 {}，不能变为 {}",
            record.id, record.status, target
        )));
    }
    Ok(())
}

/// 审核人角色等级必须严格高于提交人
pub(super) fn ensure_outranks(approver: &Actor, record: &GradeRecord) -> Result<()> {
    if !approver.role.outranks(&record.submitted_by_role) {
        return Err(GradeFlowError::validation(format!(
            "审核人角色 {} 必须高于提交人角色 {}",
            approver.role, record.submitted_by_role
        )));
    }
    Ok(())
}

/// 录入人必须是该课程的任课教师；管理员不受限制
pub(super) async fn ensure_course_authorized(
    service: &GradeWorkflowService,
    actor: &Actor,
    course_id: i64,
) -> Result<()> {
    if actor.role == UserRole::Admin {
        return Ok(());
    }
    if !actor.role.is_teaching_staff() {
        return Err(GradeFlowError::validation(format!(
            "角色 {} 不能录入成绩",
            actor.role
        )));
    }

    let courses = service.get_assignments().authorized_courses(actor.id).await?;
    if !courses.contains(&course_id) {
        return Err(GradeFlowError::validation(format!(
            "用户 {} 未被分配课程 {}",
            actor.id, course_id
        )));
    }
    Ok(())
}

/// 提交人本人，或该课程的任课教师
pub(super) async fn ensure_owner_or_authorized(
    service: &GradeWorkflowService,
    actor: &Actor,
    record: &GradeRecord,
) -> Result<()> {
    if actor.id == record.submitted_by {
        return Ok(());
    }
    ensure_course_authorized(service, actor, record.course_id).await
}

pub(super) fn require_comment(comment: &str, field: &str) -> Result<String> {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err(GradeFlowError::validation(format!("{field}不能为空")));
    }
    Ok(trimmed.to_string())
}

/// 以比较并交换方式写入新状态，并返回流转后的记录
pub(super) async fn commit(
    service: &GradeWorkflowService,
    mut record: GradeRecord,
    target: GradeStatus,
    stamp: TransitionStamp,
) -> Result<CommittedTransition> {
    let from = record.status;

    let applied = service
        .get_storage()
        .transition_grade_record(
            record.id,
            GradeTransition {
                expected: from,
                target,
                stamp: stamp.clone(),
            },
        )
        .await?;

    if !applied {
        return Err(GradeFlowError::state_transition(format!(
            "成绩 {} 已不处于 {} 状态，可能已被并发修改",
            record.id, from
        )));
    }

    apply_stamp(&mut record, target, stamp);
    info!("Grade {} moved {} -> {}", record.id, from, target);

    Ok(CommittedTransition {
        record,
        from,
        to: target,
    })
}

// 与存储层写入的字段保持一致
fn apply_stamp(record: &mut GradeRecord, target: GradeStatus, stamp: TransitionStamp) {
    record.status = target;
    record.updated_at = Utc::now();

    match stamp {
        TransitionStamp::Submitted { at } => {
            record.submitted_at = DateTime::<Utc>::from_timestamp(at, 0);
            record.rejection_comment = None;
        }
        TransitionStamp::Validated { by, at } => {
            record.validated_by = Some(by);
            record.validated_at = DateTime::<Utc>::from_timestamp(at, 0);
        }
        TransitionStamp::Commented { comment } => record.rejection_comment = Some(comment),
        TransitionStamp::Reopened { reason } => {
            record.validated_by = None;
            record.validated_at = None;
            record.rejection_comment = Some(reason);
        }
        TransitionStamp::Revised => {}
        TransitionStamp::Deleted { at } => {
            record.deleted_at = DateTime::<Utc>::from_timestamp(at, 0);
        }
    }
}

pub(super) fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}
