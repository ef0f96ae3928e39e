use chrono::Utc;
use tracing::debug;

use super::GradeWorkflowService;
use super::rules::{
    commit, ensure_owner_or_authorized, ensure_transition, load_record, now_timestamp,
};
use crate::errors::{GradeFlowError, Result};
use crate::models::grades::{
    entities::{GradeRecord, GradeStatus},
    requests::{ModifyGradeRequest, TransitionStamp, check_score},
    responses::CommittedTransition,
};
use crate::models::users::entities::Actor;

/// 被驳回 -> 修订中
pub async fn revise_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
) -> Result<CommittedTransition> {
    let record = load_record(service, grade_id).await?;

    ensure_transition(&record, &[GradeStatus::Rejected], GradeStatus::InRevision)?;
    ensure_owner_or_authorized(service, &actor, &record).await?;

    commit(
        service,
        record,
        GradeStatus::InRevision,
        TransitionStamp::Revised,
    )
    .await
}

/// 软删除：记录保留，状态变为 deleted
pub async fn delete_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
) -> Result<CommittedTransition> {
    let record = load_record(service, grade_id).await?;

    ensure_transition(
        &record,
        &[
            GradeStatus::Draft,
            GradeStatus::InRevision,
            GradeStatus::Rejected,
        ],
        GradeStatus::Deleted,
    )?;
    ensure_owner_or_authorized(service, &actor, &record).await?;

    commit(
        service,
        record,
        GradeStatus::Deleted,
        TransitionStamp::Deleted {
            at: now_timestamp(),
        },
    )
    .await
}

/// 修改分值、权重与评语，仅限待审核或修订中
pub async fn modify_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
    update: ModifyGradeRequest,
) -> Result<GradeRecord> {
    check_score(update.value, update.weight)?;
    let mut record = load_record(service, grade_id).await?;

    if !record.status.is_editable() {
        return Err(GradeFlowError::state_transition(format!(
            "成绩 {} 当前状态为 {}，不可修改",
            record.id, record.status
        )));
    }
    // 审核人也可以在审核前直接修正
    if !actor.role.outranks(&record.submitted_by_role) {
        ensure_owner_or_authorized(service, &actor, &record).await?;
    }

    let applied = service
        .get_storage()
        .modify_grade_record(grade_id, GradeStatus::editable_statuses(), update.clone())
        .await?;
    if !applied {
        return Err(GradeFlowError::state_transition(format!(
            "成绩 {grade_id} 已不可修改，可能已被并发审核"
        )));
    }

    record.value = update.value;
    record.weight = update.weight;
    record.comment = update.comment;
    record.updated_at = Utc::now();

    debug!("Grade {} modified by user {}", grade_id, actor.id);
    Ok(record)
}
