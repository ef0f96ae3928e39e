//! 审核类操作：通过、驳回、要求修订、重新打开
//!
//! 四者都要求操作人角色严格高于提交人。

use super::GradeWorkflowService;
use super::rules::{
    commit, ensure_outranks, ensure_transition, load_record, now_timestamp, require_comment,
};
use crate::errors::Result;
use crate::models::grades::{
    entities::GradeStatus, requests::TransitionStamp, responses::CommittedTransition,
};
use crate::models::users::entities::Actor;

pub async fn validate_grade(
    service: &GradeWorkflowService,
    approver: Actor,
    grade_id: i64,
) -> Result<CommittedTransition> {
    let record = load_record(service, grade_id).await?;

    // 先检查状态，重复审核报告为状态错误
    ensure_transition(
        &record,
        &[GradeStatus::PendingValidation],
        GradeStatus::Validated,
    )?;
    ensure_outranks(&approver, &record)?;

    commit(
        service,
        record,
        GradeStatus::Validated,
        TransitionStamp::Validated {
            by: approver.id,
            at: now_timestamp(),
        },
    )
    .await
}

pub async fn reject_grade(
    service: &GradeWorkflowService,
    approver: Actor,
    grade_id: i64,
    comment: &str,
) -> Result<CommittedTransition> {
    let comment = require_comment(comment, "驳回说明")?;
    let record = load_record(service, grade_id).await?;

    ensure_transition(
        &record,
        &[GradeStatus::PendingValidation],
        GradeStatus::Rejected,
    )?;
    ensure_outranks(&approver, &record)?;

    commit(
        service,
        record,
        GradeStatus::Rejected,
        TransitionStamp::Commented { comment },
    )
    .await
}

pub async fn request_revision(
    service: &GradeWorkflowService,
    approver: Actor,
    grade_id: i64,
    comment: &str,
) -> Result<CommittedTransition> {
    let comment = require_comment(comment, "修订说明")?;
    let record = load_record(service, grade_id).await?;

    ensure_transition(
        &record,
        &[GradeStatus::PendingValidation],
        GradeStatus::InRevision,
    )?;
    ensure_outranks(&approver, &record)?;

    commit(
        service,
        record,
        GradeStatus::InRevision,
        TransitionStamp::Commented { comment },
    )
    .await
}

/// 已审核 -> 修订中，清空审核信息
pub async fn reopen_grade(
    service: &GradeWorkflowService,
    approver: Actor,
    grade_id: i64,
    reason: &str,
) -> Result<CommittedTransition> {
    let reason = require_comment(reason, "重新打开原因")?;
    let record = load_record(service, grade_id).await?;

    ensure_transition(&record, &[GradeStatus::Validated], GradeStatus::InRevision)?;
    ensure_outranks(&approver, &record)?;

    commit(
        service,
        record,
        GradeStatus::InRevision,
        TransitionStamp::Reopened { reason },
    )
    .await
}
