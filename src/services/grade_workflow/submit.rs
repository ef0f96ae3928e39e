use super::GradeWorkflowService;
use super::rules::{commit, ensure_course_authorized, ensure_transition, load_record, now_timestamp};
use crate::errors::Result;
use crate::models::grades::{
    entities::GradeStatus,
    requests::{TransitionStamp, check_score},
    responses::CommittedTransition,
};
use crate::models::users::entities::Actor;

async fn submit_from(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
    from: GradeStatus,
) -> Result<CommittedTransition> {
    let record = load_record(service, grade_id).await?;

    check_score(record.value, record.weight)?;
    ensure_transition(&record, &[from], GradeStatus::PendingValidation)?;
    ensure_course_authorized(service, &actor, record.course_id).await?;

    commit(
        service,
        record,
        GradeStatus::PendingValidation,
        TransitionStamp::Submitted {
            at: now_timestamp(),
        },
    )
    .await
}

/// 草稿 -> 待审核
pub async fn submit_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
) -> Result<CommittedTransition> {
    submit_from(service, actor, grade_id, GradeStatus::Draft).await
}

/// 修订中 -> 待审核
pub async fn resubmit_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    grade_id: i64,
) -> Result<CommittedTransition> {
    submit_from(service, actor, grade_id, GradeStatus::InRevision).await
}
