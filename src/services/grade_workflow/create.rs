use tracing::debug;

use super::GradeWorkflowService;
use super::rules::ensure_course_authorized;
use crate::errors::{GradeFlowError, Result};
use crate::models::grades::{
    entities::GradeRecord,
    requests::{CreateGradeRecordRequest, check_score},
    responses::CommittedTransition,
};
use crate::models::users::entities::Actor;

pub async fn create_grade(
    service: &GradeWorkflowService,
    actor: Actor,
    req: CreateGradeRecordRequest,
) -> Result<GradeRecord> {
    check_score(req.value, req.weight)?;
    if req.term.trim().is_empty() || req.academic_year.trim().is_empty() {
        return Err(GradeFlowError::validation("学期和学年不能为空"));
    }

    ensure_course_authorized(service, &actor, req.course_id).await?;

    let record = service
        .get_storage()
        .create_grade_record(actor.id, actor.role, req)
        .await?;

    debug!(
        "Grade {} drafted for student {} in course {}",
        record.id, record.student_id, record.course_id
    );

    Ok(record)
}

/// 创建草稿后立即提交，仍然经过完整的状态机
pub async fn create_and_submit(
    service: &GradeWorkflowService,
    actor: Actor,
    req: CreateGradeRecordRequest,
) -> Result<CommittedTransition> {
    let record = create_grade(service, actor, req).await?;
    super::submit::submit_grade(service, actor, record.id).await
}
