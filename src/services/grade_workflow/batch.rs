use tracing::{debug, info};

use super::GradeWorkflowService;
use super::review::validate_grade;
use crate::models::grades::responses::BatchValidationReport;
use crate::models::users::entities::Actor;

/// 逐条审核，单条失败不影响其他记录
pub async fn batch_validate(
    service: &GradeWorkflowService,
    approver: Actor,
    grade_ids: &[i64],
) -> BatchValidationReport {
    let mut report = BatchValidationReport::default();

    for &grade_id in grade_ids {
        match validate_grade(service, approver, grade_id).await {
            Ok(transition) => report.record_success(transition),
            Err(e) => {
                debug!("Batch validation of grade {} failed: {}", grade_id, e);
                report.record_failure(grade_id, e);
            }
        }
    }

    info!(
        "Batch validation by user {}: {} succeeded, {} failed",
        approver.id, report.success_count, report.failure_count
    );

    report
}
