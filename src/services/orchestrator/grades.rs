use serde_json::json;
use tracing::debug;

use super::{TransitionOutcome, WorkflowOrchestrator, notices};
use crate::errors::Result;
use crate::models::grades::{
    entities::GradeRecord,
    requests::{CreateGradeRecordRequest, ModifyGradeRequest},
    responses::BatchValidationReport,
};
use crate::models::users::entities::Actor;

impl WorkflowOrchestrator {
    /// 录入成绩（草稿）
    pub async fn create_grade(
        &self,
        actor: Actor,
        req: CreateGradeRecordRequest,
    ) -> Result<GradeRecord> {
        let record = self.workflow.create(actor, req).await?;
        self.dispatcher
            .audit(notices::audit(
                actor,
                "grade.create",
                record.id,
                json!({
                    "student_id": record.student_id,
                    "course_id": record.course_id,
                    "value": record.value,
                    "weight": record.weight,
                }),
            ))
            .await;
        Ok(record)
    }

    /// 录入并提交审核
    pub async fn create_and_submit(
        &self,
        actor: Actor,
        req: CreateGradeRecordRequest,
    ) -> Result<TransitionOutcome> {
        let transition = self.workflow.create_and_submit(actor, req).await?;
        Ok(self.after_commit(actor, "grade.submit", transition).await)
    }

    pub async fn submit(&self, actor: Actor, grade_id: i64) -> Result<TransitionOutcome> {
        let transition = self.workflow.submit(actor, grade_id).await?;
        Ok(self.after_commit(actor, "grade.submit", transition).await)
    }

    pub async fn resubmit(&self, actor: Actor, grade_id: i64) -> Result<TransitionOutcome> {
        let transition = self.workflow.resubmit(actor, grade_id).await?;
        Ok(self.after_commit(actor, "grade.resubmit", transition).await)
    }

    pub async fn validate(&self, approver: Actor, grade_id: i64) -> Result<TransitionOutcome> {
        let transition = self.workflow.validate(approver, grade_id).await?;
        Ok(self.after_commit(approver, "grade.validate", transition).await)
    }

    pub async fn reject(
        &self,
        approver: Actor,
        grade_id: i64,
        comment: &str,
    ) -> Result<TransitionOutcome> {
        let transition = self.workflow.reject(approver, grade_id, comment).await?;
        Ok(self.after_commit(approver, "grade.reject", transition).await)
    }

    pub async fn request_revision(
        &self,
        approver: Actor,
        grade_id: i64,
        comment: &str,
    ) -> Result<TransitionOutcome> {
        let transition = self
            .workflow
            .request_revision(approver, grade_id, comment)
            .await?;
        Ok(self
            .after_commit(approver, "grade.request_revision", transition)
            .await)
    }

    pub async fn reopen(
        &self,
        approver: Actor,
        grade_id: i64,
        reason: &str,
    ) -> Result<TransitionOutcome> {
        let transition = self.workflow.reopen(approver, grade_id, reason).await?;
        Ok(self.after_commit(approver, "grade.reopen", transition).await)
    }

    pub async fn revise(&self, actor: Actor, grade_id: i64) -> Result<TransitionOutcome> {
        let transition = self.workflow.revise(actor, grade_id).await?;
        Ok(self.after_commit(actor, "grade.revise", transition).await)
    }

    pub async fn delete(&self, actor: Actor, grade_id: i64) -> Result<TransitionOutcome> {
        let transition = self.workflow.delete(actor, grade_id).await?;
        Ok(self.after_commit(actor, "grade.delete", transition).await)
    }

    /// 修改分值/权重/评语，不改变状态
    pub async fn modify(
        &self,
        actor: Actor,
        grade_id: i64,
        update: ModifyGradeRequest,
    ) -> Result<GradeRecord> {
        let record = self.workflow.modify(actor, grade_id, update).await?;
        self.dispatcher
            .audit(notices::audit(
                actor,
                "grade.modify",
                record.id,
                json!({
                    "value": record.value,
                    "weight": record.weight,
                    "status": record.status,
                }),
            ))
            .await;
        Ok(record)
    }

    /// 批量审核，每条成功的记录单独执行后续步骤
    pub async fn batch_validate(
        &self,
        approver: Actor,
        grade_ids: &[i64],
    ) -> BatchValidationReport {
        let report = self.workflow.batch_validate(approver, grade_ids).await;

        for transition in report.committed.iter().cloned() {
            let outcome = self
                .after_commit(approver, "grade.validate", transition)
                .await;
            debug!(
                "Batch item {} post-commit: {:?}",
                outcome.transition.record.id, outcome.aggregates
            );
        }

        report
    }
}
