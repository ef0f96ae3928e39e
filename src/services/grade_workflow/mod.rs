//! 成绩审核工作流
//!
//! 状态转换表见 [`crate::models::grades::entities::GradeStatus::allowed_targets`]。每次状态变更都通过存储层的
//! 比较并交换写入，两个并发的审核请求只有一个能成功。

pub mod batch;
pub mod create;
pub mod lifecycle;
pub mod review;
mod rules;
pub mod submit;

use std::sync::Arc;

use crate::errors::Result;
use crate::models::grades::{
    entities::GradeRecord,
    requests::{CreateGradeRecordRequest, ModifyGradeRequest},
    responses::{BatchValidationReport, CommittedTransition},
};
use crate::models::users::entities::Actor;
use crate::services::ports::TeachingAssignments;
use crate::storage::Storage;

pub struct GradeWorkflowService {
    storage: Arc<dyn Storage>,
    assignments: Arc<dyn TeachingAssignments>,
}

impl GradeWorkflowService {
    pub fn new(storage: Arc<dyn Storage>, assignments: Arc<dyn TeachingAssignments>) -> Self {
        Self {
            storage,
            assignments,
        }
    }

    pub(crate) fn get_storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub(crate) fn get_assignments(&self) -> &Arc<dyn TeachingAssignments> {
        &self.assignments
    }

    /// 录入成绩（草稿）
    pub async fn create(&self, actor: Actor, req: CreateGradeRecordRequest) -> Result<GradeRecord> {
        create::create_grade(self, actor, req).await
    }

    /// 录入并提交
    pub async fn create_and_submit(
        &self,
        actor: Actor,
        req: CreateGradeRecordRequest,
    ) -> Result<CommittedTransition> {
        create::create_and_submit(self, actor, req).await
    }

    /// 提交审核
    pub async fn submit(&self, actor: Actor, grade_id: i64) -> Result<CommittedTransition> {
        submit::submit_grade(self, actor, grade_id).await
    }

    /// 修订后重新提交
    pub async fn resubmit(&self, actor: Actor, grade_id: i64) -> Result<CommittedTransition> {
        submit::resubmit_grade(self, actor, grade_id).await
    }

    /// 审核通过
    pub async fn validate(&self, approver: Actor, grade_id: i64) -> Result<CommittedTransition> {
        review::validate_grade(self, approver, grade_id).await
    }

    /// 驳回
    pub async fn reject(
        &self,
        approver: Actor,
        grade_id: i64,
        comment: &str,
    ) -> Result<CommittedTransition> {
        review::reject_grade(self, approver, grade_id, comment).await
    }

    /// 要求修订
    pub async fn request_revision(
        &self,
        approver: Actor,
        grade_id: i64,
        comment: &str,
    ) -> Result<CommittedTransition> {
        review::request_revision(self, approver, grade_id, comment).await
    }

    /// 重新打开已审核成绩
    pub async fn reopen(
        &self,
        approver: Actor,
        grade_id: i64,
        reason: &str,
    ) -> Result<CommittedTransition> {
        review::reopen_grade(self, approver, grade_id, reason).await
    }

    /// 被驳回后进入修订
    pub async fn revise(&self, actor: Actor, grade_id: i64) -> Result<CommittedTransition> {
        lifecycle::revise_grade(self, actor, grade_id).await
    }

    /// 软删除
    pub async fn delete(&self, actor: Actor, grade_id: i64) -> Result<CommittedTransition> {
        lifecycle::delete_grade(self, actor, grade_id).await
    }

    /// 修改分值/权重/评语
    pub async fn modify(
        &self,
        actor: Actor,
        grade_id: i64,
        update: ModifyGradeRequest,
    ) -> Result<GradeRecord> {
        lifecycle::modify_grade(self, actor, grade_id, update).await
    }

    /// 批量审核（非原子）
    pub async fn batch_validate(&self, approver: Actor, grade_ids: &[i64]) -> BatchValidationReport {
        batch::batch_validate(self, approver, grade_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GradeFlowError;
    use crate::models::grades::entities::{EvaluationType, GradeStatus};
    use crate::models::users::entities::UserRole;
    use crate::services::ports::testing::StaticAssignments;
    use crate::storage::sea_orm_storage::test_support::memory_storage;

    const TEACHER: Actor = Actor {
        id: 7,
        role: UserRole::Teacher,
    };
    const OTHER_TEACHER: Actor = Actor {
        id: 8,
        role: UserRole::Teacher,
    };
    const HEAD: Actor = Actor {
        id: 20,
        role: UserRole::DepartmentHead,
    };
    const DIRECTOR: Actor = Actor {
        id: 30,
        role: UserRole::Director,
    };

    async fn service() -> GradeWorkflowService {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let assignments = StaticAssignments::default().with(TEACHER.id, 10);
        GradeWorkflowService::new(storage, Arc::new(assignments))
    }

    fn request(value: f64, weight: f64) -> CreateGradeRecordRequest {
        CreateGradeRecordRequest {
            student_id: 100,
            course_id: 10,
            evaluation_type: EvaluationType::Final,
            value,
            weight,
            term: "S1".into(),
            academic_year: "2025-2026".into(),
            comment: None,
        }
    }

    async fn pending(service: &GradeWorkflowService) -> i64 {
        service
            .create_and_submit(TEACHER, request(14.0, 2.0))
            .await
            .unwrap()
            .record
            .id
    }

    #[tokio::test]
    async fn test_submit_validate_and_double_validate() {
        let service = service().await;

        let err = service
            .create_and_submit(TEACHER, request(21.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeFlowError::Validation(_)));

        let submitted = service
            .create_and_submit(TEACHER, request(14.0, 2.0))
            .await
            .unwrap();
        assert_eq!(submitted.from, GradeStatus::Draft);
        assert_eq!(submitted.to, GradeStatus::PendingValidation);
        assert!(submitted.record.submitted_at.is_some());

        let validated = service
            .validate(DIRECTOR, submitted.record.id)
            .await
            .unwrap();
        assert_eq!(validated.record.status, GradeStatus::Validated);
        assert_eq!(validated.record.validated_by, Some(DIRECTOR.id));

        let err = service
            .validate(DIRECTOR, submitted.record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, GradeFlowError::StateTransition(_)));

        let stored = service
            .get_storage()
            .get_grade_record_by_id(submitted.record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, GradeStatus::Validated);
        assert_eq!(stored.validated_by, Some(DIRECTOR.id));
    }

    #[tokio::test]
    async fn test_submit_requires_course_assignment() {
        let service = service().await;
        let err = service
            .create_and_submit(OTHER_TEACHER, request(12.0, 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "G001");

        let student = Actor::new(100, UserRole::Student);
        assert!(service.create(student, request(12.0, 1.0)).await.is_err());

        // 管理员不受任课限制
        let admin = Actor::new(1, UserRole::Admin);
        assert!(service.create(admin, request(12.0, 1.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_requires_higher_role() {
        let service = service().await;
        let grade_id = pending(&service).await;

        let err = service.validate(OTHER_TEACHER, grade_id).await.unwrap_err();
        assert!(matches!(err, GradeFlowError::Validation(_)));

        // 同级不能审核，上级可以
        assert!(service.validate(HEAD, grade_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_revise_resubmit_cycle() {
        let service = service().await;
        let grade_id = pending(&service).await;

        let err = service.reject(HEAD, grade_id, "   ").await.unwrap_err();
        assert_eq!(err.code(), "G001");

        let rejected = service
            .reject(HEAD, grade_id, "wrong weighting")
            .await
            .unwrap();
        assert_eq!(rejected.to, GradeStatus::Rejected);
        assert_eq!(
            rejected.record.rejection_comment.as_deref(),
            Some("wrong weighting")
        );

        let revised = service.revise(TEACHER, grade_id).await.unwrap();
        assert_eq!(revised.to, GradeStatus::InRevision);

        let modified = service
            .modify(
                TEACHER,
                grade_id,
                ModifyGradeRequest {
                    value: 15.0,
                    weight: 1.0,
                    comment: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(modified.value, 15.0);

        let resubmitted = service.resubmit(TEACHER, grade_id).await.unwrap();
        assert_eq!(resubmitted.from, GradeStatus::InRevision);
        assert_eq!(resubmitted.to, GradeStatus::PendingValidation);
        assert!(resubmitted.record.rejection_comment.is_none());

        // submit 只接受草稿
        let err = service.submit(TEACHER, grade_id).await.unwrap_err();
        assert!(matches!(err, GradeFlowError::StateTransition(_)));
    }

    #[tokio::test]
    async fn test_request_revision_and_reopen() {
        let service = service().await;
        let grade_id = pending(&service).await;

        let revision = service
            .request_revision(DIRECTOR, grade_id, "missing practical")
            .await
            .unwrap();
        assert_eq!(revision.to, GradeStatus::InRevision);

        service.resubmit(TEACHER, grade_id).await.unwrap();
        service.validate(DIRECTOR, grade_id).await.unwrap();

        let err = service
            .reopen(TEACHER, grade_id, "typo")
            .await
            .unwrap_err();
        assert!(matches!(err, GradeFlowError::Validation(_)));

        let reopened = service
            .reopen(DIRECTOR, grade_id, "typo in score")
            .await
            .unwrap();
        assert_eq!(reopened.from, GradeStatus::Validated);
        assert_eq!(reopened.to, GradeStatus::InRevision);
        assert!(reopened.record.validated_by.is_none());
        assert!(reopened.record.validated_at.is_none());
    }

    #[tokio::test]
    async fn test_modify_is_refused_outside_editable_states() {
        let service = service().await;
        let draft = service.create(TEACHER, request(10.0, 1.0)).await.unwrap();
        let update = ModifyGradeRequest {
            value: 11.0,
            weight: 1.0,
            comment: None,
        };

        let err = service
            .modify(TEACHER, draft.id, update.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, GradeFlowError::StateTransition(_)));

        let grade_id = pending(&service).await;
        service.validate(DIRECTOR, grade_id).await.unwrap();
        let err = service.modify(TEACHER, grade_id, update).await.unwrap_err();
        assert!(matches!(err, GradeFlowError::StateTransition(_)));
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let service = service().await;
        let draft = service.create(TEACHER, request(10.0, 1.0)).await.unwrap();

        let deleted = service.delete(TEACHER, draft.id).await.unwrap();
        assert_eq!(deleted.to, GradeStatus::Deleted);
        assert!(deleted.record.deleted_at.is_some());

        // 已删除为终态
        assert!(service.delete(TEACHER, draft.id).await.is_err());

        let grade_id = pending(&service).await;
        service.validate(DIRECTOR, grade_id).await.unwrap();
        let err = service.delete(TEACHER, grade_id).await.unwrap_err();
        assert!(matches!(err, GradeFlowError::StateTransition(_)));

        let err = service.validate(DIRECTOR, 9999).await.unwrap_err();
        assert!(matches!(err, GradeFlowError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_batch_validate_is_not_atomic() {
        let service = service().await;
        let id1 = pending(&service).await;
        let id2 = pending(&service).await;
        let id3 = pending(&service).await;
        service.validate(DIRECTOR, id2).await.unwrap();

        let report = service.batch_validate(DIRECTOR, &[id1, id2, id3]).await;
        assert_eq!(report.counts(), (2, 1));
        assert_eq!(report.validated, vec![id1, id3]);
        assert_eq!(report.failures[0].grade_id, id2);
        assert!(matches!(
            report.failures[0].error,
            GradeFlowError::StateTransition(_)
        ));

        for id in [id1, id3] {
            let stored = service
                .get_storage()
                .get_grade_record_by_id(id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.status, GradeStatus::Validated);
        }
    }

    #[tokio::test]
    async fn test_concurrent_validation_has_one_winner() {
        let service = service().await;
        let grade_id = pending(&service).await;

        let (a, b) = tokio::join!(
            service.validate(DIRECTOR, grade_id),
            service.validate(HEAD, grade_id)
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(GradeFlowError::StateTransition(_))));
    }
}
