use serde_json::json;

use super::{WorkflowOrchestrator, notices};
use crate::errors::{GradeFlowError, Result};
use crate::models::bulletins::entities::{Bulletin, BulletinScope};
use crate::models::users::entities::Actor;

impl WorkflowOrchestrator {
    /// 学生平均分
    pub async fn average(&self, student_id: i64, scope: &BulletinScope) -> Result<Option<f64>> {
        self.bulletins.average(student_id, scope).await
    }

    /// 学生名次
    pub async fn rank(&self, student_id: i64, scope: &BulletinScope) -> Result<Option<u32>> {
        self.bulletins.rank(student_id, scope).await
    }

    /// 重新生成整个队列的成绩单
    pub async fn refresh_cohort(&self, actor: Actor, scope: &BulletinScope) -> Result<Vec<Bulletin>> {
        let bulletins = self.bulletins.refresh_cohort(scope, actor.id).await?;
        self.dispatcher
            .audit(notices::audit(
                actor,
                "bulletin.refresh",
                scope.program_id,
                json!({
                    "term": scope.term,
                    "academic_year": scope.academic_year,
                    "cohort_size": bulletins.len(),
                }),
            ))
            .await;
        Ok(bulletins)
    }

    /// 交给外部渲染器生成成绩单文档
    ///
    /// 只渲染已生成且具备资格的成绩单，成绩列表为该学生在范围内的已审核成绩。
    pub async fn render_bulletin(
        &self,
        actor: Actor,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Vec<u8>> {
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| GradeFlowError::configuration("未配置成绩单渲染器"))?;

        let bulletin = self
            .bulletins
            .get_bulletin(student_id, scope)
            .await?
            .ok_or_else(|| {
                GradeFlowError::not_found(format!(
                    "学生 {student_id} 在专业 {} {} {} 没有成绩单",
                    scope.program_id, scope.term, scope.academic_year
                ))
            })?;
        if !bulletin.eligible {
            return Err(GradeFlowError::validation(format!(
                "学生 {student_id} 仍有未审核的成绩，不能生成成绩单"
            )));
        }

        let grades = self.bulletins.validated_grades(student_id, scope).await?;
        let document = renderer.render_bulletin(&bulletin, &grades).await?;

        self.dispatcher
            .audit(notices::audit(
                actor,
                "bulletin.render",
                bulletin.id,
                json!({
                    "student_id": student_id,
                    "program_id": scope.program_id,
                    "bytes": document.len(),
                }),
            ))
            .await;
        Ok(document)
    }
}
