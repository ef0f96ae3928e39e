//! 成绩单：平均分、名次与生成资格
//!
//! 专业的课程集合取自课表，队列为范围内至少有一条已审核成绩的学生。

pub mod calculator;

pub use calculator::{build_standings, competition_rank, weighted_average};

use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::models::bulletins::entities::{Bulletin, BulletinScope, StudentStanding};
use crate::models::grades::entities::GradeRecord;
use crate::storage::Storage;

pub struct BulletinService {
    storage: Arc<dyn Storage>,
}

impl BulletinService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn course_set(&self, scope: &BulletinScope) -> Result<Vec<i64>> {
        self.storage
            .list_program_course_ids(scope.program_id, &scope.academic_year)
            .await
    }

    async fn student_records(
        &self,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Vec<GradeRecord>> {
        let courses = self.course_set(scope).await?;
        self.storage
            .list_student_grade_records(student_id, &scope.term, &scope.academic_year, &courses)
            .await
    }

    /// 成绩影响的所有成绩单范围；一门课可由多个专业共同开设，
    /// 课程不在任何专业课表中时为空
    pub async fn scopes_for_record(&self, record: &GradeRecord) -> Result<Vec<BulletinScope>> {
        let programs = self
            .storage
            .list_programs_for_course(record.course_id, &record.academic_year)
            .await?;

        Ok(programs
            .into_iter()
            .map(|program_id| {
                BulletinScope::new(program_id, record.term.clone(), record.academic_year.clone())
            })
            .collect())
    }

    /// 学生在范围内已审核的成绩，即成绩单上列出的成绩
    pub async fn validated_grades(
        &self,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Vec<GradeRecord>> {
        let mut records = self.student_records(student_id, scope).await?;
        records.retain(|r| r.is_validated());
        Ok(records)
    }

    /// 学生在范围内的加权平均分
    pub async fn average(&self, student_id: i64, scope: &BulletinScope) -> Result<Option<f64>> {
        let records = self.student_records(student_id, scope).await?;
        Ok(weighted_average(&records))
    }

    /// 队列中每个学生的计算结果
    pub async fn standings(&self, scope: &BulletinScope) -> Result<Vec<StudentStanding>> {
        let courses = self.course_set(scope).await?;
        let records = self
            .storage
            .list_scope_grade_records(&scope.term, &scope.academic_year, &courses)
            .await?;
        Ok(build_standings(&records))
    }

    /// 学生在队列中的名次；没有已审核成绩时为 None
    pub async fn rank(&self, student_id: i64, scope: &BulletinScope) -> Result<Option<u32>> {
        let standings = self.standings(scope).await?;
        Ok(standings
            .into_iter()
            .find(|s| s.student_id == student_id)
            .and_then(|s| s.rank))
    }

    /// 范围内所有未删除成绩均已审核
    pub async fn is_eligible(&self, student_id: i64, scope: &BulletinScope) -> Result<bool> {
        let records = self.student_records(student_id, scope).await?;
        Ok(!records.is_empty() && records.iter().all(|r| r.is_validated()))
    }

    /// 重新计算并覆盖整个队列的成绩单
    pub async fn refresh_cohort(
        &self,
        scope: &BulletinScope,
        generated_by: i64,
    ) -> Result<Vec<Bulletin>> {
        let standings = self.standings(scope).await?;
        debug!(
            "Refreshing {} bulletin(s) for program {} {} {}",
            standings.len(),
            scope.program_id,
            scope.term,
            scope.academic_year
        );
        self.storage
            .replace_cohort_bulletins(scope, generated_by, standings)
            .await
    }

    pub async fn get_bulletin(
        &self,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Option<Bulletin>> {
        self.storage.get_bulletin(student_id, scope).await
    }

    pub async fn list_bulletins(&self, scope: &BulletinScope) -> Result<Vec<Bulletin>> {
        self.storage.list_bulletins(scope).await
    }
}
