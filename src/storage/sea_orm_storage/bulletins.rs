//! 成绩单存储操作

use super::SeaOrmStorage;
use crate::entity::bulletins::{ActiveModel, Column};
use crate::entity::prelude::Bulletins;
use crate::errors::{GradeFlowError, Result};
use crate::models::bulletins::entities::{Bulletin, BulletinScope, StudentStanding};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    async fn list_bulletins_in<C: ConnectionTrait>(
        db: &C,
        scope: &BulletinScope,
    ) -> Result<Vec<Bulletin>> {
        let models = Bulletins::find()
            .filter(Column::ProgramId.eq(scope.program_id))
            .filter(Column::Term.eq(scope.term.as_str()))
            .filter(Column::AcademicYear.eq(scope.academic_year.as_str()))
            .order_by_asc(Column::Rank)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询成绩单失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_bulletin()).collect())
    }

    /// 覆盖整个队列的成绩单
    ///
    /// 排名依赖整个队列，因此一次事务内写入全部学生，
    /// 不在 standings 中的学生（已无已审核成绩）的成绩单被删除。
    pub async fn replace_cohort_bulletins_impl(
        &self,
        scope: &BulletinScope,
        generated_by: i64,
        standings: Vec<StudentStanding>,
    ) -> Result<Vec<Bulletin>> {
        let now = chrono::Utc::now().timestamp();
        let cohort_size = standings.iter().filter(|s| s.rank.is_some()).count() as i32;
        let student_ids: Vec<i64> = standings.iter().map(|s| s.student_id).collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("开启事务失败: {e}")))?;

        for standing in standings {
            let existing = Bulletins::find()
                .filter(Column::StudentId.eq(standing.student_id))
                .filter(Column::ProgramId.eq(scope.program_id))
                .filter(Column::Term.eq(scope.term.as_str()))
                .filter(Column::AcademicYear.eq(scope.academic_year.as_str()))
                .one(&txn)
                .await
                .map_err(|e| GradeFlowError::database_operation(format!("查询成绩单失败: {e}")))?;

            let rank = standing.rank.map(|r| r as i32);

            match existing {
                Some(model) => {
                    let mut active: ActiveModel = model.into();
                    active.average = Set(standing.average);
                    active.rank = Set(rank);
                    active.cohort_size = Set(cohort_size);
                    active.eligible = Set(standing.eligible);
                    active.generated_by = Set(generated_by);
                    active.generated_at = Set(now);
                    active.update(&txn).await.map_err(|e| {
                        GradeFlowError::database_operation(format!("更新成绩单失败: {e}"))
                    })?;
                }
                None => {
                    let active = ActiveModel {
                        student_id: Set(standing.student_id),
                        program_id: Set(scope.program_id),
                        term: Set(scope.term.clone()),
                        academic_year: Set(scope.academic_year.clone()),
                        average: Set(standing.average),
                        rank: Set(rank),
                        cohort_size: Set(cohort_size),
                        eligible: Set(standing.eligible),
                        generated_by: Set(generated_by),
                        generated_at: Set(now),
                        ..Default::default()
                    };
                    active.insert(&txn).await.map_err(|e| {
                        GradeFlowError::database_operation(format!("创建成绩单失败: {e}"))
                    })?;
                }
            }
        }

        // 删除队列外的旧成绩单
        Bulletins::delete_many()
            .filter(Column::ProgramId.eq(scope.program_id))
            .filter(Column::Term.eq(scope.term.as_str()))
            .filter(Column::AcademicYear.eq(scope.academic_year.as_str()))
            .filter(Column::StudentId.is_not_in(student_ids))
            .exec(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("删除过期成绩单失败: {e}")))?;

        let bulletins = Self::list_bulletins_in(&txn, scope).await?;

        txn.commit()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(bulletins)
    }

    /// 获取学生在指定范围内的成绩单
    pub async fn get_bulletin_impl(
        &self,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Option<Bulletin>> {
        let result = Bulletins::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::ProgramId.eq(scope.program_id))
            .filter(Column::Term.eq(scope.term.as_str()))
            .filter(Column::AcademicYear.eq(scope.academic_year.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询成绩单失败: {e}")))?;

        Ok(result.map(|m| m.into_bulletin()))
    }

    /// 列出范围内所有成绩单，按名次排序
    pub async fn list_bulletins_impl(&self, scope: &BulletinScope) -> Result<Vec<Bulletin>> {
        Self::list_bulletins_in(&self.db, scope).await
    }
}
