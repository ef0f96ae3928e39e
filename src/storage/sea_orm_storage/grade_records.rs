//! 成绩记录存储操作

use super::SeaOrmStorage;
use crate::entity::grade_records::{ActiveModel, Column};
use crate::entity::prelude::GradeRecords;
use crate::errors::{GradeFlowError, Result};
use crate::models::{
    grades::{
        entities::{GradeRecord, GradeStatus},
        requests::{
            CreateGradeRecordRequest, GradeTransition, ModifyGradeRequest, TransitionStamp,
            check_score,
        },
    },
    users::entities::UserRole,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建成绩记录，初始状态为草稿
    pub async fn create_grade_record_impl(
        &self,
        submitted_by: i64,
        submitted_by_role: UserRole,
        req: CreateGradeRecordRequest,
    ) -> Result<GradeRecord> {
        check_score(req.value, req.weight)?;

        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            student_id: Set(req.student_id),
            course_id: Set(req.course_id),
            evaluation_type: Set(req.evaluation_type.to_string()),
            score: Set(req.value),
            weight: Set(req.weight),
            status: Set(GradeStatus::Draft.to_string()),
            term: Set(req.term),
            academic_year: Set(req.academic_year),
            submitted_by: Set(submitted_by),
            submitted_by_role: Set(submitted_by_role.to_string()),
            validated_by: Set(None),
            comment: Set(req.comment),
            rejection_comment: Set(None),
            submitted_at: Set(None),
            validated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("创建成绩记录失败: {e}")))?;

        result.into_grade_record()
    }

    /// 通过 ID 获取成绩记录
    pub async fn get_grade_record_by_id_impl(&self, id: i64) -> Result<Option<GradeRecord>> {
        let result = GradeRecords::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询成绩记录失败: {e}")))?;

        result.map(|m| m.into_grade_record()).transpose()
    }

    /// 比较并交换状态
    ///
    /// `UPDATE grade_records SET status = <target> ... WHERE id = ? AND status = <expected>`，
    /// 影响行数为 0 说明记录已被并发修改（或不存在）。
    pub async fn transition_grade_record_impl(
        &self,
        id: i64,
        transition: GradeTransition,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let mut update = GradeRecords::update_many()
            .col_expr(Column::Status, Expr::value(transition.target.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(transition.expected.as_str()));

        update = match transition.stamp {
            TransitionStamp::Submitted { at } => update
                .col_expr(Column::SubmittedAt, Expr::value(at))
                .col_expr(Column::RejectionComment, Expr::value(Option::<String>::None)),
            TransitionStamp::Validated { by, at } => update
                .col_expr(Column::ValidatedBy, Expr::value(by))
                .col_expr(Column::ValidatedAt, Expr::value(at)),
            TransitionStamp::Commented { comment } => {
                update.col_expr(Column::RejectionComment, Expr::value(comment))
            }
            TransitionStamp::Reopened { reason } => update
                .col_expr(Column::ValidatedBy, Expr::value(Option::<i64>::None))
                .col_expr(Column::ValidatedAt, Expr::value(Option::<i64>::None))
                .col_expr(Column::RejectionComment, Expr::value(reason)),
            TransitionStamp::Revised => update,
            TransitionStamp::Deleted { at } => update.col_expr(Column::DeletedAt, Expr::value(at)),
        };

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("更新成绩状态失败: {e}")))?;

        Ok(result.rows_affected == 1)
    }

    /// 修改分值/权重/评语（状态限定在 editable 内，同样是比较并交换）
    pub async fn modify_grade_record_impl(
        &self,
        id: i64,
        editable: &[GradeStatus],
        update: ModifyGradeRequest,
    ) -> Result<bool> {
        check_score(update.value, update.weight)?;

        let now = chrono::Utc::now().timestamp();

        let result = GradeRecords::update_many()
            .col_expr(Column::Score, Expr::value(update.value))
            .col_expr(Column::Weight, Expr::value(update.weight))
            .col_expr(Column::Comment, Expr::value(update.comment))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(editable.iter().map(|s| s.as_str())))
            .exec(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("修改成绩失败: {e}")))?;

        Ok(result.rows_affected == 1)
    }

    /// 列出未删除的成绩记录，student_id 为空时列出范围内所有学生
    pub async fn list_grade_records_impl(
        &self,
        student_id: Option<i64>,
        term: &str,
        academic_year: &str,
        course_ids: &[i64],
    ) -> Result<Vec<GradeRecord>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = GradeRecords::find()
            .filter(Column::Term.eq(term))
            .filter(Column::AcademicYear.eq(academic_year))
            .filter(Column::CourseId.is_in(course_ids.iter().copied()))
            .filter(Column::Status.ne(GradeStatus::Deleted.as_str()));

        // 学生筛选
        if let Some(student_id) = student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }

        let records = select
            .order_by_asc(Column::StudentId)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询成绩列表失败: {e}")))?;

        records.into_iter().map(|m| m.into_grade_record()).collect()
    }
}
