//! 成绩记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grade_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub evaluation_type: String,
    pub score: f64,
    pub weight: f64,
    pub status: String,
    pub term: String,
    pub academic_year: String,
    pub submitted_by: i64,
    pub submitted_by_role: String,
    pub validated_by: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_comment: Option<String>,
    pub submitted_at: Option<i64>,
    pub validated_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    /// 状态/角色等枚举列无法解析时视为数据损坏，不做静默回退
    pub fn into_grade_record(
        self,
    ) -> crate::errors::Result<crate::models::grades::entities::GradeRecord> {
        use crate::errors::GradeFlowError;
        use crate::models::grades::entities::{EvaluationType, GradeRecord, GradeStatus};
        use crate::models::users::entities::UserRole;
        use chrono::{DateTime, Utc};

        let corrupt = |field: &str, e: String| {
            GradeFlowError::database_operation(format!(
                "成绩记录 {} 的 {field} 字段无法解析: {e}",
                self.id
            ))
        };

        let status = self
            .status
            .parse::<GradeStatus>()
            .map_err(|e| corrupt("status", e))?;
        let evaluation_type = self
            .evaluation_type
            .parse::<EvaluationType>()
            .map_err(|e| corrupt("evaluation_type", e))?;
        let submitted_by_role = self
            .submitted_by_role
            .parse::<UserRole>()
            .map_err(|e| corrupt("submitted_by_role", e))?;

        let ts = |ts: i64| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default();

        Ok(GradeRecord {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            evaluation_type,
            value: self.score,
            weight: self.weight,
            status,
            term: self.term,
            academic_year: self.academic_year,
            submitted_by: self.submitted_by,
            submitted_by_role,
            validated_by: self.validated_by,
            comment: self.comment,
            rejection_comment: self.rejection_comment,
            submitted_at: self.submitted_at.map(ts),
            validated_at: self.validated_at.map(ts),
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
            deleted_at: self.deleted_at.map(ts),
        })
    }
}
