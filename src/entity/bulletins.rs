//! 成绩单实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bulletins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub program_id: i64,
    pub term: String,
    pub academic_year: String,
    pub average: Option<f64>,
    pub rank: Option<i32>,
    pub cohort_size: i32,
    pub eligible: bool,
    pub generated_by: i64,
    pub generated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_bulletin(self) -> crate::models::bulletins::entities::Bulletin {
        use crate::models::bulletins::entities::Bulletin;
        use chrono::{DateTime, Utc};

        Bulletin {
            id: self.id,
            student_id: self.student_id,
            program_id: self.program_id,
            term: self.term,
            academic_year: self.academic_year,
            average: self.average,
            rank: self.rank.and_then(|r| u32::try_from(r).ok()),
            cohort_size: u32::try_from(self.cohort_size).unwrap_or_default(),
            eligible: self.eligible,
            generated_by: self.generated_by,
            generated_at: DateTime::<Utc>::from_timestamp(self.generated_at, 0).unwrap_or_default(),
        }
    }
}
