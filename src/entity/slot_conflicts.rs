//! 课表冲突记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "slot_conflicts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub slot_id: i64,
    pub conflicting_slot_id: i64,
    pub dimension: String,
    pub detected_at: i64,
    pub resolved: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::timetable_slots::Entity",
        from = "Column::SlotId",
        to = "super::timetable_slots::Column::Id"
    )]
    Slot,
}

impl Related<super::timetable_slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_recorded_conflict(
        self,
    ) -> crate::errors::Result<crate::models::timetable::entities::RecordedSlotConflict> {
        use crate::errors::GradeFlowError;
        use crate::models::timetable::entities::{ConflictDimension, RecordedSlotConflict};
        use chrono::{DateTime, Utc};

        let dimension = self.dimension.parse::<ConflictDimension>().map_err(|e| {
            GradeFlowError::database_operation(format!("冲突记录 {} 无法解析: {e}", self.id))
        })?;

        Ok(RecordedSlotConflict {
            id: self.id,
            slot_id: self.slot_id,
            conflicting_slot_id: self.conflicting_slot_id,
            dimension,
            detected_at: DateTime::<Utc>::from_timestamp(self.detected_at, 0).unwrap_or_default(),
            resolved: self.resolved,
        })
    }
}
