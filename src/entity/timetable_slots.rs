//! 课表时段实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "timetable_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub room_id: i64,
    pub program_id: i64,
    // ISO 星期，1 = 周一
    pub day_of_week: i32,
    // 自零点起的分钟数
    pub start_minute: i32,
    pub end_minute: i32,
    pub week_number: i32,
    pub academic_year: String,
    pub slot_type: String,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// 星期转为 ISO 编号
pub fn weekday_to_column(day: chrono::Weekday) -> i32 {
    day.number_from_monday() as i32
}

/// 时间转为自零点起的分钟数，调用方已保证为整分钟
pub fn time_to_column(time: chrono::NaiveTime) -> i32 {
    use chrono::Timelike;
    (time.hour() * 60 + time.minute()) as i32
}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_slot(self) -> crate::errors::Result<crate::models::timetable::entities::TimetableSlot> {
        use crate::errors::GradeFlowError;
        use crate::models::timetable::entities::{SlotPlacement, SlotType, TimetableSlot};
        use chrono::{DateTime, NaiveTime, Utc, Weekday};

        let id = self.id;
        let corrupt = move |field: &str| {
            GradeFlowError::database_operation(format!("课表时段 {id} 的 {field} 字段无法解析"))
        };

        let day_of_week = match self.day_of_week {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => return Err(corrupt("day_of_week")),
        };
        let minute_to_time = |minute: i32| {
            u32::try_from(minute)
                .ok()
                .and_then(|m| NaiveTime::from_num_seconds_from_midnight_opt(m * 60, 0))
        };
        let start_time = minute_to_time(self.start_minute).ok_or_else(|| corrupt("start_minute"))?;
        let end_time = minute_to_time(self.end_minute).ok_or_else(|| corrupt("end_minute"))?;
        let week_number = u32::try_from(self.week_number).map_err(|_| corrupt("week_number"))?;
        let slot_type = self
            .slot_type
            .parse::<SlotType>()
            .map_err(|_| corrupt("slot_type"))?;

        Ok(TimetableSlot {
            id: self.id,
            placement: SlotPlacement {
                course_id: self.course_id,
                teacher_id: self.teacher_id,
                room_id: self.room_id,
                program_id: self.program_id,
                day_of_week,
                start_time,
                end_time,
                week_number,
                academic_year: self.academic_year,
                slot_type,
            },
            created_by: self.created_by,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
