use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

// 课时类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Lecture,  // 讲授
    Tutorial, // 习题课
    Lab,      // 实验
    Exam,     // 考试
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotType::Lecture => write!(f, "lecture"),
            SlotType::Tutorial => write!(f, "tutorial"),
            SlotType::Lab => write!(f, "lab"),
            SlotType::Exam => write!(f, "exam"),
        }
    }
}

impl std::str::FromStr for SlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lecture" => Ok(SlotType::Lecture),
            "tutorial" => Ok(SlotType::Tutorial),
            "lab" => Ok(SlotType::Lab),
            "exam" => Ok(SlotType::Exam),
            _ => Err(format!("Invalid slot type: {s}")),
        }
    }
}

// 冲突维度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDimension {
    Teacher, // 同一教师
    Room,    // 同一教室
    Program, // 同一专业班级
}

impl std::fmt::Display for ConflictDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictDimension::Teacher => write!(f, "teacher"),
            ConflictDimension::Room => write!(f, "room"),
            ConflictDimension::Program => write!(f, "program"),
        }
    }
}

impl std::str::FromStr for ConflictDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(ConflictDimension::Teacher),
            "room" => Ok(ConflictDimension::Room),
            "program" => Ok(ConflictDimension::Program),
            _ => Err(format!("Invalid conflict dimension: {s}")),
        }
    }
}

/// 课表时段的位置信息（不含 id 与审计字段），用于冲突检测和创建
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotPlacement {
    pub course_id: i64,
    pub teacher_id: i64,
    pub room_id: i64,
    pub program_id: i64,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub week_number: u32,
    pub academic_year: String,
    pub slot_type: SlotType,
}

impl SlotPlacement {
    /// 是否与另一个时段处于同一天（星期、周次、学年均相同）
    pub fn same_day_as(&self, other: &SlotPlacement) -> bool {
        self.day_of_week == other.day_of_week
            && self.week_number == other.week_number
            && self.academic_year == other.academic_year
    }
}

// 课表时段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimetableSlot {
    pub id: i64,
    #[serde(flatten)]
    pub placement: SlotPlacement,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 冲突检测结果中的一项
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotConflict {
    pub dimension: ConflictDimension,
    pub conflicting_slot: TimetableSlot,
}

/// 已记录、等待复核的冲突
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedSlotConflict {
    pub id: i64,
    pub slot_id: i64,
    pub conflicting_slot_id: i64,
    pub dimension: ConflictDimension,
    pub detected_at: chrono::DateTime<chrono::Utc>,
    pub resolved: bool,
}

/// 排课结果
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledSlot {
    pub slot: TimetableSlot,
    // 强制创建时记录下来的冲突，正常创建时为空
    pub conflicts: Vec<SlotConflict>,
}
