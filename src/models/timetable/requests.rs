use chrono::{NaiveTime, Timelike};
use serde::Deserialize;

use super::entities::SlotPlacement;
use crate::errors::{GradeFlowError, Result};

/// 排课/调课请求
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSlotRequest {
    #[serde(flatten)]
    pub placement: SlotPlacement,
    // strict 模式下显式要求强制创建（需配置允许）
    #[serde(default)]
    pub force_override: bool,
}

impl ScheduleSlotRequest {
    pub fn new(placement: SlotPlacement) -> Self {
        Self {
            placement,
            force_override: false,
        }
    }

    pub fn forced(placement: SlotPlacement) -> Self {
        Self {
            placement,
            force_override: true,
        }
    }
}

// 时段按整分钟存储
fn is_whole_minute(time: NaiveTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0
}

/// 校验时段本身的合法性
pub fn validate_placement(placement: &SlotPlacement) -> Result<()> {
    for time in [placement.start_time, placement.end_time] {
        if !is_whole_minute(time) {
            return Err(GradeFlowError::validation(format!(
                "时段时间 {} 必须精确到整分钟",
                time.format("%H:%M:%S%.f")
            )));
        }
    }
    if placement.start_time >= placement.end_time {
        return Err(GradeFlowError::validation(format!(
            "时段开始时间 {} 必须早于结束时间 {}",
            placement.start_time.format("%H:%M"),
            placement.end_time.format("%H:%M")
        )));
    }
    if !(1..=53).contains(&placement.week_number) {
        return Err(GradeFlowError::validation(format!(
            "周次 {} 超出范围 1..=53",
            placement.week_number
        )));
    }
    if placement.academic_year.trim().is_empty() {
        return Err(GradeFlowError::validation("学年不能为空"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timetable::entities::SlotType;
    use chrono::Weekday;

    fn placement(start: NaiveTime, end: NaiveTime) -> SlotPlacement {
        SlotPlacement {
            course_id: 10,
            teacher_id: 7,
            room_id: 1,
            program_id: 3,
            day_of_week: Weekday::Wed,
            start_time: start,
            end_time: end,
            week_number: 4,
            academic_year: "2025-2026".into(),
            slot_type: SlotType::Tutorial,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_whole_minutes_are_accepted() {
        assert!(validate_placement(&placement(at(8, 0, 0), at(9, 30, 0))).is_ok());
    }

    #[test]
    fn test_sub_minute_times_are_rejected() {
        // 按分钟存储后会变成 08:00-08:00
        let err = validate_placement(&placement(at(8, 0, 10), at(8, 0, 50))).unwrap_err();
        assert!(matches!(err, GradeFlowError::Validation(_)));

        let err = validate_placement(&placement(at(9, 0, 0), at(10, 0, 45))).unwrap_err();
        assert_eq!(err.code(), "G001");

        let fractional = NaiveTime::from_hms_milli_opt(10, 0, 0, 500).unwrap();
        assert!(validate_placement(&placement(fractional, at(11, 0, 0))).is_err());
    }

    #[test]
    fn test_inverted_or_empty_interval_is_rejected() {
        assert!(validate_placement(&placement(at(10, 0, 0), at(10, 0, 0))).is_err());
        assert!(validate_placement(&placement(at(11, 0, 0), at(10, 0, 0))).is_err());

        let mut bad_week = placement(at(8, 0, 0), at(9, 0, 0));
        bad_week.week_number = 54;
        assert!(validate_placement(&bad_week).is_err());
    }
}
