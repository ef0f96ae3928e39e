use chrono::NaiveTime;

use crate::models::timetable::entities::{
    ConflictDimension, SlotConflict, SlotPlacement, TimetableSlot,
};

/// 半开区间 `[s1, e1)` 与 `[s2, e2)` 是否重叠；首尾相接不算重叠
pub fn intervals_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// 检测候选时段与已有时段的冲突
///
/// 只比较同一天（星期、周次、学年）且时间重叠的时段，
/// 每个时段按教师、教室、专业三个维度分别报告。
/// `exclude_id` 为调课时的时段自身。
pub fn detect_conflicts(
    candidate: &SlotPlacement,
    exclude_id: Option<i64>,
    existing: &[TimetableSlot],
) -> Vec<SlotConflict> {
    let mut conflicts = Vec::new();

    for slot in existing {
        if exclude_id == Some(slot.id) {
            continue;
        }
        let other = &slot.placement;
        if !candidate.same_day_as(other)
            || !intervals_overlap(
                candidate.start_time,
                candidate.end_time,
                other.start_time,
                other.end_time,
            )
        {
            continue;
        }

        let dimensions = [
            (ConflictDimension::Teacher, candidate.teacher_id == other.teacher_id),
            (ConflictDimension::Room, candidate.room_id == other.room_id),
            (ConflictDimension::Program, candidate.program_id == other.program_id),
        ];
        for (dimension, clash) in dimensions {
            if clash {
                conflicts.push(SlotConflict {
                    dimension,
                    conflicting_slot: slot.clone(),
                });
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timetable::entities::SlotType;
    use chrono::{Utc, Weekday};

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn placement(teacher: i64, room: i64, program: i64, start: u32, end: u32) -> SlotPlacement {
        SlotPlacement {
            course_id: 10,
            teacher_id: teacher,
            room_id: room,
            program_id: program,
            day_of_week: Weekday::Mon,
            start_time: at(start),
            end_time: at(end),
            week_number: 5,
            academic_year: "2025-2026".into(),
            slot_type: SlotType::Lecture,
        }
    }

    fn slot(id: i64, placement: SlotPlacement) -> TimetableSlot {
        TimetableSlot {
            id,
            placement,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overlapping_teacher_slots_conflict() {
        let existing = vec![slot(1, placement(7, 1, 3, 8, 10))];
        let conflicts = detect_conflicts(&placement(7, 2, 4, 9, 11), None, &existing);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].dimension, ConflictDimension::Teacher);
        assert_eq!(conflicts[0].conflicting_slot.id, 1);
    }

    #[test]
    fn test_touching_slots_do_not_conflict() {
        let existing = vec![slot(1, placement(7, 1, 3, 8, 10))];
        assert!(detect_conflicts(&placement(7, 1, 3, 10, 12), None, &existing).is_empty());
        assert!(detect_conflicts(&placement(7, 1, 3, 6, 8), None, &existing).is_empty());
    }

    #[test]
    fn test_every_matching_dimension_is_reported() {
        let existing = vec![
            slot(1, placement(7, 1, 3, 8, 10)),
            slot(2, placement(8, 1, 4, 9, 10)),
        ];
        let conflicts = detect_conflicts(&placement(7, 1, 3, 9, 11), None, &existing);
        let found: Vec<(i64, ConflictDimension)> = conflicts
            .iter()
            .map(|c| (c.conflicting_slot.id, c.dimension))
            .collect();

        assert_eq!(
            found,
            vec![
                (1, ConflictDimension::Teacher),
                (1, ConflictDimension::Room),
                (1, ConflictDimension::Program),
                (2, ConflictDimension::Room),
            ]
        );
    }

    #[test]
    fn test_other_day_or_week_is_ignored() {
        let mut other_day = placement(7, 1, 3, 8, 10);
        other_day.day_of_week = Weekday::Tue;
        let mut other_week = placement(7, 1, 3, 8, 10);
        other_week.week_number = 6;
        let existing = vec![slot(1, other_day), slot(2, other_week)];

        assert!(detect_conflicts(&placement(7, 1, 3, 8, 10), None, &existing).is_empty());
    }

    #[test]
    fn test_excluded_slot_is_skipped() {
        let existing = vec![slot(1, placement(7, 1, 3, 8, 10))];
        assert!(detect_conflicts(&placement(7, 1, 3, 9, 11), Some(1), &existing).is_empty());
    }

    #[test]
    fn test_disjoint_resources_do_not_conflict() {
        let existing = vec![slot(1, placement(7, 1, 3, 8, 10))];
        assert!(detect_conflicts(&placement(8, 2, 4, 8, 10), None, &existing).is_empty());
    }
}
