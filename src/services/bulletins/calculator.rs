//! 平均分与名次计算（纯函数）

use std::collections::BTreeMap;

use crate::models::bulletins::entities::StudentStanding;
use crate::models::grades::entities::GradeRecord;

/// 加权平均分 `Σ(value × weight) / Σweight`，只统计已审核成绩
///
/// 没有已审核成绩（权重和为 0）时返回 `None`。
pub fn weighted_average<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let (weighted_sum, total_weight) = records
        .into_iter()
        .filter(|r| r.is_validated())
        .fold((0.0_f64, 0.0_f64), |(sum, weight), r| {
            (sum + r.value * r.weight, weight + r.weight)
        });

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}

/// 竞争排名：1 + 平均分严格更高的人数，并列同名次，其后留空
pub fn competition_rank(average: f64, cohort: &[f64]) -> u32 {
    1 + cohort.iter().filter(|&&other| other > average).count() as u32
}

/// 由范围内全部成绩得到每个学生的平均分、名次和成绩单资格
///
/// 只有至少一条已审核成绩的学生进入队列。
pub fn build_standings(records: &[GradeRecord]) -> Vec<StudentStanding> {
    let mut by_student: BTreeMap<i64, Vec<&GradeRecord>> = BTreeMap::new();
    for record in records {
        by_student.entry(record.student_id).or_default().push(record);
    }

    let cohort: Vec<(i64, f64, bool)> = by_student
        .into_iter()
        .filter_map(|(student_id, grades)| {
            let eligible = grades.iter().all(|r| r.is_validated());
            weighted_average(grades).map(|average| (student_id, average, eligible))
        })
        .collect();

    let averages: Vec<f64> = cohort.iter().map(|(_, average, _)| *average).collect();

    cohort
        .into_iter()
        .map(|(student_id, average, eligible)| StudentStanding {
            student_id,
            average: Some(average),
            rank: Some(competition_rank(average, &averages)),
            eligible,
        })
        .collect()
}
