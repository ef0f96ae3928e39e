use serde::Deserialize;

use super::entities::{EvaluationType, GradeStatus, MAX_GRADE_VALUE, MIN_GRADE_VALUE};
use crate::errors::{GradeFlowError, Result};

/// 录入成绩请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGradeRecordRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub evaluation_type: EvaluationType,
    pub value: f64,
    pub weight: f64,
    pub term: String,
    pub academic_year: String,
    pub comment: Option<String>,
}

/// 修改成绩请求（仅待审核/修订中状态可用）
#[derive(Debug, Clone, Deserialize)]
pub struct ModifyGradeRequest {
    pub value: f64,
    pub weight: f64,
    pub comment: Option<String>,
}

/// 状态流转附带写入的字段
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionStamp {
    // 提交/重新提交：写入 submitted_at，清空驳回说明
    Submitted { at: i64 },
    // 审核通过：写入审核人和审核时间
    Validated { by: i64, at: i64 },
    // 驳回或要求修订：写入说明
    Commented { comment: String },
    // 重新打开：清空审核人和审核时间
    Reopened { reason: String },
    // 被驳回后进入修订
    Revised,
    // 软删除
    Deleted { at: i64 },
}

// 用于存储层的比较并交换（CAS）状态更新
#[derive(Debug, Clone)]
pub struct GradeTransition {
    pub expected: GradeStatus,
    pub target: GradeStatus,
    pub stamp: TransitionStamp,
}

/// 校验分值与权重：0 ≤ value ≤ 20，weight > 0，且均为有限数
pub fn check_score(value: f64, weight: f64) -> Result<()> {
    if !value.is_finite() || !(MIN_GRADE_VALUE..=MAX_GRADE_VALUE).contains(&value) {
        return Err(GradeFlowError::validation(format!(
            "成绩 {value} 超出范围 {MIN_GRADE_VALUE}..={MAX_GRADE_VALUE}"
        )));
    }
    if !weight.is_finite() || weight <= 0.0 {
        return Err(GradeFlowError::validation(format!(
            "权重 {weight} 必须大于 0"
        )));
    }
    Ok(())
}
