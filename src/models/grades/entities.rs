use serde::{Deserialize, Serialize};

use crate::models::users::entities::UserRole;

/// 成绩允许的最小值
pub const MIN_GRADE_VALUE: f64 = 0.0;
/// 成绩允许的最大值
pub const MAX_GRADE_VALUE: f64 = 20.0;

// 成绩状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Draft,             // 草稿
    PendingValidation, // 待审核
    Validated,         // 已审核
    Rejected,          // 已驳回
    InRevision,        // 修订中
    Deleted,           // 已删除（终态，软删除）
}

impl GradeStatus {
    pub const DRAFT: &'static str = "draft";
    pub const PENDING_VALIDATION: &'static str = "pending_validation";
    pub const VALIDATED: &'static str = "validated";
    pub const REJECTED: &'static str = "rejected";
    pub const IN_REVISION: &'static str = "in_revision";
    pub const DELETED: &'static str = "deleted";

    /// 状态流转表
    pub fn allowed_targets(&self) -> &'static [GradeStatus] {
        match self {
            GradeStatus::Draft => &[GradeStatus::PendingValidation, GradeStatus::Deleted],
            GradeStatus::PendingValidation => &[
                GradeStatus::Validated,
                GradeStatus::Rejected,
                GradeStatus::InRevision,
            ],
            GradeStatus::InRevision => &[GradeStatus::PendingValidation, GradeStatus::Deleted],
            GradeStatus::Validated => &[GradeStatus::InRevision],
            GradeStatus::Rejected => &[GradeStatus::InRevision, GradeStatus::Deleted],
            GradeStatus::Deleted => &[],
        }
    }

    pub fn can_transition_to(&self, target: GradeStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// 允许直接修改分值/权重/评语的状态
    pub fn editable_statuses() -> &'static [GradeStatus] {
        &[GradeStatus::PendingValidation, GradeStatus::InRevision]
    }

    pub fn is_editable(&self) -> bool {
        Self::editable_statuses().contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeStatus::Draft => Self::DRAFT,
            GradeStatus::PendingValidation => Self::PENDING_VALIDATION,
            GradeStatus::Validated => Self::VALIDATED,
            GradeStatus::Rejected => Self::REJECTED,
            GradeStatus::InRevision => Self::IN_REVISION,
            GradeStatus::Deleted => Self::DELETED,
        }
    }
}

impl<'de> Deserialize<'de> for GradeStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<GradeStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的成绩状态: '{s}'. 支持的状态: draft, pending_validation, validated, rejected, in_revision, deleted"
            ))
        })
    }
}

impl std::fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::DRAFT => Ok(GradeStatus::Draft),
            Self::PENDING_VALIDATION => Ok(GradeStatus::PendingValidation),
            Self::VALIDATED => Ok(GradeStatus::Validated),
            Self::REJECTED => Ok(GradeStatus::Rejected),
            Self::IN_REVISION => Ok(GradeStatus::InRevision),
            Self::DELETED => Ok(GradeStatus::Deleted),
            _ => Err(format!("Invalid grade status: {s}")),
        }
    }
}

// 评估类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Quiz,      // 随堂测验
    Homework,  // 作业
    Midterm,   // 期中考试
    Final,     // 期末考试
    Project,   // 项目
    Practical, // 实践
}

impl std::fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EvaluationType::Quiz => "quiz",
            EvaluationType::Homework => "homework",
            EvaluationType::Midterm => "midterm",
            EvaluationType::Final => "final",
            EvaluationType::Project => "project",
            EvaluationType::Practical => "practical",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EvaluationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiz" => Ok(EvaluationType::Quiz),
            "homework" => Ok(EvaluationType::Homework),
            "midterm" => Ok(EvaluationType::Midterm),
            "final" => Ok(EvaluationType::Final),
            "project" => Ok(EvaluationType::Project),
            "practical" => Ok(EvaluationType::Practical),
            _ => Err(format!("Invalid evaluation type: {s}")),
        }
    }
}

// 成绩记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeRecord {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub evaluation_type: EvaluationType,
    // 分值，0..=20
    pub value: f64,
    // 权重，> 0
    pub weight: f64,
    pub status: GradeStatus,
    // 学期，如 "S1"
    pub term: String,
    // 学年，如 "2025-2026"
    pub academic_year: String,
    pub submitted_by: i64,
    pub submitted_by_role: UserRole,
    pub validated_by: Option<i64>,
    pub comment: Option<String>,
    // 驳回或要求修订时的说明
    pub rejection_comment: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub validated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl GradeRecord {
    pub fn is_validated(&self) -> bool {
        self.status == GradeStatus::Validated
    }
}
