use serde::{Deserialize, Serialize};

/// 成绩单范围：专业 + 学期 + 学年
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BulletinScope {
    pub program_id: i64,
    pub term: String,
    pub academic_year: String,
}

impl BulletinScope {
    pub fn new(program_id: i64, term: impl Into<String>, academic_year: impl Into<String>) -> Self {
        Self {
            program_id,
            term: term.into(),
            academic_year: academic_year.into(),
        }
    }
}

// 成绩单（派生数据，每次重新计算时覆盖）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bulletin {
    pub id: i64,
    pub student_id: i64,
    pub program_id: i64,
    pub term: String,
    pub academic_year: String,
    pub average: Option<f64>,
    pub rank: Option<u32>,
    pub cohort_size: u32,
    // 该学生本学期所有成绩均已审核
    pub eligible: bool,
    pub generated_by: i64,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// 单个学生在队列中的计算结果，用于批量写入成绩单
#[derive(Debug, Clone, PartialEq)]
pub struct StudentStanding {
    pub student_id: i64,
    pub average: Option<f64>,
    pub rank: Option<u32>,
    pub eligible: bool,
}
