use serde::Serialize;

use super::entities::{GradeRecord, GradeStatus};
use crate::errors::GradeFlowError;

/// 一次已提交的状态流转
#[derive(Debug, Clone, Serialize)]
pub struct CommittedTransition {
    pub record: GradeRecord,
    pub from: GradeStatus,
    pub to: GradeStatus,
}

/// 批量审核中单条失败
#[derive(Debug, Clone)]
pub struct BatchItemFailure {
    pub grade_id: i64,
    pub error: GradeFlowError,
}

/// 批量审核结果
///
/// 批量审核不是原子操作：每条记录独立成功或失败，失败不会回滚其他记录。
#[derive(Debug, Clone, Default)]
pub struct BatchValidationReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub validated: Vec<i64>,
    pub failures: Vec<BatchItemFailure>,
    // 成功项的流转结果，供编排层逐条触发后续处理
    pub committed: Vec<CommittedTransition>,
}

impl BatchValidationReport {
    pub fn record_success(&mut self, transition: CommittedTransition) {
        self.success_count += 1;
        self.validated.push(transition.record.id);
        self.committed.push(transition);
    }

    pub fn record_failure(&mut self, grade_id: i64, error: GradeFlowError) {
        self.failure_count += 1;
        self.failures.push(BatchItemFailure { grade_id, error });
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.success_count, self.failure_count)
    }
}
