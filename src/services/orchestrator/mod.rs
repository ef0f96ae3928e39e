//! 工作流编排
//!
//! 每次成功的状态流转之后依次执行：审计、通知、成绩单重算。
//! 状态写入已经提交，后续步骤的失败只记录日志，不会让操作失败。

mod bulletins;
pub mod dispatcher;
mod grades;
pub mod notices;
mod timetable;

pub use dispatcher::{DispatchMode, SideEffect, SideEffectDispatcher};

use std::sync::Arc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::{GradeFlowError, Result};
use crate::models::bulletins::entities::BulletinScope;
use crate::models::grades::{
    entities::{GradeRecord, GradeStatus},
    responses::CommittedTransition,
};
use crate::models::users::entities::Actor;
use crate::services::bulletins::BulletinService;
use crate::services::conflicts::{ConflictPolicy, TimetableService};
use crate::services::grade_workflow::GradeWorkflowService;
use crate::services::ports::{BulletinRenderer, TeachingAssignments};
use crate::storage::Storage;

/// 编排器运行参数
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub conflict_policy: ConflictPolicy,
    pub allow_override: bool,
    pub dispatch_mode: DispatchMode,
    pub queue_capacity: usize,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            conflict_policy: config
                .conflict_policy()
                .map_err(GradeFlowError::configuration)?,
            allow_override: config.timetable.allow_override,
            dispatch_mode: config
                .dispatch_mode()
                .map_err(GradeFlowError::configuration)?,
            queue_capacity: config.dispatch.queue_capacity,
        })
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Strict,
            allow_override: false,
            dispatch_mode: DispatchMode::Inline,
            queue_capacity: 1024,
        }
    }
}

/// 成绩单重算结果
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateRefresh {
    // 本次流转不影响平均分或资格
    NotRequired,
    // 课程不在任何专业课表中
    Unscoped,
    // 每个开设该课程的专业各一项
    Refreshed(Vec<ScopeRefresh>),
    // 流转已提交，但重算失败，可通过 refresh_student_aggregates 重试
    Failed(GradeFlowError),
}

/// 单个成绩单范围的重算结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRefresh {
    pub scope: BulletinScope,
    pub eligible: bool,
    pub newly_eligible: bool,
}

/// 一次已提交流转及其后续处理结果
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub transition: CommittedTransition,
    pub aggregates: AggregateRefresh,
}

impl TransitionOutcome {
    pub fn record(&self) -> &GradeRecord {
        &self.transition.record
    }
}

pub struct WorkflowOrchestrator {
    storage: Arc<dyn Storage>,
    workflow: GradeWorkflowService,
    bulletins: BulletinService,
    timetable: TimetableService,
    dispatcher: Arc<SideEffectDispatcher>,
    renderer: Option<Arc<dyn BulletinRenderer>>,
}

impl WorkflowOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        assignments: Arc<dyn TeachingAssignments>,
        dispatcher: Arc<SideEffectDispatcher>,
        settings: &OrchestratorSettings,
    ) -> Self {
        Self {
            workflow: GradeWorkflowService::new(storage.clone(), assignments),
            bulletins: BulletinService::new(storage.clone()),
            timetable: TimetableService::new(
                storage.clone(),
                settings.conflict_policy,
                settings.allow_override,
            ),
            storage,
            dispatcher,
            renderer: None,
        }
    }

    /// 注入成绩单文档渲染器
    pub fn with_renderer(mut self, renderer: Arc<dyn BulletinRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn dispatcher(&self) -> &Arc<SideEffectDispatcher> {
        &self.dispatcher
    }

    pub fn bulletins(&self) -> &BulletinService {
        &self.bulletins
    }

    /// 已提交流转的后续步骤：审计、通知、成绩单重算
    async fn after_commit(
        &self,
        actor: Actor,
        action: &str,
        transition: CommittedTransition,
    ) -> TransitionOutcome {
        self.dispatcher
            .audit(notices::transition_audit(actor, action, &transition))
            .await;
        for notice in notices::for_transition(&transition) {
            self.dispatcher.notify(notice).await;
        }

        let aggregates = if affects_aggregates(&transition) {
            self.refresh_after(actor, &transition.record).await
        } else {
            AggregateRefresh::NotRequired
        };

        TransitionOutcome {
            transition,
            aggregates,
        }
    }

    async fn refresh_after(&self, actor: Actor, record: &GradeRecord) -> AggregateRefresh {
        match self.refresh_for_record(actor, record).await {
            Ok(refresh) => refresh,
            Err(e) => {
                error!(
                    "Grade {} committed but bulletin refresh for student {} failed: {}",
                    record.id, record.student_id, e
                );
                AggregateRefresh::Failed(e)
            }
        }
    }

    async fn refresh_for_record(
        &self,
        actor: Actor,
        record: &GradeRecord,
    ) -> Result<AggregateRefresh> {
        let scopes = self.bulletins.scopes_for_record(record).await?;
        if scopes.is_empty() {
            return Ok(AggregateRefresh::Unscoped);
        }

        let mut refreshed = Vec::with_capacity(scopes.len());
        for scope in scopes {
            refreshed.push(self.refresh_scope(actor, record.student_id, scope).await?);
        }
        Ok(AggregateRefresh::Refreshed(refreshed))
    }

    async fn refresh_scope(
        &self,
        actor: Actor,
        student_id: i64,
        scope: BulletinScope,
    ) -> Result<ScopeRefresh> {
        let was_eligible = self
            .bulletins
            .get_bulletin(student_id, &scope)
            .await?
            .is_some_and(|b| b.eligible);

        let bulletins = self.bulletins.refresh_cohort(&scope, actor.id).await?;
        let eligible = bulletins
            .iter()
            .find(|b| b.student_id == student_id)
            .is_some_and(|b| b.eligible);
        let newly_eligible = eligible && !was_eligible;

        if newly_eligible {
            info!(
                "Student {} is now eligible for a bulletin in program {}",
                student_id, scope.program_id
            );
            self.dispatcher
                .notify(notices::bulletin_eligible(student_id, &scope))
                .await;
        }

        Ok(ScopeRefresh {
            scope,
            eligible,
            newly_eligible,
        })
    }

    /// 重新计算某条成绩所在范围的成绩单，可重复调用
    pub async fn refresh_student_aggregates(
        &self,
        actor: Actor,
        grade_id: i64,
    ) -> Result<AggregateRefresh> {
        let record = self
            .storage
            .get_grade_record_by_id(grade_id)
            .await?
            .ok_or_else(|| GradeFlowError::not_found(format!("成绩记录 {grade_id} 不存在")))?;
        self.refresh_for_record(actor, &record).await
    }
}

// 进出已审核状态或删除会改变平均分与成绩单资格
fn affects_aggregates(transition: &CommittedTransition) -> bool {
    transition.to == GradeStatus::Validated
        || transition.from == GradeStatus::Validated
        || transition.to == GradeStatus::Deleted
}

#[cfg(test)]
mod tests;
