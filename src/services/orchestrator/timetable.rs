use serde_json::json;

use super::{WorkflowOrchestrator, notices};
use crate::errors::Result;
use crate::models::timetable::{
    entities::{RecordedSlotConflict, ScheduledSlot},
    requests::ScheduleSlotRequest,
};
use crate::models::users::entities::Actor;

impl WorkflowOrchestrator {
    async fn after_scheduling(&self, actor: Actor, action: &str, scheduled: &ScheduledSlot) {
        let conflicts: Vec<String> = scheduled
            .conflicts
            .iter()
            .map(|c| c.dimension.to_string())
            .collect();
        self.dispatcher
            .audit(notices::audit(
                actor,
                action,
                scheduled.slot.id,
                json!({
                    "course_id": scheduled.slot.placement.course_id,
                    "conflicts": conflicts,
                }),
            ))
            .await;

        if let Some(notice) = notices::timetable_conflict(scheduled) {
            self.dispatcher.notify(notice).await;
        }
    }

    /// 排课；带冲突写入时通知管理员
    pub async fn schedule_slot(
        &self,
        actor: Actor,
        req: ScheduleSlotRequest,
    ) -> Result<ScheduledSlot> {
        let scheduled = self.timetable.schedule_slot(actor, req).await?;
        self.after_scheduling(actor, "timetable.schedule", &scheduled)
            .await;
        Ok(scheduled)
    }

    pub async fn reschedule_slot(
        &self,
        actor: Actor,
        slot_id: i64,
        req: ScheduleSlotRequest,
    ) -> Result<ScheduledSlot> {
        let scheduled = self.timetable.reschedule_slot(actor, slot_id, req).await?;
        self.after_scheduling(actor, "timetable.reschedule", &scheduled)
            .await;
        Ok(scheduled)
    }

    pub async fn remove_slot(&self, actor: Actor, slot_id: i64) -> Result<()> {
        self.timetable.remove_slot(actor, slot_id).await?;
        self.dispatcher
            .audit(notices::audit(actor, "timetable.remove", slot_id, json!({})))
            .await;
        Ok(())
    }

    pub async fn list_slot_conflicts(&self) -> Result<Vec<RecordedSlotConflict>> {
        self.timetable.list_slot_conflicts().await
    }

    pub async fn resolve_slot_conflict(&self, actor: Actor, conflict_id: i64) -> Result<()> {
        self.timetable.resolve_slot_conflict(conflict_id).await?;
        self.dispatcher
            .audit(notices::audit(
                actor,
                "timetable.resolve_conflict",
                conflict_id,
                json!({}),
            ))
            .await;
        Ok(())
    }
}
