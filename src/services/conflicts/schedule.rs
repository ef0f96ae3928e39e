use tracing::{info, warn};

use super::{ConflictPolicy, TimetableService};
use crate::errors::{GradeFlowError, Result};
use crate::models::timetable::{entities::ScheduledSlot, requests::ScheduleSlotRequest};
use crate::models::users::entities::Actor;

fn log_recorded_conflicts(service: &TimetableService, actor: Actor, scheduled: &ScheduledSlot) {
    if scheduled.conflicts.is_empty() {
        return;
    }
    let dimensions = scheduled
        .conflicts
        .iter()
        .map(|c| format!("{}(slot {})", c.dimension, c.conflicting_slot.id))
        .collect::<Vec<_>>()
        .join(", ");

    match service.policy {
        ConflictPolicy::Advisory => warn!(
            "Slot {} scheduled by user {} with advisory conflicts: {}",
            scheduled.slot.id, actor.id, dimensions
        ),
        ConflictPolicy::Strict => warn!(
            "Slot {} force-scheduled by user {} despite conflicts: {}",
            scheduled.slot.id, actor.id, dimensions
        ),
    }
}

pub async fn schedule_slot(
    service: &TimetableService,
    actor: Actor,
    req: ScheduleSlotRequest,
) -> Result<ScheduledSlot> {
    let allow_conflicts = service.conflicts_allowed(&req)?;

    let scheduled = service
        .get_storage()
        .schedule_timetable_slot(actor.id, req.placement, allow_conflicts)
        .await?;

    log_recorded_conflicts(service, actor, &scheduled);
    info!(
        "Slot {} scheduled for course {} by user {}",
        scheduled.slot.id, scheduled.slot.placement.course_id, actor.id
    );

    Ok(scheduled)
}

pub async fn reschedule_slot(
    service: &TimetableService,
    actor: Actor,
    slot_id: i64,
    req: ScheduleSlotRequest,
) -> Result<ScheduledSlot> {
    let allow_conflicts = service.conflicts_allowed(&req)?;

    let scheduled = service
        .get_storage()
        .reschedule_timetable_slot(slot_id, req.placement, allow_conflicts)
        .await?;

    log_recorded_conflicts(service, actor, &scheduled);
    info!("Slot {} rescheduled by user {}", slot_id, actor.id);

    Ok(scheduled)
}

pub async fn remove_slot(service: &TimetableService, actor: Actor, slot_id: i64) -> Result<()> {
    if !service.get_storage().remove_timetable_slot(slot_id).await? {
        return Err(GradeFlowError::not_found(format!(
            "课表时段 {slot_id} 不存在"
        )));
    }
    info!("Slot {} removed by user {}", slot_id, actor.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timetable::entities::{SlotPlacement, SlotType};
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::memory_storage;
    use chrono::{NaiveTime, Weekday};
    use std::sync::Arc;

    fn placement(teacher: i64, room: i64, start: u32, end: u32) -> SlotPlacement {
        SlotPlacement {
            course_id: 10,
            teacher_id: teacher,
            room_id: room,
            program_id: 3,
            day_of_week: Weekday::Wed,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            week_number: 1,
            academic_year: "2025-2026".into(),
            slot_type: SlotType::Lab,
        }
    }

    async fn service(policy: ConflictPolicy, allow_override: bool) -> TimetableService {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        TimetableService::new(storage, policy, allow_override)
    }

    fn scheduler() -> Actor {
        Actor::new(1, UserRole::Admin)
    }

    #[tokio::test]
    async fn test_strict_refuses_and_inserts_nothing() {
        let service = service(ConflictPolicy::Strict, false).await;
        service
            .schedule_slot(scheduler(), ScheduleSlotRequest::new(placement(7, 1, 8, 10)))
            .await
            .unwrap();

        let err = service
            .schedule_slot(scheduler(), ScheduleSlotRequest::new(placement(8, 1, 9, 11)))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeFlowError::Conflict(_)));
        assert!(err.message().contains("room"));

        assert!(service.list_slot_conflicts().await.unwrap().is_empty());
        assert_eq!(
            service
                .get_storage()
                .list_program_course_ids(3, "2025-2026")
                .await
                .unwrap(),
            vec![10]
        );
    }

    #[tokio::test]
    async fn test_advisory_creates_and_records() {
        let service = service(ConflictPolicy::Advisory, false).await;
        service
            .schedule_slot(scheduler(), ScheduleSlotRequest::new(placement(7, 1, 8, 10)))
            .await
            .unwrap();

        let scheduled = service
            .schedule_slot(scheduler(), ScheduleSlotRequest::new(placement(7, 2, 9, 11)))
            .await
            .unwrap();
        assert_eq!(scheduled.conflicts.len(), 2);

        let pending = service.list_slot_conflicts().await.unwrap();
        assert_eq!(pending.len(), 2);
        service.resolve_slot_conflict(pending[0].id).await.unwrap();
        assert_eq!(service.list_slot_conflicts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_force_override_requires_configuration() {
        let locked = service(ConflictPolicy::Strict, false).await;
        let err = locked
            .schedule_slot(scheduler(), ScheduleSlotRequest::forced(placement(7, 1, 8, 10)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "G001");

        let open = service(ConflictPolicy::Strict, true).await;
        open.schedule_slot(scheduler(), ScheduleSlotRequest::new(placement(7, 1, 8, 10)))
            .await
            .unwrap();
        let forced = open
            .schedule_slot(scheduler(), ScheduleSlotRequest::forced(placement(7, 2, 9, 11)))
            .await
            .unwrap();
        assert_eq!(forced.conflicts.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_missing_slot_is_not_found() {
        let service = service(ConflictPolicy::Strict, false).await;
        let err = service.remove_slot(scheduler(), 42).await.unwrap_err();
        assert_eq!(err.code(), "G004");
        let err = service.resolve_slot_conflict(42).await.unwrap_err();
        assert_eq!(err.code(), "G004");
    }
}
