use std::sync::Arc;

use chrono::{NaiveTime, Weekday};

use super::*;
use crate::models::grades::entities::EvaluationType;
use crate::models::grades::requests::CreateGradeRecordRequest;
use crate::models::notifications::entities::NotificationType;
use crate::models::timetable::{
    entities::{SlotPlacement, SlotType},
    requests::ScheduleSlotRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ports::testing::{FailingSink, RecordingAudit, RecordingSink, TextRenderer};
use crate::services::ports::{NotificationSink, StorageTeachingAssignments};
use crate::storage::sea_orm_storage::test_support::memory_storage;

const ADMIN: Actor = Actor {
    id: 1,
    role: UserRole::Admin,
};
const TEACHER: Actor = Actor {
    id: 7,
    role: UserRole::Teacher,
};
const DIRECTOR: Actor = Actor {
    id: 30,
    role: UserRole::Director,
};

struct Harness {
    orchestrator: WorkflowOrchestrator,
    storage: Arc<dyn Storage>,
    audit: Arc<RecordingAudit>,
}

async fn harness(sink: Arc<dyn NotificationSink>, policy: ConflictPolicy) -> Harness {
    let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
    let audit = Arc::new(RecordingAudit::default());
    let dispatcher = Arc::new(SideEffectDispatcher::inline(sink, audit.clone()));
    let settings = OrchestratorSettings {
        conflict_policy: policy,
        ..OrchestratorSettings::default()
    };
    let orchestrator = WorkflowOrchestrator::new(
        storage.clone(),
        Arc::new(StorageTeachingAssignments::new(storage.clone())),
        dispatcher,
        &settings,
    );

    // 教师 7 在专业 3 教授课程 10
    orchestrator
        .schedule_slot(ADMIN, ScheduleSlotRequest::new(placement(7, 1, 8, 10)))
        .await
        .unwrap();

    Harness {
        orchestrator,
        storage,
        audit,
    }
}

fn placement(teacher: i64, room: i64, start: u32, end: u32) -> SlotPlacement {
    SlotPlacement {
        course_id: 10,
        teacher_id: teacher,
        room_id: room,
        program_id: 3,
        day_of_week: Weekday::Mon,
        start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        week_number: 1,
        academic_year: "2025-2026".into(),
        slot_type: SlotType::Lecture,
    }
}

fn request(student_id: i64, value: f64, weight: f64) -> CreateGradeRecordRequest {
    CreateGradeRecordRequest {
        student_id,
        course_id: 10,
        evaluation_type: EvaluationType::Midterm,
        value,
        weight,
        term: "S1".into(),
        academic_year: "2025-2026".into(),
        comment: None,
    }
}

fn scope() -> BulletinScope {
    BulletinScope::new(3, "S1", "2025-2026")
}

// (专业, 是否有资格, 是否新获得资格)
fn refreshed(scopes: &[(i64, bool, bool)]) -> AggregateRefresh {
    AggregateRefresh::Refreshed(
        scopes
            .iter()
            .map(|&(program_id, eligible, newly_eligible)| ScopeRefresh {
                scope: BulletinScope::new(program_id, "S1", "2025-2026"),
                eligible,
                newly_eligible,
            })
            .collect(),
    )
}

fn notified(sink: &RecordingSink, kind: NotificationType) -> Vec<UserRole> {
    sink.taken()
        .into_iter()
        .filter(|n| n.notification_type == kind)
        .map(|n| n.role)
        .collect()
}

#[tokio::test]
async fn test_end_to_end_grade_approval() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    let err = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 21.0, 2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, GradeFlowError::Validation(_)));

    let submitted = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 14.0, 2.0))
        .await
        .unwrap();
    assert_eq!(submitted.record().status, GradeStatus::PendingValidation);
    assert_eq!(submitted.aggregates, AggregateRefresh::NotRequired);
    assert_eq!(
        notified(&sink, NotificationType::GradeSubmitted),
        vec![UserRole::DepartmentHead]
    );

    let grade_id = submitted.record().id;
    let validated = h.orchestrator.validate(DIRECTOR, grade_id).await.unwrap();
    assert_eq!(validated.record().status, GradeStatus::Validated);
    assert_eq!(validated.record().validated_by, Some(DIRECTOR.id));
    assert_eq!(
        validated.aggregates,
        refreshed(&[(3, true, true)])
    );
    assert_eq!(
        notified(&sink, NotificationType::GradeValidated),
        vec![UserRole::Student]
    );
    assert_eq!(
        notified(&sink, NotificationType::BulletinEligible),
        vec![UserRole::Director]
    );

    let err = h
        .orchestrator
        .validate(DIRECTOR, grade_id)
        .await
        .unwrap_err();
    assert!(matches!(err, GradeFlowError::StateTransition(_)));

    let bulletin = h
        .orchestrator
        .bulletins()
        .get_bulletin(100, &scope())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bulletin.average, Some(14.0));
    assert_eq!(bulletin.rank, Some(1));

    let actions = h.audit.actions();
    assert!(actions.contains(&"grade.submit".to_string()));
    assert!(actions.contains(&"grade.validate".to_string()));
}

#[tokio::test]
async fn test_failing_sink_does_not_fail_validation() {
    let h = harness(Arc::new(FailingSink), ConflictPolicy::Strict).await;

    let submitted = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 12.0, 1.0))
        .await
        .unwrap();
    let outcome = h
        .orchestrator
        .validate(DIRECTOR, submitted.record().id)
        .await
        .unwrap();
    assert_eq!(outcome.record().status, GradeStatus::Validated);

    let stored = h
        .storage
        .get_grade_record_by_id(submitted.record().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, GradeStatus::Validated);
    assert!(h.audit.actions().contains(&"grade.validate".to_string()));
}

#[tokio::test]
async fn test_batch_validate_runs_side_effects_per_item() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    let mut ids = Vec::new();
    for student in [100, 101, 102] {
        let outcome = h
            .orchestrator
            .create_and_submit(TEACHER, request(student, 12.0, 1.0))
            .await
            .unwrap();
        ids.push(outcome.record().id);
    }
    h.orchestrator.validate(DIRECTOR, ids[1]).await.unwrap();

    let report = h.orchestrator.batch_validate(DIRECTOR, &ids).await;
    assert_eq!(report.counts(), (2, 1));
    assert_eq!(report.validated, vec![ids[0], ids[2]]);

    assert_eq!(notified(&sink, NotificationType::GradeValidated).len(), 3);
    let bulletins = h.orchestrator.bulletins().list_bulletins(&scope()).await.unwrap();
    assert_eq!(bulletins.len(), 3);
    assert!(bulletins.iter().all(|b| b.rank == Some(1) && b.cohort_size == 3));
}

#[tokio::test]
async fn test_reopen_removes_grade_from_average() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    let mut ids = Vec::new();
    for (value, weight) in [(15.0, 2.0), (10.0, 1.0)] {
        let outcome = h
            .orchestrator
            .create_and_submit(TEACHER, request(100, value, weight))
            .await
            .unwrap();
        h.orchestrator
            .validate(DIRECTOR, outcome.record().id)
            .await
            .unwrap();
        ids.push(outcome.record().id);
    }
    let average = h.orchestrator.average(100, &scope()).await.unwrap().unwrap();
    assert!((average - 40.0 / 3.0).abs() < 1e-9);

    let reopened = h
        .orchestrator
        .reopen(DIRECTOR, ids[1], "score entered twice")
        .await
        .unwrap();
    assert_eq!(
        reopened.aggregates,
        refreshed(&[(3, false, false)])
    );
    assert_eq!(h.orchestrator.average(100, &scope()).await.unwrap(), Some(15.0));
    assert_eq!(
        notified(&sink, NotificationType::GradeReopened),
        vec![UserRole::Teacher, UserRole::Student]
    );

    let bulletin = h
        .orchestrator
        .bulletins()
        .get_bulletin(100, &scope())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bulletin.average, Some(15.0));
    assert!(!bulletin.eligible);

    // 没有已审核成绩后成绩单被删除
    h.orchestrator
        .reopen(DIRECTOR, ids[0], "recount")
        .await
        .unwrap();
    assert_eq!(h.orchestrator.average(100, &scope()).await.unwrap(), None);
    assert!(h
        .orchestrator
        .bulletins()
        .get_bulletin(100, &scope())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_refresh_student_aggregates_is_repeatable() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    let outcome = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 16.0, 1.0))
        .await
        .unwrap();
    let grade_id = outcome.record().id;
    h.orchestrator.validate(DIRECTOR, grade_id).await.unwrap();

    for _ in 0..2 {
        let refresh = h
            .orchestrator
            .refresh_student_aggregates(DIRECTOR, grade_id)
            .await
            .unwrap();
        assert_eq!(
            refresh,
            refreshed(&[(3, true, false)])
        );
    }
    assert_eq!(notified(&sink, NotificationType::BulletinEligible).len(), 1);

    let err = h
        .orchestrator
        .refresh_student_aggregates(DIRECTOR, 9999)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "G004");
}

#[tokio::test]
async fn test_concurrent_validation_through_orchestrator() {
    let h = harness(Arc::new(RecordingSink::default()), ConflictPolicy::Strict).await;
    let grade_id = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 11.0, 1.0))
        .await
        .unwrap()
        .record()
        .id;

    let (a, b) = tokio::join!(
        h.orchestrator.validate(DIRECTOR, grade_id),
        h.orchestrator.validate(DIRECTOR, grade_id)
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
}

#[tokio::test]
async fn test_advisory_conflicts_notify_admin() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Advisory).await;

    let scheduled = h
        .orchestrator
        .schedule_slot(ADMIN, ScheduleSlotRequest::new(placement(7, 2, 9, 11)))
        .await
        .unwrap();
    assert!(!scheduled.conflicts.is_empty());
    assert_eq!(
        notified(&sink, NotificationType::TimetableConflict),
        vec![UserRole::Admin]
    );

    let pending = h.orchestrator.list_slot_conflicts().await.unwrap();
    assert_eq!(pending.len(), scheduled.conflicts.len());
    h.orchestrator
        .resolve_slot_conflict(ADMIN, pending[0].id)
        .await
        .unwrap();

    h.orchestrator
        .remove_slot(ADMIN, scheduled.slot.id)
        .await
        .unwrap();
    assert!(h.orchestrator.list_slot_conflicts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_strict_conflicts_are_refused() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    let err = h
        .orchestrator
        .schedule_slot(ADMIN, ScheduleSlotRequest::new(placement(7, 2, 9, 11)))
        .await
        .unwrap_err();
    assert!(matches!(err, GradeFlowError::Conflict(_)));
    assert!(notified(&sink, NotificationType::TimetableConflict).is_empty());

    // 首尾相接不冲突
    let touching = h
        .orchestrator
        .schedule_slot(ADMIN, ScheduleSlotRequest::new(placement(7, 1, 10, 12)))
        .await
        .unwrap();
    assert!(touching.conflicts.is_empty());
}

#[tokio::test]
async fn test_shared_course_refreshes_every_program() {
    let sink = Arc::new(RecordingSink::default());
    let h = harness(sink.clone(), ConflictPolicy::Strict).await;

    // 课程 10 同时在专业 5 开设，课程 20 只在专业 5 开设
    let mut shared = placement(8, 2, 13, 15);
    shared.program_id = 5;
    let mut program_only = placement(7, 3, 15, 17);
    program_only.program_id = 5;
    program_only.course_id = 20;
    for slot in [shared, program_only] {
        h.orchestrator
            .schedule_slot(ADMIN, ScheduleSlotRequest::new(slot))
            .await
            .unwrap();
    }
    let program5 = BulletinScope::new(5, "S1", "2025-2026");

    let mut other_course = request(200, 10.0, 1.0);
    other_course.course_id = 20;
    let first = h
        .orchestrator
        .create_and_submit(TEACHER, other_course)
        .await
        .unwrap();
    let first = h
        .orchestrator
        .validate(DIRECTOR, first.record().id)
        .await
        .unwrap();
    assert_eq!(first.aggregates, refreshed(&[(5, true, true)]));

    let second = h
        .orchestrator
        .create_and_submit(TEACHER, request(200, 20.0, 1.0))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .validate(DIRECTOR, second.record().id)
        .await
        .unwrap();
    assert_eq!(
        second.aggregates,
        refreshed(&[(3, true, true), (5, true, false)])
    );

    // 两个专业的成绩单都与实时计算一致
    let in_program5 = h
        .orchestrator
        .bulletins()
        .get_bulletin(200, &program5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(in_program5.average, Some(15.0));
    assert_eq!(
        h.orchestrator.average(200, &program5).await.unwrap(),
        Some(15.0)
    );

    let in_program3 = h
        .orchestrator
        .bulletins()
        .get_bulletin(200, &scope())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(in_program3.average, Some(20.0));
    assert!(in_program3.eligible);

    let eligible_notices = sink
        .taken()
        .into_iter()
        .filter(|n| n.notification_type == NotificationType::BulletinEligible)
        .count();
    assert_eq!(eligible_notices, 2);
}

#[tokio::test]
async fn test_render_bulletin_through_renderer() {
    let h = harness(Arc::new(RecordingSink::default()), ConflictPolicy::Strict).await;

    let first = h
        .orchestrator
        .create_and_submit(TEACHER, request(100, 15.0, 2.0))
        .await
        .unwrap();
    h.orchestrator
        .validate(DIRECTOR, first.record().id)
        .await
        .unwrap();

    // 未注入渲染器
    let err = h
        .orchestrator
        .render_bulletin(DIRECTOR, 100, &scope())
        .await
        .unwrap_err();
    assert!(matches!(err, GradeFlowError::Configuration(_)));

    let Harness {
        orchestrator,
        audit,
        ..
    } = h;
    let orchestrator = orchestrator.with_renderer(Arc::new(TextRenderer));

    let document = orchestrator
        .render_bulletin(DIRECTOR, 100, &scope())
        .await
        .unwrap();
    assert_eq!(String::from_utf8(document).unwrap(), "100 15.00 1/1 1");
    assert!(audit.actions().contains(&"bulletin.render".to_string()));

    let err = orchestrator
        .render_bulletin(DIRECTOR, 101, &scope())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "G004");

    // 有待审核成绩时不能生成
    orchestrator
        .create_and_submit(TEACHER, request(100, 9.0, 1.0))
        .await
        .unwrap();
    orchestrator
        .refresh_student_aggregates(DIRECTOR, first.record().id)
        .await
        .unwrap();
    let err = orchestrator
        .render_bulletin(DIRECTOR, 100, &scope())
        .await
        .unwrap_err();
    assert!(matches!(err, GradeFlowError::Validation(_)));
}
