//! 课表存储操作
//!
//! 冲突检测与写入在同一事务内完成，避免两个并发排课请求都通过检测。

use super::SeaOrmStorage;
use crate::entity::prelude::{SlotConflicts, TimetableSlots};
use crate::entity::slot_conflicts::{ActiveModel as ConflictActiveModel, Column as ConflictColumn};
use crate::entity::timetable_slots::{ActiveModel, Column, time_to_column, weekday_to_column};
use crate::errors::{GradeFlowError, Result};
use crate::models::timetable::{
    entities::{RecordedSlotConflict, ScheduledSlot, SlotConflict, SlotPlacement, TimetableSlot},
    requests::validate_placement,
};
use crate::services::conflicts::detect_conflicts;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend,
    DatabaseTransaction, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::debug;

/// 冲突错误信息，列出每个维度及对应的已有时段
fn conflict_error(conflicts: &[SlotConflict]) -> GradeFlowError {
    let details = conflicts
        .iter()
        .map(|c| format!("{}(slot {})", c.dimension, c.conflicting_slot.id))
        .collect::<Vec<_>>()
        .join(", ");
    GradeFlowError::conflict(format!("时段与已有安排冲突: {details}"))
}

impl SeaOrmStorage {
    /// 开启排课事务；SQLite 的写事务本身串行，不设置隔离级别
    async fn begin_scheduling_txn(&self) -> Result<DatabaseTransaction> {
        let isolation = match self.db.get_database_backend() {
            DatabaseBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        };
        self.db
            .begin_with_config(isolation, None)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("开启排课事务失败: {e}")))
    }

    /// 读取与候选时段同一天（星期、周次、学年）的所有时段
    async fn load_day_slots<C: ConnectionTrait>(
        db: &C,
        placement: &SlotPlacement,
    ) -> Result<Vec<TimetableSlot>> {
        let models = TimetableSlots::find()
            .filter(Column::AcademicYear.eq(placement.academic_year.as_str()))
            .filter(Column::WeekNumber.eq(placement.week_number as i32))
            .filter(Column::DayOfWeek.eq(weekday_to_column(placement.day_of_week)))
            .order_by_asc(Column::StartMinute)
            .all(db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询当日课表失败: {e}")))?;

        models.into_iter().map(|m| m.into_slot()).collect()
    }

    /// 写入冲突记录供后续复核
    async fn record_conflicts<C: ConnectionTrait>(
        db: &C,
        slot_id: i64,
        conflicts: &[SlotConflict],
        now: i64,
    ) -> Result<()> {
        for conflict in conflicts {
            let model = ConflictActiveModel {
                slot_id: Set(slot_id),
                conflicting_slot_id: Set(conflict.conflicting_slot.id),
                dimension: Set(conflict.dimension.to_string()),
                detected_at: Set(now),
                resolved: Set(false),
                ..Default::default()
            };
            model
                .insert(db)
                .await
                .map_err(|e| GradeFlowError::database_operation(format!("记录课表冲突失败: {e}")))?;
        }
        Ok(())
    }

    /// 检测冲突并创建时段
    pub async fn schedule_timetable_slot_impl(
        &self,
        created_by: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot> {
        validate_placement(&placement)?;

        let txn = self.begin_scheduling_txn().await?;

        let existing = Self::load_day_slots(&txn, &placement).await?;
        let conflicts = detect_conflicts(&placement, None, &existing);
        if !conflicts.is_empty() && !allow_conflicts {
            txn.rollback()
                .await
                .map_err(|e| GradeFlowError::database_operation(format!("回滚排课事务失败: {e}")))?;
            return Err(conflict_error(&conflicts));
        }

        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            course_id: Set(placement.course_id),
            teacher_id: Set(placement.teacher_id),
            room_id: Set(placement.room_id),
            program_id: Set(placement.program_id),
            day_of_week: Set(weekday_to_column(placement.day_of_week)),
            start_minute: Set(time_to_column(placement.start_time)),
            end_minute: Set(time_to_column(placement.end_time)),
            week_number: Set(placement.week_number as i32),
            academic_year: Set(placement.academic_year.clone()),
            slot_type: Set(placement.slot_type.to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("创建课表时段失败: {e}")))?;

        Self::record_conflicts(&txn, inserted.id, &conflicts, now).await?;

        txn.commit()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("提交排课事务失败: {e}")))?;

        debug!(
            "Scheduled slot {} with {} recorded conflict(s)",
            inserted.id,
            conflicts.len()
        );

        Ok(ScheduledSlot {
            slot: inserted.into_slot()?,
            conflicts,
        })
    }

    /// 检测冲突并修改已有时段（不与自身比较）
    pub async fn reschedule_timetable_slot_impl(
        &self,
        slot_id: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot> {
        validate_placement(&placement)?;

        let txn = self.begin_scheduling_txn().await?;

        let current = TimetableSlots::find_by_id(slot_id)
            .one(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询课表时段失败: {e}")))?
            .ok_or_else(|| GradeFlowError::not_found(format!("课表时段 {slot_id} 不存在")))?;

        let existing = Self::load_day_slots(&txn, &placement).await?;
        let conflicts = detect_conflicts(&placement, Some(slot_id), &existing);
        if !conflicts.is_empty() && !allow_conflicts {
            txn.rollback()
                .await
                .map_err(|e| GradeFlowError::database_operation(format!("回滚排课事务失败: {e}")))?;
            return Err(conflict_error(&conflicts));
        }

        let now = chrono::Utc::now().timestamp();

        let mut model: ActiveModel = current.into();
        model.course_id = Set(placement.course_id);
        model.teacher_id = Set(placement.teacher_id);
        model.room_id = Set(placement.room_id);
        model.program_id = Set(placement.program_id);
        model.day_of_week = Set(weekday_to_column(placement.day_of_week));
        model.start_minute = Set(time_to_column(placement.start_time));
        model.end_minute = Set(time_to_column(placement.end_time));
        model.week_number = Set(placement.week_number as i32);
        model.academic_year = Set(placement.academic_year.clone());
        model.slot_type = Set(placement.slot_type.to_string());
        model.updated_at = Set(now);

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("修改课表时段失败: {e}")))?;

        // 旧位置上记录的冲突已失效
        SlotConflicts::delete_many()
            .filter(ConflictColumn::SlotId.eq(slot_id))
            .exec(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("清理冲突记录失败: {e}")))?;
        Self::record_conflicts(&txn, slot_id, &conflicts, now).await?;

        txn.commit()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("提交排课事务失败: {e}")))?;

        Ok(ScheduledSlot {
            slot: updated.into_slot()?,
            conflicts,
        })
    }

    /// 删除时段及其相关冲突记录
    pub async fn remove_timetable_slot_impl(&self, slot_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("开启事务失败: {e}")))?;

        SlotConflicts::delete_many()
            .filter(
                Condition::any()
                    .add(ConflictColumn::SlotId.eq(slot_id))
                    .add(ConflictColumn::ConflictingSlotId.eq(slot_id)),
            )
            .exec(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("删除冲突记录失败: {e}")))?;

        let result = TimetableSlots::delete_by_id(slot_id)
            .exec(&txn)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("删除课表时段失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 通过 ID 获取时段
    pub async fn get_timetable_slot_by_id_impl(&self, slot_id: i64) -> Result<Option<TimetableSlot>> {
        let result = TimetableSlots::find_by_id(slot_id)
            .one(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询课表时段失败: {e}")))?;

        result.map(|m| m.into_slot()).transpose()
    }

    /// 列出冲突记录
    pub async fn list_slot_conflicts_impl(
        &self,
        unresolved_only: bool,
    ) -> Result<Vec<RecordedSlotConflict>> {
        let mut select = SlotConflicts::find();

        // 未复核筛选
        if unresolved_only {
            select = select.filter(ConflictColumn::Resolved.eq(false));
        }

        let conflicts = select
            .order_by_desc(ConflictColumn::DetectedAt)
            .order_by_asc(ConflictColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询冲突记录失败: {e}")))?;

        conflicts
            .into_iter()
            .map(|m| m.into_recorded_conflict())
            .collect()
    }

    /// 标记冲突为已复核
    pub async fn resolve_slot_conflict_impl(&self, conflict_id: i64) -> Result<bool> {
        let result = SlotConflicts::update_many()
            .col_expr(ConflictColumn::Resolved, Expr::value(true))
            .filter(ConflictColumn::Id.eq(conflict_id))
            .exec(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("复核冲突失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 教师在课表中出现过的课程即为其任课课程
    pub async fn list_courses_taught_by_impl(&self, teacher_id: i64) -> Result<Vec<i64>> {
        TimetableSlots::find()
            .select_only()
            .column(Column::CourseId)
            .distinct()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::CourseId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询任课课程失败: {e}")))
    }

    /// 专业在某学年课表中出现过的课程集合
    pub async fn list_program_course_ids_impl(
        &self,
        program_id: i64,
        academic_year: &str,
    ) -> Result<Vec<i64>> {
        TimetableSlots::find()
            .select_only()
            .column(Column::CourseId)
            .distinct()
            .filter(Column::ProgramId.eq(program_id))
            .filter(Column::AcademicYear.eq(academic_year))
            .order_by_asc(Column::CourseId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询专业课程失败: {e}")))
    }

    /// 某学年课表中开设该课程的所有专业
    pub async fn list_programs_for_course_impl(
        &self,
        course_id: i64,
        academic_year: &str,
    ) -> Result<Vec<i64>> {
        TimetableSlots::find()
            .select_only()
            .column(Column::ProgramId)
            .distinct()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::AcademicYear.eq(academic_year))
            .order_by_asc(Column::ProgramId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("查询课程所属专业失败: {e}")))
    }
}
