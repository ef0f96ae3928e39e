use std::sync::Arc;

use crate::models::{
    bulletins::entities::{Bulletin, BulletinScope, StudentStanding},
    grades::{
        entities::{GradeRecord, GradeStatus},
        requests::{CreateGradeRecordRequest, GradeTransition, ModifyGradeRequest},
    },
    timetable::entities::{RecordedSlotConflict, ScheduledSlot, SlotPlacement, TimetableSlot},
    users::entities::UserRole,
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 持久化接口
///
/// 不在进程内缓存成绩或课表状态，每次操作都直接读写数据库。
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 成绩记录方法
    // 创建成绩记录（草稿）
    async fn create_grade_record(
        &self,
        submitted_by: i64,
        submitted_by_role: UserRole,
        req: CreateGradeRecordRequest,
    ) -> Result<GradeRecord>;
    // 通过ID获取成绩记录（包含已软删除的记录）
    async fn get_grade_record_by_id(&self, id: i64) -> Result<Option<GradeRecord>>;
    // 比较并交换状态：仅当当前状态等于 expected 时写入，返回是否写入
    async fn transition_grade_record(&self, id: i64, transition: GradeTransition) -> Result<bool>;
    // 修改分值/权重/评语：仅当当前状态属于 editable 时写入，返回是否写入
    async fn modify_grade_record(
        &self,
        id: i64,
        editable: &[GradeStatus],
        update: ModifyGradeRequest,
    ) -> Result<bool>;
    // 列出某学生在指定学期、课程集合内未删除的成绩
    async fn list_student_grade_records(
        &self,
        student_id: i64,
        term: &str,
        academic_year: &str,
        course_ids: &[i64],
    ) -> Result<Vec<GradeRecord>>;
    // 列出指定学期、课程集合内所有学生未删除的成绩
    async fn list_scope_grade_records(
        &self,
        term: &str,
        academic_year: &str,
        course_ids: &[i64],
    ) -> Result<Vec<GradeRecord>>;

    /// 课表方法
    // 在同一事务内检测冲突并创建时段；allow_conflicts 为 false 且存在冲突时返回 Conflict 错误
    async fn schedule_timetable_slot(
        &self,
        created_by: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot>;
    // 在同一事务内检测冲突并修改时段（排除自身）
    async fn reschedule_timetable_slot(
        &self,
        slot_id: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot>;
    // 删除时段
    async fn remove_timetable_slot(&self, slot_id: i64) -> Result<bool>;
    // 通过ID获取时段
    async fn get_timetable_slot_by_id(&self, slot_id: i64) -> Result<Option<TimetableSlot>>;
    // 列出冲突记录
    async fn list_slot_conflicts(&self, unresolved_only: bool) -> Result<Vec<RecordedSlotConflict>>;
    // 将冲突标记为已复核
    async fn resolve_slot_conflict(&self, conflict_id: i64) -> Result<bool>;
    // 列出教师任课的课程
    async fn list_courses_taught_by(&self, teacher_id: i64) -> Result<Vec<i64>>;
    // 列出专业在某学年的课程集合
    async fn list_program_course_ids(&self, program_id: i64, academic_year: &str)
    -> Result<Vec<i64>>;
    // 列出开设该课程的所有专业
    async fn list_programs_for_course(&self, course_id: i64, academic_year: &str)
    -> Result<Vec<i64>>;

    /// 成绩单方法
    // 在同一事务内覆盖整个队列的成绩单，并删除已不再有已审核成绩的学生的成绩单
    async fn replace_cohort_bulletins(
        &self,
        scope: &BulletinScope,
        generated_by: i64,
        standings: Vec<StudentStanding>,
    ) -> Result<Vec<Bulletin>>;
    // 获取学生成绩单
    async fn get_bulletin(&self, student_id: i64, scope: &BulletinScope)
    -> Result<Option<Bulletin>>;
    // 列出范围内所有成绩单
    async fn list_bulletins(&self, scope: &BulletinScope) -> Result<Vec<Bulletin>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
