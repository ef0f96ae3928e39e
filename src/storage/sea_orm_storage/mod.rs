//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod bulletins;
mod grade_records;
mod timetable;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{GradeFlowError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 使用全局配置创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database).await
    }

    /// 按数据库配置连接并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| GradeFlowError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| GradeFlowError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存数据库只能共享一个连接
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            config.pool_size.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| GradeFlowError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size.max(1))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| GradeFlowError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(GradeFlowError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    bulletins::entities::{Bulletin, BulletinScope, StudentStanding},
    grades::{
        entities::{GradeRecord, GradeStatus},
        requests::{CreateGradeRecordRequest, GradeTransition, ModifyGradeRequest},
    },
    timetable::entities::{RecordedSlotConflict, ScheduledSlot, SlotPlacement, TimetableSlot},
    users::entities::UserRole,
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 成绩记录模块
    async fn create_grade_record(
        &self,
        submitted_by: i64,
        submitted_by_role: UserRole,
        req: CreateGradeRecordRequest,
    ) -> Result<GradeRecord> {
        self.create_grade_record_impl(submitted_by, submitted_by_role, req)
            .await
    }

    async fn get_grade_record_by_id(&self, id: i64) -> Result<Option<GradeRecord>> {
        self.get_grade_record_by_id_impl(id).await
    }

    async fn transition_grade_record(&self, id: i64, transition: GradeTransition) -> Result<bool> {
        self.transition_grade_record_impl(id, transition).await
    }

    async fn modify_grade_record(
        &self,
        id: i64,
        editable: &[GradeStatus],
        update: ModifyGradeRequest,
    ) -> Result<bool> {
        self.modify_grade_record_impl(id, editable, update).await
    }

    async fn list_student_grade_records(
        &self,
        student_id: i64,
        term: &str,
        academic_year: &str,
        course_ids: &[i64],
    ) -> Result<Vec<GradeRecord>> {
        self.list_grade_records_impl(Some(student_id), term, academic_year, course_ids)
            .await
    }

    async fn list_scope_grade_records(
        &self,
        term: &str,
        academic_year: &str,
        course_ids: &[i64],
    ) -> Result<Vec<GradeRecord>> {
        self.list_grade_records_impl(None, term, academic_year, course_ids)
            .await
    }

    // 课表模块
    async fn schedule_timetable_slot(
        &self,
        created_by: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot> {
        self.schedule_timetable_slot_impl(created_by, placement, allow_conflicts)
            .await
    }

    async fn reschedule_timetable_slot(
        &self,
        slot_id: i64,
        placement: SlotPlacement,
        allow_conflicts: bool,
    ) -> Result<ScheduledSlot> {
        self.reschedule_timetable_slot_impl(slot_id, placement, allow_conflicts)
            .await
    }

    async fn remove_timetable_slot(&self, slot_id: i64) -> Result<bool> {
        self.remove_timetable_slot_impl(slot_id).await
    }

    async fn get_timetable_slot_by_id(&self, slot_id: i64) -> Result<Option<TimetableSlot>> {
        self.get_timetable_slot_by_id_impl(slot_id).await
    }

    async fn list_slot_conflicts(&self, unresolved_only: bool) -> Result<Vec<RecordedSlotConflict>> {
        self.list_slot_conflicts_impl(unresolved_only).await
    }

    async fn resolve_slot_conflict(&self, conflict_id: i64) -> Result<bool> {
        self.resolve_slot_conflict_impl(conflict_id).await
    }

    async fn list_courses_taught_by(&self, teacher_id: i64) -> Result<Vec<i64>> {
        self.list_courses_taught_by_impl(teacher_id).await
    }

    async fn list_program_course_ids(
        &self,
        program_id: i64,
        academic_year: &str,
    ) -> Result<Vec<i64>> {
        self.list_program_course_ids_impl(program_id, academic_year)
            .await
    }

    async fn list_programs_for_course(
        &self,
        course_id: i64,
        academic_year: &str,
    ) -> Result<Vec<i64>> {
        self.list_programs_for_course_impl(course_id, academic_year)
            .await
    }

    // 成绩单模块
    async fn replace_cohort_bulletins(
        &self,
        scope: &BulletinScope,
        generated_by: i64,
        standings: Vec<StudentStanding>,
    ) -> Result<Vec<Bulletin>> {
        self.replace_cohort_bulletins_impl(scope, generated_by, standings)
            .await
    }

    async fn get_bulletin(
        &self,
        student_id: i64,
        scope: &BulletinScope,
    ) -> Result<Option<Bulletin>> {
        self.get_bulletin_impl(student_id, scope).await
    }

    async fn list_bulletins(&self, scope: &BulletinScope) -> Result<Vec<Bulletin>> {
        self.list_bulletins_impl(scope).await
    }
}
