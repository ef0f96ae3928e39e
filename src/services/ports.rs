//! 外部协作方接口
//!
//! 任课查询、通知、审计和成绩单渲染都通过这些 trait 注入，
//! 核心流程只依赖接口，不依赖具体实现。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::errors::Result;
use crate::models::bulletins::entities::Bulletin;
use crate::models::grades::entities::GradeRecord;
use crate::models::notifications::entities::{AuditEntry, Notice};
use crate::storage::Storage;

/// 任课关系查询
#[async_trait]
pub trait TeachingAssignments: Send + Sync {
    /// 教师被授权录入成绩的课程
    async fn authorized_courses(&self, teacher_id: i64) -> Result<HashSet<i64>>;
}

/// 通知发送（尽力而为）
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notice: Notice) -> Result<()>;
}

/// 审计记录（尽力而为）
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// 成绩单文档渲染，由外部系统实现
#[async_trait]
pub trait BulletinRenderer: Send + Sync {
    async fn render_bulletin(&self, bulletin: &Bulletin, grades: &[GradeRecord])
    -> Result<Vec<u8>>;
}

/// 以课表为准的任课关系：教师出现在哪些课程的时段中
pub struct StorageTeachingAssignments {
    storage: Arc<dyn Storage>,
}

impl StorageTeachingAssignments {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TeachingAssignments for StorageTeachingAssignments {
    async fn authorized_courses(&self, teacher_id: i64) -> Result<HashSet<i64>> {
        let courses = self.storage.list_courses_taught_by(teacher_id).await?;
        Ok(courses.into_iter().collect())
    }
}

/// 写入日志的通知实现
#[derive(Debug, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notice: Notice) -> Result<()> {
        info!(
            role = %notice.role,
            notification_type = %notice.notification_type,
            metadata = %notice.metadata,
            "{}: {}",
            notice.title,
            notice.message
        );
        Ok(())
    }
}

/// 写入日志的审计实现
#[derive(Debug, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        info!(
            actor_id = entry.actor_id,
            target_id = entry.target_id,
            details = %entry.details,
            "audit: {}",
            entry.action
        );
        Ok(())
    }
}
