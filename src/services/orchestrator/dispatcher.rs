//! 通知与审计的分发
//!
//! 分发永远不会让主流程失败：inline 模式等待结果并记录错误，
//! background 模式投递到有界队列，由单个后台任务依次处理。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::models::notifications::entities::{AuditEntry, Notice};
use crate::services::ports::{AuditLog, NotificationSink};

/// 分发模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    Inline,
    #[default]
    Background,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Inline => write!(f, "inline"),
            DispatchMode::Background => write!(f, "background"),
        }
    }
}

impl std::str::FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(DispatchMode::Inline),
            "background" => Ok(DispatchMode::Background),
            _ => Err(format!(
                "Invalid dispatch mode: {s}. Supported: inline, background"
            )),
        }
    }
}

/// 一次待执行的副作用
#[derive(Debug, Clone)]
pub enum SideEffect {
    Notify(Notice),
    Audit(AuditEntry),
}

#[derive(Clone)]
struct Ports {
    sink: Arc<dyn NotificationSink>,
    audit: Arc<dyn AuditLog>,
}

impl Ports {
    async fn deliver(&self, effect: SideEffect) {
        match effect {
            SideEffect::Notify(notice) => {
                let notification_type = notice.notification_type;
                let role = notice.role;
                if let Err(e) = self.sink.notify(notice).await {
                    error!(
                        "Failed to deliver {} notification to {}: {}",
                        notification_type, role, e
                    );
                }
            }
            SideEffect::Audit(entry) => {
                let action = entry.action.clone();
                let target_id = entry.target_id;
                if let Err(e) = self.audit.record(entry).await {
                    error!(
                        "Failed to record audit entry {} for target {}: {}",
                        action, target_id, e
                    );
                }
            }
        }
    }
}

pub struct SideEffectDispatcher {
    mode: DispatchMode,
    ports: Ports,
    sender: Mutex<Option<mpsc::Sender<SideEffect>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl SideEffectDispatcher {
    /// 调用方直接等待分发结果
    pub fn inline(sink: Arc<dyn NotificationSink>, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            mode: DispatchMode::Inline,
            ports: Ports { sink, audit },
            sender: Mutex::new(None),
            worker: Mutex::new(None),
            dropped: AtomicU64::new(0),
        }
    }

    /// 启动后台任务，必须在 tokio 运行时内调用
    pub fn background(
        sink: Arc<dyn NotificationSink>,
        audit: Arc<dyn AuditLog>,
        capacity: usize,
    ) -> Self {
        let ports = Ports { sink, audit };
        let (tx, mut rx) = mpsc::channel::<SideEffect>(capacity.max(1));

        let worker_ports = ports.clone();
        let worker = tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                worker_ports.deliver(effect).await;
            }
            debug!("Side-effect worker stopped");
        });

        Self {
            mode: DispatchMode::Background,
            ports,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn new(
        mode: DispatchMode,
        sink: Arc<dyn NotificationSink>,
        audit: Arc<dyn AuditLog>,
        capacity: usize,
    ) -> Self {
        match mode {
            DispatchMode::Inline => Self::inline(sink, audit),
            DispatchMode::Background => Self::background(sink, audit, capacity),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// 因队列已满而丢弃的副作用数量
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 分发一个副作用，不返回错误
    pub async fn dispatch(&self, effect: SideEffect) {
        if self.mode == DispatchMode::Inline {
            self.ports.deliver(effect).await;
            return;
        }

        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let Some(sender) = sender else {
            // 已关闭，直接在当前任务中处理
            debug!("Dispatcher already shut down, delivering inline");
            self.ports.deliver(effect).await;
            return;
        };

        match sender.try_send(effect) {
            Ok(()) => {}
            Err(TrySendError::Full(effect)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Side-effect queue full, dropping {:?}", effect);
            }
            Err(TrySendError::Closed(effect)) => {
                warn!("Side-effect worker gone, delivering inline");
                self.ports.deliver(effect).await;
            }
        }
    }

    pub async fn notify(&self, notice: Notice) {
        self.dispatch(SideEffect::Notify(notice)).await;
    }

    pub async fn audit(&self, entry: AuditEntry) {
        self.dispatch(SideEffect::Audit(entry)).await;
    }

    /// 关闭队列并等待已排队的副作用处理完毕
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!("Side-effect worker terminated abnormally: {}", e);
            }
            warn!("Side-effect queue drained");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::users::entities::UserRole;
    use crate::services::ports::testing::{FailingSink, RecordingAudit, RecordingSink};
    use serde_json::json;

    fn notice(title: &str) -> Notice {
        Notice {
            role: UserRole::Student,
            notification_type: NotificationType::GradeValidated,
            title: title.to_string(),
            message: String::new(),
            metadata: json!({}),
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("inline".parse::<DispatchMode>(), Ok(DispatchMode::Inline));
        assert_eq!(
            "BACKGROUND".parse::<DispatchMode>(),
            Ok(DispatchMode::Background)
        );
        assert!("queue".parse::<DispatchMode>().is_err());
    }

    #[tokio::test]
    async fn test_inline_swallows_port_errors() {
        let audit = Arc::new(RecordingAudit::default());
        let dispatcher = SideEffectDispatcher::inline(Arc::new(FailingSink), audit.clone());

        dispatcher.notify(notice("a")).await;
        dispatcher
            .audit(AuditEntry {
                actor_id: 1,
                action: "grade.validate".into(),
                target_id: 5,
                details: json!({}),
            })
            .await;

        assert_eq!(audit.actions(), vec!["grade.validate".to_string()]);
    }

    #[tokio::test]
    async fn test_background_drains_on_shutdown() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = SideEffectDispatcher::background(
            sink.clone(),
            Arc::new(RecordingAudit::default()),
            8,
        );

        for title in ["a", "b", "c"] {
            dispatcher.notify(notice(title)).await;
        }
        dispatcher.shutdown().await;

        let titles: Vec<String> = sink.taken().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        // 关闭后仍然可以分发
        dispatcher.notify(notice("d")).await;
        assert_eq!(sink.taken().len(), 4);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = SideEffectDispatcher::background(
            sink.clone(),
            Arc::new(RecordingAudit::default()),
            1,
        );

        // 单线程运行时下后台任务尚未运行，第二条必然被丢弃
        dispatcher.notify(notice("kept")).await;
        dispatcher.notify(notice("dropped")).await;
        assert_eq!(dispatcher.dropped_count(), 1);

        dispatcher.shutdown().await;
        let titles: Vec<String> = sink.taken().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["kept"]);
    }
}
