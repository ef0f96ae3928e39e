use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::ports::{StorageTeachingAssignments, TracingAuditLog, TracingNotificationSink};
use crate::services::{OrchestratorSettings, SideEffectDispatcher, WorkflowOrchestrator};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub dispatcher: Arc<SideEffectDispatcher>,
    pub orchestrator: Arc<WorkflowOrchestrator>,
}

/// 创建通知/审计分发器
fn create_dispatcher(settings: &OrchestratorSettings) -> Arc<SideEffectDispatcher> {
    let dispatcher = SideEffectDispatcher::new(
        settings.dispatch_mode,
        Arc::new(TracingNotificationSink),
        Arc::new(TracingAuditLog),
        settings.queue_capacity,
    );
    warn!(
        "Side-effect dispatcher started in {} mode (queue capacity {})",
        settings.dispatch_mode, settings.queue_capacity
    );
    Arc::new(dispatcher)
}

/// 准备启动上下文
/// 包括存储、迁移、分发器和编排器
pub async fn prepare_startup() -> Result<StartupContext> {
    // 数据库 TLS 连接使用 ring 作为加密后端
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config = AppConfig::get();
    let settings = OrchestratorSettings::from_config(config)?;
    debug!("Orchestrator settings: {:?}", settings);

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let dispatcher = create_dispatcher(&settings);
    let assignments = Arc::new(StorageTeachingAssignments::new(storage.clone()));

    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        storage.clone(),
        assignments,
        dispatcher.clone(),
        &settings,
    ));
    warn!(
        "Workflow orchestrator ready (conflict mode: {}, override allowed: {})",
        settings.conflict_policy, settings.allow_override
    );

    Ok(StartupContext {
        storage,
        dispatcher,
        orchestrator,
    })
}
