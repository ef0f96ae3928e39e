use tokio::signal;
use tracing::{error, warn};

use crate::services::SideEffectDispatcher;

pub async fn listen_for_shutdown() {
    // 等待 Ctrl+C 信号
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}

/// 等待后台队列中的通知和审计处理完毕
pub async fn drain_side_effects(dispatcher: &SideEffectDispatcher) {
    dispatcher.shutdown().await;
    warn!(
        "Graceful shutdown: side effects drained ({} dropped while running)",
        dispatcher.dropped_count()
    );
}
