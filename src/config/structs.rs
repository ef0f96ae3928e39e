use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub timetable: TimetableConfig,
    pub dispatch: DispatchConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
    pub pool_size: u32, // 连接池大小，0 表示按 CPU 核数
    pub timeout: u64,   // 连接超时 (秒)
}

/// 课表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableConfig {
    pub conflict_mode: String, // strict / advisory
    pub allow_override: bool,  // strict 模式下是否允许单次请求强制创建
}

/// 通知与审计分发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub mode: String,          // inline / background
    pub queue_capacity: usize, // background 模式下的队列容量
}
