use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;
use crate::services::conflicts::ConflictPolicy;
use crate::services::orchestrator::DispatchMode;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("GRADEFLOW")
                    .separator("_")
                    .try_parsing(true),
            );

        // 支持从环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option(
                "timetable.conflict_mode",
                std::env::var("CONFLICT_MODE").ok(),
            )?
            .set_override_option("dispatch.mode", std::env::var("DISPATCH_MODE").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理连接池大小
        if app_config.database.pool_size == 0 {
            app_config.database.pool_size = num_cpus::get() as u32;
        }

        // 尽早拒绝无法识别的模式，避免运行时静默回退
        app_config
            .conflict_policy()
            .map_err(ConfigError::Message)?;
        app_config.dispatch_mode().map_err(ConfigError::Message)?;

        Ok(app_config)
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 课表冲突策略
    pub fn conflict_policy(&self) -> Result<ConflictPolicy, String> {
        self.timetable.conflict_mode.parse::<ConflictPolicy>()
    }

    /// 通知/审计分发模式
    pub fn dispatch_mode(&self) -> Result<DispatchMode, String> {
        self.dispatch.mode.parse::<DispatchMode>()
    }
}
