//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 业务错误（校验、状态流转、课表冲突、资源不存在）与基础设施错误分开编码，
//! 调用方可以通过 [`GradeFlowError::is_infrastructure`] 区分。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_gradeflow_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum GradeFlowError {
            $($variant(String),)*
        }

        impl GradeFlowError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(GradeFlowError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(GradeFlowError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(GradeFlowError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl GradeFlowError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        GradeFlowError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_gradeflow_errors! {
    Validation("G001", "Validation Error"),
    StateTransition("G002", "State Transition Error"),
    Conflict("G003", "Timetable Conflict Error"),
    NotFound("G004", "Resource Not Found"),
    DatabaseConfig("G101", "Database Configuration Error"),
    DatabaseConnection("G102", "Database Connection Error"),
    DatabaseOperation("G103", "Database Operation Error"),
    Serialization("G104", "Serialization Error"),
    Configuration("G105", "Configuration Error"),
    Notification("G201", "Notification Delivery Error"),
    Audit("G202", "Audit Record Error"),
}

impl GradeFlowError {
    /// 是否为基础设施错误（存储不可用、配置错误等），此类错误会中止整个操作
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            GradeFlowError::DatabaseConfig(_)
                | GradeFlowError::DatabaseConnection(_)
                | GradeFlowError::DatabaseOperation(_)
                | GradeFlowError::Serialization(_)
                | GradeFlowError::Configuration(_)
        )
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GradeFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GradeFlowError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GradeFlowError {
    fn from(err: sea_orm::DbErr) -> Self {
        GradeFlowError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GradeFlowError {
    fn from(err: serde_json::Error) -> Self {
        GradeFlowError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for GradeFlowError {
    fn from(err: config::ConfigError) -> Self {
        GradeFlowError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GradeFlowError>;
