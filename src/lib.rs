//! GradeFlow - 成绩审核、课表冲突检测与成绩单计算核心
//!
//! 基于 SeaORM 构建的教务核心服务，认证、文件导入和文档渲染由外部系统负责。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层（审核工作流、冲突检测、成绩单、编排）
//! - `storage`: 数据存储层（SeaORM）

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod services;
pub mod storage;
