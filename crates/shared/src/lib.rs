//! 共享库
//!
//! 包含 EcoPoints 各组件共用的配置、错误处理、数据库连接、缓存与日志初始化代码。

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod observability;
