//! EcoPoints 积分核心
//!
//! 社区垃圾分类应用的游戏化积分系统：
//!
//! - **积分账本**：只追加的流水，每条流水与用户总分、等级在同一事务内提交
//! - **等级**：由总分唯一决定（Beginner → Eco Master）
//! - **奖励表**：所有动作的固定积分集中定义在 [`schedule`]
//! - **内容审核**：博客与活动共享 pending → approved | rejected 状态机，
//!   审核通过与作者奖励原子提交，同一内容最多奖励一次
//! - **排行榜**：按总分降序、注册顺序升序
//!
//! ## 模块结构
//!
//! - `models`: 领域模型
//! - `repository`: 数据访问层（PostgreSQL 与内存实现）
//! - `service`: 业务服务层
//! - `cli`: 运维命令行

pub mod cli;
pub mod error;
pub mod level;
pub mod models;
pub mod repository;
pub mod schedule;
pub mod service;

pub use error::{EcoPointsError, Result};
pub use level::level_of;
pub use service::{EcoPointsServices, MemoryServices, PgServices};
