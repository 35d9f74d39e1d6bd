//! CLI 模块
//!
//! 运维命令行接口：
//!
//! - `migrate` - 执行数据库迁移
//! - `leaderboard` / `rank` - 排行榜与排名
//! - `history` / `profile` - 用户积分流水与概览
//! - `reconcile` - 账户与流水对账
//! - `pending` / `approve` / `reject` - 内容审核
//!
//! # 使用示例
//!
//! ```bash
//! ecopoints-admin migrate
//! ecopoints-admin leaderboard --page 1 --page-size 20
//! ecopoints-admin approve --kind blog 42 --moderator admin-1
//! ecopoints-admin reconcile
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
