//! CLI 命令定义
//!
//! 使用 clap derive 宏定义运维命令行接口

use clap::{Parser, Subcommand};

use crate::models::ContentKind;

/// EcoPoints 运维工具
#[derive(Parser, Debug)]
#[command(name = "ecopoints-admin")]
#[command(version, about = "EcoPoints 积分系统运维工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 执行数据库迁移
    Migrate,

    /// 查看排行榜
    Leaderboard {
        #[arg(short, long, default_value = "1")]
        page: i64,

        /// 每页条数，默认取配置 leaderboard.default_page_size
        #[arg(short = 's', long)]
        page_size: Option<i64>,
    },

    /// 查询用户排名
    Rank {
        user_id: String,
    },

    /// 查看用户积分流水
    History {
        user_id: String,

        #[arg(short, long, default_value = "1")]
        page: i64,

        #[arg(short = 's', long, default_value = "20")]
        page_size: i64,
    },

    /// 查看用户积分概览
    Profile {
        user_id: String,

        /// 最近流水条数
        #[arg(short, long, default_value = "5")]
        recent: i64,
    },

    /// 全站统计：累计积分、用户数、分类识别次数
    Stats,

    /// 对账：核对账户总分与流水合计，发现不一致时以非零状态退出
    Reconcile {
        /// 只核对指定用户，缺省为全部用户
        #[arg(short, long)]
        user_id: Option<String>,

        #[arg(long, default_value = "500")]
        batch_size: i64,
    },

    /// 查看待审核队列
    Pending {
        /// 内容类型：blog 或 campaign
        #[arg(short, long, default_value = "blog")]
        kind: ContentKind,

        #[arg(short, long, default_value = "1")]
        page: i64,

        #[arg(short = 's', long, default_value = "20")]
        page_size: i64,
    },

    /// 审核通过并奖励作者
    Approve {
        #[arg(short, long)]
        kind: ContentKind,

        id: i64,

        /// 审核人 ID
        #[arg(short, long)]
        moderator: String,
    },

    /// 驳回
    Reject {
        #[arg(short, long)]
        kind: ContentKind,

        id: i64,

        #[arg(short, long)]
        moderator: String,
    },
}
