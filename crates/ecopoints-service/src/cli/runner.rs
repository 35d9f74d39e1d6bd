//! 命令执行器
//!
//! 把 CLI 参数转化为服务调用，结果以 JSON 输出到标准输出

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use eco_shared::cache::Cache;
use eco_shared::config::AppConfig;
use eco_shared::database::Database;

use crate::models::{ContentRef, ContentStatus};
use crate::service::{Moderator, PageRequest, PgServices};

use super::commands::Commands;

/// 命令执行器
pub struct CommandRunner {
    config: AppConfig,
    database: Database,
    services: PgServices,
}

impl CommandRunner {
    /// 连接数据库与（可选的）缓存并组装服务
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let database = Database::connect(&config.database)
            .await
            .context("连接数据库失败")?;
        database
            .health_check()
            .await
            .context("数据库健康检查失败")?;

        let cache = if config.redis.enabled {
            let cache = Cache::new(&config.redis).context("创建 Redis 客户端失败")?;
            match cache.health_check().await {
                Ok(()) => Some(Arc::new(cache)),
                Err(e) => {
                    warn!(
                        error = %e,
                        code = e.code(),
                        retryable = e.is_retryable(),
                        "Redis 不可用，排行榜不使用缓存"
                    );
                    None
                }
            }
        } else {
            None
        };

        let services = PgServices::postgres(database.pool().clone(), &config.leaderboard, cache);

        Ok(Self {
            config,
            database,
            services,
        })
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Migrate => self.run_migrate().await,
            Commands::Leaderboard { page, page_size } => {
                let page_size = page_size.unwrap_or(self.config.leaderboard.default_page_size);
                let board = self
                    .services
                    .leaderboard
                    .top(PageRequest::new(page, page_size))
                    .await?;
                print_json(&board)
            }
            Commands::Rank { user_id } => {
                print_json(&self.services.leaderboard.rank_of(&user_id).await?)
            }
            Commands::History {
                user_id,
                page,
                page_size,
            } => {
                let history = self
                    .services
                    .queries
                    .history(&user_id, PageRequest::new(page, page_size))
                    .await?;
                print_json(&history)
            }
            Commands::Profile { user_id, recent } => {
                print_json(&self.services.queries.profile(&user_id, recent).await?)
            }
            Commands::Stats => print_json(&self.services.queries.global_stats().await?),
            Commands::Reconcile {
                user_id,
                batch_size,
            } => self.run_reconcile(user_id, batch_size).await,
            Commands::Pending {
                kind,
                page,
                page_size,
            } => {
                let queue = self
                    .services
                    .moderation
                    .list_by_status(kind, ContentStatus::Pending, PageRequest::new(page, page_size))
                    .await?;
                print_json(&queue)
            }
            Commands::Approve {
                kind,
                id,
                moderator,
            } => {
                let outcome = self
                    .services
                    .moderation
                    .approve(ContentRef::new(kind, id), &Moderator::admin(moderator))
                    .await?;
                print_json(&outcome)
            }
            Commands::Reject {
                kind,
                id,
                moderator,
            } => {
                let outcome = self
                    .services
                    .moderation
                    .reject(ContentRef::new(kind, id), &Moderator::admin(moderator))
                    .await?;
                print_json(&outcome)
            }
        }
    }

    async fn run_migrate(&self) -> Result<()> {
        self.database
            .run_migrations()
            .await
            .context("数据库迁移失败")?;
        info!("数据库迁移完成");
        Ok(())
    }

    async fn run_reconcile(&self, user_id: Option<String>, batch_size: i64) -> Result<()> {
        let reports = match user_id {
            Some(user_id) => vec![self.services.queries.reconcile(&user_id).await?],
            None => self.services.queries.reconcile_all(batch_size).await?,
        };

        let drifted: Vec<_> = reports.iter().filter(|r| !r.is_consistent()).collect();
        info!(checked = reports.len(), drifted = drifted.len(), "对账完成");
        print_json(&drifted)?;

        if !drifted.is_empty() {
            bail!("{} 个用户的积分账户与流水不一致", drifted.len());
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.database.close().await;
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
