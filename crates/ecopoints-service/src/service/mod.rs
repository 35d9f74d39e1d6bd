//! 业务服务层
//!
//! 封装积分发放、内容审核、排行榜与查询的业务逻辑，
//! 依赖仓储 trait，可在 PostgreSQL 与内存实现之间切换。

pub mod activity_service;
pub mod dto;
pub mod leaderboard_service;
pub mod moderation_service;
pub mod query_service;
pub mod reward_service;

use std::sync::Arc;
use std::time::Duration;

use eco_shared::cache::Cache;
use eco_shared::config::LeaderboardConfig;
use sqlx::PgPool;

pub use activity_service::ActivityService;
pub use dto::*;
pub use leaderboard_service::LeaderboardService;
pub use moderation_service::ModerationService;
pub use query_service::PointsQueryService;
pub use reward_service::RewardService;

use crate::repository::{
    ContentRepository, ContentRepositoryTrait, MemoryStore, PointsLedgerRepository,
    PointsLedgerRepositoryTrait, UserRepository, UserRepositoryTrait,
};

/// 全部服务的组装结果
pub struct EcoPointsServices<UR, LR, CR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
    CR: ContentRepositoryTrait,
{
    pub rewards: Arc<RewardService<LR>>,
    pub moderation: Arc<ModerationService<CR, LR>>,
    pub activity: Arc<ActivityService<UR, LR, CR>>,
    pub leaderboard: Arc<LeaderboardService<UR>>,
    pub queries: Arc<PointsQueryService<UR, LR>>,
}

pub type PgServices = EcoPointsServices<UserRepository, PointsLedgerRepository, ContentRepository>;
pub type MemoryServices = EcoPointsServices<MemoryStore, MemoryStore, MemoryStore>;

impl<UR, LR, CR> EcoPointsServices<UR, LR, CR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
    CR: ContentRepositoryTrait,
{
    pub fn new(
        user_repo: Arc<UR>,
        ledger_repo: Arc<LR>,
        content_repo: Arc<CR>,
        leaderboard_config: &LeaderboardConfig,
        cache: Option<Arc<Cache>>,
    ) -> Self {
        let max_page_size = leaderboard_config.max_page_size;

        let mut rewards = RewardService::new(ledger_repo.clone());
        let mut leaderboard =
            LeaderboardService::new(user_repo.clone()).with_max_page_size(max_page_size);
        if let Some(cache) = cache {
            rewards = rewards.with_cache(cache.clone());
            leaderboard = leaderboard.with_cache(
                cache,
                Duration::from_secs(leaderboard_config.cache_ttl_seconds),
            );
        }
        let rewards = Arc::new(rewards);

        let moderation = Arc::new(
            ModerationService::new(content_repo.clone(), rewards.clone())
                .with_max_page_size(max_page_size),
        );
        let activity = Arc::new(ActivityService::new(
            user_repo.clone(),
            content_repo,
            rewards.clone(),
            moderation.clone(),
        ));
        let queries = Arc::new(
            PointsQueryService::new(user_repo, ledger_repo).with_max_page_size(max_page_size),
        );

        Self {
            rewards,
            moderation,
            activity,
            leaderboard: Arc::new(leaderboard),
            queries,
        }
    }
}

impl PgServices {
    /// 基于 PostgreSQL 连接池组装
    pub fn postgres(
        pool: PgPool,
        leaderboard_config: &LeaderboardConfig,
        cache: Option<Arc<Cache>>,
    ) -> Self {
        Self::new(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(PointsLedgerRepository::new(pool.clone())),
            Arc::new(ContentRepository::new(pool)),
            leaderboard_config,
            cache,
        )
    }
}

impl MemoryServices {
    /// 基于内存仓储组装，返回的 store 与服务共享数据
    pub fn in_memory(leaderboard_config: &LeaderboardConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let services = Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            leaderboard_config,
            None,
        );
        (services, store)
    }
}
