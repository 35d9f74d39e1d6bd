//! 排行榜服务
//!
//! 列表按 (总积分降序, 注册顺序升序) 排列，`rank` 为列表位置；
//! 单个用户的排名为积分严格更高的人数 + 1，同分共享名次。
//! 两种口径在同分时不一致，对外分别暴露。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use eco_shared::cache::{Cache, CacheKey};

use crate::error::{EcoPointsError, Result};
use crate::repository::UserRepositoryTrait;
use crate::service::dto::{LeaderboardEntry, LeaderboardPage, PageRequest, Pagination, UserRank};

/// 排行榜服务
pub struct LeaderboardService<UR>
where
    UR: UserRepositoryTrait,
{
    user_repo: Arc<UR>,
    cache: Option<Arc<Cache>>,
    cache_ttl: Duration,
    max_page_size: i64,
}

impl<UR> LeaderboardService<UR>
where
    UR: UserRepositoryTrait,
{
    pub fn new(user_repo: Arc<UR>) -> Self {
        Self {
            user_repo,
            cache: None,
            cache_ttl: Duration::from_secs(60),
            max_page_size: 100,
        }
    }

    pub fn with_cache(mut self, cache: Arc<Cache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// 分页读取排行榜
    #[instrument(skip(self))]
    pub async fn top(&self, page: PageRequest) -> Result<LeaderboardPage> {
        let offset = page.offset(self.max_page_size)?;

        let cache_key = self.cache_key(page).await;
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            match cache.get::<LeaderboardPage>(key).await {
                Ok(Some(cached)) => {
                    debug!(key = %key, "排行榜命中缓存");
                    return Ok(cached);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "读取排行榜缓存失败"),
            }
        }

        let users = self.user_repo.list_ranked(offset, page.page_size).await?;
        let total = self.user_repo.count_users().await?;

        let entries = users
            .into_iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry {
                rank: offset + i as i64 + 1,
                user_id: user.id,
                username: user.username,
                total_points: user.total_points,
                level: user.level,
            })
            .collect();

        let result = LeaderboardPage {
            entries,
            pagination: Pagination::new(total, page),
        };

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Err(e) = cache.set(key, &result, self.cache_ttl).await {
                warn!(error = %e, "写入排行榜缓存失败");
            }
        }

        Ok(result)
    }

    /// 前 N 名
    pub async fn top_n(&self, n: i64) -> Result<Vec<LeaderboardEntry>> {
        Ok(self.top(PageRequest::first(n)).await?.entries)
    }

    /// 查询单个用户的排名
    #[instrument(skip(self))]
    pub async fn rank_of(&self, user_id: &str) -> Result<UserRank> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| EcoPointsError::UserNotFound(user_id.to_string()))?;

        let above = self.user_repo.count_users_above(user.total_points).await?;

        Ok(UserRank {
            user_id: user.id,
            rank: above + 1,
            total_points: user.total_points,
            level: user.level,
        })
    }

    /// 当前代数下的分页缓存键，读取代数失败时不走缓存
    async fn cache_key(&self, page: PageRequest) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get::<i64>(CacheKey::leaderboard_generation()).await {
            Ok(generation) => Some(CacheKey::leaderboard_page(
                generation.unwrap_or(0),
                page.page,
                page.page_size,
            )),
            Err(e) => {
                warn!(error = %e, "读取排行榜缓存代数失败");
                None
            }
        }
    }
}
