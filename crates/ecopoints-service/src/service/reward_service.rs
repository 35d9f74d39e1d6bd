//! 积分发放服务
//!
//! 所有积分变动的唯一入口。发放流程：
//!
//! 1. 参数校验（用户 ID 非空、积分为正）
//! 2. 仓储层单事务写入：流水 + 总分 + 等级
//! 3. 记录指标与日志
//! 4. 排行榜缓存失效（失败只告警，不影响已提交的发放）

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument, warn};

use eco_shared::cache::{Cache, CacheKey};

use crate::error::{EcoPointsError, Result};
use crate::models::{AppliedAward, NewLedgerEntry, PointsAction};
use crate::repository::PointsLedgerRepositoryTrait;
use crate::service::dto::{AwardReceipt, AwardRequest};

/// 积分发放服务
pub struct RewardService<LR>
where
    LR: PointsLedgerRepositoryTrait,
{
    ledger_repo: Arc<LR>,
    cache: Option<Arc<Cache>>,
}

impl<LR> RewardService<LR>
where
    LR: PointsLedgerRepositoryTrait,
{
    pub fn new(ledger_repo: Arc<LR>) -> Self {
        Self {
            ledger_repo,
            cache: None,
        }
    }

    /// 启用排行榜缓存失效
    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 发放积分
    #[instrument(skip(self), fields(user_id = %request.user_id, action = %request.action))]
    pub async fn award(&self, request: AwardRequest) -> Result<AwardReceipt> {
        // 空 ID 无法解析到任何用户
        if request.user_id.trim().is_empty() {
            return Err(EcoPointsError::UserNotFound(request.user_id));
        }
        if request.points <= 0 {
            return Err(EcoPointsError::InvalidAward {
                points: request.points,
            });
        }

        let entry = NewLedgerEntry {
            user_id: request.user_id,
            action: request.action,
            points: request.points,
            description: request.description,
            ref_id: request.ref_id,
        };

        let applied = self.ledger_repo.apply_award(&entry).await?;
        Ok(self.after_commit(&applied).await)
    }

    /// 按奖励表发放某个动作的积分
    pub async fn award_action(
        &self,
        user_id: &str,
        action: PointsAction,
        description: impl Into<String>,
        ref_id: Option<String>,
    ) -> Result<AwardReceipt> {
        let mut request = AwardRequest::from_schedule(user_id, action, description);
        request.ref_id = ref_id;
        self.award(request).await
    }

    /// 发放提交后的收尾：指标、日志、缓存失效
    ///
    /// 审核通过时奖励由内容仓储在审核事务内写入，提交后同样走这里
    pub(crate) async fn after_commit(&self, applied: &AppliedAward) -> AwardReceipt {
        let action = applied.entry.action.as_str();
        counter!("ecopoints_awards_total", "action" => action).increment(1);
        counter!("ecopoints_points_awarded_total", "action" => action)
            .increment(applied.entry.points.unsigned_abs());

        info!(
            user_id = %applied.entry.user_id,
            action,
            points = applied.entry.points,
            new_total = applied.new_total,
            "积分发放成功"
        );

        if applied.leveled_up() {
            counter!("ecopoints_level_ups_total", "level" => applied.new_level.as_str())
                .increment(1);
            info!(
                user_id = %applied.entry.user_id,
                from = %applied.previous_level,
                to = %applied.new_level,
                "用户等级提升"
            );
        }

        self.invalidate_leaderboard().await;

        AwardReceipt::from(applied)
    }

    /// 自增排行榜代数，旧代数的分页缓存自然失效
    ///
    /// 新用户注册同样会改变排行榜，注册后也走这里
    pub(crate) async fn invalidate_leaderboard(&self) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(e) = cache.incr(CacheKey::leaderboard_generation(), 1).await {
            warn!(error = %e, "排行榜缓存失效失败，将在 TTL 后过期");
        }
    }
}
