//! 内容审核服务
//!
//! 博客与活动共享 pending -> approved | rejected 状态机。
//! 审核通过与作者奖励在同一事务内提交，并发审核同一内容时只有一个请求成功。

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument};

use crate::error::{EcoPointsError, Result};
use crate::models::{
    ContentKind, ContentRef, ContentStatus, ModerationDecision, ModeratableContent, NewContent,
    NewLedgerEntry,
};
use crate::repository::{ContentRepositoryTrait, PointsLedgerRepositoryTrait};
use crate::schedule::{approved_action, points_for};
use crate::service::dto::{
    AwardReceipt, ContentPage, ModerationOutcome, Moderator, PageRequest, Pagination,
};
use crate::service::reward_service::RewardService;

/// 内容审核服务
pub struct ModerationService<CR, LR>
where
    CR: ContentRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
{
    content_repo: Arc<CR>,
    reward_service: Arc<RewardService<LR>>,
    max_page_size: i64,
}

impl<CR, LR> ModerationService<CR, LR>
where
    CR: ContentRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
{
    pub fn new(content_repo: Arc<CR>, reward_service: Arc<RewardService<LR>>) -> Self {
        Self {
            content_repo,
            reward_service,
            max_page_size: 100,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// 提交内容进入待审核队列（不发放积分）
    #[instrument(skip(self))]
    pub async fn submit(&self, kind: ContentKind, author_id: &str) -> Result<ModeratableContent> {
        let content = self
            .content_repo
            .create_content(&NewContent {
                kind,
                author_id: author_id.to_string(),
            })
            .await?;

        info!(content = %content.content_ref(), author_id, "内容已提交待审核");
        Ok(content)
    }

    pub async fn get(&self, content: ContentRef) -> Result<ModeratableContent> {
        self.content_repo
            .get_content(content)
            .await?
            .ok_or(EcoPointsError::ContentNotFound(content))
    }

    /// 审核通过并奖励作者
    pub async fn approve(
        &self,
        content: ContentRef,
        moderator: &Moderator,
    ) -> Result<ModerationOutcome> {
        self.resolve(content, moderator, ModerationDecision::Approve)
            .await
    }

    /// 驳回，不发放积分
    pub async fn reject(
        &self,
        content: ContentRef,
        moderator: &Moderator,
    ) -> Result<ModerationOutcome> {
        self.resolve(content, moderator, ModerationDecision::Reject)
            .await
    }

    /// 按状态分页列出内容，队列按提交时间先后排列
    pub async fn list_by_status(
        &self,
        kind: ContentKind,
        status: ContentStatus,
        page: PageRequest,
    ) -> Result<ContentPage> {
        let offset = page.offset(self.max_page_size)?;
        let items = self
            .content_repo
            .list_by_status(kind, status, offset, page.page_size)
            .await?;
        let total = self.content_repo.count_by_status(kind, status).await?;

        Ok(ContentPage {
            items,
            pagination: Pagination::new(total, page),
        })
    }

    #[instrument(
        skip(self, moderator),
        fields(moderator_id = %moderator.id, decision = decision.as_str())
    )]
    async fn resolve(
        &self,
        content: ContentRef,
        moderator: &Moderator,
        decision: ModerationDecision,
    ) -> Result<ModerationOutcome> {
        if !moderator.is_admin {
            return Err(EcoPointsError::Forbidden {
                operation: format!("{} {}", decision.as_str(), content),
            });
        }

        // 作者不可变，先读出来用于构造奖励；状态由仓储条件更新再次校验
        let current = self.get(content).await?;
        if !current.is_pending() {
            return Err(EcoPointsError::NotPending {
                content,
                current: current.status,
            });
        }

        let reward = match decision {
            ModerationDecision::Approve => {
                let action = approved_action(content.kind);
                Some(
                    NewLedgerEntry::new(
                        &current.author_id,
                        action,
                        points_for(action),
                        format!("Approved {}", content),
                    )
                    .with_ref(content.to_string()),
                )
            }
            ModerationDecision::Reject => None,
        };

        let resolved = self
            .content_repo
            .resolve_pending(content, decision, &moderator.id, reward)
            .await?;

        let reward: Option<AwardReceipt> = match &resolved.award {
            Some(applied) => Some(self.reward_service.after_commit(applied).await),
            None => None,
        };

        counter!(
            "ecopoints_moderation_total",
            "kind" => content.kind.as_str(),
            "decision" => decision.as_str()
        )
        .increment(1);
        info!(
            content = %content,
            status = %resolved.content.status,
            author_id = %resolved.content.author_id,
            "审核完成"
        );

        Ok(ModerationOutcome {
            content: resolved.content,
            reward,
        })
    }
}
