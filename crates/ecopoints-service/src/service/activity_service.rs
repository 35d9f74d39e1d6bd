//! 用户活动服务
//!
//! 把应用里产生积分的用户行为翻译成积分发放：
//! - 注册
//! - 垃圾分类识别
//! - 提交博客 / 创建活动（进入审核队列，提交即得积分）
//! - 评论已发布博客
//! - 参与活动
//!
//! 主操作与奖励分开提交时返回 [`ActionOutcome`]，奖励失败不会被吞掉

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{EcoPointsError, Result};
use crate::models::{
    CampaignParticipant, ContentKind, ContentRef, ContentStatus, ModeratableContent, NewUser,
    PointsAction, User,
};
use crate::repository::{ContentRepositoryTrait, PointsLedgerRepositoryTrait, UserRepositoryTrait};
use crate::schedule::{CLASSIFICATION, created_action};
use crate::service::dto::{ActionOutcome, AwardReceipt, ClassificationResult, RewardStatus};
use crate::service::moderation_service::ModerationService;
use crate::service::reward_service::RewardService;

/// 用户活动服务
pub struct ActivityService<UR, LR, CR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
    CR: ContentRepositoryTrait,
{
    user_repo: Arc<UR>,
    content_repo: Arc<CR>,
    reward_service: Arc<RewardService<LR>>,
    moderation_service: Arc<ModerationService<CR, LR>>,
}

impl<UR, LR, CR> ActivityService<UR, LR, CR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
    CR: ContentRepositoryTrait,
{
    pub fn new(
        user_repo: Arc<UR>,
        content_repo: Arc<CR>,
        reward_service: Arc<RewardService<LR>>,
        moderation_service: Arc<ModerationService<CR, LR>>,
    ) -> Self {
        Self {
            user_repo,
            content_repo,
            reward_service,
            moderation_service,
        }
    }

    /// 注册用户，未提供 ID 时生成 UUID
    ///
    /// 新用户以 0 分进入排行榜，注册成功后排行榜缓存失效
    #[instrument(skip(self))]
    pub async fn register_user(&self, user_id: Option<&str>, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EcoPointsError::Validation("用户名不能为空".to_string()));
        }

        let id = match user_id.map(str::trim) {
            Some("") => return Err(EcoPointsError::Validation("用户 ID 不能为空".to_string())),
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let user = self
            .user_repo
            .create_user(&NewUser::new(id, username))
            .await?;
        info!(user_id = %user.id, "用户注册成功");

        self.reward_service.invalidate_leaderboard().await;
        Ok(user)
    }

    /// 分类识别奖励
    ///
    /// 分类器失败时调用方不应调用此方法；发放积分以奖励表为准
    #[instrument(skip(self, result), fields(category = %result.category))]
    pub async fn record_classification(
        &self,
        user_id: &str,
        result: &ClassificationResult,
    ) -> Result<AwardReceipt> {
        let category = result.category.trim();
        if category.is_empty() {
            return Err(EcoPointsError::Validation("分类结果不能为空".to_string()));
        }
        if !(0.0..=100.0).contains(&result.confidence) {
            return Err(EcoPointsError::Validation(format!(
                "置信度必须在 0 到 100 之间: {}",
                result.confidence
            )));
        }
        if result.points_earned != CLASSIFICATION {
            warn!(
                suggested = result.points_earned,
                awarded = CLASSIFICATION,
                "分类器建议积分与奖励表不一致，按奖励表发放"
            );
        }

        self.reward_service
            .award_action(
                user_id,
                PointsAction::Classification,
                format!("Classified {} ({:.0}%)", category, result.confidence),
                None,
            )
            .await
    }

    /// 提交博客：进入待审核，立即获得 article_created 积分
    pub async fn submit_blog(&self, author_id: &str) -> Result<ActionOutcome<ModeratableContent>> {
        self.submit_content(ContentKind::Blog, author_id).await
    }

    /// 创建活动：进入待审核，立即获得 campaign_created 积分
    pub async fn create_campaign(
        &self,
        author_id: &str,
    ) -> Result<ActionOutcome<ModeratableContent>> {
        self.submit_content(ContentKind::Campaign, author_id).await
    }

    /// 评论博客，仅已审核通过的博客可以获得评论积分
    #[instrument(skip(self))]
    pub async fn comment_on_blog(&self, user_id: &str, blog_id: i64) -> Result<AwardReceipt> {
        let blog = self.moderation_service.get(ContentRef::blog(blog_id)).await?;
        if blog.status != ContentStatus::Approved {
            return Err(EcoPointsError::ContentNotApproved(blog.content_ref()));
        }

        let target = blog.content_ref();
        self.reward_service
            .award_action(
                user_id,
                PointsAction::Comment,
                format!("Commented on {}", target),
                Some(target.to_string()),
            )
            .await
    }

    /// 参与活动
    ///
    /// 每个用户对同一活动只能参与一次，活动审核状态不影响参与
    #[instrument(skip(self))]
    pub async fn join_campaign(
        &self,
        user_id: &str,
        campaign_id: i64,
    ) -> Result<ActionOutcome<CampaignParticipant>> {
        let participant = self
            .content_repo
            .add_participant(campaign_id, user_id)
            .await?;
        info!(user_id, campaign_id, "用户参与活动");

        let target = ContentRef::campaign(campaign_id);
        let reward = self
            .reward_service
            .award_action(
                user_id,
                PointsAction::JoinCampaign,
                format!("Joined {}", target),
                Some(target.to_string()),
            )
            .await;

        Ok(ActionOutcome {
            result: participant,
            reward: Self::reward_status(reward),
        })
    }

    pub async fn participants(&self, campaign_id: i64) -> Result<Vec<CampaignParticipant>> {
        self.moderation_service
            .get(ContentRef::campaign(campaign_id))
            .await?;
        self.content_repo.list_participants(campaign_id).await
    }

    #[instrument(skip(self))]
    async fn submit_content(
        &self,
        kind: ContentKind,
        author_id: &str,
    ) -> Result<ActionOutcome<ModeratableContent>> {
        let content = self.moderation_service.submit(kind, author_id).await?;

        let target = content.content_ref();
        let reward = self
            .reward_service
            .award_action(
                author_id,
                created_action(kind),
                format!("Submitted {}", target),
                Some(target.to_string()),
            )
            .await;

        Ok(ActionOutcome {
            result: content,
            reward: Self::reward_status(reward),
        })
    }

    fn reward_status(reward: Result<AwardReceipt>) -> RewardStatus {
        match reward {
            Ok(receipt) => RewardStatus::Awarded(receipt),
            Err(e) if e.is_business_error() => {
                warn!(error = %e, code = e.error_code(), "主操作已完成，奖励发放被拒绝");
                RewardStatus::failed(&e)
            }
            Err(e) => {
                error!(error = %e, code = e.error_code(), "主操作已完成，奖励发放失败");
                RewardStatus::failed(&e)
            }
        }
    }
}
