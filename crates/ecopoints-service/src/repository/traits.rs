//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试与内存实现

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AccountSnapshot, AppliedAward, CampaignParticipant, ContentKind, ContentRef, ContentStatus,
    ModerationDecision, ModeratableContent, NewContent, NewLedgerEntry, NewUser,
    PointsAction, PointsLedgerEntry, ResolvedContent, User,
};

/// 用户积分账户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// 注册用户，初始积分 0、等级 Beginner
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
    /// 按积分降序、注册顺序升序分页
    async fn list_ranked(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    /// 按注册顺序的游标分页：registration_seq 大于 after_seq 的前 limit 个用户
    ///
    /// 注册顺序不随积分变化，并发发放期间遍历也不会漏掉或重复用户
    async fn list_by_registration(&self, after_seq: i64, limit: i64) -> Result<Vec<User>>;
    async fn count_users(&self) -> Result<i64>;
    /// 积分严格大于 points 的用户数
    async fn count_users_above(&self, points: i64) -> Result<i64>;
}

/// 积分账本仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsLedgerRepositoryTrait: Send + Sync {
    /// 原子发放积分
    ///
    /// 在同一个提交单元内完成：锁定用户、追加流水、累加总分、重算等级。
    /// 读者要么看到全部结果，要么什么都看不到。
    async fn apply_award(&self, entry: &NewLedgerEntry) -> Result<AppliedAward>;
    /// 用户全部流水积分之和（对账用）
    async fn sum_points(&self, user_id: &str) -> Result<i64>;
    /// 在同一读快照内取账户总分、等级与流水合计，用户不存在时返回 None
    async fn account_snapshot(&self, user_id: &str) -> Result<Option<AccountSnapshot>>;
    /// 全部用户的流水积分之和
    async fn sum_all_points(&self) -> Result<i64>;
    /// 某类动作的流水条数
    async fn count_by_action(&self, action: PointsAction) -> Result<i64>;
    /// 按写入顺序倒序分页
    async fn list_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>>;
    async fn count_by_user(&self, user_id: &str) -> Result<i64>;
    /// 查询某个触发来源产生的全部流水
    async fn list_by_ref(&self, ref_id: &str) -> Result<Vec<PointsLedgerEntry>>;
}

/// 待审核内容仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepositoryTrait: Send + Sync {
    /// 以 pending 状态创建内容，作者不存在时返回 `UserNotFound`
    async fn create_content(&self, content: &NewContent) -> Result<ModeratableContent>;
    async fn get_content(&self, content: ContentRef) -> Result<Option<ModeratableContent>>;
    async fn list_by_status(
        &self,
        kind: ContentKind,
        status: ContentStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ModeratableContent>>;
    async fn count_by_status(&self, kind: ContentKind, status: ContentStatus) -> Result<i64>;
    /// 审核迁移
    ///
    /// 仅当当前状态恰好为 pending 时迁移（条件更新），`reward` 与状态迁移同一事务提交；
    /// 奖励失败时状态保持 pending。
    async fn resolve_pending(
        &self,
        content: ContentRef,
        decision: ModerationDecision,
        moderator_id: &str,
        reward: Option<NewLedgerEntry>,
    ) -> Result<ResolvedContent>;
    /// 参与活动，重复参与返回 `AlreadyJoined`
    async fn add_participant(&self, campaign_id: i64, user_id: &str)
    -> Result<CampaignParticipant>;
    async fn list_participants(&self, campaign_id: i64) -> Result<Vec<CampaignParticipant>>;
}
