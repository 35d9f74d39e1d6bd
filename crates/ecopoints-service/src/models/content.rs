//! 待审核内容实体定义
//!
//! 博客与活动共享同一套审核状态机，通过 `ContentKind` 区分

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ContentKind, ContentStatus};
use super::ledger::AppliedAward;

/// 内容引用（类型 + ID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn blog(id: i64) -> Self {
        Self::new(ContentKind::Blog, id)
    }

    pub fn campaign(id: i64) -> Self {
        Self::new(ContentKind::Campaign, id)
    }
}

/// 格式为 `{kind}:{id}`，同时作为账本流水的 ref_id
impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// 待审核内容
///
/// 积分核心只关心作者和审核状态，标题、正文等由内容服务保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModeratableContent {
    pub id: i64,
    pub kind: ContentKind,
    pub author_id: String,
    pub status: ContentStatus,
    /// 审核人
    #[sqlx(default)]
    pub moderated_by: Option<String>,
    #[sqlx(default)]
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ModeratableContent {
    pub fn content_ref(&self) -> ContentRef {
        ContentRef::new(self.kind, self.id)
    }

    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// 提交审核参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    pub kind: ContentKind,
    pub author_id: String,
}

/// 活动参与记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignParticipant {
    pub campaign_id: i64,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// 一次已提交的审核迁移
///
/// 审核通过时 `award` 为同一事务内发放的奖励，驳回时为 None
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContent {
    pub content: ModeratableContent,
    pub award: Option<AppliedAward>,
}
