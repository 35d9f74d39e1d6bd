//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use serde::{Deserialize, Serialize};

use crate::error::{EcoPointsError, Result};
use crate::models::{
    AppliedAward, Level, ModeratableContent, PointsAction, PointsLedgerEntry,
};
use crate::schedule::points_for;

/// 积分发放请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub user_id: String,
    pub action: PointsAction,
    pub points: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

impl AwardRequest {
    pub fn new(
        user_id: impl Into<String>,
        action: PointsAction,
        points: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action,
            points,
            description: description.into(),
            ref_id: None,
        }
    }

    /// 按奖励表填充积分
    pub fn from_schedule(
        user_id: impl Into<String>,
        action: PointsAction,
        description: impl Into<String>,
    ) -> Self {
        Self::new(user_id, action, points_for(action), description)
    }

    pub fn with_ref(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }
}

/// 积分发放回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardReceipt {
    pub entry_id: i64,
    pub user_id: String,
    pub action: PointsAction,
    pub points: i64,
    pub new_total: i64,
    pub new_level: Level,
    pub leveled_up: bool,
}

impl From<&AppliedAward> for AwardReceipt {
    fn from(applied: &AppliedAward) -> Self {
        Self {
            entry_id: applied.entry.id,
            user_id: applied.entry.user_id.clone(),
            action: applied.entry.action,
            points: applied.entry.points,
            new_total: applied.new_total,
            new_level: applied.new_level,
            leveled_up: applied.leveled_up(),
        }
    }
}

/// 附带奖励的结果状态
///
/// 主操作成功后奖励单独提交，奖励失败不回滚主操作，但必须让调用方看到
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RewardStatus {
    Awarded(AwardReceipt),
    #[serde(rename_all = "camelCase")]
    Failed {
        error_code: String,
        message: String,
        /// 系统错误可整体重试，业务错误重试无意义
        retryable: bool,
    },
}

impl RewardStatus {
    pub fn failed(err: &EcoPointsError) -> Self {
        Self::Failed {
            error_code: err.error_code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }

    pub fn is_awarded(&self) -> bool {
        matches!(self, Self::Awarded(_))
    }

    pub fn receipt(&self) -> Option<&AwardReceipt> {
        match self {
            Self::Awarded(receipt) => Some(receipt),
            Self::Failed { .. } => None,
        }
    }
}

/// 主操作结果 + 奖励状态
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome<T> {
    pub result: T,
    pub reward: RewardStatus,
}

/// 审核人
///
/// 身份认证由外部完成，这里只携带 ID 与管理员标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moderator {
    pub id: String,
    pub is_admin: bool,
}

impl Moderator {
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }

    pub fn member(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }
}

/// 审核结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationOutcome {
    pub content: ModeratableContent,
    /// 审核通过时发放给作者的奖励
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<AwardReceipt>,
}

/// 外部分类器返回的识别结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: String,
    /// 置信度 0-100
    pub confidence: f64,
    /// 分类器建议的积分，仅用于核对，实际以奖励表为准
    pub points_earned: i64,
}

/// 分页请求（页码从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// 第一页
    pub fn first(page_size: i64) -> Self {
        Self::new(1, page_size)
    }

    /// 校验并返回偏移量
    pub fn offset(&self, max_page_size: i64) -> Result<i64> {
        if self.page < 1 {
            return Err(EcoPointsError::Validation(format!(
                "页码必须从 1 开始: page={}",
                self.page
            )));
        }
        if self.page_size < 1 || self.page_size > max_page_size {
            return Err(EcoPointsError::Validation(format!(
                "分页大小必须在 1 到 {} 之间: page_size={}",
                max_page_size, self.page_size
            )));
        }
        (self.page - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| EcoPointsError::Validation(format!("页码过大: page={}", self.page)))
    }
}

/// 分页元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(total: i64, request: PageRequest) -> Self {
        let pages = if request.page_size > 0 {
            (total + request.page_size - 1) / request.page_size
        } else {
            0
        };
        Self {
            total,
            page: request.page,
            page_size: request.page_size,
            pages,
        }
    }
}

/// 排行榜条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 列表位置（从 1 开始）
    pub rank: i64,
    pub user_id: String,
    pub username: String,
    pub total_points: i64,
    pub level: Level,
}

/// 排行榜分页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
}

/// 用户排名
///
/// rank = 积分严格高于该用户的人数 + 1，同分用户共享名次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRank {
    pub user_id: String,
    pub rank: i64,
    pub total_points: i64,
    pub level: Level,
}

/// 积分流水分页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub user_id: String,
    pub entries: Vec<PointsLedgerEntry>,
    pub pagination: Pagination,
}

/// 用户积分概览
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsProfile {
    pub user_id: String,
    pub username: String,
    pub total_points: i64,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_to_next_level: Option<i64>,
    pub rank: i64,
    pub recent_history: Vec<PointsLedgerEntry>,
}

/// 对账结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub user_id: String,
    /// 账户上缓存的总分
    pub recorded_total: i64,
    /// 流水累加得到的总分
    pub ledger_total: i64,
    pub recorded_level: Level,
    pub expected_level: Level,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.recorded_total == self.ledger_total && self.recorded_level == self.expected_level
    }
}

/// 全站积分统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// 全部流水积分之和
    pub total_points: i64,
    pub user_count: i64,
    /// 分类识别流水条数
    pub classification_count: i64,
}

/// 审核队列分页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    pub items: Vec<ModeratableContent>,
    pub pagination: Pagination,
}
