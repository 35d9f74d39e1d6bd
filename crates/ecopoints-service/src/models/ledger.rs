//! 积分账本实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Level, PointsAction};

/// 积分账本流水
///
/// 只追加、不可修改。用户的 `total_points` 必须始终等于其全部流水积分之和
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointsLedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub action: PointsAction,
    /// 本次获得的积分（始终为正）
    pub points: i64,
    pub description: String,
    /// 触发来源，如 `blog:12`、`campaign:3`
    #[sqlx(default)]
    pub ref_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的账本流水
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerEntry {
    pub user_id: String,
    pub action: PointsAction,
    pub points: i64,
    pub description: String,
    pub ref_id: Option<String>,
}

impl NewLedgerEntry {
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

    pub fn with_ref(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }
}

/// 一次已提交的积分发放
///
/// 由仓储层在同一事务内产生：写入的流水、发放前后的总分与等级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAward {
    pub entry: PointsLedgerEntry,
    pub previous_total: i64,
    pub previous_level: Level,
    pub new_total: i64,
    pub new_level: Level,
}

impl AppliedAward {
    /// 本次发放是否让用户升到了更高等级
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

/// 同一快照下读出的账户总分与流水合计（对账用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub user_id: String,
    pub total_points: i64,
    pub level: Level,
    pub ledger_total: i64,
}
