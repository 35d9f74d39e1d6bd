//! 用户积分账户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Level;

/// 用户积分账户
///
/// `total_points` 是账本流水的缓存汇总，`level` 由 `total_points` 派生，
/// 二者只能通过积分发放事务修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// 用户 ID（由认证服务提供）
    pub id: String,
    pub username: String,
    /// 累计积分
    pub total_points: i64,
    /// 当前等级
    pub level: Level,
    /// 注册顺序，排行榜同分时注册早的排前面
    pub registration_seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新用户注册参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: String,
    pub username: String,
}

impl NewUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}
