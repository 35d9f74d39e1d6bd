//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use std::fmt;

use serde::{Deserialize, Serialize};

/// 积分动作
///
/// 标识一条账本流水的来源动作，每个动作对应奖励表中的固定积分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PointsAction {
    /// 垃圾分类识别
    Classification,
    /// 提交博客（进入待审核）
    ArticleCreated,
    /// 博客审核通过
    BlogPublished,
    /// 提交活动（进入待审核）
    CampaignCreated,
    /// 活动审核通过
    CampaignApproved,
    /// 在已发布博客下评论
    Comment,
    /// 参与活动
    JoinCampaign,
}

impl PointsAction {
    pub const ALL: [PointsAction; 7] = [
        Self::Classification,
        Self::ArticleCreated,
        Self::BlogPublished,
        Self::CampaignCreated,
        Self::CampaignApproved,
        Self::Comment,
        Self::JoinCampaign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::ArticleCreated => "article_created",
            Self::BlogPublished => "blog_published",
            Self::CampaignCreated => "campaign_created",
            Self::CampaignApproved => "campaign_approved",
            Self::Comment => "comment",
            Self::JoinCampaign => "join_campaign",
        }
    }
}

impl fmt::Display for PointsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PointsAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("未知的积分动作: {}", s))
    }
}

/// 用户等级
///
/// 由总积分唯一决定，声明顺序即等级高低（Beginner 最低）
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "varchar")]
pub enum Level {
    #[default]
    #[serde(rename = "Beginner")]
    #[sqlx(rename = "Beginner")]
    Beginner,
    #[serde(rename = "Eco Explorer")]
    #[sqlx(rename = "Eco Explorer")]
    EcoExplorer,
    #[serde(rename = "Eco Warrior")]
    #[sqlx(rename = "Eco Warrior")]
    EcoWarrior,
    #[serde(rename = "Eco Champion")]
    #[sqlx(rename = "Eco Champion")]
    EcoChampion,
    #[serde(rename = "Eco Master")]
    #[sqlx(rename = "Eco Master")]
    EcoMaster,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::EcoExplorer => "Eco Explorer",
            Self::EcoWarrior => "Eco Warrior",
            Self::EcoChampion => "Eco Champion",
            Self::EcoMaster => "Eco Master",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待审核内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ContentKind {
    Blog,
    Campaign,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Campaign => "campaign",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blog" => Ok(Self::Blog),
            "campaign" => Ok(Self::Campaign),
            other => Err(format!("未知的内容类型: {}", other)),
        }
    }
}

/// 审核状态
///
/// 状态机：pending -> approved | rejected，后两者为终态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// 终态不允许再迁移
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("未知的审核状态: {}", other)),
        }
    }
}

/// 审核决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    Approve,
    Reject,
}

impl ModerationDecision {
    /// 决定对应的目标状态
    pub fn target_status(&self) -> ContentStatus {
        match self {
            Self::Approve => ContentStatus::Approved,
            Self::Reject => ContentStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_action_serde() {
        let json = serde_json::to_string(&PointsAction::JoinCampaign).unwrap();
        assert_eq!(json, "\"join_campaign\"");

        let action: PointsAction = serde_json::from_str("\"article_created\"").unwrap();
        assert_eq!(action, PointsAction::ArticleCreated);
    }

    #[test]
    fn test_points_action_from_str() {
        for action in PointsAction::ALL {
            assert_eq!(action.as_str().parse::<PointsAction>().unwrap(), action);
        }
        assert!("spend".parse::<PointsAction>().is_err());
    }

    #[test]
    fn test_level_ordering_and_names() {
        assert!(Level::Beginner < Level::EcoExplorer);
        assert!(Level::EcoExplorer < Level::EcoWarrior);
        assert!(Level::EcoWarrior < Level::EcoChampion);
        assert!(Level::EcoChampion < Level::EcoMaster);

        let json = serde_json::to_string(&Level::EcoChampion).unwrap();
        assert_eq!(json, "\"Eco Champion\"");
        assert_eq!(Level::default(), Level::Beginner);
    }

    #[test]
    fn test_content_status_terminal() {
        assert!(!ContentStatus::Pending.is_terminal());
        assert!(ContentStatus::Approved.is_terminal());
        assert!(ContentStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_moderation_decision_target() {
        assert_eq!(
            ModerationDecision::Approve.target_status(),
            ContentStatus::Approved
        );
        assert_eq!(
            ModerationDecision::Reject.target_status(),
            ContentStatus::Rejected
        );
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("Blog".parse::<ContentKind>().unwrap(), ContentKind::Blog);
        assert_eq!(
            "campaign".parse::<ContentKind>().unwrap(),
            ContentKind::Campaign
        );
        assert!("video".parse::<ContentKind>().is_err());
    }
}
