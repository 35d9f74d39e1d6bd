//! 积分奖励表
//!
//! 所有动作的奖励积分只在这里定义，其它模块通过 [`points_for`] 引用

use crate::models::{ContentKind, PointsAction};

pub const CLASSIFICATION: i64 = 1;
pub const ARTICLE_CREATED: i64 = 10;
pub const BLOG_PUBLISHED: i64 = 25;
pub const COMMENT: i64 = 5;
pub const CAMPAIGN_CREATED: i64 = 10;
pub const CAMPAIGN_APPROVED: i64 = 25;
pub const JOIN_CAMPAIGN: i64 = 3;

/// 动作对应的固定奖励积分
pub fn points_for(action: PointsAction) -> i64 {
    match action {
        PointsAction::Classification => CLASSIFICATION,
        PointsAction::ArticleCreated => ARTICLE_CREATED,
        PointsAction::BlogPublished => BLOG_PUBLISHED,
        PointsAction::CampaignCreated => CAMPAIGN_CREATED,
        PointsAction::CampaignApproved => CAMPAIGN_APPROVED,
        PointsAction::Comment => COMMENT,
        PointsAction::JoinCampaign => JOIN_CAMPAIGN,
    }
}

/// 提交内容时立即发放的动作
pub fn created_action(kind: ContentKind) -> PointsAction {
    match kind {
        ContentKind::Blog => PointsAction::ArticleCreated,
        ContentKind::Campaign => PointsAction::CampaignCreated,
    }
}

/// 审核通过时发放的动作
pub fn approved_action(kind: ContentKind) -> PointsAction {
    match kind {
        ContentKind::Blog => PointsAction::BlogPublished,
        ContentKind::Campaign => PointsAction::CampaignApproved,
    }
}
