//! 积分服务领域模型
//!
//! 包含用户积分账户、账本流水、待审核内容等核心实体定义

pub mod content;
pub mod enums;
pub mod ledger;
pub mod user;

// 重新导出常用类型
pub use content::{
    CampaignParticipant, ContentRef, ModeratableContent, NewContent, ResolvedContent,
};
pub use enums::{ContentKind, ContentStatus, Level, ModerationDecision, PointsAction};
pub use ledger::{AccountSnapshot, AppliedAward, NewLedgerEntry, PointsLedgerEntry};
pub use user::{NewUser, User};
