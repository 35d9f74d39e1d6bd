//! 集成测试公共辅助

#![allow(dead_code)]

use std::sync::Arc;

use eco_shared::config::LeaderboardConfig;
use ecopoints::MemoryServices;
use ecopoints::models::User;
use ecopoints::repository::MemoryStore;
use fake::Fake;
use fake::faker::internet::en::Username;

/// 基于内存仓储的完整服务
pub fn memory_services() -> (MemoryServices, Arc<MemoryStore>) {
    MemoryServices::in_memory(&LeaderboardConfig::default())
}

/// 注册一个随机用户名的用户
pub async fn register(services: &MemoryServices, user_id: &str) -> User {
    let username: String = Username().fake();
    services
        .activity
        .register_user(Some(user_id), &username)
        .await
        .expect("注册用户失败")
}
