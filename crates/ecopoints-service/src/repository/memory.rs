//! 内存仓储
//!
//! 使用 DashMap 实现全部仓储接口，适用于测试和本地开发。
//!
//! 原子性依赖 DashMap 的条目写锁：一个用户的账户（总分、等级、流水）存放在同一个条目里，
//! 发放期间持有该条目的写锁。审核迁移先锁内容再锁作者账户，全局只有这一种加锁顺序。

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::traits::{ContentRepositoryTrait, PointsLedgerRepositoryTrait, UserRepositoryTrait};
use crate::error::{EcoPointsError, Result};
use crate::level::level_of;
use crate::models::{
    AccountSnapshot, AppliedAward, CampaignParticipant, ContentKind, ContentRef, ContentStatus,
    ModerationDecision, ModeratableContent, NewContent, NewLedgerEntry, NewUser,
    PointsAction, PointsLedgerEntry, ResolvedContent, User,
};

/// 用户账户：总分、等级与流水放在同一个条目中一起加锁
#[derive(Debug, Clone)]
struct UserAccount {
    user: User,
    ledger: Vec<PointsLedgerEntry>,
}

#[derive(Debug, Clone)]
struct ContentRecord {
    content: ModeratableContent,
    participants: Vec<CampaignParticipant>,
}

/// 内存仓储
///
/// 克隆共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, UserAccount>>,
    contents: Arc<DashMap<i64, ContentRecord>>,
    sequences: Arc<Sequences>,
}

#[derive(Debug, Default)]
struct Sequences {
    registration: AtomicI64,
    ledger: AtomicI64,
    content: AtomicI64,
}

impl Sequences {
    fn next(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在已持有的账户写锁内追加流水并更新总分、等级
    fn apply_to_account(
        &self,
        account: &mut UserAccount,
        entry: &NewLedgerEntry,
    ) -> Result<AppliedAward> {
        let previous_total = account.user.total_points;
        let previous_level = account.user.level;
        let new_total = previous_total.checked_add(entry.points).ok_or_else(|| {
            EcoPointsError::Internal(format!("用户 {} 积分溢出", entry.user_id))
        })?;
        let new_level = level_of(new_total);
        let now = Utc::now();

        let ledger_entry = PointsLedgerEntry {
            id: Sequences::next(&self.sequences.ledger),
            user_id: entry.user_id.clone(),
            action: entry.action,
            points: entry.points,
            description: entry.description.clone(),
            ref_id: entry.ref_id.clone(),
            created_at: now,
        };

        account.ledger.push(ledger_entry.clone());
        account.user.total_points = new_total;
        account.user.level = new_level;
        account.user.updated_at = now;

        Ok(AppliedAward {
            entry: ledger_entry,
            previous_total,
            previous_level,
            new_total,
            new_level,
        })
    }

    fn apply_award_locked(&self, entry: &NewLedgerEntry) -> Result<AppliedAward> {
        if entry.points <= 0 {
            return Err(EcoPointsError::InvalidAward {
                points: entry.points,
            });
        }

        let mut account = self
            .users
            .get_mut(&entry.user_id)
            .ok_or_else(|| EcoPointsError::UserNotFound(entry.user_id.clone()))?;

        self.apply_to_account(&mut account, entry)
    }

    fn resolve_locked(
        &self,
        content: ContentRef,
        decision: ModerationDecision,
        moderator_id: &str,
        reward: Option<NewLedgerEntry>,
    ) -> Result<ResolvedContent> {
        let mut record = self
            .contents
            .get_mut(&content.id)
            .filter(|record| record.content.kind == content.kind)
            .ok_or(EcoPointsError::ContentNotFound(content))?;

        if record.content.status.is_terminal() {
            return Err(EcoPointsError::NotPending {
                content,
                current: record.content.status,
            });
        }

        // 先发奖励，失败时内容状态不变
        let award = match reward {
            Some(entry) => Some(self.apply_award_locked(&entry)?),
            None => None,
        };

        record.content.status = decision.target_status();
        record.content.moderated_by = Some(moderator_id.to_string());
        record.content.moderated_at = Some(Utc::now());

        Ok(ResolvedContent {
            content: record.content.clone(),
            award,
        })
    }

    fn join_locked(&self, campaign_id: i64, user_id: &str) -> Result<CampaignParticipant> {
        let campaign = ContentRef::campaign(campaign_id);
        let mut record = self
            .contents
            .get_mut(&campaign_id)
            .filter(|record| record.content.kind == ContentKind::Campaign)
            .ok_or(EcoPointsError::ContentNotFound(campaign))?;

        if !self.users.contains_key(user_id) {
            return Err(EcoPointsError::UserNotFound(user_id.to_string()));
        }

        if record.participants.iter().any(|p| p.user_id == user_id) {
            return Err(EcoPointsError::AlreadyJoined {
                campaign_id,
                user_id: user_id.to_string(),
            });
        }

        let participant = CampaignParticipant {
            campaign_id,
            user_id: user_id.to_string(),
            joined_at: Utc::now(),
        };
        record.participants.push(participant.clone());

        Ok(participant)
    }

    fn ranked_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|account| account.user.clone())
            .collect();
        users.sort_by_key(|u| (Reverse(u.total_points), u.registration_seq));
        users
    }
}

fn page<T>(items: impl Iterator<Item = T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(EcoPointsError::UserAlreadyExists(user.id.clone())),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let created = User {
                    id: user.id.clone(),
                    username: user.username.clone(),
                    total_points: 0,
                    level: level_of(0),
                    registration_seq: Sequences::next(&self.sequences.registration),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(UserAccount {
                    user: created.clone(),
                    ledger: Vec::new(),
                });
                Ok(created)
            }
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).map(|account| account.user.clone()))
    }

    async fn list_ranked(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        Ok(page(self.ranked_users().into_iter(), offset, limit))
    }

    async fn list_by_registration(&self, after_seq: i64, limit: i64) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|account| account.user.registration_seq > after_seq)
            .map(|account| account.user.clone())
            .collect();
        users.sort_by_key(|u| u.registration_seq);
        Ok(page(users.into_iter(), 0, limit))
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.len() as i64)
    }

    async fn count_users_above(&self, points: i64) -> Result<i64> {
        let count = self
            .users
            .iter()
            .filter(|account| account.user.total_points > points)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl PointsLedgerRepositoryTrait for MemoryStore {
    async fn apply_award(&self, entry: &NewLedgerEntry) -> Result<AppliedAward> {
        self.apply_award_locked(entry)
    }

    async fn sum_points(&self, user_id: &str) -> Result<i64> {
        Ok(self
            .users
            .get(user_id)
            .map(|account| account.ledger.iter().map(|e| e.points).sum())
            .unwrap_or(0))
    }

    async fn account_snapshot(&self, user_id: &str) -> Result<Option<AccountSnapshot>> {
        // 总分与流水在同一个条目读锁下读取
        Ok(self.users.get(user_id).map(|account| AccountSnapshot {
            user_id: account.user.id.clone(),
            total_points: account.user.total_points,
            level: account.user.level,
            ledger_total: account.ledger.iter().map(|e| e.points).sum(),
        }))
    }

    async fn sum_all_points(&self) -> Result<i64> {
        Ok(self
            .users
            .iter()
            .map(|account| account.ledger.iter().map(|e| e.points).sum::<i64>())
            .sum())
    }

    async fn count_by_action(&self, action: PointsAction) -> Result<i64> {
        let count: usize = self
            .users
            .iter()
            .map(|account| account.ledger.iter().filter(|e| e.action == action).count())
            .sum();
        Ok(count as i64)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>> {
        Ok(self
            .users
            .get(user_id)
            .map(|account| page(account.ledger.iter().rev().cloned(), offset, limit))
            .unwrap_or_default())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        Ok(self
            .users
            .get(user_id)
            .map(|account| account.ledger.len() as i64)
            .unwrap_or(0))
    }

    async fn list_by_ref(&self, ref_id: &str) -> Result<Vec<PointsLedgerEntry>> {
        let mut entries: Vec<PointsLedgerEntry> = self
            .users
            .iter()
            .flat_map(|account| {
                account
                    .ledger
                    .iter()
                    .filter(|e| e.ref_id.as_deref() == Some(ref_id))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }
}

#[async_trait]
impl ContentRepositoryTrait for MemoryStore {
    async fn create_content(&self, content: &NewContent) -> Result<ModeratableContent> {
        if !self.users.contains_key(&content.author_id) {
            return Err(EcoPointsError::UserNotFound(content.author_id.clone()));
        }

        let created = ModeratableContent {
            id: Sequences::next(&self.sequences.content),
            kind: content.kind,
            author_id: content.author_id.clone(),
            status: ContentStatus::Pending,
            moderated_by: None,
            moderated_at: None,
            created_at: Utc::now(),
        };
        self.contents.insert(
            created.id,
            ContentRecord {
                content: created.clone(),
                participants: Vec::new(),
            },
        );

        Ok(created)
    }

    async fn get_content(&self, content: ContentRef) -> Result<Option<ModeratableContent>> {
        Ok(self
            .contents
            .get(&content.id)
            .filter(|record| record.content.kind == content.kind)
            .map(|record| record.content.clone()))
    }

    async fn list_by_status(
        &self,
        kind: ContentKind,
        status: ContentStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ModeratableContent>> {
        let mut rows: Vec<ModeratableContent> = self
            .contents
            .iter()
            .filter(|record| record.content.kind == kind && record.content.status == status)
            .map(|record| record.content.clone())
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        Ok(page(rows.into_iter(), offset, limit))
    }

    async fn count_by_status(&self, kind: ContentKind, status: ContentStatus) -> Result<i64> {
        let count = self
            .contents
            .iter()
            .filter(|record| record.content.kind == kind && record.content.status == status)
            .count();
        Ok(count as i64)
    }

    async fn resolve_pending(
        &self,
        content: ContentRef,
        decision: ModerationDecision,
        moderator_id: &str,
        reward: Option<NewLedgerEntry>,
    ) -> Result<ResolvedContent> {
        self.resolve_locked(content, decision, moderator_id, reward)
    }

    async fn add_participant(
        &self,
        campaign_id: i64,
        user_id: &str,
    ) -> Result<CampaignParticipant> {
        self.join_locked(campaign_id, user_id)
    }

    async fn list_participants(&self, campaign_id: i64) -> Result<Vec<CampaignParticipant>> {
        Ok(self
            .contents
            .get(&campaign_id)
            .filter(|record| record.content.kind == ContentKind::Campaign)
            .map(|record| record.participants.clone())
            .unwrap_or_default())
    }
}
