//! 积分查询服务
//!
//! 只读接口：总分、等级、流水、概览、全站统计与对账

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::{EcoPointsError, Result};
use crate::level::{level_of, points_to_next_level};
use crate::models::{Level, PointsAction, User};
use crate::repository::{PointsLedgerRepositoryTrait, UserRepositoryTrait};
use crate::service::dto::{
    GlobalStats, HistoryPage, PageRequest, Pagination, PointsProfile, ReconcileReport,
};

/// 积分查询服务
pub struct PointsQueryService<UR, LR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
{
    user_repo: Arc<UR>,
    ledger_repo: Arc<LR>,
    max_page_size: i64,
}

impl<UR, LR> PointsQueryService<UR, LR>
where
    UR: UserRepositoryTrait,
    LR: PointsLedgerRepositoryTrait,
{
    pub fn new(user_repo: Arc<UR>, ledger_repo: Arc<LR>) -> Self {
        Self {
            user_repo,
            ledger_repo,
            max_page_size: 100,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub async fn user(&self, user_id: &str) -> Result<User> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| EcoPointsError::UserNotFound(user_id.to_string()))
    }

    /// 当前总分
    pub async fn total_points(&self, user_id: &str) -> Result<i64> {
        Ok(self.user(user_id).await?.total_points)
    }

    /// 当前等级
    pub async fn level(&self, user_id: &str) -> Result<Level> {
        Ok(self.user(user_id).await?.level)
    }

    /// 流水合计（不读账户缓存的总分）
    pub async fn ledger_total(&self, user_id: &str) -> Result<i64> {
        self.user(user_id).await?;
        self.ledger_repo.sum_points(user_id).await
    }

    /// 积分流水，最新的在前
    #[instrument(skip(self))]
    pub async fn history(&self, user_id: &str, page: PageRequest) -> Result<HistoryPage> {
        let offset = page.offset(self.max_page_size)?;
        self.user(user_id).await?;

        let entries = self
            .ledger_repo
            .list_by_user(user_id, offset, page.page_size)
            .await?;
        let total = self.ledger_repo.count_by_user(user_id).await?;

        Ok(HistoryPage {
            user_id: user_id.to_string(),
            entries,
            pagination: Pagination::new(total, page),
        })
    }

    /// 积分概览：总分、等级、升级进度、排名与最近流水
    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: &str, recent: i64) -> Result<PointsProfile> {
        let user = self.user(user_id).await?;
        let above = self.user_repo.count_users_above(user.total_points).await?;
        let recent_history = self
            .ledger_repo
            .list_by_user(user_id, 0, recent.clamp(0, self.max_page_size))
            .await?;

        Ok(PointsProfile {
            user_id: user.id,
            username: user.username,
            total_points: user.total_points,
            level: user.level,
            next_level: user.level.next(),
            points_to_next_level: points_to_next_level(user.total_points),
            rank: above + 1,
            recent_history,
        })
    }

    /// 全站统计：累计积分、用户数、分类识别次数
    #[instrument(skip(self))]
    pub async fn global_stats(&self) -> Result<GlobalStats> {
        let total_points = self.ledger_repo.sum_all_points().await?;
        let user_count = self.user_repo.count_users().await?;
        let classification_count = self
            .ledger_repo
            .count_by_action(PointsAction::Classification)
            .await?;

        Ok(GlobalStats {
            total_points,
            user_count,
            classification_count,
        })
    }

    /// 核对账户总分与流水合计
    ///
    /// 总分与流水合计取自同一快照，对账期间的并发发放不会被误报为不一致
    #[instrument(skip(self))]
    pub async fn reconcile(&self, user_id: &str) -> Result<ReconcileReport> {
        let snapshot = self
            .ledger_repo
            .account_snapshot(user_id)
            .await?
            .ok_or_else(|| EcoPointsError::UserNotFound(user_id.to_string()))?;

        let report = ReconcileReport {
            user_id: snapshot.user_id,
            recorded_total: snapshot.total_points,
            ledger_total: snapshot.ledger_total,
            recorded_level: snapshot.level,
            expected_level: level_of(snapshot.total_points),
        };

        if !report.is_consistent() {
            warn!(
                user_id = %report.user_id,
                recorded_total = report.recorded_total,
                ledger_total = report.ledger_total,
                "积分账户与流水不一致"
            );
        }

        Ok(report)
    }

    /// 全量对账，按注册顺序游标分批读取用户
    pub async fn reconcile_all(&self, batch_size: i64) -> Result<Vec<ReconcileReport>> {
        if batch_size < 1 {
            return Err(EcoPointsError::Validation(format!(
                "批大小必须为正: batch_size={}",
                batch_size
            )));
        }

        let mut reports = Vec::new();
        let mut after_seq = 0;

        loop {
            let users = self
                .user_repo
                .list_by_registration(after_seq, batch_size)
                .await?;
            let Some(last) = users.last() else {
                break;
            };
            after_seq = last.registration_seq;
            for user in &users {
                reports.push(self.reconcile(&user.id).await?);
            }
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountSnapshot;
    use crate::repository::{MockPointsLedgerRepositoryTrait, MockUserRepositoryTrait};
    use chrono::Utc;

    fn user(total_points: i64, level: Level) -> User {
        User {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            total_points,
            level,
            registration_seq: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_history_unknown_user() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_get_user().returning(|_| Ok(None));
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger.expect_list_by_user().never();

        let service = PointsQueryService::new(Arc::new(users), Arc::new(ledger));
        let err = service
            .history("ghost", PageRequest::first(10))
            .await
            .unwrap_err();
        assert!(matches!(err, EcoPointsError::UserNotFound(_)));
    }

    fn snapshot(total_points: i64, level: Level, ledger_total: i64) -> AccountSnapshot {
        AccountSnapshot {
            user_id: "u-1".to_string(),
            total_points,
            level,
            ledger_total,
        }
    }

    #[tokio::test]
    async fn test_reconcile_detects_drift() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_get_user().never();
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger.expect_sum_points().never();
        ledger
            .expect_account_snapshot()
            .returning(|_| Ok(Some(snapshot(60, Level::EcoExplorer, 55))));

        let service = PointsQueryService::new(Arc::new(users), Arc::new(ledger));
        let report = service.reconcile("u-1").await.unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.ledger_total, 55);
    }

    #[tokio::test]
    async fn test_reconcile_detects_stale_level() {
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger
            .expect_account_snapshot()
            .returning(|_| Ok(Some(snapshot(60, Level::Beginner, 60))));

        let service =
            PointsQueryService::new(Arc::new(MockUserRepositoryTrait::new()), Arc::new(ledger));
        let report = service.reconcile("u-1").await.unwrap();
        assert_eq!(report.expected_level, Level::EcoExplorer);
        assert!(!report.is_consistent());
    }

    #[tokio::test]
    async fn test_reconcile_unknown_user() {
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger.expect_account_snapshot().returning(|_| Ok(None));

        let service =
            PointsQueryService::new(Arc::new(MockUserRepositoryTrait::new()), Arc::new(ledger));
        let err = service.reconcile("ghost").await.unwrap_err();
        assert!(matches!(err, EcoPointsError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_reconcile_all_pages_by_registration_cursor() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_list_ranked().never();
        users
            .expect_list_by_registration()
            .returning(|after_seq, limit| {
                assert_eq!(limit, 2);
                let batch: Vec<User> = (after_seq + 1..=3)
                    .take(limit as usize)
                    .map(|seq| User {
                        id: format!("u-{seq}"),
                        registration_seq: seq,
                        ..user(0, Level::Beginner)
                    })
                    .collect();
                Ok(batch)
            });
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger.expect_account_snapshot().returning(|id| {
            Ok(Some(AccountSnapshot {
                user_id: id.to_string(),
                ..snapshot(0, Level::Beginner, 0)
            }))
        });

        let service = PointsQueryService::new(Arc::new(users), Arc::new(ledger));
        let reports = service.reconcile_all(2).await.unwrap();
        let ids: Vec<&str> = reports.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u-1", "u-2", "u-3"]);
        assert!(reports.iter().all(ReconcileReport::is_consistent));
    }

    #[tokio::test]
    async fn test_global_stats() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_count_users().returning(|| Ok(3));
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger.expect_sum_all_points().returning(|| Ok(120));
        ledger
            .expect_count_by_action()
            .withf(|action| *action == PointsAction::Classification)
            .returning(|_| Ok(7));

        let service = PointsQueryService::new(Arc::new(users), Arc::new(ledger));
        let stats = service.global_stats().await.unwrap();
        assert_eq!(
            stats,
            GlobalStats {
                total_points: 120,
                user_count: 3,
                classification_count: 7,
            }
        );
    }

    #[tokio::test]
    async fn test_profile_progress() {
        let mut users = MockUserRepositoryTrait::new();
        users
            .expect_get_user()
            .returning(|_| Ok(Some(user(180, Level::EcoExplorer))));
        users.expect_count_users_above().returning(|_| Ok(4));
        let mut ledger = MockPointsLedgerRepositoryTrait::new();
        ledger
            .expect_list_by_user()
            .withf(|_, offset, limit| *offset == 0 && *limit == 5)
            .returning(|_, _, _| Ok(vec![]));

        let service = PointsQueryService::new(Arc::new(users), Arc::new(ledger));
        let profile = service.profile("u-1", 5).await.unwrap();
        assert_eq!(profile.rank, 5);
        assert_eq!(profile.next_level, Some(Level::EcoWarrior));
        assert_eq!(profile.points_to_next_level, Some(20));
    }
}
