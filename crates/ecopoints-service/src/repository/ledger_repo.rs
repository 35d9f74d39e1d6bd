//! 积分账本仓储
//!
//! 账本只追加，用户总分与等级在同一事务内随流水一起更新

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::traits::PointsLedgerRepositoryTrait;
use super::user_repo::UserRepository;
use crate::error::{EcoPointsError, Result};
use crate::level::level_of;
use crate::models::{
    AccountSnapshot, AppliedAward, NewLedgerEntry, PointsAction, PointsLedgerEntry,
};

const LEDGER_COLUMNS: &str = "id, user_id, action, points, description, ref_id, created_at";

/// 积分账本仓储
pub struct PointsLedgerRepository {
    pool: PgPool,
}

impl PointsLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中发放积分
    ///
    /// 1. `SELECT ... FOR UPDATE` 锁定用户行
    /// 2. 追加流水
    /// 3. 写回累加后的总分与重算的等级
    ///
    /// 调用方负责提交事务，审核通过时与状态迁移共用同一事务
    pub async fn apply_award_in_tx(
        conn: &mut PgConnection,
        entry: &NewLedgerEntry,
    ) -> Result<AppliedAward> {
        if entry.points <= 0 {
            return Err(EcoPointsError::InvalidAward {
                points: entry.points,
            });
        }

        let user = UserRepository::lock_in_tx(&mut *conn, &entry.user_id)
            .await?
            .ok_or_else(|| EcoPointsError::UserNotFound(entry.user_id.clone()))?;

        let new_total = user.total_points.checked_add(entry.points).ok_or_else(|| {
            EcoPointsError::Internal(format!("用户 {} 积分溢出", entry.user_id))
        })?;
        let new_level = level_of(new_total);

        // clock_timestamp() 取行锁之后的时间，保证同一用户的流水时间单调
        let inserted = sqlx::query_as::<_, PointsLedgerEntry>(&format!(
            r#"
            INSERT INTO points_ledger (user_id, action, points, description, ref_id, created_at)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING {LEDGER_COLUMNS}
            "#
        ))
        .bind(&entry.user_id)
        .bind(entry.action)
        .bind(entry.points)
        .bind(&entry.description)
        .bind(&entry.ref_id)
        .fetch_one(&mut *conn)
        .await?;

        UserRepository::update_points_in_tx(&mut *conn, &entry.user_id, new_total, new_level)
            .await?;

        debug!(
            user_id = %entry.user_id,
            entry_id = inserted.id,
            previous_total = user.total_points,
            new_total,
            "积分流水已写入"
        );

        Ok(AppliedAward {
            entry: inserted,
            previous_total: user.total_points,
            previous_level: user.level,
            new_total,
            new_level,
        })
    }
}

#[async_trait]
impl PointsLedgerRepositoryTrait for PointsLedgerRepository {
    async fn apply_award(&self, entry: &NewLedgerEntry) -> Result<AppliedAward> {
        let mut tx = self.pool.begin().await?;
        let applied = Self::apply_award_in_tx(&mut tx, entry).await?;
        tx.commit().await?;

        Ok(applied)
    }

    async fn sum_points(&self, user_id: &str) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_ledger WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn account_snapshot(&self, user_id: &str) -> Result<Option<AccountSnapshot>> {
        // 单条语句共享一个快照，并发提交的发放要么整体可见，要么整体不可见
        let snapshot = sqlx::query_as::<_, AccountSnapshot>(
            r#"
            SELECT u.id AS user_id, u.total_points, u.level,
                   COALESCE(SUM(l.points), 0)::BIGINT AS ledger_total
            FROM eco_users u
            LEFT JOIN points_ledger l ON l.user_id = u.id
            WHERE u.id = $1
            GROUP BY u.id, u.total_points, u.level
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    async fn sum_all_points(&self) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_ledger")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    async fn count_by_action(&self, action: PointsAction) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_ledger WHERE action = $1")
            .bind(action)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>> {
        let entries = sqlx::query_as::<_, PointsLedgerEntry>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS}
            FROM points_ledger
            WHERE user_id = $1
            ORDER BY id DESC
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_ledger WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_by_ref(&self, ref_id: &str) -> Result<Vec<PointsLedgerEntry>> {
        let entries = sqlx::query_as::<_, PointsLedgerEntry>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM points_ledger WHERE ref_id = $1 ORDER BY id ASC"
        ))
        .bind(ref_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
