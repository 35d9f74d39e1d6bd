//! 待审核内容仓储
//!
//! 审核迁移使用 `WHERE status = 'pending'` 条件更新，同一内容最多被迁移一次

use async_trait::async_trait;
use sqlx::PgPool;

use super::ledger_repo::PointsLedgerRepository;
use super::traits::ContentRepositoryTrait;
use super::user_repo::UserRepository;
use crate::error::{EcoPointsError, Result};
use crate::models::{
    CampaignParticipant, ContentKind, ContentRef, ContentStatus, ModerationDecision,
    ModeratableContent, NewContent, NewLedgerEntry, ResolvedContent,
};

const CONTENT_COLUMNS: &str = "id, kind, author_id, status, moderated_by, moderated_at, created_at";

/// 待审核内容仓储
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepositoryTrait for ContentRepository {
    async fn create_content(&self, content: &NewContent) -> Result<ModeratableContent> {
        let created = sqlx::query_as::<_, ModeratableContent>(&format!(
            r#"
            INSERT INTO moderated_content (kind, author_id, status)
            SELECT $1, $2, 'pending'
            WHERE EXISTS (SELECT 1 FROM eco_users WHERE id = $2)
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(content.kind)
        .bind(&content.author_id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| EcoPointsError::UserNotFound(content.author_id.clone()))
    }

    async fn get_content(&self, content: ContentRef) -> Result<Option<ModeratableContent>> {
        let row = sqlx::query_as::<_, ModeratableContent>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM moderated_content WHERE id = $1 AND kind = $2"
        ))
        .bind(content.id)
        .bind(content.kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_status(
        &self,
        kind: ContentKind,
        status: ContentStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ModeratableContent>> {
        let rows = sqlx::query_as::<_, ModeratableContent>(&format!(
            r#"
            SELECT {CONTENT_COLUMNS}
            FROM moderated_content
            WHERE kind = $1 AND status = $2
            ORDER BY created_at ASC, id ASC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(kind)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_by_status(&self, kind: ContentKind, status: ContentStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM moderated_content WHERE kind = $1 AND status = $2",
        )
        .bind(kind)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn resolve_pending(
        &self,
        content: ContentRef,
        decision: ModerationDecision,
        moderator_id: &str,
        reward: Option<NewLedgerEntry>,
    ) -> Result<ResolvedContent> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, ModeratableContent>(&format!(
            r#"
            UPDATE moderated_content
            SET status = $3, moderated_by = $4, moderated_at = NOW()
            WHERE id = $1 AND kind = $2 AND status = 'pending'
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(content.id)
        .bind(content.kind)
        .bind(decision.target_status())
        .bind(moderator_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            // 未命中：内容不存在，或已被其它审核请求迁移
            tx.rollback().await?;
            return match self.get_content(content).await? {
                Some(current) => Err(EcoPointsError::NotPending {
                    content,
                    current: current.status,
                }),
                None => Err(EcoPointsError::ContentNotFound(content)),
            };
        };

        // 奖励失败时事务随 tx 丢弃回滚，状态保持 pending
        let award = match reward {
            Some(entry) => Some(PointsLedgerRepository::apply_award_in_tx(&mut tx, &entry).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(ResolvedContent {
            content: updated,
            award,
        })
    }

    async fn add_participant(
        &self,
        campaign_id: i64,
        user_id: &str,
    ) -> Result<CampaignParticipant> {
        let campaign = ContentRef::campaign(campaign_id);
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM moderated_content WHERE id = $1 AND kind = 'campaign')",
        )
        .bind(campaign_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(EcoPointsError::ContentNotFound(campaign));
        }

        if !UserRepository::exists_in_tx(&mut tx, user_id).await? {
            return Err(EcoPointsError::UserNotFound(user_id.to_string()));
        }

        let participant = sqlx::query_as::<_, CampaignParticipant>(
            r#"
            INSERT INTO campaign_participants (campaign_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (campaign_id, user_id) DO NOTHING
            RETURNING campaign_id, user_id, joined_at
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| EcoPointsError::AlreadyJoined {
            campaign_id,
            user_id: user_id.to_string(),
        })?;

        tx.commit().await?;

        Ok(participant)
    }

    async fn list_participants(&self, campaign_id: i64) -> Result<Vec<CampaignParticipant>> {
        let rows = sqlx::query_as::<_, CampaignParticipant>(
            r#"
            SELECT campaign_id, user_id, joined_at
            FROM campaign_participants
            WHERE campaign_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
