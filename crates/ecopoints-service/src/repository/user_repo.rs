//! 用户积分账户仓储

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::UserRepositoryTrait;
use crate::error::{EcoPointsError, Result};
use crate::models::{Level, NewUser, User};

const USER_COLUMNS: &str =
    "id, username, total_points, level, registration_seq, created_at, updated_at";

/// 用户积分账户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中锁定用户行
    ///
    /// 同一用户的并发发放在此串行化，锁持有到事务结束
    pub async fn lock_in_tx(conn: &mut PgConnection, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM eco_users WHERE id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(user)
    }

    /// 在事务中写入新的总分与等级
    pub async fn update_points_in_tx(
        conn: &mut PgConnection,
        user_id: &str,
        total_points: i64,
        level: Level,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE eco_users
            SET total_points = $2, level = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(total_points)
        .bind(level)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// 在事务中校验用户存在（不加锁）
    pub async fn exists_in_tx(conn: &mut PgConnection, user_id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM eco_users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(conn)
                .await?;

        Ok(exists)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO eco_users (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.id)
        .bind(&user.username)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| EcoPointsError::UserAlreadyExists(user.id.clone()))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM eco_users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_ranked(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM eco_users
            ORDER BY total_points DESC, registration_seq ASC
            OFFSET $1 LIMIT $2
            "#
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_by_registration(&self, after_seq: i64, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM eco_users
            WHERE registration_seq > $1
            ORDER BY registration_seq ASC
            LIMIT $2
            "#
        ))
        .bind(after_seq)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM eco_users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_users_above(&self, points: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM eco_users WHERE total_points > $1")
                .bind(points)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
