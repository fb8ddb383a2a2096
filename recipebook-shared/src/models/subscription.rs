/// Follower → author subscriptions
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     id BIGSERIAL PRIMARY KEY,
///     follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     following_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT unique_follow UNIQUE (follower_id, following_id),
///     CONSTRAINT no_self_subscription CHECK (follower_id <> following_id)
/// );
/// ```

use sqlx::PgPool;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;

/// Subscription operations
pub struct Subscription;

async fn require_user(pool: &PgPool, id: i64) -> ServiceResult<User> {
    User::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
}

impl Subscription {
    /// Subscribes `follower_id` to `following_id`
    ///
    /// Returns the followed user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the target user does not exist
    /// - `Validation` on self-subscription or an existing subscription
    pub async fn subscribe(pool: &PgPool, follower_id: i64, following_id: i64) -> ServiceResult<User> {
        let following = require_user(pool, following_id).await?;

        if follower_id == following_id {
            return Err(ServiceError::validation(
                "subscription",
                "You cannot subscribe to yourself",
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::validation(
                "subscription",
                "You are already subscribed to this user",
            ));
        }

        debug!(follower_id, following_id, "Subscription created");
        Ok(following)
    }

    /// Removes a subscription
    ///
    /// # Errors
    ///
    /// `NotFound` if the target user or the subscription does not exist.
    pub async fn unsubscribe(pool: &PgPool, follower_id: i64, following_id: i64) -> ServiceResult<()> {
        require_user(pool, following_id).await?;

        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE follower_id = $1 AND following_id = $2",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(
                "You are not subscribed to this user".to_string(),
            ));
        }

        debug!(follower_id, following_id, "Subscription removed");
        Ok(())
    }

    /// Users followed by `follower_id`, most recent subscription first
    pub async fn list_following(
        pool: &PgPool,
        follower_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.avatar, u.created_at
            FROM subscriptions s
            JOIN users u ON u.id = s.following_id
            WHERE s.follower_id = $1
            ORDER BY s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Number of users followed by `follower_id`
    pub async fn count_following(pool: &PgPool, follower_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE follower_id = $1")
            .bind(follower_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Returns which of `user_ids` `follower_id` is subscribed to
    pub async fn following_among(
        pool: &PgPool,
        follower_id: i64,
        user_ids: &[i64],
    ) -> Result<HashSet<i64>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT following_id FROM subscriptions WHERE follower_id = $1 AND following_id = ANY($2)",
        )
        .bind(follower_id)
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
