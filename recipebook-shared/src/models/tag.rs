/// Tag catalog
///
/// Tags are reference data: created by administrators, read by everyone and
/// linked to recipes through `recipe_tags`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(32) NOT NULL UNIQUE,
///     slug VARCHAR(32) NOT NULL UNIQUE
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashSet;

/// Recipe tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Input for creating a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub slug: String,
}

/// A tag attached to a recipe
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeTag {
    pub recipe_id: i64,
    #[sqlx(flatten)]
    pub tag: Tag,
}

impl Tag {
    /// Creates a tag
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await
    }

    /// Lists every tag ordered by ID
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Finds a tag by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Returns the subset of `ids` that exist
    pub async fn existing_ids<'e, E>(executor: E, ids: &[i64]) -> Result<HashSet<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Loads the tags of several recipes in one query
    pub async fn for_recipes(pool: &PgPool, recipe_ids: &[i64]) -> Result<Vec<RecipeTag>, sqlx::Error> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, RecipeTag>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await
    }
}
