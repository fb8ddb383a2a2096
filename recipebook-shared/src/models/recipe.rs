/// Recipe model and database operations
///
/// A recipe row plus the association tables it owns (`recipe_tags`,
/// `ingredient_amounts`). Writes that touch several tables take a
/// `&mut PgConnection` so the caller can run them inside one transaction;
/// see [`crate::recipe_write`] for the validated write path.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE recipes (
///     id BIGSERIAL PRIMARY KEY,
///     author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(256) NOT NULL,
///     text TEXT NOT NULL,
///     image VARCHAR(512) NOT NULL,
///     cooking_time INTEGER NOT NULL CHECK (cooking_time > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE recipe_tags (
///     recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (recipe_id, tag_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

/// Recipe row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,

    /// Owning user
    pub author_id: i64,

    pub name: String,

    /// Description / instructions
    pub text: String,

    /// Media name of the recipe image
    pub image: String,

    /// Cooking time in minutes, always positive
    pub cooking_time: i32,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a recipe row
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Partial update of a recipe row; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
}

/// One ingredient line of a recipe write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientLine {
    pub ingredient_id: i64,
    pub amount: i32,
}

/// List filters for `GET /api/recipes/`
///
/// Favorite and cart filters only apply when `viewer` is set; anonymous
/// callers get the unfiltered list.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// User on whose behalf the list is built
    pub viewer: Option<i64>,

    /// Only recipes by this author
    pub author: Option<i64>,

    /// Recipes carrying any of these tag slugs
    pub tags: Vec<String>,

    /// `Some(true)`: only the viewer's favorites, `Some(false)`: exclude them
    pub is_favorited: Option<bool>,

    /// `Some(true)`: only recipes in the viewer's cart, `Some(false)`: exclude them
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(author) = self.author {
            qb.push(" AND r.author_id = ").push_bind(author);
        }

        if !self.tags.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(self.tags.clone())
            .push("))");
        }

        if let Some(viewer) = self.viewer {
            for (flag, table) in [
                (self.is_favorited, "favorites"),
                (self.is_in_shopping_cart, "shopping_cart"),
            ] {
                let Some(flag) = flag else { continue };

                qb.push(if flag { " AND EXISTS" } else { " AND NOT EXISTS" })
                    .push(" (SELECT 1 FROM ")
                    .push(table)
                    .push(" m WHERE m.recipe_id = r.id AND m.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
        }
    }
}

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.text, r.image, r.cooking_time, r.created_at";

impl Recipe {
    /// Lists recipes matching `filter`, newest first
    pub async fn list(
        pool: &PgPool,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r"));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Recipe>().fetch_all(pool).await
    }

    /// Counts recipes matching `filter`
    pub async fn count(pool: &PgPool, filter: &RecipeFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes r");
        filter.push_conditions(&mut qb);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Finds a recipe by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Recipe>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a recipe and locks its row until the transaction ends
    pub async fn find_for_update(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Inserts the recipe row only; associations are written separately
    pub async fn insert(conn: &mut PgConnection, data: NewRecipe) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_id, name, text, image, cooking_time, created_at
            "#,
        )
        .bind(data.author_id)
        .bind(data.name)
        .bind(data.text)
        .bind(data.image)
        .bind(data.cooking_time)
        .fetch_one(&mut *conn)
        .await
    }

    /// Applies a partial update to the recipe row
    pub async fn apply_changes(
        conn: &mut PgConnection,
        id: i64,
        changes: RecipeChanges,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET name = COALESCE($2, name),
                text = COALESCE($3, text),
                image = COALESCE($4, image),
                cooking_time = COALESCE($5, cooking_time)
            WHERE id = $1
            RETURNING id, author_id, name, text, image, cooking_time, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.text)
        .bind(changes.image)
        .bind(changes.cooking_time)
        .fetch_one(&mut *conn)
        .await
    }

    /// Replaces the full tag set of a recipe
    pub async fn replace_tags(conn: &mut PgConnection, id: i64, tag_ids: &[i64]) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(id)
            .bind(tag_ids)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Replaces the full ingredient-amount set of a recipe, keeping input order
    pub async fn replace_ingredients(
        conn: &mut PgConnection,
        id: i64,
        lines: &[IngredientLine],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM ingredient_amounts WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let ingredient_ids: Vec<i64> = lines.iter().map(|line| line.ingredient_id).collect();
        let amounts: Vec<i32> = lines.iter().map(|line| line.amount).collect();

        sqlx::query(
            r#"
            INSERT INTO ingredient_amounts (recipe_id, ingredient_id, amount)
            SELECT $1, line.ingredient_id, line.amount
            FROM UNNEST($2::BIGINT[], $3::INTEGER[]) WITH ORDINALITY
                AS line(ingredient_id, amount, position)
            ORDER BY line.position
            "#,
        )
        .bind(id)
        .bind(ingredient_ids)
        .bind(amounts)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes a recipe; tags, amounts and relations cascade
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Recipes by one author, newest first, optionally capped
    pub async fn list_by_author(
        pool: &PgPool,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.author_id = $1 ORDER BY r.id DESC LIMIT $2"
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Recipe counts per author; authors without recipes are absent
    pub async fn count_by_authors(
        pool: &PgPool,
        author_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, sqlx::Error> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
        )
        .bind(author_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
