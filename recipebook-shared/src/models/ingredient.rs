/// Ingredient catalog and per-recipe ingredient amounts
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ingredients (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(128) NOT NULL,
///     measurement_unit VARCHAR(64) NOT NULL
/// );
///
/// CREATE TABLE ingredient_amounts (
///     id BIGSERIAL PRIMARY KEY,
///     recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
///     ingredient_id BIGINT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
///     amount INTEGER NOT NULL CHECK (amount >= 1),
///     CONSTRAINT unique_ingredient_recipe UNIQUE (ingredient_id, recipe_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashSet;

/// Ingredient reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Input for creating an ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIngredient {
    pub name: String,
    pub measurement_unit: String,
}

/// An ingredient with its amount in a specific recipe
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl Ingredient {
    /// Creates an ingredient
    pub async fn create(pool: &PgPool, data: CreateIngredient) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            RETURNING id, name, measurement_unit
            "#,
        )
        .bind(data.name)
        .bind(data.measurement_unit)
        .fetch_one(pool)
        .await
    }

    /// Lists ingredients, optionally restricted to a case-sensitive name prefix
    pub async fn list(pool: &PgPool, name_prefix: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        match name_prefix.filter(|prefix| !prefix.is_empty()) {
            Some(prefix) => {
                sqlx::query_as::<_, Ingredient>(
                    r#"
                    SELECT id, name, measurement_unit
                    FROM ingredients
                    WHERE starts_with(name, $1)
                    ORDER BY id
                    "#,
                )
                .bind(prefix)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Ingredient>(
                    "SELECT id, name, measurement_unit FROM ingredients ORDER BY id",
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Finds an ingredient by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Returns the subset of `ids` that exist
    pub async fn existing_ids<'e, E>(executor: E, ids: &[i64]) -> Result<HashSet<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Loads the ingredient amounts of several recipes, in insertion order
    pub async fn for_recipes(
        pool: &PgPool,
        recipe_ids: &[i64],
    ) -> Result<Vec<RecipeIngredient>, sqlx::Error> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, RecipeIngredient>(
            r#"
            SELECT ia.recipe_id, i.id AS ingredient_id, i.name, i.measurement_unit, ia.amount
            FROM ingredient_amounts ia
            JOIN ingredients i ON i.id = ia.ingredient_id
            WHERE ia.recipe_id = ANY($1)
            ORDER BY ia.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await
    }
}
