/// User × Recipe marker relations (favorites, shopping cart)
///
/// Both relations have the same shape: a `(user_id, recipe_id)` row with a
/// unique constraint on the pair. The operations are written once, generic
/// over [`RecipeRelation`], and instantiated for [`Favorite`] and
/// [`ShoppingCart`].
///
/// Adding relies on `ON CONFLICT DO NOTHING`, so two concurrent adds of the
/// same pair cannot both succeed.
///
/// # Example
///
/// ```no_run
/// use recipebook_shared::models::relation::{self, Favorite, ShoppingCart};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = relation::add::<Favorite>(&pool, 1, 10).await?;
/// relation::add::<ShoppingCart>(&pool, 1, recipe.id).await?;
/// relation::remove::<Favorite>(&pool, 1, recipe.id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::recipe::Recipe;

/// A per-user marker relation against recipes
pub trait RecipeRelation {
    /// Table holding `(user_id, recipe_id)` rows, unique on the pair
    const TABLE: &'static str;

    /// Human-readable name used in error messages
    const LABEL: &'static str;
}

/// Recipes a user marked as favorite
#[derive(Debug, Clone, Copy)]
pub struct Favorite;

impl RecipeRelation for Favorite {
    const TABLE: &'static str = "favorites";
    const LABEL: &'static str = "favorites";
}

/// Recipes in a user's shopping cart
#[derive(Debug, Clone, Copy)]
pub struct ShoppingCart;

impl RecipeRelation for ShoppingCart {
    const TABLE: &'static str = "shopping_cart";
    const LABEL: &'static str = "the shopping cart";
}

async fn require_recipe(pool: &PgPool, recipe_id: i64) -> ServiceResult<Recipe> {
    Recipe::find_by_id(pool, recipe_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Recipe not found".to_string()))
}

/// Marks a recipe for a user
///
/// Returns the recipe so the caller can render its cropped representation.
///
/// # Errors
///
/// - `NotFound` if the recipe does not exist
/// - `Conflict` if the relation already exists
pub async fn add<R: RecipeRelation>(pool: &PgPool, user_id: i64, recipe_id: i64) -> ServiceResult<Recipe> {
    let recipe = require_recipe(pool, recipe_id).await?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT (user_id, recipe_id) DO NOTHING",
        R::TABLE
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::Conflict(format!(
            "Recipe is already in {}",
            R::LABEL
        )));
    }

    debug!(user_id, recipe_id, relation = R::TABLE, "Relation added");
    Ok(recipe)
}

/// Removes a recipe mark for a user
///
/// # Errors
///
/// - `NotFound` if the recipe does not exist
/// - `Conflict` if the relation does not exist
pub async fn remove<R: RecipeRelation>(pool: &PgPool, user_id: i64, recipe_id: i64) -> ServiceResult<()> {
    require_recipe(pool, recipe_id).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        R::TABLE
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::Conflict(format!("Recipe is not in {}", R::LABEL)));
    }

    debug!(user_id, recipe_id, relation = R::TABLE, "Relation removed");
    Ok(())
}

/// Returns which of `recipe_ids` the user has marked
pub async fn marked_among<R: RecipeRelation>(
    pool: &PgPool,
    user_id: i64,
    recipe_ids: &[i64],
) -> Result<HashSet<i64>, sqlx::Error> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(i64,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
        R::TABLE
    ))
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_tables_are_distinct() {
        assert_eq!(Favorite::TABLE, "favorites");
        assert_eq!(ShoppingCart::TABLE, "shopping_cart");
        assert_ne!(Favorite::LABEL, ShoppingCart::LABEL);
    }
}
