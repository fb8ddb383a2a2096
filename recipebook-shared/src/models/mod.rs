/// Database models for the recipe book
///
/// Each module owns one table (or a small family of tables) and exposes its
/// queries as associated functions taking a pool or an executor.
///
/// # Models
///
/// - `user`: Accounts and avatars
/// - `tag`: Tag catalog and recipe ↔ tag links
/// - `ingredient`: Ingredient catalog and per-recipe amounts
/// - `recipe`: Recipes, listing filters, transactional writes
/// - `relation`: Favorites and shopping cart
/// - `subscription`: Follower → author subscriptions
///
/// # Example
///
/// ```no_run
/// use recipebook_shared::models::user::{User, CreateUser};
/// use recipebook_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgresql://localhost/recipebook")).await?;
///
/// let user = User::create(
///     &pool,
///     CreateUser {
///         email: "cook@example.com".to_string(),
///         username: "cook".to_string(),
///         first_name: "Jane".to_string(),
///         last_name: "Doe".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod ingredient;
pub mod recipe;
pub mod relation;
pub mod subscription;
pub mod tag;
pub mod user;
