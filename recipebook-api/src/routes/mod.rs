/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `tags`: Tag catalog
/// - `ingredients`: Ingredient catalog with prefix search
/// - `recipes`: Recipes, favorites, shopping cart and its CSV download
/// - `users`: Profiles, avatars and subscriptions
/// - `links`: Short recipe links

pub mod health;
pub mod ingredients;
pub mod links;
pub mod recipes;
pub mod tags;
pub mod users;
