/// Response representations
///
/// Models are turned into JSON bodies here. Every builder takes the viewer
/// explicitly (`Option<i64>` for reads that also serve anonymous callers)
/// and loads related rows in batches, one query per relation regardless of
/// how many items are rendered.

use recipebook_shared::models::{
    ingredient::Ingredient,
    recipe::Recipe,
    relation::{self, Favorite, ShoppingCart},
    subscription::Subscription,
    tag::Tag,
    user::User,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Public user profile
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

/// Ingredient line inside a recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation
#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Cropped recipe representation
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

/// Avatar body of `/api/users/me/avatar/`
#[derive(Debug, Clone, Serialize)]
pub struct AvatarResponse {
    pub avatar: Option<String>,
}

fn user_response(state: &AppState, user: User, is_subscribed: bool) -> UserResponse {
    UserResponse {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
        avatar: user.avatar.map(|name| state.media.url(&name)),
    }
}

/// Avatar URL of a user, if any
pub fn avatar_response(state: &AppState, user: &User) -> AvatarResponse {
    AvatarResponse {
        avatar: user.avatar.as_deref().map(|name| state.media.url(name)),
    }
}

/// Cropped representation of a recipe
pub fn recipe_summary(state: &AppState, recipe: Recipe) -> RecipeSummary {
    RecipeSummary {
        id: recipe.id,
        image: state.media.url(&recipe.image),
        name: recipe.name,
        cooking_time: recipe.cooking_time,
    }
}

/// Renders users with `is_subscribed` relative to the viewer
pub async fn users(state: &AppState, viewer: Option<i64>, users: Vec<User>) -> ApiResult<Vec<UserResponse>> {
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let following = match viewer {
        Some(viewer) => Subscription::following_among(&state.db, viewer, &ids).await?,
        None => HashSet::new(),
    };

    Ok(users
        .into_iter()
        .map(|user| {
            let subscribed = following.contains(&user.id);
            user_response(state, user, subscribed)
        })
        .collect())
}

/// Renders a single user
pub async fn user(state: &AppState, viewer: Option<i64>, user: User) -> ApiResult<UserResponse> {
    let id = user.id;
    users(state, viewer, vec![user])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

/// Renders full recipes for the viewer
pub async fn recipes(
    state: &AppState,
    viewer: Option<i64>,
    recipes: Vec<Recipe>,
) -> ApiResult<Vec<RecipeResponse>> {
    let recipe_ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

    let mut author_ids: Vec<i64> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in Tag::for_recipes(&state.db, &recipe_ids).await? {
        tags.entry(row.recipe_id).or_default().push(row.tag);
    }

    let mut ingredients: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    for row in Ingredient::for_recipes(&state.db, &recipe_ids).await? {
        ingredients
            .entry(row.recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: row.ingredient_id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    }

    let authors: HashMap<i64, UserResponse> = users(state, viewer, User::find_many(&state.db, &author_ids).await?)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            relation::marked_among::<Favorite>(&state.db, viewer, &recipe_ids).await?,
            relation::marked_among::<ShoppingCart>(&state.db, viewer, &recipe_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let mut rendered = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        // Authors cascade-delete their recipes, so a missing author means the
        // recipe vanished between queries; skip it.
        let Some(author) = authors.get(&recipe.author_id).cloned() else {
            continue;
        };

        rendered.push(RecipeResponse {
            id: recipe.id,
            tags: tags.remove(&recipe.id).unwrap_or_default(),
            author,
            ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            image: state.media.url(&recipe.image),
            name: recipe.name,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }

    Ok(rendered)
}

/// Renders one full recipe
pub async fn recipe(state: &AppState, viewer: Option<i64>, recipe: Recipe) -> ApiResult<RecipeResponse> {
    let id = recipe.id;
    recipes(state, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {} not found", id)))
}

/// Renders followed authors with up to `recipes_limit` recipes each
pub async fn subscriptions(
    state: &AppState,
    viewer: i64,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let ids: Vec<i64> = authors.iter().map(|u| u.id).collect();
    let counts = Recipe::count_by_authors(&state.db, &ids).await?;
    let profiles = users(state, Some(viewer), authors).await?;

    let mut rendered = Vec::with_capacity(profiles.len());
    for user in profiles {
        let recipes = Recipe::list_by_author(&state.db, user.id, recipes_limit)
            .await?
            .into_iter()
            .map(|recipe| recipe_summary(state, recipe))
            .collect();

        rendered.push(SubscriptionResponse {
            recipes_count: counts.get(&user.id).copied().unwrap_or(0),
            recipes,
            user,
        });
    }

    Ok(rendered)
}
