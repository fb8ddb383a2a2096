/// Recipe endpoints
///
/// ```text
/// GET    /api/recipes/                        # paginated, filterable
/// POST   /api/recipes/                        # authenticated
/// GET    /api/recipes/:id/
/// PATCH  /api/recipes/:id/                    # author only
/// DELETE /api/recipes/:id/                    # author only
/// POST   /api/recipes/:id/favorite/           # DELETE to remove
/// POST   /api/recipes/:id/shopping_cart/      # DELETE to remove
/// GET    /api/recipes/download_shopping_cart/ # CSV attachment
/// ```
///
/// # List filters
///
/// - `author=<id>`
/// - `tags=<slug>` (repeatable; a recipe matches if it has any of them)
/// - `is_favorited=0|1`, `is_in_shopping_cart=0|1` (ignored when anonymous)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    pagination::{Page, PageRequest},
    params::QueryParams,
    represent::{self, RecipeResponse, RecipeSummary},
};
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use recipebook_shared::{
    auth::middleware::AuthContext,
    models::{
        recipe::{Recipe, RecipeFilter},
        relation::{self, Favorite, RecipeRelation, ShoppingCart},
    },
    recipe_write::{self, IngredientAmountInput, RecipeDraft},
    shopping_list,
};
use serde::Deserialize;
use validator::Validate;

/// Body of recipe create and update requests
///
/// Field-level bounds are checked here; list rules (non-empty, no
/// duplicates, existing references) are enforced by the write path.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipeRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 32767, message = "Cooking time must be between 1 and 32767"))]
    pub cooking_time: Option<i64>,

    /// Base64 data URL
    pub image: Option<String>,

    pub tags: Option<Vec<i64>>,

    pub ingredients: Option<Vec<IngredientAmountInput>>,
}

impl From<RecipeRequest> for RecipeDraft {
    fn from(request: RecipeRequest) -> Self {
        RecipeDraft {
            name: request.name,
            text: request.text,
            cooking_time: request.cooking_time,
            image: request.image,
            tags: request.tags,
            ingredients: request.ingredients,
        }
    }
}

fn read_body(payload: Result<Json<RecipeRequest>, JsonRejection>) -> ApiResult<RecipeDraft> {
    let Json(request) = payload?;
    request.validate()?;
    Ok(request.into())
}

/// Lists recipes, newest first
pub async fn list_recipes(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    OriginalUri(uri): OriginalUri,
    params: QueryParams,
) -> ApiResult<Json<Page<RecipeResponse>>> {
    let viewer = auth.map(|a| a.user_id);
    let page = PageRequest::from_params(&params)?;

    let filter = RecipeFilter {
        viewer,
        author: params.get_i64("author"),
        tags: params.get_all("tags"),
        is_favorited: params.get_flag("is_favorited"),
        is_in_shopping_cart: params.get_flag("is_in_shopping_cart"),
    };

    let count = Recipe::count(&state.db, &filter).await?;
    page.ensure_within(count)?;

    let recipes = Recipe::list(&state.db, &filter, page.limit, page.offset()).await?;
    let results = represent::recipes(&state, viewer, recipes).await?;

    Ok(Json(Page::new(results, count, page, &state.request_url(&uri)?)))
}

/// Creates a recipe authored by the caller
pub async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let draft = read_body(payload)?;

    let recipe = recipe_write::create_recipe(&state.db, state.media.as_ref(), auth.user_id, &draft).await?;
    let body = represent::recipe(&state, Some(auth.user_id), recipe).await?;

    Ok((StatusCode::CREATED, Json(body)))
}

/// Retrieves one recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeResponse>> {
    let recipe = Recipe::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(represent::recipe(&state, auth.map(|a| a.user_id), recipe).await?))
}

/// Updates a recipe; tags and ingredients replace the stored sets
pub async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<Json<RecipeResponse>> {
    let draft = read_body(payload)?;

    let recipe =
        recipe_write::update_recipe(&state.db, state.media.as_ref(), auth.user_id, id, &draft).await?;

    Ok(Json(represent::recipe(&state, Some(auth.user_id), recipe).await?))
}

/// Deletes a recipe
pub async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    recipe_write::delete_recipe(&state.db, state.media.as_ref(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark<R: RecipeRelation>(
    state: &AppState,
    auth: AuthContext,
    id: i64,
) -> ApiResult<(StatusCode, Json<RecipeSummary>)> {
    let recipe = relation::add::<R>(&state.db, auth.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(represent::recipe_summary(state, recipe))))
}

async fn unmark<R: RecipeRelation>(state: &AppState, auth: AuthContext, id: i64) -> ApiResult<StatusCode> {
    relation::remove::<R>(&state.db, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a recipe to the caller's favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeSummary>)> {
    mark::<Favorite>(&state, auth, id).await
}

/// Removes a recipe from the caller's favorites
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    unmark::<Favorite>(&state, auth, id).await
}

/// Adds a recipe to the caller's shopping cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeSummary>)> {
    mark::<ShoppingCart>(&state, auth, id).await
}

/// Removes a recipe from the caller's shopping cart
pub async fn remove_from_cart(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    unmark::<ShoppingCart>(&state, auth, id).await
}

/// Downloads the caller's aggregated shopping list as CSV
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Response> {
    let csv = shopping_list::build_shopping_list(&state.db, auth.user_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", shopping_list::FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> RecipeRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_bounds() {
        let ok = request(serde_json::json!({
            "name": "Soup",
            "cooking_time": 10,
            "tags": [1],
            "ingredients": [{"id": 1, "amount": 2}]
        }));
        assert!(ok.validate().is_ok());

        let long_name = request(serde_json::json!({ "name": "x".repeat(257) }));
        assert!(long_name.validate().is_err());

        let zero_time = request(serde_json::json!({ "cooking_time": 0 }));
        assert!(zero_time.validate().is_err());
    }

    #[test]
    fn test_request_converts_to_draft() {
        let draft: RecipeDraft = request(serde_json::json!({
            "text": "Mix",
            "ingredients": [{"id": 4, "amount": 3}]
        }))
        .into();

        assert_eq!(draft.text.as_deref(), Some("Mix"));
        assert!(draft.name.is_none());
        assert_eq!(draft.ingredients, Some(vec![IngredientAmountInput { id: 4, amount: 3 }]));
    }
}
