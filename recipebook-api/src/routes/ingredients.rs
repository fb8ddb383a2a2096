/// Ingredient catalog endpoints
///
/// ```text
/// GET /api/ingredients/?name=<prefix>   # unpaginated, case-sensitive prefix match
/// GET /api/ingredients/:id/
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    params::QueryParams,
};
use axum::{
    extract::{Path, State},
    Json,
};
use recipebook_shared::models::ingredient::Ingredient;

/// Lists ingredients, filtered by name prefix when `name` is given
pub async fn list_ingredients(
    State(state): State<AppState>,
    params: QueryParams,
) -> ApiResult<Json<Vec<Ingredient>>> {
    Ok(Json(Ingredient::list(&state.db, params.get("name")).await?))
}

/// Retrieves one ingredient
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ingredient>> {
    Ingredient::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))
}
