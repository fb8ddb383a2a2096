/// Short recipe links
///
/// ```text
/// GET /api/recipes/:id/get-link/   # { "short-link": "http://host/s/3d7" }
/// GET /s/:code                     # 307 to /api/recipes/:id/
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use recipebook_shared::{
    models::recipe::Recipe,
    shortlink::{self, SHORT_LINK_PREFIX},
};
use serde::Serialize;

/// Short link body
#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

async fn require_recipe(state: &AppState, id: i64) -> ApiResult<Recipe> {
    Recipe::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
}

/// Returns the absolute short link of a recipe
pub async fn get_link(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ShortLinkResponse>> {
    let recipe = require_recipe(&state, id).await?;
    let path = format!("{}{}", SHORT_LINK_PREFIX, shortlink::encode(recipe.id));

    Ok(Json(ShortLinkResponse {
        short_link: state.absolute_url(&path),
    }))
}

/// Redirects a short link to its recipe
pub async fn follow_link(State(state): State<AppState>, Path(code): Path<String>) -> ApiResult<Redirect> {
    let id = shortlink::decode(&code).ok_or_else(|| ApiError::NotFound("Unknown short link".to_string()))?;
    let recipe = require_recipe(&state, id).await?;

    Ok(Redirect::temporary(&format!("/api/recipes/{}/", recipe.id)))
}
