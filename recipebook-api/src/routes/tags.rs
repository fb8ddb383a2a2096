/// Tag catalog endpoints
///
/// ```text
/// GET /api/tags/        # every tag, unpaginated
/// GET /api/tags/:id/
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use recipebook_shared::models::tag::Tag;

/// Lists all tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(Tag::list(&state.db).await?))
}

/// Retrieves one tag
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Tag>> {
    Tag::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))
}
