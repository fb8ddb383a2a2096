/// User endpoints
///
/// ```text
/// GET    /api/users/                    # paginated
/// GET    /api/users/:id/
/// GET    /api/users/me/                 # authenticated
/// GET    /api/users/me/avatar/          # PUT/PATCH to upload, DELETE to remove
/// POST   /api/users/:id/subscribe/      # ?recipes_limit=N, DELETE to remove
/// GET    /api/users/subscriptions/      # ?page, limit, recipes_limit
/// ```
///
/// Users themselves are provisioned outside this service.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    pagination::{Page, PageRequest},
    params::QueryParams,
    represent::{self, AvatarResponse, SubscriptionResponse, UserResponse},
};
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::StatusCode,
    Json,
};
use recipebook_shared::{
    auth::middleware::AuthContext,
    avatar,
    models::{subscription::Subscription, user::User},
};
use serde::Deserialize;

/// Body of avatar uploads
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    /// Base64 data URL
    pub avatar: Option<String>,
}

fn recipes_limit(params: &QueryParams) -> Option<i64> {
    params.get_i64("recipes_limit").filter(|limit| *limit >= 0)
}

async fn require_user(state: &AppState, id: i64) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Lists users ordered by ID
pub async fn list_users(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    OriginalUri(uri): OriginalUri,
    params: QueryParams,
) -> ApiResult<Json<Page<UserResponse>>> {
    let page = PageRequest::from_params(&params)?;

    let count = User::count(&state.db).await?;
    page.ensure_within(count)?;

    let users = User::list(&state.db, page.limit, page.offset()).await?;
    let results = represent::users(&state, auth.map(|a| a.user_id), users).await?;

    Ok(Json(Page::new(results, count, page, &state.request_url(&uri)?)))
}

/// Retrieves one user
pub async fn get_user(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = require_user(&state, id).await?;
    Ok(Json(represent::user(&state, auth.map(|a| a.user_id), user).await?))
}

/// Retrieves the caller's own profile
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<UserResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    Ok(Json(represent::user(&state, Some(auth.user_id), user).await?))
}

/// Returns the caller's avatar URL
pub async fn get_avatar(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<AvatarResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    Ok(Json(represent::avatar_response(&state, &user)))
}

/// Uploads or replaces the caller's avatar
pub async fn set_avatar(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<AvatarRequest>, JsonRejection>,
) -> ApiResult<Json<AvatarResponse>> {
    let Json(request) = payload?;

    let user = avatar::set_avatar(
        &state.db,
        state.media.as_ref(),
        auth.user_id,
        request.avatar.as_deref(),
    )
    .await?;

    Ok(Json(represent::avatar_response(&state, &user)))
}

/// Removes the caller's avatar
pub async fn delete_avatar(State(state): State<AppState>, auth: AuthContext) -> ApiResult<StatusCode> {
    avatar::clear_avatar(&state.db, state.media.as_ref(), auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Subscribes the caller to an author
pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    params: QueryParams,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let author = Subscription::subscribe(&state.db, auth.user_id, id).await?;

    let body = represent::subscriptions(&state, auth.user_id, vec![author], recipes_limit(&params))
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(body)))
}

/// Unsubscribes the caller from an author
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    Subscription::unsubscribe(&state.db, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the authors the caller follows, most recent subscription first
pub async fn list_subscriptions(
    State(state): State<AppState>,
    auth: AuthContext,
    OriginalUri(uri): OriginalUri,
    params: QueryParams,
) -> ApiResult<Json<Page<SubscriptionResponse>>> {
    let page = PageRequest::from_params(&params)?;

    let count = Subscription::count_following(&state.db, auth.user_id).await?;
    page.ensure_within(count)?;

    let authors = Subscription::list_following(&state.db, auth.user_id, page.limit, page.offset()).await?;
    let results = represent::subscriptions(&state, auth.user_id, authors, recipes_limit(&params)).await?;

    Ok(Json(Page::new(results, count, page, &state.request_url(&uri)?)))
}
