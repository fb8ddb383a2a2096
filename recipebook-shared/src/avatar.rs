/// Avatar upload and removal
///
/// Each user has at most one avatar file, named after the user ID. Replacing
/// an avatar with a different image type removes the previous file once the
/// new reference is stored.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::media::{avatar_name, decode_data_url, MediaError, MediaStore};
use crate::models::user::User;

fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}

async fn discard(store: &dyn MediaStore, user_id: i64, name: &str) {
    if let Err(e) = store.delete(name).await {
        warn!(user_id, media = name, error = %e, "Failed to delete avatar file");
    }
}

/// Stores a new avatar for a user
///
/// # Errors
///
/// - `Validation` (field `avatar`) if the payload is absent or not a
///   decodable image
/// - `NotFound` if the user does not exist
pub async fn set_avatar(
    pool: &PgPool,
    store: &dyn MediaStore,
    user_id: i64,
    payload: Option<&str>,
) -> ServiceResult<User> {
    let payload = payload
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ServiceError::validation("avatar", "This field is required"))?;

    let image = decode_data_url(payload).map_err(|e| match e {
        MediaError::InvalidPayload(msg) => ServiceError::validation("avatar", msg),
        other => ServiceError::Media(other),
    })?;

    let current = User::find_by_id(pool, user_id).await?.ok_or_else(user_not_found)?;

    let name = avatar_name(user_id, image.extension);
    store.save(&name, &image.bytes).await?;

    // Same name means the stored file was overwritten in place
    let overwritten = current.avatar.as_deref() == Some(name.as_str());

    let user = match User::set_avatar(pool, user_id, Some(&name)).await {
        Ok(Some(user)) => user,
        failed => {
            if !overwritten {
                discard(store, user_id, &name).await;
            }
            return Err(failed.err().map_or_else(user_not_found, ServiceError::from));
        }
    };

    if let Some(old) = current.avatar.filter(|_| !overwritten) {
        discard(store, user_id, &old).await;
    }

    info!(user_id, "Avatar updated");
    Ok(user)
}

/// Removes a user's avatar
///
/// # Errors
///
/// - `Validation` (field `avatar`) if the user has no avatar
/// - `NotFound` if the user does not exist
pub async fn clear_avatar(pool: &PgPool, store: &dyn MediaStore, user_id: i64) -> ServiceResult<User> {
    let current = User::find_by_id(pool, user_id).await?.ok_or_else(user_not_found)?;

    let old = current
        .avatar
        .ok_or_else(|| ServiceError::validation("avatar", "No avatar to delete"))?;

    let user = User::set_avatar(pool, user_id, None)
        .await?
        .ok_or_else(user_not_found)?;

    discard(store, user_id, &old).await;

    info!(user_id, "Avatar removed");
    Ok(user)
}
