/// Authentication context and bearer-token middleware
///
/// The API accepts anonymous requests on read endpoints, so authentication
/// is split in two steps:
///
/// 1. [`bearer_auth_middleware`] runs on every request. Without an
///    `Authorization` header it passes the request through untouched; with
///    one it validates the token and inserts an [`AuthContext`] into the
///    request extensions.
/// 2. Handlers declare what they need: `AuthContext` (401 when anonymous)
///    or `Option<AuthContext>` (viewer-aware reads).
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use recipebook_shared::auth::middleware::{create_bearer_middleware, AuthContext};
///
/// async fn me(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn(create_bearer_middleware("secret")));
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{validate_token, JwtError};

/// Authenticated caller
///
/// Passed explicitly into every model operation that depends on who is
/// asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,
}

impl AuthContext {
    /// Creates auth context for a user
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Endpoint requires a user but none was authenticated
    #[error("Authentication credentials were not provided")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid token issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Bearer token middleware
///
/// Validates `Authorization: Bearer <token>` when present and records the
/// caller in request extensions. Requests without the header continue as
/// anonymous.
///
/// # Errors
///
/// `401 Unauthorized` if the header is not a Bearer credential or the token
/// is invalid or expired.
pub async fn bearer_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let auth_header = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token.trim(), &secret)?;

    req.extensions_mut().insert(AuthContext::new(claims.sub));

    Ok(next.run(req).await)
}

/// Creates a bearer middleware closure capturing the JWT secret
pub fn create_bearer_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(bearer_auth_middleware(secret, req, next))
    }
}
