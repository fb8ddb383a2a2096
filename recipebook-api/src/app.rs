/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use recipebook_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = recipebook_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware,
    routing::{get, post},
    Router,
};
use recipebook_shared::{
    auth::middleware::create_bearer_middleware,
    media::{LocalMediaStore, MediaStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use url::Url;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Storage for recipe images and avatars
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// Creates application state with a filesystem media store
    pub fn new(db: PgPool, config: Config) -> Self {
        let media = LocalMediaStore::new(&config.media.root, config.media_base_url());
        Self::with_media(db, config, Arc::new(media))
    }

    /// Creates application state with a custom media store
    pub fn with_media(db: PgPool, config: Config, media: Arc<dyn MediaStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }

    /// Gets JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Absolute URL for a server path
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api.public_url, path)
    }

    /// Absolute URL of the current request, used for pagination links
    pub fn request_url(&self, uri: &Uri) -> ApiResult<Url> {
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Url::parse(&self.absolute_url(path))
            .map_err(|e| ApiError::InternalError(format!("Failed to build request URL: {}", e)))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health
/// ├── /s/:code                              # short link redirect
/// ├── /media/...                            # stored images
/// └── /api/
///     ├── /tags/, /tags/:id/
///     ├── /ingredients/, /ingredients/:id/
///     ├── /recipes/                         # GET list, POST create
///     │   ├── /download_shopping_cart/
///     │   └── /:id/                         # GET, PATCH, DELETE
///     │       ├── /get-link/
///     │       ├── /favorite/                # POST, DELETE
///     │       └── /shopping_cart/           # POST, DELETE
///     └── /users/                           # GET list
///         ├── /me/, /me/avatar/
///         ├── /subscriptions/
///         └── /:id/, /:id/subscribe/
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost last):
/// 1. Optional bearer authentication (injects `AuthContext`)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let tag_routes = Router::new()
        .route("/", get(routes::tags::list_tags))
        .route("/:id/", get(routes::tags::get_tag));

    let ingredient_routes = Router::new()
        .route("/", get(routes::ingredients::list_ingredients))
        .route("/:id/", get(routes::ingredients::get_ingredient));

    let recipe_routes = Router::new()
        .route(
            "/",
            get(routes::recipes::list_recipes).post(routes::recipes::create_recipe),
        )
        .route(
            "/download_shopping_cart/",
            get(routes::recipes::download_shopping_cart),
        )
        .route(
            "/:id/",
            get(routes::recipes::get_recipe)
                .patch(routes::recipes::update_recipe)
                .delete(routes::recipes::delete_recipe),
        )
        .route("/:id/get-link/", get(routes::links::get_link))
        .route(
            "/:id/favorite/",
            post(routes::recipes::add_favorite).delete(routes::recipes::remove_favorite),
        )
        .route(
            "/:id/shopping_cart/",
            post(routes::recipes::add_to_cart).delete(routes::recipes::remove_from_cart),
        );

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/me/", get(routes::users::me))
        .route(
            "/me/avatar/",
            get(routes::users::get_avatar)
                .put(routes::users::set_avatar)
                .patch(routes::users::set_avatar)
                .delete(routes::users::delete_avatar),
        )
        .route("/subscriptions/", get(routes::users::list_subscriptions))
        .route("/:id/", get(routes::users::get_user))
        .route(
            "/:id/subscribe/",
            post(routes::users::subscribe).delete(routes::users::unsubscribe),
        );

    let api_routes = Router::new()
        .nest("/tags/", tag_routes)
        .nest("/ingredients/", ingredient_routes)
        .nest("/recipes/", recipe_routes)
        .nest("/users/", user_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let media_path = match state.config.media.url_path.trim_end_matches('/') {
        "" => "/media".to_string(),
        path => path.to_string(),
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/s/:code", get(routes::links::follow_link))
        .nest("/api", api_routes)
        .nest_service(&media_path, ServeDir::new(&state.config.media.root))
        .layer(middleware::from_fn(create_bearer_middleware(
            state.jwt_secret().to_string(),
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
