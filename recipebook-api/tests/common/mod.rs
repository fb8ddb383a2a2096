/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations included)
/// - Seeded users, tags and ingredients with unique names
/// - JWT token generation
/// - A temporary media root
/// - Request helpers driving the router with `oneshot`

use axum::body::Body;
use axum::http::{Request, StatusCode};
use recipebook_api::app::{build_router, AppState};
use recipebook_api::config::Config;
use recipebook_shared::auth::jwt::{create_token, Claims};
use recipebook_shared::db::migrations::run_migrations;
use recipebook_shared::models::ingredient::{CreateIngredient, Ingredient};
use recipebook_shared::models::tag::{CreateTag, Tag};
use recipebook_shared::models::user::{CreateUser, User};
use serde_json::Value;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// 1x1 PNG header as a data URL
pub const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub media: TempDir,
    pub author: User,
    pub reader: User,
    pub tag: Tag,
    pub ingredients: Vec<Ingredient>,
    pub author_token: String,
    pub reader_token: String,
}

fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &id[..12])
}

async fn create_user(db: &PgPool) -> anyhow::Result<User> {
    let username = unique("user");
    Ok(User::create(
        db,
        CreateUser {
            email: format!("{}@example.com", username),
            username,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await?)
}

impl TestContext {
    /// Creates a new test context against `DATABASE_URL`
    pub async fn new() -> anyhow::Result<Self> {
        let media = TempDir::new()?;
        let media_root = media.path().to_string_lossy().to_string();

        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "MEDIA_ROOT" => Some(media_root.clone()),
            "PUBLIC_URL" => Some("http://testserver".to_string()),
            other => std::env::var(other).ok(),
        })?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let author = create_user(&db).await?;
        let reader = create_user(&db).await?;

        let slug = unique("t");
        let tag = Tag::create(
            &db,
            CreateTag {
                name: slug.clone(),
                slug,
            },
        )
        .await?;

        let mut ingredients = Vec::new();
        for (name, unit) in [("tomato", "pcs"), ("Tofu", "g"), ("salt", "g")] {
            ingredients.push(
                Ingredient::create(
                    &db,
                    CreateIngredient {
                        name: unique(name),
                        measurement_unit: unit.to_string(),
                    },
                )
                .await?,
            );
        }

        let author_token = create_token(&Claims::new(author.id), JWT_SECRET)?;
        let reader_token = create_token(&Claims::new(reader.id), JWT_SECRET)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            media,
            author,
            reader,
            tag,
            ingredients,
            author_token,
            reader_token,
        })
    }

    /// Sends a request, optionally authenticated, with an optional JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, bytes.to_vec())
    }

    /// Like [`send`](Self::send) but parses the body as JSON (`Null` when empty)
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, token, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    /// A valid recipe payload using the seeded tag and the first two ingredients
    pub fn recipe_body(&self) -> Value {
        serde_json::json!({
            "name": "Tomato salad",
            "text": "Slice and season",
            "cooking_time": 10,
            "image": PNG,
            "tags": [self.tag.id],
            "ingredients": [
                {"id": self.ingredients[0].id, "amount": 2},
                {"id": self.ingredients[1].id, "amount": 3}
            ]
        })
    }

    /// Creates a recipe as the author, returning its ID
    pub async fn create_recipe(&self, body: Value) -> i64 {
        let (status, json) = self
            .send_json("POST", "/api/recipes/", Some(&self.author_token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
        json["id"].as_i64().unwrap()
    }

    /// A valid token whose user has since been deleted
    pub async fn deleted_user_token(&self) -> String {
        let user = create_user(&self.db).await.unwrap();
        User::delete(&self.db, user.id).await.unwrap();
        create_token(&Claims::new(user.id), JWT_SECRET).unwrap()
    }

    /// Deletes seeded users; their recipes and relations cascade
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.author.id).await?;
        User::delete(&self.db, self.reader.id).await?;
        Ok(())
    }
}
