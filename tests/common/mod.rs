#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api_portal::config::Config;
use api_portal::error::AppError;
use api_portal::routes::{create_router, session_store};
use api_portal::services::analytics::{Analytics, HitsQuery};
use api_portal::services::keygen::KeyGenerator;
use api_portal::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use entity::user::Role;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, Set};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret-0123456789";

// ─── Collaborator doubles ────────────────────────────────────────────────────

/// Records every query and answers with a fixed hit count.
#[derive(Default)]
pub struct FakeAnalytics {
    pub queries: Mutex<Vec<HitsQuery>>,
}

#[async_trait]
impl Analytics for FakeAnalytics {
    async fn total_hits(&self, query: &HitsQuery) -> Result<serde_json::Value, AppError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(serde_json::json!({ "total": 42 }))
    }
}

pub struct FailingAnalytics;

#[async_trait]
impl Analytics for FailingAnalytics {
    async fn total_hits(&self, _query: &HitsQuery) -> Result<serde_json::Value, AppError> {
        Err(AppError::Internal("analytics unavailable".to_string()))
    }
}

/// Hands out the same key every time, so the second application collides
/// with the unique index.
pub struct FixedKeyGenerator(pub &'static str);

impl KeyGenerator for FixedKeyGenerator {
    fn generate(
        &self,
        _owner: &entity::user::Model,
        _app: &entity::application::Model,
    ) -> String {
        self.0.to_string()
    }
}

// ─── TestResponse ────────────────────────────────────────────────────────────

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    body_bytes: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).to_string()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body_bytes).unwrap_or_else(|e| {
            panic!(
                "Failed to deserialize response as {}: {e}\nBody: {}",
                std::any::type_name::<T>(),
                self.text()
            )
        })
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected status {expected}, got {}. Body: {}",
            self.status,
            self.text()
        );
    }

    pub fn assert_redirect(&self, to: &str) {
        self.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(self.location.as_deref(), Some(to));
    }
}

// ─── TestApp ─────────────────────────────────────────────────────────────────

pub struct TestApp {
    router: Router,
    pub state: AppState,
    /// Session cookie carried between requests, like a browser would.
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(|_| {}).await
    }

    pub async fn with_analytics(analytics: Arc<dyn Analytics>) -> Self {
        Self::build(|state| state.analytics = analytics).await
    }

    pub async fn with_keygen(keygen: Arc<dyn KeyGenerator>) -> Self {
        Self::build(|state| state.keygen = keygen).await
    }

    /// Collaborators are swapped in `configure` before the router is built.
    async fn build(configure: impl FnOnce(&mut AppState)) -> Self {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            jwt_issuer: "api-portal-test".to_string(),
            jwt_access_token_expiry_secs: 3600,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            analytics_url: None,
            cors_allowed_origins: "*".to_string(),
        };

        let db = Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to in-memory SQLite");

        migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let mut state = AppState::new(db, config).expect("Failed to build state");
        state.analytics = Arc::new(FakeAnalytics::default());
        configure(&mut state);

        let sessions = session_store(&state.db)
            .await
            .expect("Failed to create session store");
        let router = create_router(state.clone(), sessions);

        Self {
            router,
            state,
            cookie: Mutex::new(None),
        }
    }

    pub async fn request(&self, mut req: Request<Body>) -> TestResponse {
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let resp = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot failed");

        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        if let Some(set_cookie) = &set_cookie {
            let pair = set_cookie
                .split(';')
                .next()
                .unwrap()
                .trim()
                .to_string();
            let empty = pair.ends_with('=');
            *self.cookie.lock().unwrap() = if empty { None } else { Some(pair) };
        }

        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body_bytes = resp
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            location,
            set_cookie,
            body_bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send("GET", uri, token).await
    }

    /// Bodyless request, as sent by the delete/ban/publish buttons.
    pub async fn send(&self, method: &str, uri: &str, token: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        self.request(req).await
    }

    pub async fn send_form(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let encoded = reqwest::Url::parse_with_params("http://localhost/", fields)
            .unwrap()
            .query()
            .unwrap_or_default()
            .to_string();

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encoded))
            .unwrap();

        self.request(req).await
    }

    // ── Fixtures ─────────────────────────────────────────────────────────

    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> entity::user::Model {
        api_portal::db::queries::users::insert(&self.state.db, name, email, role)
            .await
            .expect("Failed to insert user")
    }

    pub fn token_for(&self, user: &entity::user::Model) -> String {
        self.state
            .jwt
            .issue_access_token(&user.id)
            .expect("Failed to issue token")
    }

    /// Inserts a keyed application created `age_secs` seconds ago.
    pub async fn insert_application(
        &self,
        owner: &entity::user::Model,
        name: &str,
        app_type: &str,
        age_secs: i64,
    ) -> entity::application::Model {
        let created = chrono::Utc::now().naive_utc() - chrono::Duration::seconds(age_secs);

        entity::application::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            owner_id: Set(owner.id.clone()),
            name: Set(name.to_string()),
            description: Set(format!("{name} description")),
            app_type: Set(app_type.to_string()),
            key: Set(Some(uuid::Uuid::new_v4().simple().to_string())),
            disabled: Set(false),
            created_at: Set(created),
            updated_at: Set(created),
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to insert application")
    }

    pub async fn insert_token(
        &self,
        app: &entity::application::Model,
        user: &entity::user::Model,
    ) -> entity::token::Model {
        entity::token::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            app_id: Set(app.id.clone()),
            user_id: Set(user.id.clone()),
            disabled: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to insert token")
    }
}
