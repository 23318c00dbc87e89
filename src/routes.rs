use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::db::pool::Db;
use crate::handlers;
use crate::AppState;

/// Idle sessions expire after this many minutes.
pub const SESSION_IDLE_MINUTES: i64 = 60;

/// Session store sharing the application database. Creates its table on
/// first use.
pub async fn session_store(
    db: &Db,
) -> Result<SqliteStore, tower_sessions_sqlx_store::sqlx::Error> {
    let store = SqliteStore::new(db.get_sqlite_connection_pool().clone());
    store.migrate().await?;
    Ok(store)
}

pub fn create_router(state: AppState, sessions: SqliteStore) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    // Flash messages and old input live in the session
    let session_layer = SessionManagerLayer::new(sessions)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            SESSION_IDLE_MINUTES,
        )));

    let application_routes = Router::new()
        .route(
            "/applications",
            get(handlers::applications::index).post(handlers::applications::store),
        )
        .route("/applications/create", get(handlers::applications::create))
        .route(
            "/applications/:id",
            get(handlers::applications::show)
                .put(handlers::applications::update)
                .delete(handlers::applications::destroy),
        )
        .route("/applications/:id/edit", get(handlers::applications::edit))
        .route(
            "/applications/:id/disable",
            post(handlers::applications::disable),
        )
        .route(
            "/applications/:id/enable",
            post(handlers::applications::enable),
        );

    // Admin only
    let user_routes = Router::new()
        .route("/users", get(handlers::users::index))
        .route("/users/:id", delete(handlers::users::destroy))
        .route("/users/:id/ban", post(handlers::users::ban))
        .route("/users/:id/unban", post(handlers::users::unban));

    // Admin only
    let showcase_routes = Router::new()
        .route(
            "/showcase",
            get(handlers::showcase::index).post(handlers::showcase::store),
        )
        .route("/showcase/create", get(handlers::showcase::create))
        .route(
            "/showcase/:id",
            put(handlers::showcase::update).delete(handlers::showcase::destroy),
        )
        .route("/showcase/:id/edit", get(handlers::showcase::edit))
        .route("/showcase/:id/publish", post(handlers::showcase::publish))
        .route("/showcase/:id/draft", post(handlers::showcase::draft))
        .route("/showcase/:id/media", get(handlers::showcase::media))
        .route("/showcase/:id/icon", put(handlers::showcase::set_icon))
        .route(
            "/showcase/:id/screenshots",
            post(handlers::showcase::add_screenshot),
        )
        .route(
            "/showcase/:id/screenshots/:index",
            delete(handlers::showcase::remove_screenshot),
        );

    Router::new()
        .route("/", get(handlers::dashboard::index))
        .merge(application_routes)
        .merge(user_routes)
        .merge(showcase_routes)
        .layer(session_layer)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed: &str) -> CorsLayer {
    let origins: Vec<&str> = allowed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let layer = if origins.contains(&"*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer.allow_methods(Any).allow_headers(Any)
}

async fn health_check() -> &'static str {
    "ok"
}
