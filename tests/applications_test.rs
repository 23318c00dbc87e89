mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{FailingAnalytics, FakeAnalytics, FixedKeyGenerator, TestApp};
use entity::user::Role;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, Statement,
};
use serde_json::Value;
use serial_test::serial;

async fn app_count(app: &TestApp) -> u64 {
    entity::application::Entity::find()
        .count(&app.state.db)
        .await
        .unwrap()
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn user_sees_only_own_applications_newest_first() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;

    app.insert_application(&alice, "Older", "web", 60).await;
    app.insert_application(&alice, "Newer", "mobile", 10).await;
    app.insert_application(&bob, "Bob's", "web", 5).await;

    let resp = app.get("/applications", &app.token_for(&alice)).await;
    resp.assert_status(StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["view"], "app.user-index");
    let names: Vec<&str> = body["data"]["applications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Newer", "Older"]);
}

#[tokio::test]
#[serial]
async fn admin_sees_all_applications_and_can_filter_by_type() {
    let app = TestApp::new().await;
    let admin = app.create_user("Root", "root@example.com", Role::Admin).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;

    app.insert_application(&alice, "Alice Web", "web", 30).await;
    app.insert_application(&bob, "Bob Mobile", "mobile", 20).await;
    app.insert_application(&bob, "Bob Web", "web", 10).await;

    let token = app.token_for(&admin);

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["view"], "app.admin-index");
    assert_eq!(body["data"]["applications"].as_array().unwrap().len(), 3);

    let body: Value = app.get("/applications?type=mobile", &token).await.json();
    let apps = body["data"]["applications"].as_array().unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["name"], "Bob Mobile");
    assert_eq!(body["data"]["type"], "mobile");
}

#[tokio::test]
#[serial]
async fn requests_without_token_are_unauthorized() {
    let app = TestApp::new().await;

    let resp = app.get("/applications", "not-a-jwt").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn banned_user_is_forbidden() {
    let app = TestApp::new().await;
    let user = app.create_user("Mallory", "mallory@example.com", Role::User).await;
    let token = app.token_for(&user);
    api_portal::db::queries::users::set_status(&app.state.db, user, entity::user::Status::Banned)
        .await
        .unwrap();

    let resp = app.get("/applications", &token).await;
    resp.assert_status(StatusCode::FORBIDDEN);
    let body: Value = resp.json();
    assert_eq!(body["error"], "user_banned");
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn admin_cannot_create_applications() {
    let app = TestApp::new().await;
    let admin = app.create_user("Root", "root@example.com", Role::Admin).await;
    let token = app.token_for(&admin);

    let resp = app.get("/applications/create", &token).await;
    resp.assert_redirect("/applications");

    let resp = app
        .send_form(
            "POST",
            "/applications",
            &token,
            &[("name", "Sneaky"), ("type", "web")],
        )
        .await;
    resp.assert_redirect("/applications");
    assert_eq!(app_count(&app).await, 0);

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["kind"], "error");
    assert_eq!(body["flash"]["message"], "Admin cannot create new application.");
}

#[tokio::test]
#[serial]
async fn user_creates_application_with_generated_key() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let token = app.token_for(&alice);

    let body: Value = app.get("/applications/create", &token).await.json();
    assert_eq!(body["view"], "app.form");

    let resp = app
        .send_form(
            "POST",
            "/applications",
            &token,
            &[
                ("name", "Candidate Lookup"),
                ("description", "Search by constituency"),
                ("type", "web"),
            ],
        )
        .await;
    resp.assert_redirect("/applications");

    let stored = entity::application::Entity::find()
        .one(&app.state.db)
        .await
        .unwrap()
        .expect("application not stored");
    assert_eq!(stored.owner_id, alice.id);
    assert_eq!(stored.name, "Candidate Lookup");
    assert_eq!(stored.app_type, "web");
    assert!(!stored.disabled);

    let key = stored.key.expect("key not assigned");
    assert_eq!(key.len(), 40);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["kind"], "success");
    assert_eq!(body["flash"]["message"], "Application is successfully created.");
}

#[tokio::test]
#[serial]
async fn created_applications_get_distinct_keys() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let token = app.token_for(&alice);

    for name in ["First", "Second"] {
        app.send_form("POST", "/applications", &token, &[("name", name), ("type", "web")])
            .await
            .assert_redirect("/applications");
    }

    let apps = entity::application::Entity::find()
        .all(&app.state.db)
        .await
        .unwrap();
    assert_eq!(apps.len(), 2);
    assert_ne!(apps[0].key, apps[1].key);
}

#[tokio::test]
#[serial]
async fn key_collision_rolls_back_and_keeps_input() {
    let app = TestApp::with_keygen(Arc::new(FixedKeyGenerator("same-key-every-time"))).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let token = app.token_for(&alice);

    app.send_form("POST", "/applications", &token, &[("name", "First"), ("type", "web")])
        .await
        .assert_redirect("/applications");

    let resp = app
        .send_form(
            "POST",
            "/applications",
            &token,
            &[
                ("name", "Second"),
                ("description", "Collides on key"),
                ("type", "mobile"),
            ],
        )
        .await;
    resp.assert_redirect("/applications/create");

    // The keyless insert of "Second" was rolled back with the failed key
    let apps = entity::application::Entity::find()
        .all(&app.state.db)
        .await
        .unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].name, "First");
    assert_eq!(apps[0].key.as_deref(), Some("same-key-every-time"));

    let body: Value = app.get("/applications/create", &token).await.json();
    assert_eq!(body["view"], "app.form");
    assert_eq!(body["flash"]["kind"], "error");
    assert_eq!(
        body["flash"]["message"],
        "Error occured to generate the application key."
    );
    assert_eq!(body["old"]["name"], "Second");
    assert_eq!(body["old"]["description"], "Collides on key");
    assert_eq!(body["old"]["type"], "mobile");

    // Old input shows once
    let body: Value = app.get("/applications/create", &token).await.json();
    assert!(body["old"].is_null());
    assert!(body["flash"].is_null());
}

#[tokio::test]
#[serial]
async fn flash_sessions_expire_when_idle() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;

    let resp = app
        .send(
            "POST",
            &format!("/applications/{}/disable", created.id),
            &app.token_for(&alice),
        )
        .await;
    resp.assert_redirect("/applications");

    let cookie = resp.set_cookie.expect("flash did not start a session");
    assert!(cookie.contains("Max-Age=3600"), "cookie without idle expiry: {cookie}");

    let row = app
        .state
        .db
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT COUNT(*) AS n FROM tower_sessions",
        ))
        .await
        .unwrap()
        .expect("no count row");
    let stored: i64 = row.try_get("", "n").unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
#[serial]
async fn invalid_application_is_not_stored() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;

    let resp = app
        .send_form(
            "POST",
            "/applications",
            &app.token_for(&alice),
            &[("name", ""), ("description", "no name"), ("type", "web")],
        )
        .await;
    resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json();
    assert_eq!(body["view"], "app.form");
    assert!(body["data"]["errors"]["name"].is_array());
    assert!(body["data"]["errors"].get("type").is_none());
    assert_eq!(body["data"]["input"]["description"], "no name");
    assert_eq!(app_count(&app).await, 0);
}

// ─── Show ────────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn show_reports_token_count_and_hits() {
    let analytics = Arc::new(FakeAnalytics::default());
    let app = TestApp::with_analytics(analytics.clone()).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;

    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    app.insert_token(&created, &alice).await;
    app.insert_token(&created, &bob).await;

    let resp = app
        .get(&format!("/applications/{}", created.id), &app.token_for(&alice))
        .await;
    resp.assert_status(StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["view"], "app.single");
    assert_eq!(body["data"]["application"]["id"], created.id.as_str());
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["analytic"]["total"], 42);

    let queries = analytics.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(Some(&queries[0].api_key), created.key.as_ref());
    assert_eq!(queries[0].hit_contents, "endpoint|api_key");
}

#[tokio::test]
#[serial]
async fn show_is_scoped_to_owner_or_admin() {
    let app = TestApp::new().await;
    let admin = app.create_user("Root", "root@example.com", Role::Admin).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    let uri = format!("/applications/{}", created.id);

    let resp = app.get(&uri, &app.token_for(&bob)).await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = app.get(&uri, &app.token_for(&admin)).await;
    resp.assert_status(StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn show_fails_when_analytics_fails() {
    let app = TestApp::with_analytics(Arc::new(FailingAnalytics)).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;

    let resp = app
        .get(&format!("/applications/{}", created.id), &app.token_for(&alice))
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// ─── Edit / update ───────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn edit_of_missing_application_flashes_and_redirects() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let token = app.token_for(&alice);

    let resp = app.get("/applications/does-not-exist/edit", &token).await;
    resp.assert_redirect("/applications");

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["message"], "Sorry, you cannot edit the application.");
}

#[tokio::test]
#[serial]
async fn update_changes_only_editable_fields() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    let token = app.token_for(&alice);

    let body: Value = app
        .get(&format!("/applications/{}/edit", created.id), &token)
        .await
        .json();
    assert_eq!(body["view"], "app.form");
    assert_eq!(body["data"]["model"]["name"], "Mapper");

    let resp = app
        .send_form(
            "PUT",
            &format!("/applications/{}", created.id),
            &token,
            &[
                ("name", "Mapper 2"),
                ("description", "Now with tiles"),
                ("type", "mobile"),
            ],
        )
        .await;
    resp.assert_redirect("/applications");

    let stored = entity::application::Entity::find_by_id(created.id.clone())
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Mapper 2");
    assert_eq!(stored.description, "Now with tiles");
    assert_eq!(stored.app_type, "mobile");
    assert_eq!(stored.key, created.key);
    assert_eq!(stored.owner_id, alice.id);
}

#[tokio::test]
#[serial]
async fn update_of_foreign_application_is_refused() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    let token = app.token_for(&bob);

    let resp = app
        .send_form(
            "PUT",
            &format!("/applications/{}", created.id),
            &token,
            &[("name", "Hijacked"), ("type", "web")],
        )
        .await;
    resp.assert_redirect("/applications");

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["message"], "Sorry, you cannot update the application.");

    let stored = entity::application::Entity::find_by_id(created.id.clone())
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Mapper");
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn delete_removes_application_and_callers_tokens() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    app.insert_token(&created, &alice).await;
    let bobs_token = app.insert_token(&created, &bob).await;

    let resp = app
        .send(
            "DELETE",
            &format!("/applications/{}", created.id),
            &app.token_for(&alice),
        )
        .await;
    resp.assert_redirect("/applications");

    assert_eq!(app_count(&app).await, 0);

    let remaining = entity::token::Entity::find()
        .filter(entity::token::Column::AppId.eq(created.id.as_str()))
        .all(&app.state.db)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, bobs_token.id);
}

#[tokio::test]
#[serial]
async fn delete_of_foreign_application_changes_nothing() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    app.insert_token(&created, &bob).await;
    let token = app.token_for(&bob);

    app.send("DELETE", &format!("/applications/{}", created.id), &token)
        .await
        .assert_redirect("/applications");

    assert_eq!(app_count(&app).await, 1);
    let tokens = entity::token::Entity::find()
        .count(&app.state.db)
        .await
        .unwrap();
    assert_eq!(tokens, 1);

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["message"], "Sorry, you cannot delete the application.");
}

// ─── Disable / enable ────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn disable_and_enable_cascade_to_tokens() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;
    let other = app.insert_application(&alice, "Other", "web", 0).await;
    app.insert_token(&created, &alice).await;
    app.insert_token(&created, &bob).await;
    app.insert_token(&other, &bob).await;
    let token = app.token_for(&alice);

    app.send("POST", &format!("/applications/{}/disable", created.id), &token)
        .await
        .assert_redirect("/applications");

    let stored = entity::application::Entity::find_by_id(created.id.clone())
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.disabled);

    let disabled = entity::token::Entity::find()
        .filter(entity::token::Column::Disabled.eq(true))
        .all(&app.state.db)
        .await
        .unwrap();
    assert_eq!(disabled.len(), 2);
    assert!(disabled.iter().all(|t| t.app_id == created.id));

    app.send("POST", &format!("/applications/{}/enable", created.id), &token)
        .await
        .assert_redirect("/applications");

    let still_disabled = entity::token::Entity::find()
        .filter(entity::token::Column::Disabled.eq(true))
        .count(&app.state.db)
        .await
        .unwrap();
    assert_eq!(still_disabled, 0);

    let body: Value = app.get("/applications", &token).await.json();
    assert_eq!(body["flash"]["message"], "Application is successfully enabled.");
}

#[tokio::test]
#[serial]
async fn admin_can_disable_any_application() {
    let app = TestApp::new().await;
    let admin = app.create_user("Root", "root@example.com", Role::Admin).await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;

    app.send(
        "POST",
        &format!("/applications/{}/disable", created.id),
        &app.token_for(&admin),
    )
    .await
    .assert_redirect("/applications");

    let stored = entity::application::Entity::find_by_id(created.id.clone())
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.disabled);
}

#[tokio::test]
#[serial]
async fn disable_of_foreign_application_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.create_user("Alice", "alice@example.com", Role::User).await;
    let bob = app.create_user("Bob", "bob@example.com", Role::User).await;
    let created = app.insert_application(&alice, "Mapper", "web", 0).await;

    let resp = app
        .send(
            "POST",
            &format!("/applications/{}/disable", created.id),
            &app.token_for(&bob),
        )
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}
