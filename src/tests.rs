// Handler tests for the Accounts API
// Exercises the /users endpoints end to end against a test database

use super::*;
use crate::auth::password::PasswordService;
use crate::auth::role::Role;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

// ============================================================================
// Test Helpers
// ============================================================================

/// Connects to the test database, runs migrations and removes leftover rows
async fn create_test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://accounts_user:accounts_pass@db:5432/accounts_db".to_string());

    let pool = crate::db::create_pool(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("DELETE FROM refresh_tokens")
        .execute(&pool)
        .await
        .expect("Failed to clean refresh tokens");
    sqlx::query("DELETE FROM users")
        .execute(&pool)
        .await
        .expect("Failed to clean users");

    pool
}

/// Builds a TestServer over the full router with a fixed test secret
async fn create_test_app(pool: PgPool) -> TestServer {
    let tokens = Arc::new(TokenService::new(TEST_SECRET.to_string()));
    let service = Arc::new(AccountService::new(
        UserRepository::new(pool.clone()),
        RefreshTokenStore::new(pool),
        tokens.clone(),
    ));

    TestServer::new(create_router(AppState { service, tokens })).unwrap()
}

/// Inserts a user directly and returns (id, bearer header value)
async fn seed_user(pool: &PgPool, email: &str, role: Role) -> (i32, HeaderValue) {
    let hash = PasswordService::hash_password("Aa1!aaaa").unwrap();
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash, pseudonyme, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(email)
    .bind(&hash)
    .bind("seeded")
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user");

    let token = TokenService::new(TEST_SECRET.to_string())
        .issue_access_token(id, role)
        .unwrap();

    let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).unwrap();
    (id, bearer)
}

// ============================================================================
// Signup (POST /users/create-user)
// ============================================================================

#[tokio::test]
async fn test_signup_returns_tokens_and_default_role() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/create-user")
        .json(&json!({
            "email": "a@b.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "alice"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();

    let access = body["data"]["tokens"]["accessToken"].as_str().unwrap();
    let refresh = body["data"]["tokens"]["refreshToken"].as_str().unwrap();
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let payload = json!({
        "email": "dup@example.com",
        "password": "Aa1!aaaa",
        "pseudonyme": "first"
    });
    assert_eq!(
        server.post("/users/create-user").json(&payload).await.status_code(),
        StatusCode::CREATED
    );

    let response = server.post("/users/create-user").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["msg"], "Email already exists");
}

#[tokio::test]
async fn test_signup_missing_fields_rejected() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/create-user")
        .json(&json!({
            "email": "weak@example.com",
            "password": "weak",
            "pseudonyme": "w"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"]["errors"].is_array());
}

// ============================================================================
// Login (POST /users/login)
// ============================================================================

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let pool = create_test_pool().await;
    seed_user(&pool, "carol@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/login")
        .json(&json!({
            "email": "carol@example.com",
            "password": "Wrong1!aa"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["msg"], "Invalid email or password");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_login_unknown_email_same_message() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "Aa1!aaaa"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["msg"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_success_issues_pair() {
    let pool = create_test_pool().await;
    seed_user(&pool, "dave@example.com", Role::Moderator).await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/login")
        .json(&json!({
            "email": "dave@example.com",
            "password": "Aa1!aaaa"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["tokens"]["accessToken"].is_string());
    assert_eq!(body["data"]["user"]["role"], "moderator");
}

// ============================================================================
// Logout and refresh (POST /users/logout, /users/refresh-token)
// ============================================================================

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let signup: serde_json::Value = server
        .post("/users/create-user")
        .json(&json!({
            "email": "erin@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "erin"
        }))
        .await
        .json();
    let refresh_token = signup["data"]["tokens"]["refreshToken"].as_str().unwrap();

    let response = server
        .post("/users/refresh-token")
        .json(&json!({ "refreshToken": refresh_token }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["tokens"]["accessToken"].is_string());
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let signup: serde_json::Value = server
        .post("/users/create-user")
        .json(&json!({
            "email": "frank@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "frank"
        }))
        .await
        .json();
    let refresh_token = signup["data"]["tokens"]["refreshToken"].as_str().unwrap();

    let logout = server
        .post("/users/logout")
        .json(&json!({ "refreshToken": refresh_token }))
        .await;
    assert_eq!(logout.status_code(), StatusCode::OK);

    // Signature is still valid, but the store row is gone
    let refresh = server
        .post("/users/refresh-token")
        .json(&json!({ "refreshToken": refresh_token }))
        .await;
    assert_eq!(refresh.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = refresh.json();
    assert_eq!(body["error"]["msg"], "Invalid token");
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let signup: serde_json::Value = server
        .post("/users/create-user")
        .json(&json!({
            "email": "gina@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "gina"
        }))
        .await
        .json();
    let refresh_token = signup["data"]["tokens"]["refreshToken"].as_str().unwrap();

    for _ in 0..2 {
        let response = server
            .post("/users/logout")
            .json(&json!({ "refreshToken": refresh_token }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_refresh_with_garbage_token_rejected() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/refresh-token")
        .json(&json!({ "refreshToken": "not.a.token" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Admin create (POST /users/admin/create-user)
// ============================================================================

#[tokio::test]
async fn test_moderator_cannot_create_super_admin() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "mod@example.com", Role::Moderator).await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/admin/create-user")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({
            "email": "boss@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "boss",
            "role": "super-admin"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_admin_creates_super_admin() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "root@example.com", Role::SuperAdmin).await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/admin/create-user")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({
            "email": "boss2@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "boss2",
            "role": "super-admin"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["user"]["role"], "super-admin");
    // No tokens are issued when creating on someone else's behalf
    assert!(body["data"].get("tokens").is_none());
}

#[tokio::test]
async fn test_admin_create_with_bogus_role_rejected() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "root2@example.com", Role::SuperAdmin).await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/admin/create-user")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({
            "email": "x@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "x",
            "role": "bogus"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_create_requires_bearer() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/users/admin/create-user")
        .json(&json!({
            "email": "y@example.com",
            "password": "Aa1!aaaa",
            "pseudonyme": "y",
            "role": "user"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Listing (GET /users/get-all-users)
// ============================================================================

#[tokio::test]
async fn test_list_users_requires_admin_rank() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "plain@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    let response = server
        .get("/users/get-all-users")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_users_pagination_metadata() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin@example.com", Role::Admin).await;
    for i in 0..5 {
        seed_user(&pool, &format!("listed{}@example.com", i), Role::User).await;
    }
    let server = create_test_app(pool).await;

    let response = server
        .get("/users/get-all-users")
        .add_query_param("limit", "2")
        .add_query_param("page", "1")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["pagination"]["total"], 6);
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], 2);
    assert_eq!(body["data"]["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn test_list_users_role_filter() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin2@example.com", Role::Admin).await;
    seed_user(&pool, "m1@example.com", Role::Moderator).await;
    seed_user(&pool, "u1@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    let response = server
        .get("/users/get-all-users")
        .add_query_param("role", "moderator")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["role"], "moderator");
}

#[tokio::test]
async fn test_listing_never_exposes_password_hash() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin3@example.com", Role::Admin).await;
    let server = create_test_app(pool).await;

    let response = server
        .get("/users/get-all-users")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;

    assert!(!response.text().contains("argon2"));
}

// ============================================================================
// Delete (DELETE /users/delete-user/:id)
// ============================================================================

#[tokio::test]
async fn test_admin_deletes_lower_rank() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin4@example.com", Role::Admin).await;
    let (target_id, _) = seed_user(&pool, "victim@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    let response = server
        .delete(&format!("/users/delete-user/{}", target_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let again = server
        .delete(&format!("/users/delete-user/{}", target_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_delete_super_admin() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin5@example.com", Role::Admin).await;
    let (target_id, _) = seed_user(&pool, "root3@example.com", Role::SuperAdmin).await;
    let server = create_test_app(pool).await;

    let response = server
        .delete(&format!("/users/delete-user/{}", target_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Update (PUT /users/update-user/:id)
// ============================================================================

#[tokio::test]
async fn test_self_update_drops_role_silently() {
    let pool = create_test_pool().await;
    let (id, bearer) = seed_user(&pool, "self@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    let response = server
        .put(&format!("/users/update-user/{}", id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({
            "pseudonyme": "renamed",
            "role": "admin"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["user"]["pseudonyme"], "renamed");
    assert_eq!(body["data"]["user"]["role"], "user");
}

#[tokio::test]
async fn test_cross_update_requires_dominance() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "mod2@example.com", Role::Moderator).await;
    let (admin_id, _) = seed_user(&pool, "admin6@example.com", Role::Admin).await;
    let server = create_test_app(pool).await;

    let response = server
        .put(&format!("/users/update-user/{}", admin_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "pseudonyme": "hijacked" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_requires_dominating_new_role() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin7@example.com", Role::Admin).await;
    let (target_id, _) = seed_user(&pool, "promotee@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    // Admin may promote up to admin
    let ok = server
        .put(&format!("/users/update-user/{}", target_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "role": "moderator" }))
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);
    let body: serde_json::Value = ok.json();
    assert_eq!(body["data"]["user"]["role"], "moderator");

    // But not beyond their own rank
    let forbidden = server
        .put(&format!("/users/update-user/{}", target_id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "role": "super-admin" }))
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_password_change_requires_current_password() {
    let pool = create_test_pool().await;
    let (id, bearer) = seed_user(&pool, "pw@example.com", Role::User).await;
    let server = create_test_app(pool).await;

    // Missing current password
    let missing = server
        .put(&format!("/users/update-user/{}", id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "newPassword": "Bb2@bbbb" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

    // Wrong current password
    let wrong = server
        .put(&format!("/users/update-user/{}", id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "password": "Cc3#cccc", "newPassword": "Bb2@bbbb" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    // Correct current password
    let ok = server
        .put(&format!("/users/update-user/{}", id))
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "password": "Aa1!aaaa", "newPassword": "Bb2@bbbb" }))
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);

    // Old password no longer works, the new one does
    let old_login = server
        .post("/users/login")
        .json(&json!({ "email": "pw@example.com", "password": "Aa1!aaaa" }))
        .await;
    assert_eq!(old_login.status_code(), StatusCode::UNAUTHORIZED);

    let new_login = server
        .post("/users/login")
        .json(&json!({ "email": "pw@example.com", "password": "Bb2@bbbb" }))
        .await;
    assert_eq!(new_login.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_user_is_not_found() {
    let pool = create_test_pool().await;
    let (_, bearer) = seed_user(&pool, "admin8@example.com", Role::Admin).await;
    let server = create_test_app(pool).await;

    let response = server
        .put("/users/update-user/999999")
        .add_header(header::AUTHORIZATION, bearer.clone())
        .json(&json!({ "pseudonyme": "ghost" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
