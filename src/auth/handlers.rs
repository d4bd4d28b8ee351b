// HTTP handlers for the /users endpoints

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        AdminCreateRequest, LoginRequest, RefreshTokenRequest, SignupRequest, UpdateUserRequest,
    },
    service::AccountService,
};
use crate::query::ListUsersParams;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Register a new account
/// POST /users/create-user
#[utoipa::path(
    post,
    path = "/users/create-user",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, token pair issued"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already exists")
    ),
    tag = "users"
)]
pub async fn signup_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    let payload = service.signup(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "data": payload,
        })),
    ))
}

/// Authenticate and obtain a token pair
/// POST /users/login
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated, token pair issued"),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "users"
)]
pub async fn login_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AuthError> {
    let payload = service.login(request).await?;
    Ok(Json(json!({
        "message": "Login successful",
        "data": payload,
    })))
}

/// Invalidate a refresh token
/// POST /users/logout
#[utoipa::path(
    post,
    path = "/users/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Refresh token invalidated (idempotent)")
    ),
    tag = "users"
)]
pub async fn logout_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AuthError> {
    service.logout(&request.refresh_token).await?;
    Ok(Json(json!({ "message": "Logout successful" })))
}

/// Exchange a refresh token for a new access token
/// POST /users/refresh-token
#[utoipa::path(
    post,
    path = "/users/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token issued"),
        (status = 401, description = "Unknown, revoked or expired refresh token")
    ),
    tag = "users"
)]
pub async fn refresh_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AuthError> {
    let tokens = service.refresh(&request.refresh_token).await?;
    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "data": { "tokens": tokens },
    })))
}

/// Create an account with a caller-chosen role
/// POST /users/admin/create-user
#[utoipa::path(
    post,
    path = "/users/admin/create-user",
    request_body = AdminCreateRequest,
    responses(
        (status = 201, description = "Account created, no tokens issued"),
        (status = 400, description = "Invalid role or fields"),
        (status = 403, description = "Caller rank does not cover the assigned role"),
        (status = 409, description = "Email already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn admin_create_handler(
    State(service): State<Arc<AccountService>>,
    caller: AuthenticatedUser,
    Json(request): Json<AdminCreateRequest>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    let user = service.admin_create(&caller, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "data": { "user": user },
        })),
    ))
}

/// Filtered, paginated listing of all accounts
/// GET /users/get-all-users
#[utoipa::path(
    get,
    path = "/users/get-all-users",
    params(ListUsersParams),
    responses(
        (status = 200, description = "Page of users with pagination metadata"),
        (status = 403, description = "Caller is below admin rank")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(service): State<Arc<AccountService>>,
    caller: AuthenticatedUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Value>, AuthError> {
    let page = service.list_users(&caller, params).await?;
    Ok(Json(json!({
        "message": "Users retrieved successfully",
        "data": page,
    })))
}

/// Delete an account
/// DELETE /users/delete-user/:id
#[utoipa::path(
    delete,
    path = "/users/delete-user/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 403, description = "Caller rank does not cover the target"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(service): State<Arc<AccountService>>,
    caller: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AuthError> {
    service.delete_user(&caller, id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// Update an account
/// PUT /users/update-user/:id
#[utoipa::path(
    put,
    path = "/users/update-user/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated"),
        (status = 400, description = "Invalid fields or incomplete password change"),
        (status = 403, description = "Caller rank does not cover the target or new role"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_handler(
    State(service): State<Arc<AccountService>>,
    caller: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AuthError> {
    let user = service.update_user(&caller, id, request).await?;
    Ok(Json(json!({
        "message": "User updated successfully",
        "data": { "user": user },
    })))
}
