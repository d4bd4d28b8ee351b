mod auth;
mod config;
mod db;
mod query;
mod validation;

use axum::{
    extract::FromRef,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{
        admin_create_handler, delete_user_handler, list_users_handler, login_handler,
        logout_handler, refresh_handler, signup_handler, update_user_handler,
    },
    repository::UserRepository,
    AccountService, RefreshTokenStore, TokenService,
};
use config::Config;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup_handler,
        auth::handlers::login_handler,
        auth::handlers::logout_handler,
        auth::handlers::refresh_handler,
        auth::handlers::admin_create_handler,
        auth::handlers::list_users_handler,
        auth::handlers::delete_user_handler,
        auth::handlers::update_user_handler,
    ),
    components(
        schemas(
            auth::models::SignupRequest,
            auth::models::LoginRequest,
            auth::models::RefreshTokenRequest,
            auth::models::AdminCreateRequest,
            auth::models::UpdateUserRequest,
            auth::models::UserResponse,
            auth::models::TokenPair,
            auth::models::AuthPayload,
            auth::models::PageMeta,
            auth::models::UserPage,
            auth::role::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Account, token and role management endpoints")
    ),
    info(
        title = "Accounts API",
        version = "1.0.0",
        description = "Role-gated account management with access/refresh token authentication"
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    service: Arc<AccountService>,
    tokens: Arc<TokenService>,
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates and configures the application router
/// Maps all /users endpoints to their handlers and adds CORS middleware
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Account routes
        .route("/users/create-user", post(signup_handler))
        .route("/users/login", post(login_handler))
        .route("/users/logout", post(logout_handler))
        .route("/users/refresh-token", post(refresh_handler))
        .route("/users/admin/create-user", post(admin_create_handler))
        .route("/users/get-all-users", get(list_users_handler))
        .route("/users/delete-user/:id", delete(delete_user_handler))
        .route("/users/update-user/:id", put(update_user_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Accounts API - Starting...");

    // A missing or empty TOKEN_SECRET aborts startup here; token issuance
    // and verification never run against an unconfigured secret
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let tokens = Arc::new(TokenService::new(config.token_secret.clone()));
    let store = RefreshTokenStore::new(db_pool.clone());

    // Startup sweep of refresh tokens past their expiry
    match store.purge_expired().await {
        Ok(purged) => tracing::info!("Purged {} expired refresh tokens", purged),
        Err(e) => tracing::warn!("Refresh token sweep failed: {}", e),
    }

    let service = Arc::new(AccountService::new(
        UserRepository::new(db_pool.clone()),
        RefreshTokenStore::new(db_pool.clone()),
        tokens.clone(),
    ));

    let app = create_router(AppState { service, tokens });

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Accounts API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
