// Authentication and account management module
// Token issuance/verification, role hierarchy, policy and account operations

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod role;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use models::{
    AdminCreateRequest, AuthPayload, LoginRequest, RefreshTokenRequest, SignupRequest, TokenPair,
    UpdateUserRequest, User, UserResponse,
};
pub use policy::AuthorizationPolicy;
pub use role::{Rank, Role};
pub use service::AccountService;
pub use store::RefreshTokenStore;
pub use token::TokenService;
