// Account service - orchestrates signup, login, tokens and user management

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        AdminCreateRequest, AuthPayload, LoginRequest, PageMeta, SignupRequest, TokenPair,
        UpdateUserRequest, User, UserPage, UserResponse,
    },
    password::PasswordService,
    policy::AuthorizationPolicy,
    repository::{UserChanges, UserRepository},
    role::Role,
    store::RefreshTokenStore,
    token::TokenService,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Account service coordinating repositories, token issuance and policy
pub struct AccountService {
    user_repo: UserRepository,
    store: RefreshTokenStore,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(
        user_repo: UserRepository,
        store: RefreshTokenStore,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repo,
            store,
            tokens,
        }
    }

    /// Issue a token pair for a user and persist the refresh token row
    async fn issue_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let (access_token, refresh_token) = self.tokens.issue_pair(user.id, user.role)?;
        let expires_at = Utc::now() + Duration::seconds(self.tokens.refresh_token_duration());
        self.store
            .insert(user.id, &refresh_token, expires_at)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Register a new account with the default (lowest-privilege) role
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthPayload, AuthError> {
        request.validate()?;

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .user_repo
            .create_user(&request.email, &password_hash, &request.pseudonyme, Role::default())
            .await?;

        let tokens = self.issue_session(&user).await?;
        info!("New account registered: user_id={}", user.id);

        Ok(AuthPayload {
            user: user.into(),
            tokens,
        })
    }

    /// Authenticate by email and password
    ///
    /// Absent account, absent hash and hash mismatch all collapse into the
    /// same `InvalidCredentials` so responses do not reveal which failed.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthPayload, AuthError> {
        request.validate()?;

        let user = self
            .user_repo
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !PasswordService::verify_password(&request.password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_session(&user).await?;
        info!("Login: user_id={}", user.id);

        Ok(AuthPayload {
            user: user.into(),
            tokens,
        })
    }

    /// Invalidate a refresh token
    ///
    /// Idempotent: deleting a token that was never issued, or was already
    /// logged out, is still a success.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.store.delete(refresh_token).await
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The token must pass signature and expiry checks AND still have a live
    /// store row; a signature-valid token whose row was deleted by logout is
    /// rejected. The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.verify(refresh_token)?;

        self.store
            .find(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let access_token = self.tokens.issue_access_token(claims.sub, claims.role)?;
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Create an account on someone else's behalf with a caller-chosen role
    ///
    /// No tokens are issued; the new owner logs in themselves.
    pub async fn admin_create(
        &self,
        caller: &AuthenticatedUser,
        request: AdminCreateRequest,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;

        let role = Role::parse(&request.role)?;
        AuthorizationPolicy::can_assign_role(caller.role, role)?;

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .user_repo
            .create_user(&request.email, &password_hash, &request.pseudonyme, role)
            .await?;

        info!(
            "Account created by admin: user_id={}, role={}, created_by={}",
            user.id, user.role, caller.user_id
        );
        Ok(user.into())
    }

    /// Filtered, paginated, sorted listing of all accounts
    pub async fn list_users(
        &self,
        caller: &AuthenticatedUser,
        params: crate::query::ListUsersParams,
    ) -> Result<UserPage, AuthError> {
        AuthorizationPolicy::can_list_users(caller.role)?;

        let listing = crate::query::ValidatedListing::from_params(params, caller.role)?;
        let (users, total) = self.user_repo.list(&listing).await?;

        let total_pages = (total + listing.limit as i64 - 1) / listing.limit as i64;
        Ok(UserPage {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: PageMeta {
                total,
                page: listing.page,
                limit: listing.limit,
                total_pages,
            },
        })
    }

    /// Delete an account outright
    ///
    /// Outstanding refresh tokens for the account are not revoked here; the
    /// rows age out through their own expiry.
    pub async fn delete_user(
        &self,
        caller: &AuthenticatedUser,
        target_id: i32,
    ) -> Result<(), AuthError> {
        let target = self
            .user_repo
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::AccountNotFound(target_id))?;

        AuthorizationPolicy::can_delete(caller.role, target.role)?;

        if !self.user_repo.delete_by_id(target_id).await? {
            return Err(AuthError::AccountNotFound(target_id));
        }

        info!("Account deleted: user_id={}, deleted_by={}", target_id, caller.user_id);
        Ok(())
    }

    /// Update an account through the per-operation field allow-list
    ///
    /// Self-updates silently drop any requested role change; cross-account
    /// updates require rank dominance over the target, and a role change
    /// additionally requires dominance over the new role.
    pub async fn update_user(
        &self,
        caller: &AuthenticatedUser,
        target_id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        let target = self
            .user_repo
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::AccountNotFound(target_id))?;

        AuthorizationPolicy::can_update(caller.user_id, caller.role, target.id, target.role)?;

        let is_self_update = caller.user_id == target.id;

        let mut changes = UserChanges::default();

        if let Some(email) = request.email {
            if !validator::validate_email(&email) {
                return Err(AuthError::MissingInfo(
                    "email must be a valid address".to_string(),
                ));
            }
            changes.email = Some(email);
        }

        if let Some(pseudonyme) = request.pseudonyme {
            if pseudonyme.trim().is_empty() {
                return Err(AuthError::MissingInfo("pseudonyme must not be empty".to_string()));
            }
            changes.pseudonyme = Some(pseudonyme);
        }

        // Role never mutates on self-update, whatever the request says
        if !is_self_update {
            if let Some(role_str) = request.role.as_deref() {
                let new_role = Role::parse(role_str)?;
                AuthorizationPolicy::can_change_role_to(caller.role, new_role)?;
                changes.role = Some(new_role);
            }
        }

        if let Some(new_hash) = resolve_password_change(
            target.password_hash.as_deref(),
            request.password.as_deref(),
            request.new_password.as_deref(),
        )? {
            changes.password_hash = Some(new_hash);
        }

        if changes.is_empty() {
            return Err(AuthError::MissingInfo("no updatable fields provided".to_string()));
        }

        let updated = self.user_repo.update_user(target_id, changes).await?;
        info!("Account updated: user_id={}, updated_by={}", target_id, caller.user_id);
        Ok(updated.into())
    }
}

/// Decide whether a password change applies and produce the new hash
///
/// Rules:
/// - a new password with an existing hash requires the matching current one
/// - a current password without a new one is an incomplete request
/// - a current password against an account with no stored hash cannot match
/// - a new password with no stored hash is accepted as-is (first password)
fn resolve_password_change(
    existing_hash: Option<&str>,
    current: Option<&str>,
    new: Option<&str>,
) -> Result<Option<String>, AuthError> {
    let new_password = match (current, new) {
        (None, None) => return Ok(None),
        (Some(_), None) => return Err(AuthError::NewPasswordRequired),
        (current, Some(new_password)) => {
            match existing_hash {
                Some(hash) => {
                    let current = current.ok_or(AuthError::PasswordRequired)?;
                    if !PasswordService::verify_password(current, hash)? {
                        return Err(AuthError::InvalidCredentials);
                    }
                }
                None => {
                    if current.is_some() {
                        return Err(AuthError::NoPasswordSet);
                    }
                }
            }
            new_password
        }
    };

    if let Err(e) = crate::validation::validate_password_strength(new_password) {
        return Err(AuthError::MissingInfo(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "password does not meet requirements".to_string()),
        ));
    }

    Ok(Some(PasswordService::hash_password(new_password)?))
}
