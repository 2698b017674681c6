//! Identity service
//!
//! Users, login sessions and user-role membership:
//! - token issue / revoke and session validation
//! - registration with an optional inline profile picture
//! - profile updates, activation toggle and soft delete
//! - credential change (revokes every session of the user)
//! - seeding of the administrator account

use crate::config::AuthConfig;
use crate::db::repositories::{RoleRepository, SessionRepository, UserRepository};
use crate::models::{
    ChangeCredentialsInput, RegisterInput, Role, Session, TokenRequest, TokenResponse,
    UpdateUserInput, User, UserRoleEntry, UserRolesPayload, ADMINISTRATOR_ROLE, BASIC_ROLE,
};
use crate::services::error::ContentError;
use crate::services::hub::ChatHub;
use crate::services::password::{check_new_password, hash_password, verify_password};
use crate::services::rate_limiter::LoginRateLimiter;
use crate::services::upload::{UploadLocation, UploadService};
use std::sync::Arc;

/// Fixed id of the administrator created at first start
pub const SEEDED_ADMIN_ID: &str = "00000000-0000-4000-8000-000000000001";

/// Error types for identity operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid Credentials.")]
    InvalidCredentials,

    #[error("User Not Active. Please contact the administrator.")]
    Inactive,

    #[error("Too many login attempts. Please try again later.")]
    RateLimited,

    /// Missing, unknown or expired token
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ContentError> for IdentityError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(msg) => IdentityError::Validation(msg),
            ContentError::NotFound(msg) => IdentityError::NotFound(msg),
            ContentError::Conflict(msg) => IdentityError::Conflict(msg),
            ContentError::Internal(err) => IdentityError::Internal(err),
        }
    }
}

/// Roles and permission claims of an authenticated user
#[derive(Debug, Clone, Default)]
pub struct UserAccess {
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl UserAccess {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(ADMINISTRATOR_ROLE))
    }
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    role_repo: Arc<dyn RoleRepository>,
    uploads: Arc<UploadService>,
    hub: Arc<ChatHub>,
    rate_limiter: LoginRateLimiter,
    session_ttl_hours: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        role_repo: Arc<dyn RoleRepository>,
        uploads: Arc<UploadService>,
        hub: Arc<ChatHub>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            role_repo,
            uploads,
            hub,
            rate_limiter: LoginRateLimiter::from_config(auth),
            session_ttl_hours: auth.session_ttl_hours,
        }
    }

    /// Issue a token for an email or user name and password.
    ///
    /// Failed attempts count against the identifier; an inactive account
    /// with the right password does not.
    pub async fn login(&self, input: TokenRequest) -> Result<TokenResponse, IdentityError> {
        let identifier = input.email_or_user_name.trim();
        if identifier.is_empty() || input.password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        if self.rate_limiter.is_limited(identifier).await {
            tracing::warn!(identifier = %identifier, "Login rate limited");
            return Err(IdentityError::RateLimited);
        }

        let user = match self.user_repo.get_by_email(identifier).await? {
            Some(user) => Some(user),
            None => self.user_repo.get_by_user_name(identifier).await?,
        };

        let Some(user) = user else {
            self.rate_limiter.record_failure(identifier).await;
            return Err(IdentityError::InvalidCredentials);
        };

        if !verify_password(&input.password, &user.password_hash)? {
            self.rate_limiter.record_failure(identifier).await;
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(IdentityError::Inactive);
        }

        self.rate_limiter.clear(identifier).await;

        let session = self
            .session_repo
            .create(&Session::new(user.id.clone(), self.session_ttl_hours))
            .await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(TokenResponse {
            token: session.id,
            user_id: user.id,
            refresh_token_expiry_time: session.expires_at,
        })
    }

    /// Delete a session (logout)
    pub async fn revoke(&self, token: &str) -> Result<(), IdentityError> {
        self.session_repo.delete(token).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub async fn validate_session(&self, token: &str) -> Result<User, IdentityError> {
        let session = self
            .session_repo
            .get_by_id(token)
            .await?
            .ok_or_else(|| IdentityError::Unauthorized("Invalid or expired token".to_string()))?;

        if session.is_expired() {
            self.session_repo.delete(&session.id).await?;
            return Err(IdentityError::Unauthorized("Invalid or expired token".to_string()));
        }

        let user = self
            .user_repo
            .get_by_id(&session.user_id)
            .await?
            .ok_or_else(|| IdentityError::Unauthorized("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(IdentityError::Unauthorized(IdentityError::Inactive.to_string()));
        }

        Ok(user)
    }

    pub async fn access_for(&self, user_id: &str) -> Result<UserAccess, IdentityError> {
        Ok(UserAccess {
            roles: self.user_repo.role_names(user_id).await?,
            permissions: self.user_repo.permissions(user_id).await?,
        })
    }

    pub async fn list(&self) -> Result<Vec<User>, IdentityError> {
        Ok(self.user_repo.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<User, IdentityError> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("User Not Found.".to_string()))
    }

    /// Register a user and give it the Basic role, returning the new id
    pub async fn register(&self, input: RegisterInput) -> Result<String, IdentityError> {
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        let email = input.email.trim().to_string();
        validate_profile(&first_name, &last_name, &email)?;

        if let Some(message) = check_new_password(&input.password, &input.confirm_password) {
            return Err(IdentityError::Validation(message.to_string()));
        }

        let user_name = input
            .user_name
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| default_user_name(&email));

        if self.user_repo.user_name_taken(&user_name, None).await? {
            return Err(IdentityError::Conflict(format!("Username {} is already taken.", user_name)));
        }
        if self.user_repo.email_taken(&email, None).await? {
            return Err(IdentityError::Conflict(format!("Email {} is already registered.", email)));
        }

        let mut user = User::new(first_name, last_name, user_name, email, hash_password(&input.password)?);
        user.phone_number = input.phone_number;
        user.is_active = input.is_active;

        if let Some(request) = input.upload_request.filter(|r| !r.data.trim().is_empty()) {
            let stored = self
                .uploads
                .store_inline(UploadLocation::ProfilePictures, &request)
                .await?;
            user.profile_picture_url = Some(stored.public_url());
        }

        let user = self.user_repo.create(&user).await?;

        match self.role_repo.get_by_name(BASIC_ROLE).await? {
            Some(role) => self.user_repo.add_role(&user.id, &role.id).await?,
            None => tracing::warn!(user_id = %user.id, "Basic role missing; user registered without roles"),
        }

        tracing::info!(user_id = %user.id, user_name = %user.user_name, "User registered");
        Ok(user.id)
    }

    /// Update profile fields (not the password) on behalf of `current_user_id`
    pub async fn update(
        &self,
        current_user_id: &str,
        id: &str,
        input: UpdateUserInput,
    ) -> Result<User, IdentityError> {
        let mut user = self.get(id).await?;

        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        let email = input.email.trim().to_string();
        validate_profile(&first_name, &last_name, &email)?;

        if self.user_repo.email_taken(&email, Some(id)).await? {
            return Err(IdentityError::Conflict(format!("Email {} is already registered.", email)));
        }
        if let Some(user_name) = input.user_name.as_deref().map(str::trim) {
            if self.user_repo.user_name_taken(user_name, Some(id)).await? {
                return Err(IdentityError::Conflict(format!("Username {} is already taken.", user_name)));
            }
            user.user_name = user_name.to_string();
        }

        if input.is_active == Some(false) {
            check_can_deactivate(current_user_id, id)?;
        }

        user.first_name = first_name;
        user.last_name = last_name;
        user.email = email;
        user.phone_number = input.phone_number;
        if let Some(active) = input.is_active {
            user.is_active = active;
        }
        if let Some(url) = input.profile_picture_url {
            user.profile_picture_url = Some(url);
        }
        if let Some(request) = input.upload_request.filter(|r| !r.data.trim().is_empty()) {
            let stored = self
                .uploads
                .store_inline(UploadLocation::ProfilePictures, &request)
                .await?;
            user.profile_picture_url = Some(stored.public_url());
        }

        if !self.user_repo.update(&user).await? {
            return Err(IdentityError::NotFound("User Not Found.".to_string()));
        }
        if !user.is_active {
            self.end_sessions(id).await?;
        }
        Ok(user)
    }

    /// Soft delete `target_id` on behalf of `current_user_id`
    pub async fn delete(&self, current_user_id: &str, target_id: &str) -> Result<(), IdentityError> {
        if current_user_id == target_id {
            return Err(IdentityError::Validation("You cannot delete your own account.".to_string()));
        }
        if target_id == SEEDED_ADMIN_ID {
            return Err(IdentityError::Validation(
                "The administrator account cannot be deleted.".to_string(),
            ));
        }
        if !self.user_repo.soft_delete(target_id).await? {
            return Err(IdentityError::NotFound("User Not Found.".to_string()));
        }
        self.end_sessions(target_id).await?;
        tracing::info!(user_id = %target_id, deleted_by = %current_user_id, "User deleted");
        Ok(())
    }

    /// Set or flip `is_active`, returning the new state
    pub async fn set_status(
        &self,
        current_user_id: &str,
        id: &str,
        active: Option<bool>,
    ) -> Result<bool, IdentityError> {
        let user = self.get(id).await?;
        let active = active.unwrap_or(!user.is_active);

        if !active {
            check_can_deactivate(current_user_id, id)?;
        }

        self.user_repo.set_active(id, active).await?;
        if !active {
            self.end_sessions(id).await?;
        }
        tracing::info!(user_id = %id, active, "User status changed");
        Ok(active)
    }

    /// Every role with `selected` set for those the user holds
    pub async fn user_roles(&self, user_id: &str) -> Result<UserRolesPayload, IdentityError> {
        self.get(user_id).await?;
        let held = self.user_repo.role_names(user_id).await?;
        let user_roles = self
            .role_repo
            .list()
            .await?
            .into_iter()
            .map(|role| UserRoleEntry {
                selected: held.iter().any(|h| h.eq_ignore_ascii_case(&role.name)),
                role_name: role.name,
                role_description: role.description,
            })
            .collect();

        Ok(UserRolesPayload {
            user_id: user_id.to_string(),
            user_roles,
        })
    }

    /// Replace the user's roles with the selected entries
    pub async fn update_user_roles(
        &self,
        user_id: &str,
        payload: UserRolesPayload,
    ) -> Result<(), IdentityError> {
        if !payload.user_id.is_empty() && payload.user_id != user_id {
            return Err(IdentityError::Validation("IDs are not matching".to_string()));
        }
        self.get(user_id).await?;

        let roles = self.role_repo.list().await?;
        let mut role_ids = Vec::new();
        let mut keeps_admin = false;
        for entry in payload.user_roles.iter().filter(|e| e.selected) {
            let role = roles
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(&entry.role_name))
                .ok_or_else(|| IdentityError::Validation(format!("Role {} not found.", entry.role_name)))?;
            keeps_admin |= role.name.eq_ignore_ascii_case(ADMINISTRATOR_ROLE);
            if !role_ids.contains(&role.id) {
                role_ids.push(role.id.clone());
            }
        }

        if user_id == SEEDED_ADMIN_ID && !keeps_admin {
            return Err(IdentityError::Validation(
                "The administrator account must keep the Administrator role.".to_string(),
            ));
        }

        self.user_repo.set_roles(user_id, &role_ids).await?;
        tracing::info!(user_id = %user_id, roles = role_ids.len(), "User roles updated");
        Ok(())
    }

    /// Change email and password of the current user
    pub async fn change_credentials(
        &self,
        user_id: &str,
        input: ChangeCredentialsInput,
    ) -> Result<(), IdentityError> {
        let user = self.get(user_id).await?;

        if !input.old_email.trim().eq_ignore_ascii_case(&user.email) {
            return Err(IdentityError::Validation("Old email does not match.".to_string()));
        }
        let new_email = input.new_email.trim();
        if !is_valid_email(new_email) {
            return Err(IdentityError::Validation("A valid email is required.".to_string()));
        }
        if let Some(message) = check_new_password(&input.password, &input.confirm_password) {
            return Err(IdentityError::Validation(message.to_string()));
        }
        if self.user_repo.email_taken(new_email, Some(user_id)).await? {
            return Err(IdentityError::Conflict(format!("Email {} is already registered.", new_email)));
        }

        self.user_repo
            .update_credentials(user_id, new_email, &hash_password(&input.password)?)
            .await?;
        let revoked = self.end_sessions(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Credentials changed");
        Ok(())
    }

    /// Revoke every session of a user and close their chat sockets
    async fn end_sessions(&self, user_id: &str) -> Result<u64, IdentityError> {
        let revoked = self.session_repo.delete_by_user(user_id).await?;
        self.hub.disconnect_user(user_id).await;
        Ok(revoked)
    }

    /// Purge expired sessions and stale rate-limit entries
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, IdentityError> {
        self.rate_limiter.cleanup().await;
        Ok(self.session_repo.delete_expired().await?)
    }

    /// Create the administrator account if missing and make sure it holds
    /// the Administrator role. Returns whether a user was created.
    pub async fn ensure_admin(&self, auth: &AuthConfig, admin_role: &Role) -> Result<bool, IdentityError> {
        if self.user_repo.get_by_id(SEEDED_ADMIN_ID).await?.is_some() {
            self.user_repo.add_role(SEEDED_ADMIN_ID, &admin_role.id).await?;
            return Ok(false);
        }

        if let Some(existing) = self.user_repo.get_by_email(&auth.admin_email).await? {
            tracing::warn!(user_id = %existing.id, "Administrator email already in use; granting role only");
            self.user_repo.add_role(&existing.id, &admin_role.id).await?;
            return Ok(false);
        }

        let mut admin = User::new(
            "Orbit".to_string(),
            "Administrator".to_string(),
            auth.admin_user_name.clone(),
            auth.admin_email.clone(),
            hash_password(&auth.admin_password)?,
        );
        admin.id = SEEDED_ADMIN_ID.to_string();
        admin.email_confirmed = true;

        self.user_repo.create(&admin).await?;
        self.user_repo.add_role(&admin.id, &admin_role.id).await?;
        tracing::info!(user_id = %admin.id, email = %admin.email, "Administrator account seeded");
        Ok(true)
    }
}

fn validate_profile(first_name: &str, last_name: &str, email: &str) -> Result<(), IdentityError> {
    if first_name.is_empty() {
        return Err(IdentityError::Validation("First name is required.".to_string()));
    }
    if last_name.is_empty() {
        return Err(IdentityError::Validation("Last name is required.".to_string()));
    }
    if !is_valid_email(email) {
        return Err(IdentityError::Validation("A valid email is required.".to_string()));
    }
    Ok(())
}

/// Loose shape check: one `@`, a non-empty local part and a dotted domain
fn check_can_deactivate(current_user_id: &str, id: &str) -> Result<(), IdentityError> {
    if id == current_user_id {
        return Err(IdentityError::Validation("You cannot deactivate your own account.".to_string()));
    }
    if id == SEEDED_ADMIN_ID {
        return Err(IdentityError::Validation(
            "The administrator account cannot be deactivated.".to_string(),
        ));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// User name derived from the local part of an email
fn default_user_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxRoleRepository, SqlxSessionRepository, SqlxUserRepository};
    use crate::services::role::RoleService;
    use tempfile::TempDir;

    struct Fixture {
        users: UserService,
        roles: RoleService,
        hub: Arc<ChatHub>,
        _uploads: TempDir,
    }

    async fn setup_with(auth: AuthConfig) -> Fixture {
        let pool = migrated_pool().await;
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let role_repo = SqlxRoleRepository::boxed(pool.clone());
        let dir = TempDir::new().unwrap();
        let uploads = Arc::new(UploadService::new(crate::config::UploadConfig {
            path: dir.path().to_path_buf(),
            ..Default::default()
        }));

        let hub = Arc::new(ChatHub::new(8));
        let roles = RoleService::new(role_repo.clone());
        let users = UserService::new(
            user_repo,
            SqlxSessionRepository::boxed(pool),
            role_repo,
            uploads,
            hub.clone(),
            &auth,
        );
        let admin_role = roles.ensure_default_roles().await.unwrap();
        users.ensure_admin(&auth, &admin_role).await.unwrap();

        Fixture {
            users,
            roles,
            hub,
            _uploads: dir,
        }
    }

    async fn setup() -> Fixture {
        setup_with(AuthConfig::default()).await
    }

    fn register_input(email: &str) -> RegisterInput {
        serde_json::from_value(serde_json::json!({
            "firstName": "Sara",
            "lastName": "Haddad",
            "email": email,
            "password": "secret1",
            "confirmPassword": "secret1",
        }))
        .unwrap()
    }

    fn token_request(who: &str, password: &str) -> TokenRequest {
        TokenRequest {
            email_or_user_name: who.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email("a@@b.io"));
        assert_eq!(default_user_name("sara.h@example.com"), "sara.h");
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let f = setup().await;
        let token = f.users.login(token_request("admin@orbit.local", "Admin@123")).await.unwrap();
        assert_eq!(token.user_id, SEEDED_ADMIN_ID);

        let user = f.users.validate_session(&token.token).await.unwrap();
        assert_eq!(user.user_name, "admin");
        assert!(f.users.access_for(&user.id).await.unwrap().is_admin());

        // by user name too, and seeding twice is harmless
        assert!(f.users.login(token_request("ADMIN", "Admin@123")).await.is_ok());
        let admin_role = f.roles.ensure_default_roles().await.unwrap();
        assert!(!f.users.ensure_admin(&AuthConfig::default(), &admin_role).await.unwrap());
        assert_eq!(f.users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_defaults() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();

        let user = f.users.get(&id).await.unwrap();
        assert_eq!(user.user_name, "sara");
        assert!(user.is_active);
        assert_ne!(user.password_hash, "secret1");

        let access = f.users.access_for(&id).await.unwrap();
        assert_eq!(access.roles, vec![BASIC_ROLE.to_string()]);
        assert!(!access.is_admin());
    }

    #[tokio::test]
    async fn test_register_validation_and_conflicts() {
        let f = setup().await;

        let mut short = register_input("x@example.com");
        short.password = "123".into();
        short.confirm_password = "123".into();
        assert!(matches!(f.users.register(short).await, Err(IdentityError::Validation(_))));

        let mut mismatch = register_input("x@example.com");
        mismatch.confirm_password = "different".into();
        assert!(matches!(f.users.register(mismatch).await, Err(IdentityError::Validation(_))));

        assert!(matches!(
            f.users.register(register_input("not-an-email")).await,
            Err(IdentityError::Validation(_))
        ));

        f.users.register(register_input("dup@example.com")).await.unwrap();
        assert!(matches!(
            f.users.register(register_input("DUP@example.com")).await,
            Err(IdentityError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_register_with_profile_picture() {
        let f = setup().await;
        let mut input = register_input("pic@example.com");
        input.upload_request = Some(crate::models::UploadRequest {
            file_name: "me".into(),
            extension: ".png".into(),
            upload_type: 1,
            data: data_encoding::BASE64.encode(b"fake-png"),
        });

        let id = f.users.register(input).await.unwrap();
        let url = f.users.get(&id).await.unwrap().profile_picture_url.unwrap();
        assert!(url.starts_with("/Files/UploadFiles/ProfilePictures/"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();

        assert!(matches!(
            f.users.login(token_request("sara@example.com", "wrong-pass")).await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            f.users.login(token_request("nobody", "secret1")).await,
            Err(IdentityError::InvalidCredentials)
        ));

        f.users.set_status(SEEDED_ADMIN_ID, &id, Some(false)).await.unwrap();
        assert!(matches!(
            f.users.login(token_request("sara", "secret1")).await,
            Err(IdentityError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let auth = AuthConfig {
            max_login_attempts: 2,
            ..AuthConfig::default()
        };
        let f = setup_with(auth).await;

        for _ in 0..2 {
            let _ = f.users.login(token_request("admin", "nope")).await;
        }
        assert!(matches!(
            f.users.login(token_request("admin", "Admin@123")).await,
            Err(IdentityError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_revoke_and_expired_sessions() {
        let f = setup().await;
        let token = f.users.login(token_request("admin", "Admin@123")).await.unwrap();

        f.users.revoke(&token.token).await.unwrap();
        assert!(matches!(
            f.users.validate_session(&token.token).await,
            Err(IdentityError::Unauthorized(_))
        ));
        assert!(matches!(
            f.users.validate_session("garbage").await,
            Err(IdentityError::Unauthorized(_))
        ));
        assert_eq!(f.users.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_user() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();
        f.users.register(register_input("taken@example.com")).await.unwrap();

        let input: UpdateUserInput = serde_json::from_value(serde_json::json!({
            "firstName": "Sara",
            "lastName": "Khoury",
            "email": "sara.k@example.com",
            "phoneNumber": "+961 1 234",
        }))
        .unwrap();
        let updated = f.users.update(SEEDED_ADMIN_ID, &id, input).await.unwrap();
        assert_eq!(updated.last_name, "Khoury");
        assert_eq!(f.users.get(&id).await.unwrap().email, "sara.k@example.com");

        let clash: UpdateUserInput = serde_json::from_value(serde_json::json!({
            "firstName": "Sara", "lastName": "K", "email": "taken@example.com",
        }))
        .unwrap();
        assert!(matches!(f.users.update(SEEDED_ADMIN_ID, &id, clash).await, Err(IdentityError::Conflict(_))));

        let missing: UpdateUserInput = serde_json::from_value(serde_json::json!({
            "firstName": "A", "lastName": "B", "email": "a@b.io",
        }))
        .unwrap();
        assert!(matches!(
            f.users.update(SEEDED_ADMIN_ID, "nope", missing).await,
            Err(IdentityError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_cannot_deactivate_self() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();
        let token = f.users.login(token_request("sara", "secret1")).await.unwrap();

        let deactivate = |email: &str| -> UpdateUserInput {
            serde_json::from_value(serde_json::json!({
                "firstName": "Sara", "lastName": "Haddad", "email": email, "isActive": false,
            }))
            .unwrap()
        };

        assert!(matches!(
            f.users.update(&id, &id, deactivate("sara@example.com")).await,
            Err(IdentityError::Validation(_))
        ));
        assert!(f.users.get(&id).await.unwrap().is_active);
        assert!(f.users.validate_session(&token.token).await.is_ok());

        assert!(matches!(
            f.users.update(&id, SEEDED_ADMIN_ID, deactivate("admin@orbit.local")).await,
            Err(IdentityError::Validation(_))
        ));

        // someone else may, and that ends the user's sessions
        let updated = f
            .users
            .update(SEEDED_ADMIN_ID, &id, deactivate("sara@example.com"))
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert!(f.users.validate_session(&token.token).await.is_err());
    }

    #[tokio::test]
    async fn test_revoking_sessions_closes_chat_connections() {
        let f = setup().await;
        let sara = f.users.register(register_input("sara@example.com")).await.unwrap();
        let omar = f.users.register(register_input("omar@example.com")).await.unwrap();

        let (_, mut sara_rx) = f.hub.register(&sara).await;
        f.users.set_status(SEEDED_ADMIN_ID, &sara, Some(false)).await.unwrap();
        assert!(!f.hub.is_online(&sara).await);
        while sara_rx.try_recv().is_ok() {}
        assert!(sara_rx.recv().await.is_none());

        // reactivating does not touch connections
        f.users.set_status(SEEDED_ADMIN_ID, &sara, Some(true)).await.unwrap();
        let (_, _sara_rx) = f.hub.register(&sara).await;
        let input = ChangeCredentialsInput {
            old_email: "sara@example.com".into(),
            new_email: "sara.h@example.com".into(),
            password: "newpass1".into(),
            confirm_password: "newpass1".into(),
        };
        f.users.change_credentials(&sara, input).await.unwrap();
        assert!(!f.hub.is_online(&sara).await);

        let (_, _omar_rx) = f.hub.register(&omar).await;
        f.users.delete(SEEDED_ADMIN_ID, &omar).await.unwrap();
        assert!(!f.hub.is_online(&omar).await);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();

        assert!(matches!(f.users.delete(&id, &id).await, Err(IdentityError::Validation(_))));
        assert!(matches!(
            f.users.delete(&id, SEEDED_ADMIN_ID).await,
            Err(IdentityError::Validation(_))
        ));

        f.users.delete(SEEDED_ADMIN_ID, &id).await.unwrap();
        assert!(matches!(f.users.get(&id).await, Err(IdentityError::NotFound(_))));
        assert!(matches!(
            f.users.delete(SEEDED_ADMIN_ID, &id).await,
            Err(IdentityError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_toggle() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();

        assert!(!f.users.set_status(SEEDED_ADMIN_ID, &id, None).await.unwrap());
        assert!(f.users.set_status(SEEDED_ADMIN_ID, &id, None).await.unwrap());
        assert!(matches!(
            f.users.set_status(&id, SEEDED_ADMIN_ID, Some(false)).await,
            Err(IdentityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_user_roles_round_trip() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();

        let mut payload = f.users.user_roles(&id).await.unwrap();
        assert_eq!(payload.user_roles.len(), 2);
        for entry in payload.user_roles.iter_mut() {
            entry.selected = entry.role_name == ADMINISTRATOR_ROLE;
        }
        f.users.update_user_roles(&id, payload).await.unwrap();
        assert!(f.users.access_for(&id).await.unwrap().is_admin());

        let mut admin_payload = f.users.user_roles(SEEDED_ADMIN_ID).await.unwrap();
        for entry in admin_payload.user_roles.iter_mut() {
            entry.selected = false;
        }
        assert!(matches!(
            f.users.update_user_roles(SEEDED_ADMIN_ID, admin_payload).await,
            Err(IdentityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_change_credentials_revokes_sessions() {
        let f = setup().await;
        let id = f.users.register(register_input("sara@example.com")).await.unwrap();
        let token = f.users.login(token_request("sara", "secret1")).await.unwrap();

        let wrong_old = ChangeCredentialsInput {
            old_email: "other@example.com".into(),
            new_email: "new@example.com".into(),
            password: "newpass1".into(),
            confirm_password: "newpass1".into(),
        };
        assert!(matches!(
            f.users.change_credentials(&id, wrong_old).await,
            Err(IdentityError::Validation(_))
        ));

        let input = ChangeCredentialsInput {
            old_email: "Sara@Example.com".into(),
            new_email: "new@example.com".into(),
            password: "newpass1".into(),
            confirm_password: "newpass1".into(),
        };
        f.users.change_credentials(&id, input).await.unwrap();

        assert!(f.users.validate_session(&token.token).await.is_err());
        assert!(f.users.login(token_request("new@example.com", "newpass1")).await.is_ok());
        assert!(f.users.login(token_request("sara", "secret1")).await.is_err());
    }
}
