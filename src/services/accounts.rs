//! Account registration, sign-in and profile upkeep

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::LoginRequest, ChangePassword, CreateAccount, PasswordCheck, Principal, UpdateProfile, User,
    },
    repository::DynStore,
};

use super::{
    authorization::{Action, Authorizer},
    identity::JwtCredentials,
};

#[derive(Clone)]
pub struct AccountsService {
    store: DynStore,
    authorizer: Authorizer,
    credentials: JwtCredentials,
}

impl AccountsService {
    pub fn new(store: DynStore, authorizer: Authorizer, credentials: JwtCredentials) -> Self {
        Self {
            store,
            authorizer,
            credentials,
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, account: CreateAccount) -> AppResult<(String, User)> {
        account.validate()?;

        let account = CreateAccount {
            email: account.email.trim().to_lowercase(),
            ..account
        };
        let hash = hash_password(&account.password)?;
        let user = self.store.user_create(&account, &hash).await?;
        let token = self.credentials.issue(user.id)?;

        tracing::info!("Registered user {} ({})", user.id, user.email);
        Ok((token, user))
    }

    /// Check credentials and issue a token
    pub async fn login(&self, request: &LoginRequest) -> AppResult<(String, User)> {
        let email = request.email.trim().to_lowercase();
        let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

        let user = self.store.user_get_by_email(&email).await?.ok_or_else(invalid)?;
        if !verify_password(&user.password, &request.password)? {
            tracing::info!("Failed sign-in for user {}", user.id);
            return Err(invalid());
        }

        let token = self.credentials.issue(user.id)?;
        Ok((token, user))
    }

    /// Account of the calling principal
    pub async fn me(&self, principal: Option<&Principal>) -> AppResult<User> {
        let user_id = self.caller(principal, Action::Me).await?;
        self.load(user_id).await
    }

    /// Replace the caller's name and email, and the phone when given
    pub async fn update_profile(&self, principal: Option<&Principal>, profile: UpdateProfile) -> AppResult<User> {
        let user_id = self.caller(principal, Action::UpdateProfile).await?;
        let profile = UpdateProfile {
            email: profile.email.trim().to_lowercase(),
            ..profile
        };
        profile.validate()?;

        let user = self
            .store
            .user_update_profile(user_id, &profile)
            .await?
            .ok_or_else(|| not_found(user_id))?;

        tracing::info!("Updated profile of user {}", user.id);
        Ok(user)
    }

    /// Confirm the caller's current password
    pub async fn check_password(&self, principal: Option<&Principal>, check: &PasswordCheck) -> AppResult<User> {
        let user_id = self.caller(principal, Action::CheckPassword).await?;
        let user = self.load(user_id).await?;

        if !verify_password(&user.password, &check.password)? {
            return Err(AppError::validation("password", "Invalid password"));
        }
        Ok(user)
    }

    /// Store a new password for the caller; existing tokens stay valid
    pub async fn update_password(&self, principal: Option<&Principal>, change: ChangePassword) -> AppResult<User> {
        let user_id = self.caller(principal, Action::UpdatePassword).await?;
        change.validate()?;

        let hash = hash_password(&change.password)?;
        if !self.store.user_set_password(user_id, &hash).await? {
            return Err(not_found(user_id));
        }

        tracing::info!("Changed password of user {}", user_id);
        self.load(user_id).await
    }

    async fn caller(&self, principal: Option<&Principal>, action: Action) -> AppResult<i32> {
        self.authorizer.require(principal, action, None).await?;
        principal
            .map(|p| p.user_id)
            .ok_or_else(|| AppError::Unauthenticated("Missing credential".to_string()))
    }

    async fn load(&self, user_id: i32) -> AppResult<User> {
        self.store.user_get(user_id).await?.ok_or_else(|| not_found(user_id))
    }
}

fn not_found(user_id: i32) -> AppError {
    AppError::NotFound(format!("User with id {} not found", user_id))
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
