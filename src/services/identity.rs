//! Identity resolution from bearer credentials

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{Principal, UserClaims},
};

/// Signature and expiry check of an opaque credential
pub trait CredentialVerifier: Send + Sync {
    /// Subject user id embedded in a valid credential
    fn verify(&self, credential: &str) -> AppResult<i32>;
}

/// HS256 JWT credentials: verification and issuance
#[derive(Clone)]
pub struct JwtCredentials {
    secret: String,
    expiration_hours: u64,
}

impl JwtCredentials {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_hours: config.jwt_expiration_hours,
        }
    }

    /// Issue a credential for a user
    pub fn issue(&self, user_id: i32) -> AppResult<String> {
        UserClaims::new(user_id, self.expiration_hours)
            .create_token(&self.secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

impl CredentialVerifier for JwtCredentials {
    fn verify(&self, credential: &str) -> AppResult<i32> {
        let claims = UserClaims::from_token(credential, &self.secret)
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        // `sub` and `user_id` are written together; a mismatch means a forged payload
        match claims.sub.parse::<i32>() {
            Ok(sub) if sub == claims.user_id => Ok(sub),
            _ => Err(AppError::Unauthenticated("Credential subject mismatch".to_string())),
        }
    }
}

/// Resolves the principal of a request; fails closed
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn CredentialVerifier>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    pub fn resolve(&self, credential: Option<&str>) -> AppResult<Principal> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Missing credential".to_string()))?;

        let user_id = self.verifier.verify(credential)?;
        Ok(Principal::new(user_id))
    }
}
