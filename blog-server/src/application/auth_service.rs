use std::sync::Arc;

use blog_core::SignupRequest;
use blog_core::model::LoginRequest;
use blog_core::validation::validate_signup;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

/// Caller identity attached to a request once its bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup(&self, req: SignupRequest) -> Result<User, DomainError> {
        validate_signup(&req).into_result()?;

        let hash =
            hash_password(&req.password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(req.email.trim().to_lowercase(), hash);
        self.repo.create(user).await
    }

    /// Returns the access token for valid credentials.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: &LoginRequest) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_email(&req.email.trim().to_lowercase())
            .await?
            .ok_or_else(|| DomainError::unauthorized("invalid email or password"))?;

        let valid = verify_password(&req.password, &user.password_hash)
            .map_err(|_| DomainError::unauthorized("invalid email or password"))?;
        if !valid {
            return Err(DomainError::unauthorized("invalid email or password"));
        }

        self.keys
            .generate_token(user.id, &user.email)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Checks a bearer token and resolves it to a live user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, DomainError> {
        let claims = self.keys.verify_token(token).map_err(|e| {
            warn!("rejected token: {}", e);
            DomainError::unauthorized("invalid token")
        })?;
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| DomainError::unauthorized("invalid token"))?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::unauthorized("user not found"))?;

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
        })
    }
}
