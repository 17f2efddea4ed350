//! Authentication and user account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult, FieldErrors},
    models::user::{
        LoginRequest, RefreshRequest, RegisterPayload, TokenClaims, TokenPair, TokenType, User,
        UserSummary,
    },
    repository::{users::USERNAME_TAKEN, Repository},
};

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";
const BAD_TOKEN: &str = "Token is invalid or expired";

/// Argon2 hash with default parameters that no password matches. Checked
/// against when the username is unknown so that both paths cost the same.
const UNMATCHABLE_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c3RhY2tzLWR1bW15LXNhbHQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    fn access_lifetime(&self) -> Duration {
        Duration::minutes(self.config.access_token_minutes)
    }

    fn refresh_lifetime(&self) -> Duration {
        Duration::hours(self.config.refresh_token_hours)
    }

    /// Authenticate by username and password and return a token pair
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPair> {
        FieldErrors::of(&request).into_result()?;
        let username = request.username.unwrap_or_default();
        let password = request.password.unwrap_or_default();

        let Some(user) = self.repository.users_get_by_username(&username).await? else {
            check_password(UNMATCHABLE_HASH, &password)?;
            return Err(AppError::Authentication(BAD_CREDENTIALS.to_string()));
        };

        if !verify_password(&user, &password)? {
            tracing::warn!("Failed login for user id={}", user.id);
            return Err(AppError::Authentication(BAD_CREDENTIALS.to_string()));
        }

        self.issue_pair(&user)
    }

    /// Mint an access/refresh pair for a user
    pub fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let refresh = TokenClaims::new(TokenType::Refresh, user, self.refresh_lifetime());
        let access = TokenClaims::new(TokenType::Access, user, self.access_lifetime());

        Ok(TokenPair {
            refresh: self.sign(&refresh)?,
            access: self.sign(&access)?,
        })
    }

    /// Exchange a refresh token for a new access token
    pub fn refresh(&self, request: RefreshRequest) -> AppResult<String> {
        FieldErrors::of(&request).into_result()?;
        let token = request.refresh.unwrap_or_default();

        let claims = TokenClaims::from_token(&token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication(BAD_TOKEN.to_string()))?
            .require(TokenType::Refresh)
            .map_err(|_| AppError::Authentication(BAD_TOKEN.to_string()))?;

        self.sign(&TokenClaims::access_from(&claims, self.access_lifetime()))
    }

    /// Validate a bearer token presented on a request
    pub fn verify_access(&self, token: &str) -> AppResult<TokenClaims> {
        TokenClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Given token not valid: {}", e)))?
            .require(TokenType::Access)
    }

    fn sign(&self, claims: &TokenClaims) -> AppResult<String> {
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Register a new account
    pub async fn register(&self, payload: RegisterPayload) -> AppResult<User> {
        let registration = payload.decode().map_err(AppError::Validation)?;

        if self.repository.users_username_taken(&registration.username).await? {
            return Err(AppError::field("username", USERNAME_TAKEN));
        }

        let hash = hash_password(&registration.password)?;
        let user = self
            .repository
            .users_create(&registration.username, &registration.email, &hash)
            .await?;

        tracing::info!("Registered user id={} username={}", user.id, user.username);
        Ok(user)
    }

    /// List every account (id and username)
    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        self.repository.users_list().await
    }
}

/// Verify user password
fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    check_password(&user.password, password)
}

fn check_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
