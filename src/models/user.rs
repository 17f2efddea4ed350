//! User model, registration payload and JWT claims

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{text_field, REQUIRED};
use crate::error::{AppError, FieldErrors};

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

/// Full user model from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    pub password: String,
    pub date_joined: DateTime<Utc>,
}

/// User representation for the account listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
}

/// Registration response: the password is never sent back
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUser {
    pub username: String,
    pub email: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterPayload {
    #[validate(
        required(message = "This field is required."),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub username: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: Option<String>,
}

/// Validated registration; the password is still in clear text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterPayload {
    pub fn decode(mut self) -> Result<Registration, FieldErrors> {
        // A blank e-mail is allowed and stored as empty
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let mut errors = FieldErrors::of(&self);

        let username = text_field(&mut errors, "username", self.username);
        if let Some(ref username) = username {
            if !is_valid_username(username) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        // Passwords are taken verbatim, only emptiness is rejected
        let password = match self.password {
            Some(p) if p.is_empty() => {
                errors.add("password", super::BLANK);
                None
            }
            other => other,
        };

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Registration {
                username,
                email: self.email.unwrap_or_default(),
                password,
            }),
            (None, _) if !errors.has("username") => {
                errors.add("username", REQUIRED);
                Err(errors)
            }
            _ => Err(errors),
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username.chars().count() <= USERNAME_MAX_LEN
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Login request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(required(message = "This field is required."))]
    pub username: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

/// Refresh request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(required(message = "This field is required."))]
    pub refresh: Option<String>,
}

/// Access + refresh token pair returned on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// New access token returned on refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

/// Kind of JWT, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub token_type: TokenType,
    pub user_id: i32,
    pub username: String,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

impl TokenClaims {
    pub fn new(token_type: TokenType, user: &User, lifetime: Duration) -> Self {
        Self::issued(token_type, user.id, &user.username, lifetime)
    }

    /// Access token minted from a refresh token
    pub fn access_from(refresh: &TokenClaims, lifetime: Duration) -> Self {
        Self::issued(TokenType::Access, refresh.user_id, &refresh.username, lifetime)
    }

    fn issued(token_type: TokenType, user_id: i32, username: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            token_type,
            user_id,
            username: username.to_string(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Reject tokens of the wrong kind
    pub fn require(self, expected: TokenType) -> Result<Self, AppError> {
        if self.token_type == expected {
            Ok(self)
        } else {
            Err(AppError::Authentication(
                "Token has wrong type".to_string(),
            ))
        }
    }
}
