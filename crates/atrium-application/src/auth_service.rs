//! Mock authentication service.
//!
//! Issues short-lived HS256 tokens for accounts held in an injected
//! [`UserRepository`]. Validation is stateless: signature and expiry only.

use atrium_core::AtriumError;
use atrium_core::auth::{
    AccessToken, DEFAULT_ROLE, Identity, LoginRequest, RegisterRequest, UserRecord, UserRepository,
};
use atrium_core::config::{AuthConfig, SeedUser};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            first_name: claims.first_name,
            last_name: claims.last_name,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("{0}")]
    InvalidRegistration(String),
    #[error("missing authorization header")]
    MissingAuthorization,
    #[error("invalid authorization scheme")]
    InvalidAuthorizationScheme,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("Failed to issue token: {0}")]
    Signing(String),
    #[error(transparent)]
    Repository(#[from] AtriumError),
}

impl AuthError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailTaken => "email_taken",
            Self::InvalidRegistration(_) => "invalid_registration",
            Self::MissingAuthorization => "missing_authorization",
            Self::InvalidAuthorizationScheme => "invalid_authorization_scheme",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::Signing(_) => "signing_failed",
            Self::Repository(_) => "repository_error",
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingAuthorization
                | Self::InvalidAuthorizationScheme
                | Self::InvalidToken
                | Self::TokenExpired
        )
    }
}

/// Login, registration and token validation over a user repository.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    pub fn from_config(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self::new(
            users,
            &config.jwt_secret,
            Duration::minutes(config.token_ttl_minutes),
        )
    }

    /// Creates the configured accounts, skipping emails that already exist.
    pub async fn seed_users(&self, seeds: &[SeedUser]) -> Result<usize, AuthError> {
        let mut created = 0;
        for seed in seeds {
            if self.users.find_by_email(&seed.email).await?.is_some() {
                continue;
            }
            let record = new_record(
                &seed.email,
                &seed.password,
                &seed.role,
                &seed.first_name,
                &seed.last_name,
                "",
            );
            self.users.insert(record).await?;
            created += 1;
        }
        tracing::info!(created, "Seeded user accounts");
        Ok(created)
    }

    /// Verifies credentials and issues a token.
    pub async fn login(&self, request: &LoginRequest) -> Result<AccessToken, AuthError> {
        let user = self
            .users
            .find_by_email(request.username.trim())
            .await?
            .filter(|user| verify_password(user, &request.password))
            .ok_or_else(|| {
                tracing::info!(email = %request.username, "Rejected login");
                AuthError::InvalidCredentials
            })?;

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "Issued access token");
        Ok(AccessToken {
            access_token: token,
        })
    }

    /// Creates an account with the default role.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Identity, AuthError> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidRegistration(
                "Email and password are required".to_string(),
            ));
        }
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let record = new_record(
            email,
            &request.password,
            DEFAULT_ROLE,
            request.first_name.as_deref().unwrap_or_default(),
            request.last_name.as_deref().unwrap_or_default(),
            request.nickname.as_deref().unwrap_or_default(),
        );
        let identity = Identity::from(&record);
        self.users.insert(record).await.map_err(|e| {
            // Lost a race with a concurrent registration
            if e.is_validation() {
                AuthError::EmailTaken
            } else {
                AuthError::Repository(e)
            }
        })?;

        tracing::info!(user_id = %identity.id, "Registered account");
        Ok(identity)
    }

    /// Validates a token's signature and expiry.
    pub fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(decoded) => Ok(decoded.claims.into()),
            Err(error) => match error.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                _ => Err(AuthError::InvalidToken),
            },
        }
    }

    /// Validates an `Authorization` header value.
    pub fn authenticate_header(&self, header_value: Option<&str>) -> Result<Identity, AuthError> {
        self.authenticate(extract_bearer(header_value)?)
    }

    fn issue_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

/// Parses `Bearer <token>` out of an `Authorization` header value.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    let raw = header_value.ok_or(AuthError::MissingAuthorization)?;
    let Some(token) = raw.trim().strip_prefix("Bearer ") else {
        return Err(AuthError::InvalidAuthorizationScheme);
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthorizationScheme);
    }
    Ok(token)
}

fn new_record(
    email: &str,
    password: &str,
    role: &str,
    first_name: &str,
    last_name: &str,
    nickname: &str,
) -> UserRecord {
    let salt = Uuid::new_v4().simple().to_string();
    UserRecord {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: hash_password(password, &salt),
        salt,
        role: role.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        nickname: nickname.to_string(),
    }
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_password(user: &UserRecord, password: &str) -> bool {
    hash_password(password, &user.salt) == user.password_hash
}
