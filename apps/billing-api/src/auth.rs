//! JWT authentication module.
//!
//! Token generation and validation, password hashing, and the mapping from a
//! verified access token to the caller's [`Identity`].
//!
//! ```text
//! login(email, password)
//!      │
//!      ├── argon2 verify against users.password_hash
//!      │
//!      ▼
//! access token (1h)  +  refresh token (30d)
//!      │                      │
//!      ▼                      ▼
//! identify(token)        refresh(token) ──► new access token
//!      │
//!      ▼
//! Identity { user_id, email, is_admin }
//! ```

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use billing_core::{Identity, User};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub email: String,

    pub is_admin: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Access/refresh pair handed out at login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user: &Identity) -> ApiResult<String> {
        self.generate(user, ACCESS_TOKEN, self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, user: &Identity) -> ApiResult<String> {
        self.generate(user, REFRESH_TOKEN, self.refresh_lifetime_secs)
    }

    /// Both tokens for a freshly authenticated user.
    pub fn issue_pair(&self, user: &Identity) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
            expires_in: self.access_lifetime_secs,
            token_type: "Bearer".to_string(),
        })
    }

    fn generate(&self, user: &Identity, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate {token_type} token: {e}")))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::Unauthenticated(format!("Invalid token: {e}")))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_kind(token, ACCESS_TOKEN)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        self.validate_kind(token, REFRESH_TOKEN)
    }

    fn validate_kind(&self, token: &str, expected: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(ApiError::Unauthenticated(format!("Expected {expected} token")));
        }
        Ok(claims)
    }

    /// Resolves the caller behind an `Authorization` header value.
    pub fn identify(&self, auth_header: &str) -> ApiResult<Identity> {
        let token = extract_bearer_token(auth_header)
            .ok_or_else(|| ApiError::Unauthenticated("Missing bearer token".to_string()))?;
        Ok(self.validate_access_token(token)?.identity())
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Identity carried by a stored user.
pub fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    }
}

/// Fails with Forbidden unless the caller is an admin.
pub fn require_admin(identity: &Identity) -> ApiResult<()> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(ApiError::admin_required())
    }
}
