//! JWT service for token generation and validation
//!
//! Tokens are signed with an HMAC algorithm and a shared secret. They are
//! stateless: validity is decided by signature and expiry only.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::UserRecord;

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    30
}

fn default_refresh_token_expire_days() -> i64 {
    7
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared signing secret
    pub secret_key: String,
    /// One of HS256, HS384, HS512
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Access token lifetime (default: 30 minutes)
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
    /// Refresh token lifetime (default: 7 days)
    #[serde(default = "default_refresh_token_expire_days")]
    pub refresh_token_expire_days: i64,
    /// Static client credentials accepted by the token endpoint
    pub client_id: String,
    pub client_secret: String,
}

impl JwtConfig {
    /// Parse the configured algorithm, accepting only the HMAC family
    pub fn algorithm(&self) -> Result<Algorithm, TokenError> {
        let algorithm = Algorithm::from_str(&self.algorithm)
            .map_err(|_| TokenError::Algorithm(self.algorithm.clone()))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            _ => Err(TokenError::Algorithm(self.algorithm.clone())),
        }
    }
}

/// Token errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Could not create token: {0}")]
    Creation(String),

    #[error("Unsupported signing algorithm: {0}")]
    Algorithm(String),
}

/// Token type marker carried in the `type` claim
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access_token",
            TokenType::Refresh => "refresh_token",
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Issued at (UTC seconds)
    pub iat: i64,
    /// Expiration (UTC seconds)
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Obfuscated role id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self, TokenError> {
        let algorithm = config.algorithm()?;
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            header: Header::new(algorithm),
            validation,
            config,
        })
    }

    /// Compare against the configured static client credentials
    pub fn validate_client(&self, client_id: Option<&str>, client_secret: Option<&str>) -> bool {
        client_id == Some(self.config.client_id.as_str())
            && client_secret == Some(self.config.client_secret.as_str())
    }

    /// Access token lifetime in seconds
    pub fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expire_minutes * 60
    }

    /// Issue an access token carrying the user's profile claims
    pub fn create_access_token(
        &self,
        user: &UserRecord,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(self.config.access_token_expire_minutes));
        let now = Utc::now();

        let claims = Claims {
            sub: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: TokenType::Access,
            name: user.full_name.clone(),
            email: user.email.clone(),
            role: Some(user.role.clone()),
        };

        self.sign(&claims)
    }

    /// Issue a refresh token carrying only the subject
    pub fn create_refresh_token(
        &self,
        user: &UserRecord,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or_else(|| Duration::days(self.config.refresh_token_expire_days));
        let now = Utc::now();

        let claims = Claims {
            sub: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: TokenType::Refresh,
            name: None,
            email: None,
            role: None,
        };

        self.sign(&claims)
    }

    /// Verify signature and expiry and return the claims
    pub fn decode_token(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                warn!("Token expired");
                Err(TokenError::Expired)
            }
            Err(e) => {
                warn!("Invalid token: {}", e);
                Err(TokenError::Invalid)
            }
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign {}: {}", claims.token_type.as_str(), e);
            TokenError::Creation(e.to_string())
        })
    }
}
