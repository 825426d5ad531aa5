//! Service-account token acquisition (OAuth2 JWT-bearer grant).

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ServiceError, ServiceResult};

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The subset of a service-account key file used for the JWT grant
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> ServiceResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(raw)?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(ServiceError::Auth(
                "service account key lacks client_email or private_key".to_string(),
            ));
        }
        Ok(key)
    }
}

/// JWT claims for the assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scope: &str, now: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Sign a short-lived RS256 assertion for `scope`.
pub fn sign_assertion(key: &ServiceAccountKey, scope: &str) -> ServiceResult<String> {
    let claims = AssertionClaims::new(key, scope, Utc::now().timestamp());
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
}

/// Exchanges a signed assertion for a bearer token on every call.
#[derive(Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    scope: String,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            http,
            key,
            scope: scope.into(),
        }
    }

    pub async fn access_token(&self) -> ServiceResult<String> {
        let assertion = sign_assertion(&self.key, &self.scope)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response("Google token", response).await);
        }

        let body: TokenResponse = response.json().await?;
        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ServiceError::Auth(format!(
                "token endpoint returned no access_token ({}: {})",
                body.error.unwrap_or_default(),
                body.error_description.unwrap_or_default()
            ))),
        }
    }
}
