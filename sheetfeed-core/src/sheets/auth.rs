//! Service-account authorization for the Google APIs.
//!
//! Flow (OAuth 2.0 JWT bearer grant):
//! 1. sign a short-lived RS256 assertion with the service account's key
//! 2. exchange it at `token_uri` for an access token
//! 3. reuse that token until shortly before it expires

use super::store::SheetsError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

/// The service-account JSON key file issued by Google Cloud.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json)
            .map_err(|e| SheetsError::Credentials(format!("invalid service account key: {e}")))
    }
}

// Never print the private key.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// JWT assertion claims for the bearer grant.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scopes: &[String], now: DateTime<Utc>) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Authorized-client credentials: the parsed key plus a cached access token.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Parse the key's PEM up front so a malformed key fails at startup.
    pub fn new(key: ServiceAccountKey, scopes: &[&str]) -> Result<Self, SheetsError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Credentials(format!("invalid private key: {e}")))?;
        Ok(Self {
            key,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            signing_key,
            cached: Mutex::new(None),
        })
    }

    pub fn from_file(path: &Path, scopes: &[&str]) -> Result<Self, SheetsError> {
        Self::new(ServiceAccountKey::from_file(path)?, scopes)
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed assertion for the token exchange.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let claims = AssertionClaims::new(&self.key, &self.scopes, now);
        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| SheetsError::Credentials(format!("failed to sign assertion: {e}")))
    }

    /// A valid access token, exchanging a fresh assertion when needed.
    pub fn access_token(&self, client: &Client) -> Result<String, SheetsError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| SheetsError::Auth("token cache poisoned".into()))?;

        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if now + Duration::seconds(EXPIRY_MARGIN_SECS) < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange(client, now)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    fn exchange(&self, client: &Client, now: DateTime<Utc>) -> Result<CachedToken, SheetsError> {
        let assertion = self.assertion(now)?;
        debug!(client_email = %self.key.client_email, token_uri = %self.key.token_uri, "exchanging assertion");

        let resp = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|err| match err.error_description {
                    Some(desc) => format!("{}: {desc}", err.error),
                    None => err.error,
                })
                .unwrap_or(body);
            return Err(SheetsError::Auth(format!("HTTP {status}: {message}")));
        }

        let token: TokenResponse = resp
            .json()
            .map_err(|e| SheetsError::Auth(format!("malformed token response: {e}")))?;
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
