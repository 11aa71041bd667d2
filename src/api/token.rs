//! Tenant credential lifecycle: lazy acquisition, caching and invalidation.

use crate::config::ClientConfig;
use crate::constants::{DEFAULT_TOKEN_LIFETIME_SECS, TENANT_TOKEN_PATH, TOKEN_EXPIRY_MARGIN_SECS};
use crate::error::AppError;
use crate::types::CredentialSecrets;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

/// A bearer credential and the instant after which it must not be used.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credential exchange response. Fields are top-level, not under `data`.
#[derive(Debug, Deserialize)]
struct TenantTokenResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: Option<i64>,
}

/// Owns the session's tenant credential.
///
/// The cache sits behind an async mutex that stays locked across the
/// exchange, so concurrent callers wait for one acquisition instead of
/// each performing their own.
pub struct TokenManager {
    http: reqwest::Client,
    endpoint: String,
    secrets: CredentialSecrets,
    cached: Mutex<Option<Credential>>,
}

impl TokenManager {
    pub fn new(config: &ClientConfig, secrets: CredentialSecrets) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.url(TENANT_TOKEN_PATH),
            secrets,
            cached: Mutex::new(None),
        })
    }

    /// Returns the cached credential while it is valid, acquiring a new one
    /// otherwise.
    pub async fn get_valid_credential(&self) -> Result<Credential, AppError> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(Utc::now()) {
                return Ok(credential.clone());
            }
            log::debug!("Tenant credential expired at {}", credential.expires_at);
        }

        let credential = self.acquire().await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Forces the next `get_valid_credential` to acquire.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Invalidates only if `stale` is still the cached credential.
    ///
    /// A caller holding a stale credential must not discard one that a
    /// concurrent caller has already refreshed.
    pub async fn invalidate_if_current(&self, stale: &Credential) {
        let mut cached = self.cached.lock().await;
        if cached.as_ref() == Some(stale) {
            *cached = None;
        }
    }

    async fn acquire(&self) -> Result<Credential, AppError> {
        log::debug!("POST {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "app_id": self.secrets.app_id,
                "app_secret": self.secrets.app_secret,
            }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: TenantTokenResponse =
            serde_json::from_str(&body).map_err(|_| AppError::AuthenticationFailed {
                code: i64::from(status.as_u16()),
                message: format!("credential exchange returned a non-JSON body (HTTP {})", status),
            })?;

        if parsed.code != 0 {
            return Err(AppError::AuthenticationFailed {
                code: parsed.code,
                message: parsed.msg,
            });
        }
        let value = parsed
            .tenant_access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::AuthenticationFailed {
                code: parsed.code,
                message: "credential exchange response has no tenant_access_token".to_string(),
            })?;

        let lifetime = parsed.expire.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let expires_at = lifetime
            .checked_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|validity| Utc::now().checked_add_signed(validity))
            .ok_or_else(|| AppError::AuthenticationFailed {
                code: parsed.code,
                message: format!("credential exchange reported an unusable expire of {}", lifetime),
            })?;
        log::info!(
            "Acquired tenant credential for {} (valid until {})",
            self.secrets.app_id,
            expires_at
        );
        Ok(Credential::new(value, expires_at))
    }

    #[cfg(test)]
    async fn seed(&self, credential: Credential) {
        *self.cached.lock().await = Some(credential);
    }
}
