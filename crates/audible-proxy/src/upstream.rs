//! Upstream Audible/Amazon API client.
//!
//! The [`AudibleApi`] trait is the seam between the HTTP handlers and the
//! network: handlers are written against the trait and tested against a
//! stub, while [`HttpAudible`] talks to the real marketplace hosts.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{locale::Locale, models::RawLibraryItem};

/// Response groups requested for full library listings.
const LIBRARY_RESPONSE_GROUPS: &str = "product_desc,product_attrs,media,last_position_heard";

/// Response groups requested for single-book progress lookups.
const PROGRESS_RESPONSE_GROUPS: &str = "media,last_position_heard";

/// Errors from the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Login rejected by the marketplace.
    #[error("invalid credentials")]
    BadCredentials,

    /// Access token expired or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,

    /// Anything else: network failures, unexpected payloads.
    #[error("{0}")]
    Other(String),
}

/// Tokens and device identity from a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub device_serial: String,
}

/// Operations this service needs from the Audible API.
#[async_trait]
pub trait AudibleApi: Send + Sync {
    /// Registers a device with email and password, returning fresh tokens.
    async fn login(
        &self,
        email: &str,
        password: &str,
        locale: &Locale,
    ) -> Result<Session, UpstreamError>;

    /// Fetches the full library, sorted by purchase date.
    async fn library(
        &self,
        access_token: &str,
        locale: &Locale,
    ) -> Result<Vec<RawLibraryItem>, UpstreamError>;

    /// Fetches a single library item by ASIN. `Ok(None)` when the book is
    /// not in the library.
    async fn library_item(
        &self,
        access_token: &str,
        locale: &Locale,
        asin: &str,
    ) -> Result<Option<RawLibraryItem>, UpstreamError>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh(
        &self,
        refresh_token: &str,
        locale: &Locale,
    ) -> Result<String, UpstreamError>;
}

/// Real client backed by `reqwest`.
pub struct HttpAudible {
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct LibraryEnvelope {
    #[serde(default)]
    items: Vec<RawLibraryItem>,
}

#[derive(Deserialize)]
struct RegisterEnvelope {
    response: RegisterResponse,
}

#[derive(Deserialize)]
struct RegisterResponse {
    success: RegisterSuccess,
}

#[derive(Deserialize)]
struct RegisterSuccess {
    tokens: RegisterTokens,
    #[serde(default)]
    extensions: RegisterExtensions,
}

#[derive(Deserialize)]
struct RegisterTokens {
    bearer: BearerTokens,
}

#[derive(Deserialize)]
struct BearerTokens {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize, Default)]
struct RegisterExtensions {
    #[serde(default)]
    device_info: DeviceInfo,
}

#[derive(Deserialize, Default)]
struct DeviceInfo {
    #[serde(default)]
    device_serial_number: String,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    access_token: String,
}

impl HttpAudible {
    pub fn new() -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("audible-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Other(e.to_string()))?;
        Ok(Self { http })
    }

    fn map_status(status: reqwest::StatusCode) -> Option<UpstreamError> {
        match status.as_u16() {
            200..=299 => None,
            401 | 403 => Some(UpstreamError::Unauthorized),
            404 => Some(UpstreamError::NotFound),
            code => Some(UpstreamError::Other(format!(
                "upstream returned status {code}"
            ))),
        }
    }

    async fn get_library(
        &self,
        access_token: &str,
        locale: &Locale,
        query: &[(&str, &str)],
    ) -> Result<Vec<RawLibraryItem>, UpstreamError> {
        let url = format!("{}/1.0/library", locale.audible_api_base());
        debug!(url = %url, "fetching library");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;

        if let Some(err) = Self::map_status(response.status()) {
            return Err(err);
        }

        let envelope: LibraryEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;
        Ok(envelope.items)
    }
}

#[async_trait]
impl AudibleApi for HttpAudible {
    async fn login(
        &self,
        email: &str,
        password: &str,
        locale: &Locale,
    ) -> Result<Session, UpstreamError> {
        let url = format!("{}/auth/register", locale.amazon_api_base());
        debug!(url = %url, "registering device");

        let body = json!({
            "auth_data": {
                "user_id_password": {
                    "user_id": email,
                    "password": password,
                }
            },
            "requested_token_type": ["bearer"],
            "requested_extensions": ["device_info"],
            "registration_data": {
                "domain": "Device",
                "app_name": "Audible",
                "device_type": "A2CZJZGLK2JJVM",
            },
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            // The register endpoint answers bad credentials with 401 and
            // malformed auth data with 400; both mean the login failed.
            400 | 401 | 403 => return Err(UpstreamError::BadCredentials),
            code => {
                return Err(UpstreamError::Other(format!(
                    "upstream returned status {code}"
                )))
            }
        }

        let envelope: RegisterEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;

        let success = envelope.response.success;
        Ok(Session {
            access_token: success.tokens.bearer.access_token,
            refresh_token: success.tokens.bearer.refresh_token,
            device_serial: success.extensions.device_info.device_serial_number,
        })
    }

    async fn library(
        &self,
        access_token: &str,
        locale: &Locale,
    ) -> Result<Vec<RawLibraryItem>, UpstreamError> {
        self.get_library(
            access_token,
            locale,
            &[
                ("num_results", "1000"),
                ("response_groups", LIBRARY_RESPONSE_GROUPS),
                ("sort_by", "PurchaseDate"),
            ],
        )
        .await
    }

    async fn library_item(
        &self,
        access_token: &str,
        locale: &Locale,
        asin: &str,
    ) -> Result<Option<RawLibraryItem>, UpstreamError> {
        let items = self
            .get_library(
                access_token,
                locale,
                &[("asin", asin), ("response_groups", PROGRESS_RESPONSE_GROUPS)],
            )
            .await?;
        Ok(items.into_iter().next())
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        locale: &Locale,
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/auth/token", locale.amazon_api_base());
        debug!(url = %url, "refreshing access token");

        let body = json!({
            "app_name": "Audible",
            "source_token": refresh_token,
            "source_token_type": "refresh_token",
            "requested_token_type": "access_token",
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;

        if let Some(err) = Self::map_status(response.status()) {
            return Err(err);
        }

        let envelope: TokenEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;
        Ok(envelope.access_token)
    }
}
