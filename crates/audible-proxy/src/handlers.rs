//! HTTP request handlers.
//!
//! Every endpoint follows the same envelope: check the shared secret,
//! validate the body, open the sealed tokens, call upstream, shape the
//! result, and seal anything sensitive before it goes back out. Failures
//! short-circuit at the first failing step.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{Duration, SecondsFormat, Utc};
use tracing::info;

use crate::{
    crypto::TokenCipher,
    error::ServiceError,
    locale::Locale,
    models::{
        shape_book, AuthRequest, AuthResponse, HealthResponse, LibraryResponse, ProgressResponse,
        RefreshRequest, RefreshResponse, TokenRequest,
    },
    upstream::{AudibleApi, UpstreamError},
};

/// Shared state handed to every handler.
pub struct AppState {
    pub cipher: TokenCipher,
    pub api_secret: Option<String>,
    pub upstream: Arc<dyn AudibleApi>,
}

impl AppState {
    /// Checks the `X-API-Secret` header. With no secret configured the
    /// service accepts every request.
    fn verify_api_secret(&self, headers: &HeaderMap) -> Result<(), ServiceError> {
        let Some(expected) = &self.api_secret else {
            return Ok(());
        };
        let presented = headers
            .get("x-api-secret")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented == expected {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    fn resolve_locale(&self, country_code: Option<&str>) -> Result<Locale, ServiceError> {
        Locale::resolve(country_code).map_err(ServiceError::Validation)
    }
}

/// Tokens are valid for an hour after issue.
fn expires_at() -> String {
    (Utc::now() + Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "audible-integration",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

/// `POST /api/auth`
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    state.verify_api_secret(&headers)?;

    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ServiceError::Validation(
            "Email and password are required".into(),
        ));
    };

    let locale = state.resolve_locale(body.country_code.as_deref())?;
    info!(email = %email, country = locale.country_code, "authenticating user");

    let session = state
        .upstream
        .login(&email, &password, &locale)
        .await
        .map_err(|e| match e {
            UpstreamError::BadCredentials => ServiceError::BadCredentials,
            other => ServiceError::Internal(format!("Authentication error: {other}")),
        })?;

    let seal = |token: &str| {
        state
            .cipher
            .encrypt(token)
            .map_err(|e| ServiceError::Internal(format!("Authentication error: {e}")))
    };

    Ok(Json(AuthResponse {
        success: true,
        access_token: seal(&session.access_token)?,
        refresh_token: seal(&session.refresh_token)?,
        device_serial: seal(&session.device_serial)?,
        expires_at: expires_at(),
    }))
}

/// `POST /api/library`
pub async fn get_library(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TokenRequest>,
) -> Result<Json<LibraryResponse>, ServiceError> {
    state.verify_api_secret(&headers)?;

    let (Some(access_token), Some(refresh_token)) = (
        body.access_token.filter(|t| !t.is_empty()),
        body.refresh_token.filter(|t| !t.is_empty()),
    ) else {
        return Err(ServiceError::Validation("Tokens are required".into()));
    };

    let locale = state.resolve_locale(body.country_code.as_deref())?;
    info!(country = locale.country_code, "fetching library");

    // Both tokens must open cleanly before anything goes upstream.
    let access_token = state
        .cipher
        .decrypt(&access_token)
        .map_err(|e| ServiceError::Internal(format!("Library fetch error: {e}")))?;
    state
        .cipher
        .decrypt(&refresh_token)
        .map_err(|e| ServiceError::Internal(format!("Library fetch error: {e}")))?;

    let items = state
        .upstream
        .library(&access_token, &locale)
        .await
        .map_err(|e| match e {
            UpstreamError::Unauthorized => ServiceError::TokenExpired,
            other => ServiceError::Internal(format!("Library fetch error: {other}")),
        })?;

    info!(count = items.len(), "found books in library");

    let books: Vec<_> = items.iter().map(shape_book).collect();
    let total_count = books.len();
    Ok(Json(LibraryResponse {
        success: true,
        books,
        total_count,
    }))
}

/// `POST /api/progress/{asin}`
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(asin): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TokenRequest>,
) -> Result<Json<ProgressResponse>, ServiceError> {
    state.verify_api_secret(&headers)?;

    let (Some(access_token), Some(refresh_token)) = (
        body.access_token.filter(|t| !t.is_empty()),
        body.refresh_token.filter(|t| !t.is_empty()),
    ) else {
        return Err(ServiceError::Validation("Tokens are required".into()));
    };

    let locale = state.resolve_locale(body.country_code.as_deref())?;
    info!(asin = %asin, "fetching progress");

    let access_token = state
        .cipher
        .decrypt(&access_token)
        .map_err(|e| ServiceError::Internal(format!("Progress fetch error: {e}")))?;
    state
        .cipher
        .decrypt(&refresh_token)
        .map_err(|e| ServiceError::Internal(format!("Progress fetch error: {e}")))?;

    let item = state
        .upstream
        .library_item(&access_token, &locale, &asin)
        .await
        .map_err(|e| match e {
            UpstreamError::Unauthorized => ServiceError::TokenExpired,
            other => ServiceError::Internal(format!("Progress fetch error: {other}")),
        })?
        .ok_or_else(|| ServiceError::NotFound("Book not found in library".into()))?;

    let book = shape_book(&item);
    Ok(Json(ProgressResponse {
        success: true,
        asin,
        position_seconds: book.position_seconds,
        percent_complete: book.percent_complete,
        is_finished: book.is_finished,
    }))
}

/// `POST /api/refresh-token`
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ServiceError> {
    state.verify_api_secret(&headers)?;

    let Some(sealed) = body.refresh_token.filter(|t| !t.is_empty()) else {
        return Err(ServiceError::Validation("Refresh token is required".into()));
    };

    let locale = state.resolve_locale(body.country_code.as_deref())?;
    info!("refreshing access token");

    let refresh_token = state
        .cipher
        .decrypt(&sealed)
        .map_err(|e| ServiceError::Internal(format!("Token refresh error: {e}")))?;

    let access_token = state
        .upstream
        .refresh(&refresh_token, &locale)
        .await
        .map_err(|e| ServiceError::Internal(format!("Token refresh error: {e}")))?;

    let sealed = state
        .cipher
        .encrypt(&access_token)
        .map_err(|e| ServiceError::Internal(format!("Token refresh error: {e}")))?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token: sealed,
        expires_at: expires_at(),
    }))
}
