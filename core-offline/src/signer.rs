//! # Signed URL Issuance
//!
//! The backend stores media in a private bucket and issues short-lived
//! pre-signed download URLs. Such URLs expire, so the controller requests a
//! fresh one immediately before every caching attempt and never reuses a
//! previously obtained value.

use crate::error::{OfflineError, Result};
use crate::models::TrackId;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Issues a fresh time-limited download URL for a track.
#[async_trait::async_trait]
pub trait SignedUrlProvider: Send + Sync {
    /// Request a new signed URL. Every call must hit the backend; cached or
    /// previously returned values must not be served.
    async fn fresh_download_url(&self, track_id: &TrackId) -> Result<String>;
}

/// Signed-URL response body.
///
/// The backend returns `{"fileUrlSigned": "https://..."}`; older deployments
/// used a plain `url` field, so both are accepted.
#[derive(Debug, Deserialize)]
struct SignedGetResponse {
    #[serde(rename = "fileUrlSigned")]
    file_url_signed: Option<String>,
    url: Option<String>,
}

/// HTTP implementation of [`SignedUrlProvider`] against the platform API.
pub struct ApiSignedUrlProvider {
    http: Arc<dyn HttpClient>,
    api_base: String,
    bearer_token: String,
}

impl ApiSignedUrlProvider {
    pub fn new(
        http: Arc<dyn HttpClient>,
        api_base: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    fn pick_url(response: SignedGetResponse) -> Result<String> {
        response
            .file_url_signed
            .or(response.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| OfflineError::SignedUrl("Response missing URL".to_string()))
    }
}

#[async_trait::async_trait]
impl SignedUrlProvider for ApiSignedUrlProvider {
    #[instrument(skip(self))]
    async fn fresh_download_url(&self, track_id: &TrackId) -> Result<String> {
        let url = format!(
            "{}/music/signedGet?musicId={}",
            self.api_base,
            urlencoding::encode(track_id.as_str())
        );
        debug!("Requesting fresh signed URL");

        // Authorization only; no Content-Type on a GET.
        let request =
            HttpRequest::new(HttpMethod::Get, url).bearer_token(self.bearer_token.clone());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| OfflineError::SignedUrl(format!("Request failed: {}", e)))?;

        if !response.is_success() {
            return Err(OfflineError::SignedUrl(format!(
                "signedGet failed with status {}",
                response.status
            )));
        }

        let body: SignedGetResponse = response
            .json()
            .map_err(|e| OfflineError::SignedUrl(format!("Invalid response body: {}", e)))?;

        Self::pick_url(body)
    }
}
