//! HTTP transport shared by every service.
//!
//! Wraps [`reqwest`] with the backend's conventions: bearer authorization
//! taken from the [`SessionStore`], JSON request bodies, and error bodies of
//! the form `{"detail": "..."}`.

use std::sync::Arc;

use hamro_core::error::CoreError;
use hamro_session::SessionStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Request path as a list of segments. Each segment is percent-encoded when
/// the URL is built. An empty final segment produces a trailing slash.
pub type Segments<'a> = &'a [&'a str];

/// HTTP client bound to one backend and one session.
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl Gateway {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        session: Arc<SessionStore>,
    ) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `segments` against the base URL.
    pub fn url(&self, segments: Segments<'_>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// A request that needs no credential.
    pub fn public(&self, method: Method, segments: Segments<'_>) -> ApiResult<RequestBuilder> {
        let url = self.url(segments)?;
        tracing::debug!(method = %method, path = url.path(), "Public request");
        Ok(self.client.request(method, url).header(CONTENT_TYPE, JSON_CONTENT_TYPE))
    }

    /// A request carrying the stored bearer token.
    ///
    /// Fails with [`ApiError::AuthenticationRequired`] before any I/O when
    /// the session holds no token.
    pub fn authenticated(
        &self,
        method: Method,
        segments: Segments<'_>,
    ) -> ApiResult<RequestBuilder> {
        Ok(self.bearer(method, segments)?.header(CONTENT_TYPE, JSON_CONTENT_TYPE))
    }

    /// Authenticated multipart upload. The transport writes the
    /// `multipart/form-data` content type with its boundary.
    pub fn authenticated_multipart(
        &self,
        segments: Segments<'_>,
        form: reqwest::multipart::Form,
    ) -> ApiResult<RequestBuilder> {
        Ok(self.bearer(Method::POST, segments)?.multipart(form))
    }

    fn bearer(&self, method: Method, segments: Segments<'_>) -> ApiResult<RequestBuilder> {
        let token = self.session.token().ok_or_else(|| {
            tracing::debug!(path = ?segments, "Protected call without a token");
            ApiError::AuthenticationRequired
        })?;
        let url = self.url(segments)?;
        tracing::debug!(method = %method, path = url.path(), "Authenticated request");
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Send `request` and return the response if its status is 2xx.
    pub async fn execute(&self, request: RequestBuilder, fallback: &str) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request did not reach the server");
            ApiError::Connectivity(e)
        })?;
        ensure_success(response, fallback).await
    }

    /// Send `request` and decode the body as `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = self.execute(request, fallback).await?;
        decode_body(response).await
    }

    /// Send `request`, decode the body as payload `P` and build model `M`.
    pub async fn fetch_model<P, M>(&self, request: RequestBuilder, fallback: &str) -> ApiResult<M>
    where
        P: DeserializeOwned,
        M: TryFrom<P, Error = CoreError>,
    {
        let payload: P = self.fetch(request, fallback).await?;
        into_model(payload)
    }

    /// Like [`fetch_model`](Self::fetch_model) for a JSON array body.
    pub async fn fetch_models<P, M>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResult<Vec<M>>
    where
        P: DeserializeOwned,
        M: TryFrom<P, Error = CoreError>,
    {
        let payloads: Vec<P> = self.fetch(request, fallback).await?;
        payloads.into_iter().map(into_model).collect()
    }

    /// `HEAD /`. Healthy only when the backend answers with a 2xx status.
    pub async fn health_check(&self) -> bool {
        let url = match self.url(&[""]) {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    tracing::warn!(status = status.as_u16(), "Backend unhealthy");
                }
                status.is_success()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend unreachable");
                false
            }
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

pub(crate) fn into_model<P, M>(payload: P) -> ApiResult<M>
where
    M: TryFrom<P, Error = CoreError>,
{
    M::try_from(payload).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn ensure_success(response: Response, fallback: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
    tracing::debug!(status = status.as_u16(), error = %message, "Server rejected request");
    Err(ApiError::ServerRejected {
        status: status.as_u16(),
        message,
    })
}

/// Extract a string `detail` from an error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}

async fn decode_body<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
