use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::credentials::{CredentialSource, NoCredential};
use crate::envelope::{Envelope, Page};
use crate::error::{GatewayError, GatewayInitError};
use crate::headers::build_headers;
use crate::url::{build_url, normalize_base_url, QueryParams};

/// Optional parts of a gateway call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub query: QueryParams,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `body` as the JSON request body.
    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self, GatewayError> {
        self.body = Some(serde_json::to_value(body).map_err(|error| {
            GatewayError::network(format!("failed to serialize request body: {error}"))
        })?);
        Ok(self)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }
}

/// Raw payload returned by [`Gateway::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// The single HTTP access point every data operation goes through.
///
/// Each call is one attempt: no retries and no de-duplication. The credential
/// source is consulted fresh for every request.
#[derive(Clone)]
pub struct Gateway {
    http: Client,
    config: GatewayConfig,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates an unauthenticated gateway.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayInitError> {
        Self::with_credentials(config, Arc::new(NoCredential))
    }

    pub fn with_credentials(
        config: GatewayConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, GatewayInitError> {
        let base_url = normalize_base_url(&config.base_url).map_err(|source| {
            GatewayInitError::InvalidBaseUrl {
                value: config.base_url.clone(),
                source,
            }
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            config,
            base_url,
            credentials,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves the absolute URL for `path` and `query`.
    pub fn url_for(&self, path: &str, query: &QueryParams) -> Result<reqwest::Url, GatewayError> {
        build_url(&self.base_url, path, query)
            .map_err(|error| GatewayError::network(format!("invalid request URL for {path}: {error}")))
    }

    /// Builds request headers, acquiring the credential for this call.
    pub fn build_headers(&self) -> Result<HeaderMap, GatewayError> {
        let credential = self.credentials.credential();
        let headers = build_headers(&self.config, credential.as_deref());
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| GatewayError::network(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| GatewayError::network(format!("invalid header value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        let url = self.url_for(path, &options.query)?;
        let headers = self.build_headers()?;
        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        Ok(request)
    }

    /// Performs one request and parses the response envelope.
    ///
    /// Fails with `NETWORK_ERROR` (status `0`) when no response arrives or a
    /// success body is not a valid envelope. A status outside the success
    /// range fails with the backend's error code, or `UNKNOWN_ERROR` when the
    /// body carries none (an HTML proxy page, say), and keeps the status. A
    /// successful status is returned as-is, even if the envelope reports
    /// `success: false`; see [`Envelope::into_result`].
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Envelope<T>, GatewayError> {
        let response = self.send(method, path, &options).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // A proxy error page is still a response: keep its status.
            let error = serde_json::from_slice::<Envelope<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.error);
            return Err(GatewayError::from_envelope_error(status.as_u16(), error));
        }

        let mut envelope: Envelope<T> = serde_json::from_slice(&body)?;
        envelope.http_status = status.as_u16();
        Ok(envelope)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<Envelope<T>, GatewayError> {
        self.call(Method::GET, path, RequestOptions::new().with_query(query))
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, GatewayError> {
        self.call(Method::POST, path, RequestOptions::new().with_body(body)?)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, GatewayError> {
        self.call(Method::PUT, path, RequestOptions::new().with_body(body)?)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, GatewayError> {
        self.call(Method::PATCH, path, RequestOptions::new().with_body(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, GatewayError> {
        self.call(Method::DELETE, path, RequestOptions::new()).await
    }

    /// Fetches one page from a list endpoint.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<Page<T>, GatewayError> {
        self.get::<Vec<T>>(path, query).await?.into_page()
    }

    /// Fetches a binary payload, bypassing envelope parsing.
    ///
    /// Non-success statuses fail with `DOWNLOAD_ERROR`; transport failures with
    /// `NETWORK_ERROR`.
    pub async fn download(&self, path: &str, query: QueryParams) -> Result<Download, GatewayError> {
        let options = RequestOptions::new().with_query(query);
        let response = self.send(Method::GET, path, &options).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::download(status));
        }

        let content_type = header_string(&response, CONTENT_TYPE.as_str());
        let file_name = header_string(&response, CONTENT_DISPOSITION.as_str())
            .as_deref()
            .and_then(parse_content_disposition_filename);
        let bytes = response.bytes().await?.to_vec();

        Ok(Download {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, GatewayError> {
        let request = self.build_request(method.clone(), path, options)?;
        match request.send().await {
            Ok(response) => {
                debug!(%method, path, status = response.status().as_u16(), "gateway response");
                Ok(response)
            }
            Err(error) => {
                debug!(%method, path, %error, "gateway transport failure");
                Err(GatewayError::from(error))
            }
        }
    }
}

fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Extracts `filename` from a `content-disposition` header value.
pub fn parse_content_disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let (key, raw) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        }
    })
}
