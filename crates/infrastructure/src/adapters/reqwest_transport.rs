//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port: it resolves request
//! paths against the configured API base URL, encodes the body, and sends
//! exactly one request per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tokenwarden_application::ports::HttpTransport;
use tokenwarden_domain::request::{APPLICATION_JSON, CONTENT_TYPE, FORM_URLENCODED};
use tokenwarden_domain::{
    ApiRequest, ApiResponse, AuthError, AuthResult, ClientConfig, Headers, HttpMethod,
    RequestBody,
};
use tracing::debug;

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the configuration is invalid
    /// or the client cannot be built.
    pub fn new(config: &ClientConfig) -> AuthResult<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| AuthError::Configuration {
            message: e.to_string(),
        })?;

        Ok(Self::with_client(client, config.base_url()))
    }

    /// Creates a transport around an existing reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn url_for(&self, path: &str) -> AuthResult<Url> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&url).map_err(|e| AuthError::Configuration {
            message: format!("{e}: {url}"),
        })
    }

    /// Encodes the body and sets its content type unless the caller did.
    fn build_body(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
        body: &RequestBody,
    ) -> AuthResult<reqwest::RequestBuilder> {
        let (content_type, bytes) = match body {
            RequestBody::None => return Ok(builder),
            RequestBody::Json(value) => (
                APPLICATION_JSON,
                serde_json::to_vec(value).map_err(|e| AuthError::decode(e.to_string()))?,
            ),
            RequestBody::Form(fields) => (
                FORM_URLENCODED,
                serde_urlencoded::to_string(fields)
                    .map_err(|e| AuthError::decode(e.to_string()))?
                    .into_bytes(),
            ),
        };

        let builder = if headers.contains(CONTENT_TYPE) {
            builder
        } else {
            builder.header(CONTENT_TYPE, content_type)
        };
        Ok(builder.body(bytes))
    }

    /// Maps reqwest errors to a network failure.
    fn map_error(error: &reqwest::Error) -> AuthError {
        if error.is_timeout() {
            return AuthError::network(format!("request timed out: {error}"));
        }
        if error.is_connect() {
            return AuthError::network(format!("connection failed: {error}"));
        }
        if error.is_redirect() {
            return AuthError::network("too many redirects");
        }
        AuthError::network(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> AuthResult<ApiResponse> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, path = %request.path, "Sending request");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }
        builder = Self::build_body(builder, &request.headers, &request.body)?;

        let response = builder.send().await.map_err(|e| Self::map_error(&e))?;

        let status = response.status();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.add(name.as_str(), value.to_str().unwrap_or("<binary>"));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::network(format!("failed to read body: {e}")))?
            .to_vec();

        debug!(status = status.as_u16(), path = %request.path, "Received response");
        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
