//! Microsoft Graph API client
//!
//! Issues authenticated HTTP calls against the Graph v1.0 endpoint. Every
//! attempt asks the [`TokenProvider`] for a fresh token, so a provider that
//! refreshes on expiry lets a call recover from `InvalidAuthenticationToken`
//! through the bounded auth-retry loop in [`ApiClient::call`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spsync_graph::{auth::StaticToken, client::{ApiClient, CallOptions}};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new(Arc::new(StaticToken::new("access-token")));
//! let lists = client.depaginate("/sites/contoso.sharepoint.com:/sites/archive:/lists").await?;
//! println!("{} lists", lists.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use spsync_core::config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
use spsync_core::ports::TokenProvider;
use tracing::{debug, warn};

use crate::{GraphError, GraphResult};

/// Error codes that mean "the token was rejected"; these trigger a retry
const AUTH_FAILURE_CODES: &[&str] = &["InvalidAuthenticationToken", "unauthenticated"];

/// Statuses that count as success; anything else is inspected as an error
const SUCCESS_STATUSES: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT];

/// Default key of the page array in collection responses
pub const VALUE_KEY: &str = "value";

/// Default key of the continuation URL in collection responses
pub const NEXT_LINK_KEY: &str = "@odata.nextLink";

/// Default property selected by [`ApiClient::download_url`]
pub const DOWNLOAD_URL_ATTR: &str = "@microsoft.graph.downloadUrl";

// ============================================================================
// Request options
// ============================================================================

/// Body sent with a request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON
    Json(Value),
    /// Sent verbatim
    Raw(Bytes),
}

/// Per-call options: body, content type and auth-retry budget
#[derive(Debug, Clone)]
pub struct CallOptions {
    body: RequestBody,
    content_type: String,
    max_retries: Option<u32>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            body: RequestBody::Empty,
            content_type: "application/json".to_string(),
            max_retries: None,
        }
    }
}

impl CallOptions {
    /// No body, `application/json`, the client's default retry budget
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON body with `Content-Type: application/json`
    pub fn json(value: Value) -> Self {
        Self {
            body: RequestBody::Json(value),
            ..Self::default()
        }
    }

    /// Raw body with the given content type
    pub fn raw(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: RequestBody::Raw(data.into()),
            content_type: content_type.into(),
            max_retries: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Overrides the auth-retry budget for this call
    ///
    /// The budget counts attempts: `2` allows one retry, `1` none.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Diagnostic rendering of the body for [`ApiFailure::request_body`]
    fn body_for_diagnostics(&self) -> Option<Value> {
        match &self.body {
            RequestBody::Empty => None,
            RequestBody::Json(v) => Some(v.clone()),
            RequestBody::Raw(data) => Some(Value::String(format!(
                "<{} bytes of {}>",
                data.len(),
                self.content_type
            ))),
        }
    }
}

// ============================================================================
// Responses and failures
// ============================================================================

/// A successful (200/201/204) response with its body fully read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    endpoint: String,
    body: Bytes,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The absolute URL the response came from
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> GraphResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            GraphError::InvalidResponse(format!("{}: {}", self.endpoint, e))
        })
    }

    /// Parses the body as an untyped JSON value
    pub fn value(&self) -> GraphResult<Value> {
        self.json()
    }
}

/// Diagnostic payload of a failed API call
#[derive(Debug, Clone, Serialize)]
pub struct ApiFailure {
    pub message: String,
    pub method: String,
    pub status_code: u16,
    /// Final (absolute) endpoint
    pub endpoint: String,
    /// The body that was sent, if any
    pub request_body: Option<Value>,
    /// The parsed response body; non-JSON bodies are kept as a string
    pub response: Value,
}

impl ApiFailure {
    /// The Graph error code (`error.code`), if the response carried one
    pub fn error_code(&self) -> Option<&str> {
        self.response
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
    }

    /// Whether the error code denotes a rejected or missing token
    pub fn is_auth_failure(&self) -> bool {
        self.error_code()
            .is_some_and(|code| AUTH_FAILURE_CODES.contains(&code))
    }

    /// The diagnostic payload as JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} returned {}",
            self.message, self.method, self.endpoint, self.status_code
        )?;
        if let Some(code) = self.error_code() {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

/// Result of a single attempt
#[derive(Debug)]
enum CallOutcome {
    Success(ApiResponse),
    RetryableAuthFailure(ApiFailure),
    FatalFailure(ApiFailure),
}

/// Classifies a raw response into a [`CallOutcome`]
fn classify(
    method: &Method,
    endpoint: &str,
    status: StatusCode,
    body: Bytes,
    options: &CallOptions,
) -> CallOutcome {
    if SUCCESS_STATUSES.contains(&status) {
        return CallOutcome::Success(ApiResponse {
            status,
            endpoint: endpoint.to_string(),
            body,
        });
    }

    let response = serde_json::from_slice::<Value>(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));

    let failure = ApiFailure {
        message: "bad http response".to_string(),
        method: method.to_string(),
        status_code: status.as_u16(),
        endpoint: endpoint.to_string(),
        request_body: options.body_for_diagnostics(),
        response,
    };

    if failure.is_auth_failure() {
        CallOutcome::RetryableAuthFailure(failure)
    } else {
        CallOutcome::FatalFailure(failure)
    }
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP client for Microsoft Graph API calls
///
/// Holds no token state: the [`TokenProvider`] is asked for a token on
/// every attempt.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying HTTP client
    http: Client,
    /// Base URL prefixed to relative endpoints
    base_url: String,
    /// Token source, queried once per attempt
    tokens: Arc<dyn TokenProvider>,
    /// Default auth-retry budget for calls that do not override it
    max_retries: u32,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for the public Graph v1.0 endpoint
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(tokens, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(tokens: Arc<dyn TokenProvider>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a client from the `api` configuration section
    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(tokens, config.base_url.clone()).with_max_retries(config.max_retries)
    }

    /// Sets the default auth-retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Prefixes the base URL unless `endpoint` is already absolute
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    pub async fn get(&self, endpoint: &str, options: CallOptions) -> GraphResult<ApiResponse> {
        self.call(Method::GET, endpoint, options).await
    }

    pub async fn put(&self, endpoint: &str, options: CallOptions) -> GraphResult<ApiResponse> {
        self.call(Method::PUT, endpoint, options).await
    }

    pub async fn post(&self, endpoint: &str, options: CallOptions) -> GraphResult<ApiResponse> {
        self.call(Method::POST, endpoint, options).await
    }

    pub async fn patch(&self, endpoint: &str, options: CallOptions) -> GraphResult<ApiResponse> {
        self.call(Method::PATCH, endpoint, options).await
    }

    pub async fn delete(&self, endpoint: &str, options: CallOptions) -> GraphResult<ApiResponse> {
        self.call(Method::DELETE, endpoint, options).await
    }

    /// Sends a request, retrying authentication failures within the budget
    ///
    /// The budget counts attempts: with the default of 2 an auth failure is
    /// retried once (with a freshly fetched token). Any other non-success
    /// status, or an auth failure with the budget spent, becomes
    /// [`GraphError::Api`]. Network errors are not retried.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        options: CallOptions,
    ) -> GraphResult<ApiResponse> {
        let url = self.resolve(endpoint);
        let mut budget = options.max_retries.unwrap_or(self.max_retries);

        loop {
            match self.attempt(&method, &url, &options).await? {
                CallOutcome::Success(response) => return Ok(response),
                CallOutcome::RetryableAuthFailure(failure) if budget > 1 => {
                    budget -= 1;
                    warn!(
                        method = %method,
                        endpoint = %url,
                        code = failure.error_code().unwrap_or_default(),
                        remaining = budget,
                        "Authentication rejected, retrying with a fresh token"
                    );
                }
                CallOutcome::RetryableAuthFailure(failure) | CallOutcome::FatalFailure(failure) => {
                    debug!(
                        method = %method,
                        endpoint = %url,
                        status = failure.status_code,
                        "Graph request failed"
                    );
                    return Err(failure.into());
                }
            }
        }
    }

    /// One round trip: fetch token, send, read body, classify
    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        options: &CallOptions,
    ) -> GraphResult<CallOutcome> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(GraphError::Token)?;

        debug!(method = %method, endpoint = url, authenticated = token.is_some(), ">>");

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, options.content_type.as_str());

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match &options.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.body(value.to_string()),
            RequestBody::Raw(data) => request.body(data.clone()),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(classify(method, url, status, body, options))
    }

    /// Fetches every page of a collection and concatenates the `value` arrays
    pub async fn depaginate(&self, url: &str) -> GraphResult<Vec<Value>> {
        self.depaginate_with(url, VALUE_KEY, NEXT_LINK_KEY).await
    }

    /// [`depaginate`](Self::depaginate) with custom page and continuation keys
    ///
    /// Pages are fetched strictly one after another, following
    /// `next_link_key` until a page lacks it.
    pub async fn depaginate_with(
        &self,
        url: &str,
        value_key: &str,
        next_link_key: &str,
    ) -> GraphResult<Vec<Value>> {
        let mut page = self.get(url, CallOptions::new()).await?.value()?;
        let mut values = take_page_values(&mut page, value_key, url)?;
        let mut page_count: u32 = 1;

        while let Some(next) = page.get(next_link_key).and_then(Value::as_str) {
            let next = next.to_string();
            page = self.get(&next, CallOptions::new()).await?.value()?;
            values.extend(take_page_values(&mut page, value_key, &next)?);
            page_count += 1;
        }

        debug!(pages = page_count, items = values.len(), url, "Depaginated collection");
        Ok(values)
    }

    /// Returns the pre-authenticated download URL of a drive item
    pub async fn download_url(&self, drive_id: &str, item_id: &str) -> GraphResult<String> {
        self.download_url_with(drive_id, item_id, DOWNLOAD_URL_ATTR)
            .await
    }

    /// [`download_url`](Self::download_url) selecting a custom property
    pub async fn download_url_with(
        &self,
        drive_id: &str,
        item_id: &str,
        attr: &str,
    ) -> GraphResult<String> {
        let endpoint = format!("/drives/{drive_id}/items/{item_id}?select=id,{attr}");
        let item = self.get(&endpoint, CallOptions::new()).await?.value()?;
        item.get(attr)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                GraphError::InvalidResponse(format!("item {item_id} has no '{attr}' property"))
            })
    }
}

/// Moves the page array out of a collection response
fn take_page_values(page: &mut Value, value_key: &str, url: &str) -> GraphResult<Vec<Value>> {
    match page.get_mut(value_key).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(GraphError::InvalidResponse(format!(
            "{url}: page has no '{value_key}' array"
        ))),
    }
}
