use async_trait::async_trait;
use oracle_core::{
    AnalysisRequest, AnalysisResult, AuthToken, DashboardApi, GatewayConfig, GatewayError,
    GatewayResult, IndicatorsInfo, LoginRequest, Preferences, RegisterRequest, TradeRecord,
    UsageQuota, UserRecord,
};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::mocks;

/// How a single request should be sent
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Sent as `Authorization: Bearer {token}`
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    /// Sent as a JSON body
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            bearer: None,
            query: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn put() -> Self {
        Self {
            method: Method::PUT,
            ..Self::default()
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> GatewayResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(GatewayError::Encode)?);
        Ok(self)
    }
}

/// Client for the analysis service and the account API.
///
/// Every call makes at most one attempt. Operations with a mock branch skip the
/// network entirely when `use_mocks` is set; `analyze_trade` has none.
#[derive(Clone)]
pub struct RequestGateway {
    client: Client,
    config: GatewayConfig,
}

impl RequestGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_mock(&self) -> bool {
        self.config.use_mocks
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn analysis_url(&self, path: &str) -> String {
        format!("{}{}", self.config.analysis_base_url, path)
    }

    /// Send one request and hand back whatever response arrives, whatever its status.
    async fn send(&self, url: &str, options: RequestOptions) -> GatewayResult<Response> {
        let RequestOptions {
            method,
            bearer,
            query,
            body,
        } = options;

        let mut request = self.client.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            debug!(%method, url, error = %e, "Request failed before a response arrived");
            GatewayError::transport()
        })
    }

    /// Send one request and decode the JSON reply.
    ///
    /// A request that never gets a response fails with [`GatewayError::Transport`].
    /// A non-2xx status fails with [`GatewayError::Response`] carrying the error
    /// body, or an empty body if it cannot be read. A 2xx body that does not
    /// decode as `T` is [`GatewayError::MalformedResponse`].
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> GatewayResult<T> {
        let method = options.method.clone();
        let response = self.send(url, options).await?;
        let status = response.status();

        if !status.is_success() {
            debug!(%method, url, status = status.as_u16(), "Request returned an error status");
            let bytes = response
                .bytes()
                .await
                .inspect_err(|e| debug!(%method, url, error = %e, "Failed to read error body"))
                .unwrap_or_default();
            return Err(GatewayError::from_error_body(status.as_u16(), &bytes));
        }

        let bytes = response.bytes().await.map_err(|e| {
            debug!(%method, url, error = %e, "Failed to read response body");
            GatewayError::transport()
        })?;
        serde_json::from_slice(&bytes).map_err(GatewayError::MalformedResponse)
    }
}

#[async_trait]
impl DashboardApi for RequestGateway {
    async fn analyze_trade(&self, request: &AnalysisRequest) -> GatewayResult<AnalysisResult> {
        let url = self.analysis_url("/analyze-holy-grail-advanced");
        self.fetch_json(&url, RequestOptions::post().query("pair", request.pair.as_str()))
            .await
    }

    async fn get_indicators_info(&self) -> GatewayResult<IndicatorsInfo> {
        if self.is_mock() {
            return mocks::indicators_info();
        }
        self.fetch_json(&self.api_url("/trades/indicators-info"), RequestOptions::get())
            .await
    }

    async fn get_usage(&self, token: &str) -> GatewayResult<UsageQuota> {
        if self.is_mock() {
            return Ok(mocks::usage());
        }
        self.fetch_json(&self.api_url("/trades/usage"), RequestOptions::get().bearer(token))
            .await
    }

    async fn get_preferences(&self, token: &str) -> GatewayResult<Preferences> {
        if self.is_mock() {
            return mocks::preferences();
        }
        self.fetch_json(
            &self.api_url("/users/me/preferences"),
            RequestOptions::get().bearer(token),
        )
        .await
    }

    async fn update_preferences(&self, token: &str, preferences: &Preferences) -> GatewayResult<Value> {
        if self.is_mock() {
            return Ok(mocks::preferences_updated());
        }
        let options = RequestOptions::put().bearer(token).json(preferences)?;
        self.fetch_json(&self.api_url("/users/me/preferences"), options)
            .await
    }

    async fn get_recent_trades(&self, token: &str) -> GatewayResult<Vec<TradeRecord>> {
        if self.is_mock() {
            return mocks::recent_trades();
        }
        self.fetch_json(&self.api_url("/users/me/trades"), RequestOptions::get().bearer(token))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthToken> {
        if self.is_mock() {
            return Ok(mocks::login_token());
        }
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.fetch_json(&self.api_url("/auth/login"), RequestOptions::post().json(&body)?)
            .await
    }

    async fn register(&self, email: &str, username: &str, password: &str) -> GatewayResult<UserRecord> {
        if self.is_mock() {
            return Ok(mocks::user(email, username));
        }
        let body = RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        self.fetch_json(&self.api_url("/auth/register"), RequestOptions::post().json(&body)?)
            .await
    }

    async fn get_me(&self, token: &str) -> GatewayResult<UserRecord> {
        if self.is_mock() {
            return Ok(mocks::current_user());
        }
        self.fetch_json(&self.api_url("/auth/me"), RequestOptions::get().bearer(token))
            .await
    }

    async fn health(&self) -> GatewayResult<bool> {
        if self.is_mock() {
            return Ok(true);
        }
        let response = self
            .send(&self.analysis_url("/health"), RequestOptions::get())
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod gateway_tests;
