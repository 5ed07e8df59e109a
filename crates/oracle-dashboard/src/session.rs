//! Login state kept on behalf of the gateway, which stores nothing itself.

use chrono::{DateTime, Utc};
use oracle_core::forms::{validate_login, validate_registration, FormError};
use oracle_core::{
    AuthToken, Credentials, DashboardApi, GatewayError, Preferences, TradeRecord, UsageQuota,
    UserRecord,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::token_store::{TokenStore, TokenStoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] TokenStoreError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session expired, please log in again")]
    Expired,
}

impl SessionError {
    /// What to show the user. Server-side failures use the server's detail
    /// when it sent one, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SessionError::Gateway(e) if e.is_transport() => e.to_string(),
            SessionError::Gateway(e) => e.user_message(fallback),
            SessionError::Storage(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

pub struct Session {
    api: Arc<dyn DashboardApi>,
    store: TokenStore,
    check_expiry: bool,
}

impl Session {
    pub fn new(api: Arc<dyn DashboardApi>, store: TokenStore) -> Self {
        Self {
            api,
            store,
            check_expiry: true,
        }
    }

    /// Turn local expiry checks off and leave token rejection to the server.
    pub fn with_expiry_check(mut self, enabled: bool) -> Self {
        self.check_expiry = enabled;
        self
    }

    pub fn api(&self) -> &Arc<dyn DashboardApi> {
        &self.api
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken, SessionError> {
        validate_login(credentials)?;
        let token = self
            .api
            .login(credentials.email.trim(), &credentials.password)
            .await?;
        self.store.save(&token).await?;
        tracing::info!("Logged in as {}", credentials.email.trim());
        Ok(token)
    }

    /// Create the account, then log in with the same credentials.
    pub async fn register(&self, credentials: &Credentials) -> Result<(UserRecord, AuthToken), SessionError> {
        validate_registration(credentials)?;
        let username = credentials.username.as_deref().unwrap_or_default().trim();
        let user = self
            .api
            .register(credentials.email.trim(), username, &credentials.password)
            .await?;
        tracing::info!("Registered {} ({})", username, credentials.email.trim());

        let token = self.login(credentials).await?;
        Ok((user, token))
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn current_token(&self) -> Result<Option<AuthToken>, SessionError> {
        Ok(self.store.load().await?)
    }

    /// Stored access token, refused once it has expired.
    pub async fn bearer(&self) -> Result<String, SessionError> {
        self.bearer_at(Utc::now()).await
    }

    pub async fn bearer_at(&self, now: DateTime<Utc>) -> Result<String, SessionError> {
        let token = self.store.load().await?.ok_or(SessionError::NotLoggedIn)?;
        if self.check_expiry && token.is_expired_at(now) {
            tracing::debug!("Stored token expired at {}", token.expires_at);
            return Err(SessionError::Expired);
        }
        Ok(token.access_token)
    }

    pub async fn usage(&self) -> Result<UsageQuota, SessionError> {
        let token = self.bearer().await?;
        Ok(self.api.get_usage(&token).await?)
    }

    pub async fn preferences(&self) -> Result<Preferences, SessionError> {
        let token = self.bearer().await?;
        Ok(self.api.get_preferences(&token).await?)
    }

    pub async fn update_preferences(&self, preferences: &Preferences) -> Result<Value, SessionError> {
        let token = self.bearer().await?;
        Ok(self.api.update_preferences(&token, preferences).await?)
    }

    pub async fn recent_trades(&self) -> Result<Vec<TradeRecord>, SessionError> {
        let token = self.bearer().await?;
        Ok(self.api.get_recent_trades(&token).await?)
    }

    pub async fn me(&self) -> Result<UserRecord, SessionError> {
        let token = self.bearer().await?;
        Ok(self.api.get_me(&token).await?)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
