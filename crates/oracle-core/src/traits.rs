use async_trait::async_trait;
use serde_json::Value;

use crate::{
    AnalysisRequest, AnalysisResult, AuthToken, GatewayResult, IndicatorsInfo, Preferences,
    TradeRecord, UsageQuota, UserRecord,
};

/// Every backend call the dashboard makes.
///
/// Token-taking methods expect the raw access token; an empty token is sent
/// as-is and left for the server to reject.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Run the multi-timeframe analysis for a pair. Always hits the network.
    async fn analyze_trade(&self, request: &AnalysisRequest) -> GatewayResult<AnalysisResult>;

    async fn get_indicators_info(&self) -> GatewayResult<IndicatorsInfo>;

    async fn get_usage(&self, token: &str) -> GatewayResult<UsageQuota>;

    async fn get_preferences(&self, token: &str) -> GatewayResult<Preferences>;

    /// Replace the stored preferences. The server's acknowledgement is returned untouched.
    async fn update_preferences(&self, token: &str, preferences: &Preferences) -> GatewayResult<Value>;

    async fn get_recent_trades(&self, token: &str) -> GatewayResult<Vec<TradeRecord>>;

    async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthToken>;

    async fn register(&self, email: &str, username: &str, password: &str) -> GatewayResult<UserRecord>;

    async fn get_me(&self, token: &str) -> GatewayResult<UserRecord>;

    /// Liveness check of the analysis service.
    async fn health(&self) -> GatewayResult<bool>;
}
