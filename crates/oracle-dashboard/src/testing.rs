use async_trait::async_trait;
use oracle_core::{
    AnalysisRequest, AnalysisResult, AuthToken, DashboardApi, GatewayError, GatewayResult,
    IndicatorsInfo, Preferences, TradeRecord, UsageQuota, UserRecord,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory backend that records every call it receives.
pub(crate) struct FakeApi {
    pub calls: Mutex<Vec<String>>,
    pub token_expires_at: String,
    pub login_status: Option<u16>,
    pub analyze_delays: Mutex<VecDeque<Duration>>,
    analyze_count: AtomicU32,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            token_expires_at: "2099-01-01T00:00:00".to_string(),
            login_status: None,
            analyze_delays: Mutex::new(VecDeque::new()),
            analyze_count: AtomicU32::new(0),
        }
    }

    pub fn with_expiry(mut self, expires_at: &str) -> Self {
        self.token_expires_at = expires_at.to_string();
        self
    }

    pub fn failing_login(mut self, status: u16) -> Self {
        self.login_status = Some(status);
        self
    }

    pub fn with_analyze_delays(self, delays: &[u64]) -> Self {
        *self.analyze_delays.lock().unwrap() =
            delays.iter().map(|ms| Duration::from_millis(*ms)).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn user(email: &str, username: &str) -> UserRecord {
        serde_json::from_value(json!({
            "id": "u1",
            "email": email,
            "username": username,
            "roles": ["user"],
            "daily_trade_limit": 7
        }))
        .unwrap()
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn analyze_trade(&self, request: &AnalysisRequest) -> GatewayResult<AnalysisResult> {
        let call = self.analyze_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(format!("analyze:{}", request.pair));
        let delay = self.analyze_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(AnalysisResult(json!({"decision": "LONG", "confidence": 90, "call": call})))
    }

    async fn get_indicators_info(&self) -> GatewayResult<IndicatorsInfo> {
        self.record("indicators".into());
        Ok(IndicatorsInfo::default())
    }

    async fn get_usage(&self, token: &str) -> GatewayResult<UsageQuota> {
        self.record(format!("usage:{token}"));
        Ok(UsageQuota {
            remaining: 1,
            limit: 7,
            date: "2025-11-13".into(),
            used: 6,
            extra: Map::new(),
        })
    }

    async fn get_preferences(&self, token: &str) -> GatewayResult<Preferences> {
        self.record(format!("preferences:{token}"));
        Ok(Preferences::default())
    }

    async fn update_preferences(&self, token: &str, _preferences: &Preferences) -> GatewayResult<Value> {
        self.record(format!("update_preferences:{token}"));
        Ok(json!({"success": true}))
    }

    async fn get_recent_trades(&self, token: &str) -> GatewayResult<Vec<TradeRecord>> {
        self.record(format!("trades:{token}"));
        Ok(Vec::new())
    }

    async fn login(&self, email: &str, _password: &str) -> GatewayResult<AuthToken> {
        self.record(format!("login:{email}"));
        if let Some(status) = self.login_status {
            return Err(GatewayError::from_error_body(status, br#"{"detail":"Invalid credentials"}"#));
        }
        Ok(AuthToken {
            access_token: format!("token-for-{email}"),
            token_type: "bearer".into(),
            expires_at: self.token_expires_at.clone(),
            extra: Map::new(),
        })
    }

    async fn register(&self, email: &str, username: &str, _password: &str) -> GatewayResult<UserRecord> {
        self.record(format!("register:{email}:{username}"));
        Ok(Self::user(email, username))
    }

    async fn get_me(&self, token: &str) -> GatewayResult<UserRecord> {
        self.record(format!("me:{token}"));
        Ok(Self::user("user@example.com", "user"))
    }

    async fn health(&self) -> GatewayResult<bool> {
        Ok(true)
    }
}

/// Scratch directory for one test's token file, removed on drop.
pub(crate) struct TempTokenDir {
    dir: PathBuf,
}

impl TempTokenDir {
    /// Unique per test name and process.
    pub fn new(name: &str) -> Self {
        Self {
            dir: std::env::temp_dir().join(format!("oracle-dashboard-{}-{}", std::process::id(), name)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.join("token.json")
    }
}

impl Drop for TempTokenDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
