//! Canned responses served when mock mode is on.

use chrono::{SecondsFormat, Utc};
use oracle_core::{
    AuthToken, GatewayError, GatewayResult, IndicatorsInfo, Preferences, TradeRecord, UsageQuota,
    UserRecord,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

const INDICATORS_INFO: &str = include_str!("../fixtures/indicators-info.mock.json");
const PREFERENCES: &str = include_str!("../fixtures/preferences.mock.json");
const TRADES: &str = include_str!("../fixtures/trades.mock.json");

pub const MOCK_ACCESS_TOKEN: &str = "mocktoken";
pub const MOCK_USER_ID: &str = "mockid";

fn fixture<T: DeserializeOwned>(name: &'static str, raw: &str) -> GatewayResult<T> {
    serde_json::from_str(raw).map_err(|source| GatewayError::Fixture { name, source })
}

pub fn indicators_info() -> GatewayResult<IndicatorsInfo> {
    fixture("indicators-info.mock.json", INDICATORS_INFO)
}

pub fn preferences() -> GatewayResult<Preferences> {
    fixture("preferences.mock.json", PREFERENCES)
}

pub fn recent_trades() -> GatewayResult<Vec<TradeRecord>> {
    fixture("trades.mock.json", TRADES)
}

pub fn usage() -> UsageQuota {
    UsageQuota {
        remaining: 4,
        limit: 7,
        date: "2025-11-13".to_string(),
        used: 3,
        extra: Map::new(),
    }
}

/// Acknowledgement returned instead of sending preferences anywhere
pub fn preferences_updated() -> Value {
    json!({ "success": true })
}

pub fn login_token() -> AuthToken {
    AuthToken {
        access_token: MOCK_ACCESS_TOKEN.to_string(),
        token_type: "bearer".to_string(),
        expires_at: "2025-11-14T12:34:56".to_string(),
        extra: Map::new(),
    }
}

/// Fabricated user record, timestamped now.
pub fn user(email: &str, username: &str) -> UserRecord {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut record = Map::new();
    record.insert("id".into(), MOCK_USER_ID.into());
    record.insert("email".into(), email.into());
    record.insert("username".into(), username.into());
    record.insert("roles".into(), json!(["user"]));
    record.insert("daily_trade_limit".into(), 7.into());
    record.insert("created_at".into(), now.clone().into());
    record.insert("updated_at".into(), now.into());
    UserRecord(record)
}

pub fn current_user() -> UserRecord {
    user("user@example.com", "user")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_core::Decision;

    #[test]
    fn test_bundled_fixtures_decode() {
        let info = indicators_info().unwrap();
        assert!(!info.indicators.is_empty());
        assert!(!info.features.is_empty());

        let prefs = preferences().unwrap();
        assert_eq!(prefs.default_pair(), Some("BTCUSDT"));
        assert_eq!(
            serde_json::to_value(&prefs).unwrap(),
            serde_json::from_str::<Value>(PREFERENCES).unwrap()
        );

        let trades = recent_trades().unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[2].decision(), Decision::Neutral);
        assert_eq!(trades[2].decision_label(), Some("NO_TRADE"));
    }

    #[test]
    fn test_static_quota() {
        let quota = usage();
        assert_eq!((quota.remaining, quota.limit, quota.used), (4, 7, 3));
        assert_eq!(quota.date, "2025-11-13");
    }

    #[test]
    fn test_mock_user_shape() {
        let me = current_user();
        assert_eq!(me.id(), Some("mockid"));
        assert_eq!(me.email(), Some("user@example.com"));
        assert_eq!(me.roles(), vec!["user"]);
        assert_eq!(me.daily_trade_limit(), Some(7));
        assert!(me.created_at().is_some());
    }
}
