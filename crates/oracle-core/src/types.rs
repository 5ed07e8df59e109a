use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parameters for a single trade analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub pair: String,
}

impl AnalysisRequest {
    pub fn new(pair: impl Into<String>) -> Self {
        Self { pair: pair.into() }
    }
}

/// Directional recommendation returned by the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Decision {
    Long,
    Short,
    /// Also covers `NO_TRADE` and any label the dashboard does not know.
    Neutral,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Long => "LONG",
            Decision::Short => "SHORT",
            Decision::Neutral => "NEUTRAL",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Decision::Long => "LONG Position",
            Decision::Short => "SHORT Position",
            Decision::Neutral => "NEUTRAL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Decision::Long => "Bullish market conditions detected",
            Decision::Short => "Bearish market conditions detected",
            Decision::Neutral => "Market conditions unclear",
        }
    }
}

impl From<&str> for Decision {
    fn from(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "LONG" => Decision::Long,
            "SHORT" => Decision::Short,
            _ => Decision::Neutral,
        }
    }
}

impl From<String> for Decision {
    fn from(label: String) -> Self {
        Decision::from(label.as_str())
    }
}

impl From<Decision> for String {
    fn from(decision: Decision) -> Self {
        decision.as_str().to_string()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown timeframe: {0}")]
pub struct UnknownTimeframe(pub String);

/// Candle interval offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Hour1,
    Hour4,
    Daily,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::Min1,
        Timeframe::Min5,
        Timeframe::Min15,
        Timeframe::Hour1,
        Timeframe::Hour4,
        Timeframe::Daily,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::Min1 => 1,
            Timeframe::Min5 => 5,
            Timeframe::Min15 => 15,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Daily => 1440,
        }
    }

    /// Trading style the interval is suited for.
    pub fn description(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "Scalping - Very short term",
            Timeframe::Min5 => "Scalping - Short term",
            Timeframe::Min15 | Timeframe::Hour1 => "Swing trading - Medium term",
            Timeframe::Hour4 => "Position trading - Long term",
            Timeframe::Daily => "Position trading - Very long term",
        }
    }

    /// Default stop-loss distance as a fraction of entry
    pub fn default_stop_loss(&self) -> f64 {
        match self {
            Timeframe::Min1 | Timeframe::Min5 => 0.005,
            Timeframe::Min15 | Timeframe::Hour1 => 0.01,
            Timeframe::Hour4 | Timeframe::Daily => 0.02,
        }
    }

    /// Heading used on timeframe tiles
    pub fn display_name(&self) -> String {
        match self {
            Timeframe::Hour4 => "4-Hour".to_string(),
            Timeframe::Hour1 => "1-Hour".to_string(),
            Timeframe::Min15 => "15-Minute".to_string(),
            other => other.label().to_uppercase(),
        }
    }
}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label() == wanted)
            .ok_or_else(|| UnknownTimeframe(s.to_string()))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = UnknownTimeframe;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.label().to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured decision returned by the analysis endpoint.
///
/// The body is kept exactly as the server sent it; the accessors below only
/// read from it and return `None` for anything missing or oddly typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Value);

/// Entry, exits and risk/reward pulled out of an analysis result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeSetup {
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Vec<f64>,
    pub risk_reward_ratio: Option<String>,
    pub entry_confirmation: Option<String>,
    pub position_sizing_suggestion: Option<String>,
}

impl TradeSetup {
    /// A setup is actionable only when both entry and stop loss are known.
    pub fn is_actionable(&self) -> bool {
        self.entry.is_some() && self.stop_loss.is_some()
    }
}

/// Indicator readings for one timeframe of a multi-timeframe analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeframeSnapshot {
    pub trend: Option<String>,
    pub adx: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<String>,
    pub trend_strength: Option<String>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub price: Option<f64>,
    pub entry_trigger: Option<String>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub adx_strength: Option<String>,
    pub adx_direction: Option<String>,
    pub histogram: Option<f64>,
}

/// Signal tally behind a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSummary {
    pub bullish_signals: u32,
    pub bearish_signals: u32,
    pub required_agreement: u32,
}

fn number_like(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn text_like(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl AnalysisResult {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn decision(&self) -> Option<Decision> {
        self.0.get("decision").and_then(Value::as_str).map(Decision::from)
    }

    pub fn confidence(&self) -> Option<f64> {
        number_like(self.0.get("confidence"))
    }

    pub fn reason(&self) -> Option<&str> {
        self.0.get("reason").and_then(Value::as_str)
    }

    pub fn trade_setup(&self) -> Option<TradeSetup> {
        let setup = self.0.get("trade_setup")?.as_object()?;
        let take_profit = match setup.get("take_profit") {
            Some(Value::Array(levels)) => levels.iter().filter_map(|v| number_like(Some(v))).collect(),
            other => number_like(other).into_iter().collect(),
        };
        Some(TradeSetup {
            entry: number_like(setup.get("entry")),
            stop_loss: number_like(setup.get("stop_loss")),
            take_profit,
            risk_reward_ratio: text_like(setup.get("risk_reward_ratio")),
            entry_confirmation: text_like(setup.get("entry_confirmation")),
            position_sizing_suggestion: text_like(setup.get("position_sizing_suggestion")),
        })
    }

    pub fn signal_summary(&self) -> Option<SignalSummary> {
        let summary = self.0.get("analysis_summary")?;
        serde_json::from_value(summary.clone()).ok()
    }

    /// Per-timeframe breakdown, highest timeframe first. Labels the dashboard
    /// does not recognise come last, in the order the server sent them.
    pub fn timeframes(&self) -> Vec<(String, TimeframeSnapshot)> {
        let Some(frames) = self
            .0
            .get("timeframes")
            .or_else(|| self.0.get("multi_timeframe"))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };

        let mut tiles: Vec<(String, TimeframeSnapshot)> = frames
            .iter()
            .filter_map(|(label, data)| {
                serde_json::from_value::<TimeframeSnapshot>(data.clone())
                    .ok()
                    .map(|snapshot| (label.clone(), snapshot))
            })
            .collect();

        tiles.sort_by_key(|(label, _)| {
            std::cmp::Reverse(label.parse::<Timeframe>().map(|tf| tf.minutes()).unwrap_or(0))
        });
        tiles
    }

    pub fn analyzed_pair(&self) -> Option<&str> {
        self.0
            .pointer("/metadata/pair")
            .or_else(|| self.0.get("pair"))
            .and_then(Value::as_str)
    }

    pub fn analysis_timestamp(&self) -> Option<&str> {
        self.0
            .pointer("/metadata/analysis_timestamp")
            .or_else(|| self.0.get("timestamp"))
            .and_then(Value::as_str)
    }
}

/// Login or registration form contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Bearer token issued by the login endpoint. Callers own storage and expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthToken {
    /// Expiry instant. Timestamps without an offset are read as UTC.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.expires_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.expires_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// An unreadable expiry is not treated as expired; the server decides.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_utc().map(|exp| exp <= now).unwrap_or(false)
    }
}

/// Daily analysis quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageQuota {
    pub remaining: u32,
    pub limit: u32,
    pub date: String,
    pub used: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UsageQuota {
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    Balanced,
    Aggressive,
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "balanced" => Ok(RiskProfile::Balanced),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => Err(format!("Unknown risk profile: {other}")),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskProfile::Conservative => write!(f, "conservative"),
            RiskProfile::Balanced => write!(f, "balanced"),
            RiskProfile::Aggressive => write!(f, "aggressive"),
        }
    }
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn str_list<'a>(fields: &'a Map<String, Value>, key: &str) -> Vec<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Per-user dashboard defaults.
///
/// Held as the JSON object the server sent, so a read-modify-write cycle only
/// touches the keys that were set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(pub Map<String, Value>);

impl Preferences {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn default_pair(&self) -> Option<&str> {
        str_field(&self.0, "default_pair")
    }

    pub fn default_timeframe(&self) -> Option<&str> {
        str_field(&self.0, "default_timeframe")
    }

    pub fn default_trade_amount(&self) -> Option<f64> {
        number_like(self.0.get("default_trade_amount"))
    }

    pub fn risk_profile_label(&self) -> Option<&str> {
        str_field(&self.0, "risk_profile")
    }

    pub fn risk_profile(&self) -> Option<RiskProfile> {
        self.risk_profile_label()?.parse().ok()
    }

    pub fn indicators_of_interest(&self) -> Vec<&str> {
        str_list(&self.0, "indicators_of_interest")
    }

    pub fn auto_execute(&self) -> Option<bool> {
        self.0.get("auto_execute").and_then(Value::as_bool)
    }
}

/// One entry of the recent analyses list, kept exactly as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeRecord(pub Map<String, Value>);

impl TradeRecord {
    /// Stored under `_id` by the account API, `id` elsewhere.
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "_id").or_else(|| str_field(&self.0, "id"))
    }

    pub fn pair(&self) -> Option<&str> {
        str_field(&self.0, "pair")
    }

    /// Label as the server wrote it, e.g. `NO_TRADE`.
    pub fn decision_label(&self) -> Option<&str> {
        str_field(&self.0, "decision")
    }

    pub fn decision(&self) -> Decision {
        self.decision_label().map(Decision::from).unwrap_or(Decision::Neutral)
    }

    pub fn confidence(&self) -> Option<f64> {
        number_like(self.0.get("confidence"))
    }

    pub fn created_at(&self) -> Option<&str> {
        str_field(&self.0, "created_at")
    }
}

/// Supported indicators and analysis features
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorsInfo {
    pub indicators: Vec<String>,
    pub features: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Account record returned by registration and `/auth/me`, kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub Map<String, Value>);

impl UserRecord {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id").or_else(|| str_field(&self.0, "_id"))
    }

    pub fn email(&self) -> Option<&str> {
        str_field(&self.0, "email")
    }

    pub fn username(&self) -> Option<&str> {
        str_field(&self.0, "username")
    }

    pub fn roles(&self) -> Vec<&str> {
        str_list(&self.0, "roles")
    }

    pub fn daily_trade_limit(&self) -> Option<u64> {
        self.0.get("daily_trade_limit").and_then(Value::as_u64)
    }

    pub fn trade_usage(&self) -> Option<&Value> {
        self.0.get("trade_usage")
    }

    pub fn trade_preferences(&self) -> Option<&Value> {
        self.0.get("trade_preferences")
    }

    pub fn created_at(&self) -> Option<&str> {
        str_field(&self.0, "created_at")
    }

    pub fn updated_at(&self) -> Option<&str> {
        str_field(&self.0, "updated_at")
    }
}
