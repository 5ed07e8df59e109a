//! Formatting and threshold helpers shared by every way of showing a result.
//!
//! Nothing here knows about colors or markup: each helper reports a [`Tone`]
//! and the renderer decides what that looks like.

use chrono::{DateTime, NaiveDateTime};

use crate::config::ConfidenceThresholds;
use crate::types::{Decision, SignalSummary, Timeframe};

/// Visual weight a renderer should give a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Caution,
    Warning,
    Negative,
    Neutral,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceLevel {
    VeryPoor,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64, thresholds: &ConfidenceThresholds) -> Self {
        if score >= thresholds.excellent {
            ConfidenceLevel::Excellent
        } else if score >= thresholds.good {
            ConfidenceLevel::Good
        } else if score >= thresholds.acceptable {
            ConfidenceLevel::Acceptable
        } else if score >= thresholds.poor {
            ConfidenceLevel::Poor
        } else {
            ConfidenceLevel::VeryPoor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::Excellent => "Excellent",
            ConfidenceLevel::Good => "Good",
            ConfidenceLevel::Acceptable => "Acceptable",
            ConfidenceLevel::Poor => "Poor",
            ConfidenceLevel::VeryPoor => "Very Poor",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            ConfidenceLevel::Excellent | ConfidenceLevel::Good => Tone::Positive,
            ConfidenceLevel::Acceptable => Tone::Caution,
            ConfidenceLevel::Poor => Tone::Warning,
            ConfidenceLevel::VeryPoor => Tone::Negative,
        }
    }

    pub fn position_size_recommendation(&self) -> &'static str {
        match self {
            ConfidenceLevel::Excellent => "Maximum position size (high confidence)",
            ConfidenceLevel::Good => "Large position size (good confidence)",
            ConfidenceLevel::Acceptable => "Medium position size (acceptable confidence)",
            ConfidenceLevel::Poor | ConfidenceLevel::VeryPoor => "Small position size (low confidence)",
        }
    }
}

pub fn confidence_tone(score: f64, thresholds: &ConfidenceThresholds) -> Tone {
    ConfidenceLevel::from_score(score, thresholds).tone()
}

pub fn decision_tone(decision: Decision) -> Tone {
    match decision {
        Decision::Long => Tone::Positive,
        Decision::Short => Tone::Negative,
        Decision::Neutral => Tone::Neutral,
    }
}

/// One-line advice shown under the confidence meter
pub fn signal_strength_hint(confidence: f64) -> &'static str {
    if confidence >= 70.0 {
        "Strong signal - Consider taking position"
    } else if confidence >= 50.0 {
        "Moderate signal - Wait for confirmation"
    } else {
        "Weak signal - Avoid trading"
    }
}

pub fn indicator_tone(value: &str) -> Tone {
    match value.to_lowercase().as_str() {
        "bullish" | "uptrend" => Tone::Positive,
        "bearish" | "downtrend" => Tone::Negative,
        "neutral" | "sideways" => Tone::Neutral,
        _ => Tone::Info,
    }
}

pub fn indicator_glyph(value: &str) -> &'static str {
    match value.to_lowercase().as_str() {
        "bullish" => "↗",
        "bearish" => "↘",
        "uptrend" => "▲",
        "downtrend" => "▼",
        "sideways" => "→",
        _ => "–",
    }
}

/// Trend text is matched loosely ("strong_uptrend", "downtrend", ...).
pub fn trend_tone(trend: &str) -> Tone {
    let trend = trend.to_lowercase();
    if trend.contains("up") {
        Tone::Positive
    } else if trend.contains("down") {
        Tone::Negative
    } else {
        Tone::Caution
    }
}

pub fn rsi_tone(rsi: f64) -> Tone {
    if rsi > 70.0 {
        Tone::Negative
    } else if rsi < 30.0 {
        Tone::Positive
    } else {
        Tone::Neutral
    }
}

pub fn adx_tone(adx: f64) -> Tone {
    if adx > 25.0 {
        Tone::Positive
    } else if adx > 20.0 {
        Tone::Caution
    } else {
        Tone::Negative
    }
}

/// en-US grouping with a fixed number of decimals: `1234.5` -> `1,234.50`
pub fn format_price(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_currency(amount: f64) -> String {
    let body = format_price(amount.abs(), 2);
    if amount < 0.0 {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// Reward over risk for the first target. `None` when entry equals stop.
pub fn risk_reward_ratio(entry: f64, stop_loss: f64, take_profit: f64) -> Option<f64> {
    let risk = (entry - stop_loss).abs();
    if risk == 0.0 {
        return None;
    }
    Some((take_profit - entry).abs() / risk)
}

/// Stop distance as a percentage of entry
pub fn risk_percentage(entry: f64, stop_loss: f64) -> Option<f64> {
    if entry == 0.0 {
        return None;
    }
    Some((entry - stop_loss).abs() * 100.0 / entry)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotentialPl {
    pub risk: f64,
    pub reward: f64,
}

pub fn potential_pl(entry: f64, stop_loss: f64, take_profit: f64, position_size: f64) -> PotentialPl {
    PotentialPl {
        risk: (entry - stop_loss).abs() * position_size,
        reward: (take_profit - entry).abs() * position_size,
    }
}

/// Fallback is 1% for labels that are not a known timeframe.
pub fn stop_loss_percentage(timeframe: &str) -> f64 {
    timeframe
        .parse::<Timeframe>()
        .map(|tf| tf.default_stop_loss())
        .unwrap_or(0.01)
}

pub fn timeframe_description(timeframe: &str) -> &'static str {
    timeframe
        .parse::<Timeframe>()
        .map(|tf| tf.description())
        .unwrap_or("Unknown timeframe")
}

pub fn analysis_summary_text(summary: &SignalSummary) -> String {
    let SignalSummary {
        bullish_signals,
        bearish_signals,
        required_agreement,
    } = *summary;

    if bullish_signals >= required_agreement {
        format!("Strong bullish signals ({bullish_signals}/{required_agreement} required)")
    } else if bearish_signals >= required_agreement {
        format!("Strong bearish signals ({bearish_signals}/{required_agreement} required)")
    } else {
        format!(
            "Mixed signals - insufficient agreement ({}/{} required)",
            bullish_signals.max(bearish_signals),
            required_agreement
        )
    }
}

/// `BTCUSDT` -> `BTC/USDT`. Pairs without a USDT quote are returned as-is.
pub fn pair_display_name(pair: &str) -> String {
    match pair.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => format!("{base}/USDT"),
        _ => pair.to_string(),
    }
}

/// `2025-11-13T10:00:00Z` -> `Nov 13, 2025, 10:00:00`. Unparseable input is echoed.
pub fn format_timestamp(timestamp: &str) -> String {
    const OUT: &str = "%b %-d, %Y, %H:%M:%S";
    if let Ok(ts) = DateTime::parse_from_rfc3339(timestamp) {
        return ts.naive_utc().format(OUT).to_string();
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.format(OUT).to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Numeric cell for indicator tables: two to four decimals, `N/A` when absent
pub fn format_indicator(value: Option<f64>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(v) => {
            let four = format_price(v, 4);
            let trimmed = four.trim_end_matches('0');
            let decimals = trimmed.split_once('.').map(|(_, f)| f.len()).unwrap_or(0);
            if decimals < 2 {
                format_price(v, 2)
            } else {
                trimmed.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_levels() {
        let t = ConfidenceThresholds::default();
        assert_eq!(ConfidenceLevel::from_score(95.0, &t), ConfidenceLevel::Excellent);
        assert_eq!(ConfidenceLevel::from_score(90.0, &t), ConfidenceLevel::Excellent);
        assert_eq!(ConfidenceLevel::from_score(85.0, &t), ConfidenceLevel::Good);
        assert_eq!(ConfidenceLevel::from_score(70.0, &t), ConfidenceLevel::Acceptable);
        assert_eq!(ConfidenceLevel::from_score(60.0, &t), ConfidenceLevel::Poor);
        assert_eq!(ConfidenceLevel::from_score(12.0, &t), ConfidenceLevel::VeryPoor);
        assert_eq!(ConfidenceLevel::Good.tone(), Tone::Positive);
        assert_eq!(ConfidenceLevel::Poor.tone(), Tone::Warning);
        assert_eq!(
            ConfidenceLevel::Acceptable.position_size_recommendation(),
            "Medium position size (acceptable confidence)"
        );
    }

    #[test]
    fn test_indicator_tones() {
        assert_eq!(indicator_tone("Bullish"), Tone::Positive);
        assert_eq!(indicator_tone("downtrend"), Tone::Negative);
        assert_eq!(indicator_tone("sideways"), Tone::Neutral);
        assert_eq!(indicator_tone("overbought"), Tone::Info);
        assert_eq!(trend_tone("strong_uptrend"), Tone::Positive);
        assert_eq!(trend_tone("ranging"), Tone::Caution);
        assert_eq!(rsi_tone(75.0), Tone::Negative);
        assert_eq!(rsi_tone(25.0), Tone::Positive);
        assert_eq!(adx_tone(22.0), Tone::Caution);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(59000.0, 2), "59,000.00");
        assert_eq!(format_price(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_price(0.5, 4), "0.5000");
        assert_eq!(format_price(999.0, 0), "999");
        assert_eq!(format_price(-1500.25, 2), "-1,500.25");
        assert_eq!(format_price(f64::NAN, 2), "N/A");
        assert_eq!(format_currency(1000.0), "$1,000.00");
        assert_eq!(format_currency(-42.5), "-$42.50");
    }

    #[test]
    fn test_format_indicator() {
        assert_eq!(format_indicator(None), "N/A");
        assert_eq!(format_indicator(Some(27.5)), "27.50");
        assert_eq!(format_indicator(Some(0.123456)), "0.1235");
        assert_eq!(format_indicator(Some(61234.0)), "61,234.00");
    }

    #[test]
    fn test_risk_reward() {
        assert_eq!(risk_reward_ratio(100.0, 90.0, 125.0), Some(2.5));
        assert_eq!(risk_reward_ratio(100.0, 100.0, 125.0), None);
        let pl = potential_pl(100.0, 95.0, 110.0, 2.0);
        assert_eq!(pl, PotentialPl { risk: 10.0, reward: 20.0 });
        assert_eq!(risk_percentage(200.0, 190.0), Some(5.0));
    }

    #[test]
    fn test_timeframe_helpers() {
        assert_eq!(stop_loss_percentage("1m"), 0.005);
        assert_eq!(stop_loss_percentage("4h"), 0.02);
        assert_eq!(stop_loss_percentage("3w"), 0.01);
        assert_eq!(timeframe_description("1d"), "Position trading - Very long term");
        assert_eq!(timeframe_description("2h"), "Unknown timeframe");
    }

    #[test]
    fn test_summary_text() {
        let s = SignalSummary { bullish_signals: 1, bearish_signals: 6, required_agreement: 3 };
        assert_eq!(analysis_summary_text(&s), "Strong bearish signals (6/3 required)");
        let s = SignalSummary { bullish_signals: 2, bearish_signals: 1, required_agreement: 3 };
        assert_eq!(
            analysis_summary_text(&s),
            "Mixed signals - insufficient agreement (2/3 required)"
        );
    }

    #[test]
    fn test_pair_and_timestamp_display() {
        assert_eq!(pair_display_name("BTCUSDT"), "BTC/USDT");
        assert_eq!(pair_display_name("USDT"), "USDT");
        assert_eq!(pair_display_name("ETHBTC"), "ETHBTC");
        assert_eq!(format_timestamp("2025-11-13T10:05:09Z"), "Nov 13, 2025, 10:05:09");
        assert_eq!(format_timestamp("2025-11-13T10:05:09.123"), "Nov 13, 2025, 10:05:09");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_signal_hint() {
        assert_eq!(signal_strength_hint(88.0), "Strong signal - Consider taking position");
        assert_eq!(signal_strength_hint(55.0), "Moderate signal - Wait for confirmation");
        assert_eq!(signal_strength_hint(10.0), "Weak signal - Avoid trading");
    }
}
