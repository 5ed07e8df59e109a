//! Plain-text views for the terminal.

use oracle_core::presentation::{
    analysis_summary_text, confidence_tone, decision_tone, format_currency, format_indicator, format_price,
    format_timestamp, indicator_glyph, pair_display_name, potential_pl, risk_percentage,
    risk_reward_ratio, signal_strength_hint, ConfidenceLevel, Tone,
};
use oracle_core::{
    AnalysisResult, AppConfig, Decision, IndicatorsInfo, Preferences, TradeRecord, UsageQuota,
    UserRecord,
};
use std::fmt::Write;

fn marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => "[+]",
        Tone::Negative => "[-]",
        Tone::Caution | Tone::Warning => "[!]",
        Tone::Neutral | Tone::Info => "[ ]",
    }
}

fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 100.0) / 5.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}

/// Decision card, trade setup and timeframe tiles for one analysis.
pub fn analysis(result: &AnalysisResult, config: &AppConfig) -> String {
    let mut out = String::new();
    let decision = result.decision().unwrap_or(Decision::Neutral);
    let confidence = result.confidence().unwrap_or(0.0);
    let level = ConfidenceLevel::from_score(confidence, &config.confidence);

    if let Some(pair) = result.analyzed_pair() {
        let _ = write!(out, "{}", pair_display_name(pair));
        if let Some(ts) = result.analysis_timestamp() {
            let _ = write!(out, "  ({})", format_timestamp(ts));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{} {}", marker(decision_tone(decision)), decision.title());
    let _ = writeln!(out, "    {}", decision.description());
    let _ = writeln!(
        out,
        "    Confidence {} {:.0}% {} ({})",
        confidence_bar(confidence),
        confidence,
        marker(confidence_tone(confidence, &config.confidence)),
        level.label()
    );
    let _ = writeln!(out, "    {}", signal_strength_hint(confidence));
    if let Some(reason) = result.reason() {
        let _ = writeln!(out, "    Reason: {reason}");
    }
    if let Some(summary) = result.signal_summary() {
        let _ = writeln!(out, "    {}", analysis_summary_text(&summary));
    }

    if let Some(setup) = result.trade_setup() {
        out.push_str("\nTrade setup\n");
        let _ = writeln!(out, "    Entry:       {}", price_or_na(setup.entry));
        let _ = writeln!(out, "    Stop loss:   {}", price_or_na(setup.stop_loss));
        if let (Some(entry), Some(stop)) = (setup.entry, setup.stop_loss) {
            if let Some(pct) = risk_percentage(entry, stop) {
                let _ = writeln!(out, "    Risk:        {pct:.2}%");
            }
        }
        for (i, target) in setup.take_profit.iter().enumerate() {
            let _ = write!(out, "    Target {}:    {}", i + 1, format_price(*target, 2));
            if let (Some(entry), Some(stop)) = (setup.entry, setup.stop_loss) {
                if let Some(rr) = risk_reward_ratio(entry, stop, *target) {
                    let _ = write!(out, "  (R:R 1:{rr:.2})");
                }
            }
            out.push('\n');
        }
        if let Some(rr) = &setup.risk_reward_ratio {
            let _ = writeln!(out, "    Risk/reward: {rr}");
        }
        if let (Some(entry), Some(stop), Some(target)) =
            (setup.entry, setup.stop_loss, setup.take_profit.first())
        {
            if entry > 0.0 {
                let size = config.trading.default_amount / entry;
                let pl = potential_pl(entry, stop, *target, size);
                let _ = writeln!(
                    out,
                    "    On {}: risk {} / reward {}",
                    format_currency(config.trading.default_amount),
                    format_currency(pl.risk),
                    format_currency(pl.reward)
                );
            }
        }
        if let Some(confirmation) = &setup.entry_confirmation {
            let _ = writeln!(out, "    Confirmation: {confirmation}");
        }
        let sizing = setup
            .position_sizing_suggestion
            .as_deref()
            .unwrap_or_else(|| level.position_size_recommendation());
        let _ = writeln!(out, "    Sizing: {sizing}");
        if !setup.is_actionable() {
            out.push_str("    No actionable setup\n");
        }
    }

    let tiles = result.timeframes();
    if !tiles.is_empty() {
        out.push_str("\nTimeframes\n");
        for (label, tile) in tiles {
            let heading = label
                .parse::<oracle_core::Timeframe>()
                .map(|tf| tf.display_name())
                .unwrap_or_else(|_| label.to_uppercase());
            let trend = tile.trend.as_deref().unwrap_or("unknown");
            let _ = writeln!(out, "  {heading:<10} {} {trend}", indicator_glyph(trend));
            let _ = writeln!(
                out,
                "      ADX {}  RSI {}  MACD {}",
                format_indicator(tile.adx),
                format_indicator(tile.rsi),
                tile.macd.as_deref().unwrap_or("N/A")
            );
            if tile.support.is_some() || tile.resistance.is_some() {
                let _ = writeln!(
                    out,
                    "      Support {}  Resistance {}",
                    price_or_na(tile.support),
                    price_or_na(tile.resistance)
                );
            }
            if let Some(trigger) = &tile.entry_trigger {
                let _ = writeln!(out, "      Trigger: {trigger}");
            }
        }
    }

    out
}

fn price_or_na(value: Option<f64>) -> String {
    value
        .map(|v| format_price(v, 2))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn usage(quota: &UsageQuota) -> String {
    format!(
        "Analyses today: {}/{} used, {} remaining ({})\n",
        quota.used, quota.limit, quota.remaining, quota.date
    )
}

pub fn preferences(prefs: &Preferences) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Default pair:      {}", prefs.default_pair().unwrap_or("-"));
    let _ = writeln!(out, "Default timeframe: {}", prefs.default_timeframe().unwrap_or("-"));
    let amount = prefs
        .default_trade_amount()
        .map(format_currency)
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "Trade amount:      {amount}");
    let _ = writeln!(out, "Risk profile:      {}", prefs.risk_profile_label().unwrap_or("-"));
    let _ = writeln!(out, "Indicators:        {}", prefs.indicators_of_interest().join(", "));
    let auto = match prefs.auto_execute() {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    let _ = writeln!(out, "Auto execute:      {auto}");
    out
}

pub fn trades(trades: &[TradeRecord]) -> String {
    if trades.is_empty() {
        return "No recent analyses\n".to_string();
    }
    let mut out = String::new();
    for trade in trades {
        let confidence = trade
            .confidence()
            .map(|c| format!("{c:.1}%"))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "{} {:<10} {:<8} {:>6}  {}",
            marker(decision_tone(trade.decision())),
            trade.pair().map(pair_display_name).unwrap_or_else(|| "?".to_string()),
            trade.decision_label().unwrap_or("N/A"),
            confidence,
            trade.created_at().map(format_timestamp).unwrap_or_default()
        );
    }
    out
}

pub fn indicators(info: &IndicatorsInfo) -> String {
    let mut out = String::from("Supported indicators\n");
    for indicator in &info.indicators {
        let _ = writeln!(out, "  - {indicator}");
    }
    out.push_str("Analysis features\n");
    for feature in &info.features {
        let _ = writeln!(out, "  - {feature}");
    }
    out
}

pub fn user(user: &UserRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} <{}>",
        user.username().unwrap_or("?"),
        user.email().unwrap_or("?")
    );
    if let Some(id) = user.id() {
        let _ = writeln!(out, "  id:    {id}");
    }
    let roles = user.roles();
    if !roles.is_empty() {
        let _ = writeln!(out, "  roles: {}", roles.join(", "));
    }
    if let Some(limit) = user.daily_trade_limit() {
        let _ = writeln!(out, "  daily analysis limit: {limit}");
    }
    if let Some(created) = user.created_at() {
        let _ = writeln!(out, "  member since: {}", format_timestamp(created));
    }
    out
}
