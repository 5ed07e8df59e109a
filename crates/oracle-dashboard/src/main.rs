use std::sync::Arc;

use anyhow::{bail, Context, Result};
use oracle_client::RequestGateway;
use oracle_core::forms::{filter_pairs, password_requirements, AnalyzeForm};
use oracle_core::{AppConfig, Credentials, DashboardApi, Preferences};
use oracle_dashboard::render;
use oracle_dashboard::{LiveEvent, LiveMonitor, Session, SessionError, TokenStore};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  oracle-dashboard analyze [PAIR] [--amount N] [--note TEXT]");
    eprintln!("  oracle-dashboard live [PAIR]               Re-analyze on the live-mode interval");
    eprintln!("  oracle-dashboard pairs [QUERY]             List or search trading pairs");
    eprintln!("  oracle-dashboard indicators                Supported indicators and features");
    eprintln!("  oracle-dashboard login EMAIL PASSWORD");
    eprintln!("  oracle-dashboard register EMAIL USERNAME PASSWORD");
    eprintln!("  oracle-dashboard logout");
    eprintln!("  oracle-dashboard me | usage | prefs | trades");
    eprintln!("  oracle-dashboard prefs-set KEY VALUE       Update one preference");
    eprintln!("  oracle-dashboard health");
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First positional argument after the subcommand, skipping `--flag value` pairs.
fn positional(args: &[String], index: usize) -> Option<&str> {
    let mut skip = false;
    args.iter()
        .skip(2)
        .filter(|a| {
            if skip {
                skip = false;
                return false;
            }
            if a.starts_with("--") {
                skip = true;
                return false;
            }
            true
        })
        .nth(index)
        .map(String::as_str)
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    match positional(args, index) {
        Some(v) => Ok(v),
        None => {
            print_usage();
            bail!("Missing argument: {name}")
        }
    }
}

/// Show a session failure the way the dashboard pages do.
fn report(err: SessionError, fallback: &str) -> anyhow::Error {
    match &err {
        SessionError::NotLoggedIn | SessionError::Expired => {
            anyhow::anyhow!("{err}. Run `oracle-dashboard login EMAIL PASSWORD`.")
        }
        _ => anyhow::anyhow!(err.user_message(fallback)),
    }
}

fn apply_preference(prefs: &mut Preferences, key: &str, value: &str) -> Result<()> {
    match key {
        "default_pair" => prefs.set(key, value.trim().to_uppercase()),
        "default_timeframe" => {
            let tf: oracle_core::Timeframe = value.parse()?;
            prefs.set(key, tf.to_string());
        }
        "default_trade_amount" => {
            let amount: f64 = value.trim().parse().context("Trade amount must be a number")?;
            if amount <= 0.0 {
                bail!("Trade amount must be positive");
            }
            prefs.set(key, amount);
        }
        "risk_profile" => {
            let profile: oracle_core::RiskProfile = value.parse().map_err(anyhow::Error::msg)?;
            prefs.set(key, profile.to_string());
        }
        "indicators_of_interest" => {
            let indicators: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            prefs.set(key, indicators);
        }
        "auto_execute" => {
            let enabled: bool = value.trim().parse().context("auto_execute must be true or false")?;
            prefs.set(key, enabled);
        }
        other => bail!("Unknown preference: {other}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = AppConfig::from_env()?;
    config.validate()?;
    tracing::info!(
        "{} v{} (analysis: {}, api: {}, mocks: {})",
        config.app.name,
        config.app.version,
        config.gateway.analysis_base_url,
        config.gateway.api_base_url,
        config.gateway.use_mocks
    );

    let gateway = RequestGateway::new(config.gateway.clone())?;
    let api: Arc<dyn DashboardApi> = Arc::new(gateway);
    // Mock tokens carry a fixed expiry in the past.
    let session = Session::new(api.clone(), TokenStore::new(&config.token_file))
        .with_expiry_check(!config.gateway.use_mocks);
    let messages = &config.messages;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("");

    match command {
        "analyze" => {
            let form = AnalyzeForm {
                pair: positional(&args, 0)
                    .unwrap_or(config.trading.default_pair.as_str())
                    .to_string(),
                trade_amount: flag_value(&args, "--amount").map(str::to_string),
                note: flag_value(&args, "--note").map(str::to_string),
            };
            let validated = form.validate()?;
            eprintln!("{}", messages.analyzing);
            let result = api
                .analyze_trade(&validated.request)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message(messages.analysis_failed)))?;
            let mut view_config = config.clone();
            if let Some(amount) = validated.trade_amount {
                view_config.trading.default_amount = amount;
            }
            print!("{}", render::analysis(&result, &view_config));
            if let Some(note) = validated.note {
                println!("\nNote: {note}");
            }
            eprintln!("{}", messages.analysis_complete);
        }
        "live" => {
            if !config.live_mode.enabled {
                bail!("{}", messages.live_mode_disabled);
            }
            let validated = AnalyzeForm::new(positional(&args, 0).unwrap_or(config.trading.default_pair.as_str()))
                .validate()?;
            eprintln!("{}", messages.live_mode_enabled);
            let monitor = LiveMonitor::new(api.clone(), validated.request, &config.live_mode);
            let shutdown = async {
                tokio::signal::ctrl_c().await.ok();
            };
            let summary = monitor
                .run(shutdown, |event| match event {
                    LiveEvent::Update { seq, result } => {
                        println!("--- update #{seq} ---");
                        print!("{}", render::analysis(&result, &config));
                    }
                    LiveEvent::Failed { seq, error } => {
                        eprintln!("update #{seq}: {}", error.user_message(messages.api_error));
                    }
                    LiveEvent::Stale { .. } => {}
                })
                .await;
            eprintln!(
                "{} ({} updates, {} failed, {} stale)",
                messages.live_mode_disabled, summary.updates, summary.failures, summary.stale
            );
        }
        "pairs" => {
            let query = positional(&args, 0).unwrap_or("");
            for pair in filter_pairs(&config.trading.available_pairs, query) {
                println!("{pair}");
            }
        }
        "indicators" => {
            let info = api
                .get_indicators_info()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message(messages.api_error)))?;
            print!("{}", render::indicators(&info));
        }
        "login" => {
            let credentials = Credentials::new(required(&args, 0, "EMAIL")?, required(&args, 1, "PASSWORD")?);
            let token = session
                .login(&credentials)
                .await
                .map_err(|e| report(e, messages.login_failed))?;
            println!("Logged in. Token expires at {}", token.expires_at);
        }
        "register" => {
            let password = required(&args, 2, "PASSWORD")?;
            let credentials = Credentials::new(required(&args, 0, "EMAIL")?, password)
                .with_username(required(&args, 1, "USERNAME")?);
            if let Err(e) = oracle_core::forms::validate_registration(&credentials) {
                for req in password_requirements(password) {
                    eprintln!("  [{}] {}", if req.met { "x" } else { " " }, req.text);
                }
                return Err(e.into());
            }
            let (user, _token) = session
                .register(&credentials)
                .await
                .map_err(|e| report(e, messages.registration_failed))?;
            println!("Registered and logged in.");
            print!("{}", render::user(&user));
        }
        "logout" => {
            session.logout().await.map_err(|e| report(e, messages.api_error))?;
            println!("Logged out.");
        }
        "me" => {
            let user = session.me().await.map_err(|e| report(e, messages.api_error))?;
            print!("{}", render::user(&user));
        }
        "usage" => {
            let quota = session.usage().await.map_err(|e| report(e, messages.api_error))?;
            print!("{}", render::usage(&quota));
        }
        "prefs" => {
            let prefs = session
                .preferences()
                .await
                .map_err(|e| report(e, messages.api_error))?;
            print!("{}", render::preferences(&prefs));
        }
        "prefs-set" => {
            let key = required(&args, 0, "KEY")?;
            let value = required(&args, 1, "VALUE")?;
            let mut prefs = session
                .preferences()
                .await
                .map_err(|e| report(e, messages.api_error))?;
            apply_preference(&mut prefs, key, value)?;
            let ack = session
                .update_preferences(&prefs)
                .await
                .map_err(|e| report(e, messages.api_error))?;
            println!("{}", serde_json::to_string_pretty(&ack)?);
        }
        "trades" => {
            let trades = session
                .recent_trades()
                .await
                .map_err(|e| report(e, messages.api_error))?;
            print!("{}", render::trades(&trades));
        }
        "health" => {
            let healthy = api
                .health()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message(messages.api_error)))?;
            if !healthy {
                bail!("Analysis service at {} is unhealthy", config.gateway.analysis_base_url);
            }
            println!("Analysis service at {} is up", config.gateway.analysis_base_url);
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
