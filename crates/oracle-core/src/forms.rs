//! Client-side checks run before anything is sent to the gateway.

use thiserror::Error;

use crate::config::{Messages, UploadConstraints};
use crate::types::{AnalysisRequest, Credentials};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Please choose a trading pair")]
    MissingPair,

    #[error("Trade amount must be a number: {0:?}")]
    InvalidAmount(String),

    #[error("Trade amount must be positive")]
    NonPositiveAmount,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("Username is required")]
    MissingUsername,

    #[error("{0}")]
    Upload(String),
}

/// Raw contents of the analyze form
#[derive(Debug, Clone, Default)]
pub struct AnalyzeForm {
    pub pair: String,
    pub trade_amount: Option<String>,
    pub note: Option<String>,
}

/// Analyze form after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnalysis {
    pub request: AnalysisRequest,
    pub trade_amount: Option<f64>,
    pub note: Option<String>,
}

impl AnalyzeForm {
    pub fn new(pair: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            ..Default::default()
        }
    }

    /// Blank amount or note means "not provided", not an error.
    pub fn validate(&self) -> Result<ValidatedAnalysis, FormError> {
        let pair = self.pair.trim().to_uppercase();
        if pair.is_empty() {
            return Err(FormError::MissingPair);
        }

        let trade_amount = match self.trade_amount.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let amount: f64 = raw
                    .parse()
                    .map_err(|_| FormError::InvalidAmount(raw.to_string()))?;
                if !amount.is_finite() {
                    return Err(FormError::InvalidAmount(raw.to_string()));
                }
                if amount <= 0.0 {
                    return Err(FormError::NonPositiveAmount);
                }
                Some(amount)
            }
        };

        let note = self
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(ValidatedAnalysis {
            request: AnalysisRequest::new(pair),
            trade_amount,
            note,
        })
    }
}

/// Case-insensitive substring search over the pair list.
pub fn filter_pairs<'a>(pairs: &'a [String], query: &str) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    pairs
        .iter()
        .filter(|p| p.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

/// One password rule and whether the candidate meets it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub text: &'static str,
    pub met: bool,
}

pub fn password_requirements(password: &str) -> Vec<Requirement> {
    vec![
        Requirement {
            text: "At least 8 characters",
            met: password.chars().count() >= MIN_PASSWORD_LENGTH,
        },
        Requirement {
            text: "Contains a number",
            met: password.chars().any(|c| c.is_ascii_digit()),
        },
        Requirement {
            text: "Contains a letter",
            met: password.chars().any(char::is_alphabetic),
        },
    ]
}

fn check_email(email: &str) -> Result<(), FormError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(FormError::InvalidEmail),
    }
}

pub fn validate_login(credentials: &Credentials) -> Result<(), FormError> {
    check_email(&credentials.email)?;
    if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FormError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_registration(credentials: &Credentials) -> Result<(), FormError> {
    validate_login(credentials)?;
    match credentials.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(FormError::MissingUsername),
    }
}

/// Size and content-type check for chart uploads.
pub fn validate_upload(
    size: u64,
    content_type: &str,
    constraints: &UploadConstraints,
    messages: &Messages,
) -> Result<(), FormError> {
    if size > constraints.max_file_size {
        return Err(FormError::Upload(messages.file_too_large.to_string()));
    }
    if !constraints
        .allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(content_type.trim()))
    {
        return Err(FormError::Upload(messages.invalid_file_type.to_string()));
    }
    Ok(())
}
