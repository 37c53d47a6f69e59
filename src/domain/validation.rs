//! Input checks run by callers before handing data to a registry.
//!
//! The registries trust their inputs; these helpers keep malformed values
//! from reaching a snapshot.

use crate::error::{DeskError, Result};
use chrono::NaiveDate;

/// Rejects empty or whitespace-only values for a required field.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DeskError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Accepts `local@domain.tld` shaped addresses.
pub fn email(value: &str) -> Result<String> {
    let value = required("email", value)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(value)
    } else {
        Err(DeskError::Validation(format!(
            "`{}` is not a valid email address",
            value
        )))
    }
}

/// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DeskError::Validation(format!("`{}` is not a date (YYYY-MM-DD)", value)))
}

/// Processing success probability must be a probability.
pub fn probability(value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DeskError::Validation(format!(
            "success rate {} is outside [0, 1]",
            value
        )))
    }
}
