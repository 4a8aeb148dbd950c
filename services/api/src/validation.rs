//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate a payroll period (`YYYYMM`)
pub fn validate_period(period: &str) -> Result<(), String> {
    if period.is_empty() {
        return Err("Periode is required".to_string());
    }

    static PERIOD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PERIOD_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9]{4}(0[1-9]|1[0-2])$").expect("Failed to compile period regex")
    });

    if !regex.is_match(period) {
        return Err(format!("Invalid periode '{}', expected YYYYMM", period));
    }

    Ok(())
}

/// Validate a bare SQL identifier used for a configurable table name
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier is required".to_string());
    }

    if name.len() > 64 {
        return Err("Identifier must be at most 64 characters long".to_string());
    }

    static IDENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENT_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Failed to compile identifier regex")
    });

    if !regex.is_match(name) {
        return Err("Identifier can only contain letters, digits, and underscores".to_string());
    }

    Ok(())
}

/// Validate the shape of submitted login credentials
pub fn validate_credentials(username: &str, password: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 64 {
        return Err("Username must be at most 64 characters long".to_string());
    }

    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    Ok(())
}
