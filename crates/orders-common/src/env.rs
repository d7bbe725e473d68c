//! Typed environment variable lookups
//!
//! Configuration structs in the binaries are built once at startup from these
//! helpers. A variable that is unset falls back to its default; a variable that
//! is set but cannot be parsed is a configuration error instead of being
//! silently replaced.

use std::str::FromStr;

use crate::error::{OrdersError, Result};

/// Read a string variable, falling back to `default` when unset
pub fn string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset
pub fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            OrdersError::config(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

/// Read a boolean flag
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
pub fn flag_or(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw)
            .ok_or_else(|| OrdersError::config(format!("{} has invalid flag value '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
