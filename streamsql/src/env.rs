use crate::error::{StreamSQLError, StreamSQLResult};
use std::collections::HashMap;
use std::str::FromStr;

/// Read-only view over key/value configuration.
///
/// Empty values are reported as absent.
pub trait EnvSource: Send + Sync {
    fn raw(&self, key: &str) -> Option<String>;

    fn var(&self, key: &str) -> Option<String> {
        self.raw(key).filter(|v| !v.trim().is_empty())
    }

    fn var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn raw(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn raw(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

pub fn parse_number<T>(key: &str, value: &str) -> StreamSQLResult<T>
where
    T: FromStr,
{
    value.trim().parse::<T>().map_err(|_| {
        StreamSQLError::ConfigError(format!("{} must be an integer, got '{}'", key, value))
    })
}

pub fn number_or<T>(env: &dyn EnvSource, key: &str, default: T) -> StreamSQLResult<T>
where
    T: FromStr,
{
    match env.var(key) {
        Some(value) => parse_number(key, &value),
        None => Ok(default),
    }
}

pub fn flag_or(env: &dyn EnvSource, key: &str, default: bool) -> bool {
    match env.var(key) {
        Some(value) => value.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

#[cfg(test)]
pub fn env_from(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
