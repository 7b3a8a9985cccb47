//! Environment variable access with substitution tracking.
//!
//! The [`Env`] trait lets configuration code read the environment through an
//! object that tests can replace:
//!
//! - [`OsEnv`]: reads the process environment
//! - [`FauxEnv`]: a fixed map for tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::env::{var, var_os};
use std::ffi::OsString;

use log::warn;
use subst::VariableMap;

/// Variables read by libpq-style clients, in the order they appear in a connection string.
pub const PG_ENV_VARS: [&str; 5] = ["PGHOST", "PGPORT", "PGUSER", "PGPASSWORD", "PGDATABASE"];

/// Environment variable access with Unicode validation and usage tracking.
pub trait Env<'a>: VariableMap<'a> {
    /// Get an environment variable as an [`OsString`] without Unicode validation.
    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Get an environment variable as a UTF-8 validated [`String`].
    ///
    /// Logs a warning and returns `None` if the variable contains invalid Unicode.
    #[must_use]
    fn get_env_str(&self, key: &str) -> Option<String> {
        let value = self.var_os(key)?;
        match value.into_string() {
            Ok(v) => Some(v),
            Err(v) => {
                let v = v.to_string_lossy();
                warn!("Environment variable {key} has invalid unicode. Lossy representation: {v}");
                None
            }
        }
    }

    /// Check if an environment variable exists but was not accessed during substitution.
    #[must_use]
    fn has_unused_var(&self, key: &str) -> bool;

    /// Assemble a key/value connection string from the `PG*` variables.
    ///
    /// Returns `None` unless at least `PGHOST` or `PGDATABASE` is set, so an
    /// empty environment does not turn into a connection to a default server.
    #[must_use]
    fn pg_connection_string(&self) -> Option<String> {
        let values: Vec<(&str, String)> = PG_ENV_VARS
            .iter()
            .filter_map(|&key| self.get_env_str(key).map(|v| (key, v)))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        if !values
            .iter()
            .any(|(k, _)| *k == "PGHOST" || *k == "PGDATABASE")
        {
            return None;
        }
        let parts: Vec<String> = values
            .into_iter()
            .map(|(key, value)| {
                let name = match key {
                    "PGHOST" => "host",
                    "PGPORT" => "port",
                    "PGUSER" => "user",
                    "PGPASSWORD" => "password",
                    _ => "dbname",
                };
                format!("{name}={}", quote_conn_value(&value))
            })
            .collect();
        Some(parts.join(" "))
    }
}

/// Quote a value for a key/value `PostgreSQL` connection string.
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Production implementation that accesses system environment variables.
///
/// Tracks which variables are accessed via [`VariableMap`] using interior mutability.
#[derive(Debug, Default)]
pub struct OsEnv(RefCell<HashSet<String>>);

impl Env<'_> for OsEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        var_os(key)
    }

    fn has_unused_var(&self, key: &str) -> bool {
        !self.0.borrow().contains(key) && var_os(key).is_some()
    }
}

impl<'a> VariableMap<'a> for OsEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.borrow_mut().insert(key.to_string());
        var(key).ok()
    }
}

/// Test implementation with configurable environment variables.
#[derive(Debug, Default)]
pub struct FauxEnv(pub HashMap<&'static str, OsString>);

impl<'a> VariableMap<'a> for FauxEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.get(key).map(|s| s.to_string_lossy().to_string())
    }
}

impl Env<'_> for FauxEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.0.get(key).map(Into::into)
    }

    fn has_unused_var(&self, key: &str) -> bool {
        self.var_os(key).is_some()
    }
}

impl FromIterator<(&'static str, &'static str)> for FauxEnv {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, OsString::from(v))).collect())
    }
}
