// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::get_setting;
use anyhow::{anyhow, Result};
use rusqlite::Connection;

pub const REMOTE_URL: &str = "remote_url";
pub const REMOTE_KEY: &str = "remote_key";
pub const GEMINI_API_KEY: &str = "gemini_api_key";

pub const KNOWN_KEYS: [&str; 3] = [REMOTE_URL, REMOTE_KEY, GEMINI_API_KEY];

fn env_name(key: &str) -> &'static str {
    match key {
        REMOTE_URL => "CANTIERE_REMOTE_URL",
        REMOTE_KEY => "CANTIERE_REMOTE_KEY",
        _ => "GEMINI_API_KEY",
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Stored settings, with environment variables taking precedence.
    pub fn load(conn: &Connection) -> Result<Self> {
        Self::resolve(|k| get_setting(conn, k), |name| std::env::var(name).ok())
    }

    pub fn resolve(
        stored: impl Fn(&str) -> Result<Option<String>>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let pick = |key: &str| -> Result<Option<String>> {
            let v = match env(env_name(key)) {
                Some(v) => Some(v),
                None => stored(key)?,
            };
            Ok(v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        };
        Ok(Self {
            remote_url: pick(REMOTE_URL)?,
            remote_key: pick(REMOTE_KEY)?,
            gemini_api_key: pick(GEMINI_API_KEY)?,
        })
    }

    /// Both halves of the remote credentials, or nothing.
    pub fn remote(&self) -> Option<(&str, &str)> {
        match (&self.remote_url, &self.remote_key) {
            (Some(u), Some(k)) => Some((u.as_str(), k.as_str())),
            _ => None,
        }
    }
}

pub fn check_key(key: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(anyhow!(
            "Unknown setting '{}', expected one of {}",
            key,
            KNOWN_KEYS.join("|")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_stored_value() {
        let cfg = Config::resolve(
            |k| Ok((k == GEMINI_API_KEY).then(|| "stored".to_string())),
            |name| (name == "GEMINI_API_KEY").then(|| "from-env".to_string()),
        )
        .unwrap();
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("from-env"));
        assert!(cfg.remote().is_none());
    }

    #[test]
    fn remote_needs_url_and_key() {
        let cfg = Config::resolve(
            |k| Ok(Some(format!("{}-value", k))),
            |_| None,
        )
        .unwrap();
        assert_eq!(cfg.remote(), Some(("remote_url-value", "remote_key-value")));
        let blank = Config::resolve(|_| Ok(Some("  ".into())), |_| None).unwrap();
        assert!(blank.gemini_api_key.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(check_key(REMOTE_URL).is_ok());
        assert!(check_key("base_currency").is_err());
    }
}
