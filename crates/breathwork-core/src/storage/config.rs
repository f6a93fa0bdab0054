//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default pattern and custom patterns
//! - Engine cadences (frame, hold sampler, elapsed ticker)
//! - Remote API location and session cookie
//! - Where finished sessions are persisted
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::pattern::Pattern;
use crate::session::CadenceConfig;

/// Where finished sessions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    Local,
    Remote,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_mode")]
    pub mode: PersistenceMode,
}

/// Remote persistence API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Raw `Cookie` header value of an authenticated session.
    #[serde(default)]
    pub session_cookie: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_pattern")]
    pub default_pattern: String,
    #[serde(default)]
    pub engine: CadenceConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// User-defined patterns; they shadow presets of the same name.
    #[serde(default)]
    pub custom_patterns: Vec<Pattern>,
}

fn default_pattern() -> String {
    "4-7-8".into()
}
fn default_mode() -> PersistenceMode {
    PersistenceMode::Local
}
fn default_base_url() -> String {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);
    format!("http://localhost:{port}")
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_pattern: default_pattern(),
            engine: CadenceConfig::default(),
            api: ApiConfig::default(),
            persistence: PersistenceConfig::default(),
            custom_patterns: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                // Optional strings serialize as null until first set.
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Set a config value by key without touching disk.
    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Resolve a pattern by name or key: custom patterns first, then
    /// presets, then a literal key such as `5-5-5`.
    ///
    /// # Errors
    /// Returns an error if nothing matches or the match is invalid.
    pub fn find_pattern(&self, name: &str) -> Result<Pattern> {
        let found = self
            .custom_patterns
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) || p.key() == name)
            .cloned()
            .or_else(|| Pattern::find_preset(name));
        match found {
            Some(p) => {
                p.validate()?;
                Ok(p)
            }
            None => Pattern::from_key(name, name).map_err(|_| {
                ValidationError::NotFound {
                    kind: "pattern".into(),
                    name: name.into(),
                }
                .into()
            }),
        }
    }

    /// All selectable patterns: custom ones first, then presets.
    pub fn patterns(&self) -> Vec<Pattern> {
        let mut all = self.custom_patterns.clone();
        all.extend(
            Pattern::presets()
                .into_iter()
                .filter(|p| !self.custom_patterns.iter().any(|c| c.name == p.name)),
        );
        all
    }

    pub fn default_pattern(&self) -> Result<Pattern> {
        self.find_pattern(&self.default_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_pattern, "4-7-8");
        assert_eq!(parsed.engine.hold_sample_ms, 100);
        assert_eq!(parsed.persistence.mode, PersistenceMode::Local);
    }

    #[test]
    fn empty_file_gets_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.engine.frame_ms, 16);
        assert_eq!(cfg.engine.elapsed_tick_ms, 1000);
        assert!(cfg.api.base_url.starts_with("http://localhost:"));
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("engine.frame_ms").as_deref(), Some("16"));
        assert_eq!(cfg.get("persistence.mode").as_deref(), Some("local"));
        assert!(cfg.get("engine.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("engine.hold_sample_ms", "50").unwrap();
        cfg.apply("persistence.mode", "both").unwrap();
        cfg.apply("api.session_cookie", "sid=abc").unwrap();
        assert_eq!(cfg.engine.hold_sample_ms, 50);
        assert_eq!(cfg.persistence.mode, PersistenceMode::Both);
        assert_eq!(cfg.api.session_cookie.as_deref(), Some("sid=abc"));
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.apply("engine.nonexistent", "1").is_err());
        assert!(cfg.apply("engine.frame_ms", "fast").is_err());
        assert!(cfg.apply("persistence.mode", "cloud").is_err());
        assert_eq!(cfg.persistence.mode, PersistenceMode::Local);
    }

    #[test]
    fn custom_patterns_shadow_presets() {
        let mut cfg = Config::default();
        cfg.custom_patterns
            .push(Pattern::new("Box Breathing", vec![5.0, 5.0, 5.0, 5.0]).unwrap());
        assert_eq!(cfg.find_pattern("box breathing").unwrap().key(), "5-5-5-5");
        let names: Vec<_> = cfg.patterns().into_iter().map(|p| p.name).collect();
        assert_eq!(names.iter().filter(|n| *n == "Box Breathing").count(), 1);
    }

    #[test]
    fn find_pattern_accepts_literal_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.find_pattern("6-2-6").unwrap().sequence, vec![6.0, 2.0, 6.0]);
        assert!(cfg.find_pattern("not a pattern").is_err());
        assert_eq!(cfg.default_pattern().unwrap().key(), "4-7-8");
    }
}
