//! TOML-based client configuration.
//!
//! Stores:
//! - Server address and credentials for the tap and session endpoints
//! - Sound and vibration preferences for the breathing guide
//! - Display language and balloon sizing
//!
//! Configuration is stored at `~/.config/habitual/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::breathing::{BalloonSizer, GuideOptions, Locale};
use crate::error::ConfigError;

/// Backend connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Anti-forgery token, as the page's hidden form field would carry it.
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Raw `Cookie` header. Also searched for `csrftoken`.
    #[serde(default)]
    pub cookie: Option<String>,
}

/// Breathing cue preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuesConfig {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_balloon_min_px")]
    pub balloon_min_px: u32,
    #[serde(default = "default_balloon_max_px")]
    pub balloon_max_px: u32,
}

/// Client configuration.
///
/// Serialized to/from TOML at `~/.config/habitual/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cues: CuesConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

// Default functions
fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_true() -> bool {
    true
}
fn default_viewport_width() -> u32 {
    420
}
fn default_balloon_min_px() -> u32 {
    40
}
fn default_balloon_max_px() -> u32 {
    350
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            csrf_token: None,
            cookie: None,
        }
    }
}

impl Default for CuesConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            viewport_width: default_viewport_width(),
            balloon_min_px: default_balloon_min_px(),
            balloon_max_px: default_balloon_max_px(),
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
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
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot replace a whole section".into()));
                }
                // Strings and unset optional strings.
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `config.toml` in the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk. A missing file is created with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file; writing defaults");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                serde_json::Value::Null => out.push((prefix.to_string(), String::new())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = url::Url::parse(&self.server.base_url) {
            return Err(ConfigError::InvalidValue {
                key: "server.base_url".into(),
                message: e.to_string(),
            });
        }
        if self.display.balloon_min_px == 0 || self.display.balloon_min_px > self.display.balloon_max_px {
            return Err(ConfigError::InvalidValue {
                key: "display.balloon_min_px".into(),
                message: "must be positive and no larger than display.balloon_max_px".into(),
            });
        }
        Ok(())
    }

    pub fn balloon_sizer(&self) -> BalloonSizer {
        BalloonSizer::for_viewport(
            f64::from(self.display.viewport_width),
            f64::from(self.display.balloon_min_px),
            f64::from(self.display.balloon_max_px),
        )
    }

    /// Guide settings from the stored preferences.
    pub fn guide_options(&self) -> GuideOptions {
        GuideOptions {
            sound_enabled: self.cues.sound_enabled,
            vibration_enabled: self.cues.vibration_enabled,
            locale: self.display.locale,
            sizer: self.balloon_sizer(),
        }
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
        assert_eq!(parsed, cfg);
        assert!(parsed.cues.sound_enabled);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[cues]\nsound_enabled = false\n").unwrap();
        assert!(!parsed.cues.sound_enabled);
        assert!(parsed.cues.vibration_enabled);
        assert_eq!(parsed.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(parsed.display.locale, Locale::Ru);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("cues.sound_enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("display.viewport_width").as_deref(), Some("420"));
        assert_eq!(cfg.get("display.locale").as_deref(), Some("ru"));
        assert_eq!(cfg.get("server.cookie").as_deref(), Some(""));
        assert!(cfg.get("display.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("cues.vibration_enabled", "false").unwrap();
        cfg.set("display.balloon_max_px", "300").unwrap();
        cfg.set("display.locale", "en").unwrap();
        cfg.set("server.csrf_token", "abc").unwrap();
        assert!(!cfg.cues.vibration_enabled);
        assert_eq!(cfg.display.balloon_max_px, 300);
        assert_eq!(cfg.display.locale, Locale::En);
        assert_eq!(cfg.server.csrf_token.as_deref(), Some("abc"));
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("cues.volume", "3"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("cues.sound_enabled", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("display.locale", "de").is_err());
        assert!(cfg.set("server.base_url", "not a url").is_err());
        assert!(cfg.set("display.balloon_min_px", "900").is_err());
        assert!(cfg.set("cues", "x").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_list_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"server.base_url".to_string()));
        assert!(keys.contains(&"cues.vibration_enabled".to_string()));
        assert!(keys.contains(&"display.balloon_min_px".to_string()));
        assert_eq!(keys.len(), 9);
    }

    #[test]
    fn load_from_creates_missing_file_and_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("cues.sound_enabled", "false").unwrap();
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().cues.sound_enabled);
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cues\nsound_enabled = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn guide_options_follow_preferences() {
        let mut cfg = Config::default();
        cfg.set("cues.sound_enabled", "false").unwrap();
        let opts = cfg.guide_options();
        assert!(!opts.sound_enabled);
        assert!(opts.vibration_enabled);
        assert_eq!(opts.sizer, BalloonSizer::default());
    }
}
