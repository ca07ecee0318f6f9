//! Configuration loading and typed accessors.
//!
//! Settings are read once from a TOML file into a flat key/value map
//! (nested tables are flattened with dot-joined keys, so `[grid]
//! enabled = true` becomes `grid.enabled`). The map is immutable except
//! through [`Settings::reload`], which swaps it atomically.
//!
//! Typed access follows the harness contract:
//!
//! - [`Settings::get`] warns and returns `None` on a missing key;
//!   callers decide how severe that is.
//! - [`Settings::get_int`] fails with [`ConfigError::Parse`] when the
//!   stored value cannot be coerced.
//! - [`Settings::get_bool`] never fails: anything that is not `true`
//!   (case-insensitive) reads as `false`.
//!
//! The int/bool asymmetry is part of the observable contract and is
//! deliberate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use tracing::{info, warn};

/// Default config file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "storecheck.toml";

/// Errors raised by configuration access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid value for key '{key}': {value:?}")]
    Parse { key: String, value: Option<String> },
}

/// Process-wide settings store.
///
/// Constructed once at startup and handed to every component that needs
/// it; there is no hidden global. Construction fails if the backing file
/// is unreadable or malformed -- an empty configuration is never a valid
/// fallback.
pub struct Settings {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, &[])
    }

    /// Load settings, then apply key/value overrides (e.g. CLI flags).
    pub fn load_with_overrides(
        path: impl AsRef<Path>,
        overrides: &[(String, String)],
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let mut values = read_values(&path)?;
        for (key, value) in overrides {
            values.insert(key.clone(), value.clone());
        }
        info!("loaded {} settings from {}", values.len(), path.display());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Look up a raw value. Missing keys log a warning and return `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self
            .values
            .read()
            .expect("settings lock poisoned")
            .get(key)
            .cloned();
        if value.is_none() {
            warn!("setting not found for key: {key}");
        }
        value
    }

    /// Look up a raw value, falling back to `default`. Never fails.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .expect("settings lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Look up an integer value. Missing or non-numeric values are a
    /// [`ConfigError::Parse`] for this property access only.
    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        let value = self.get(key);
        value
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| ConfigError::Parse {
                key: key.to_string(),
                value,
            })
    }

    /// Look up a boolean value. Standard boolean parsing: only a
    /// case-insensitive `true` reads as `true`, everything else
    /// (including a missing key) reads as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.values
            .read()
            .expect("settings lock poisoned")
            .get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Re-read the backing file, replacing the map atomically.
    /// Concurrent readers see either the old map or the new one.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let fresh = read_values(&self.path)?;
        *self.values.write().expect("settings lock poisoned") = fresh;
        info!("settings reloaded from {}", self.path.display());
        Ok(())
    }

    // Application

    pub fn app_url(&self) -> String {
        self.get_or("app.url", "https://www.saucedemo.com")
    }

    pub fn app_title(&self) -> String {
        self.get_or("app.title", "Swag Labs")
    }

    pub fn environment(&self) -> String {
        self.get_or("suite.environment", "local")
    }

    // Browser & timeouts

    pub fn browser(&self) -> String {
        self.get_or("browser.kind", "chrome")
    }

    pub fn headless(&self) -> bool {
        self.get_bool("browser.headless")
    }

    pub fn implicit_wait(&self) -> Result<Duration, ConfigError> {
        self.duration_secs("timeouts.implicit_wait")
    }

    pub fn explicit_wait(&self) -> Result<Duration, ConfigError> {
        self.duration_secs("timeouts.explicit_wait")
    }

    pub fn page_load_timeout(&self) -> Result<Duration, ConfigError> {
        self.duration_secs("timeouts.page_load")
    }

    // Grid

    pub fn grid_enabled(&self) -> bool {
        self.get_bool("grid.enabled")
    }

    pub fn grid_hub_url(&self) -> Option<String> {
        self.get("grid.hub_url")
    }

    // Suite

    pub fn retry_count(&self) -> Result<usize, ConfigError> {
        Ok(self.get_int("retry.count")? as usize)
    }

    /// `"fresh"` (default) or `"shared"`; see the retry module for what
    /// a shared policy instance implies.
    pub fn retry_lifetime(&self) -> String {
        self.get_or("retry.lifetime", "fresh")
    }

    pub fn worker_count(&self) -> Result<usize, ConfigError> {
        Ok(self.get_int("suite.workers")? as usize)
    }

    // Evidence

    pub fn screenshot_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("evidence.screenshot_dir", "artifacts/screenshots"))
    }

    pub fn report_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("evidence.report_dir", "artifacts/reports"))
    }

    pub fn report_name(&self) -> String {
        self.get_or("evidence.report_name", "Storefront UI Regression")
    }

    pub fn report_title(&self) -> String {
        self.get_or("evidence.report_title", "storecheck report")
    }

    pub fn report_theme(&self) -> String {
        self.get_or("evidence.theme", "standard")
    }

    /// Screenshots older than this many days are eligible for cleanup.
    /// Only a present-but-unparsable value is an error.
    pub fn screenshot_retention_days(&self) -> Result<u64, ConfigError> {
        let present = self
            .values
            .read()
            .expect("settings lock poisoned")
            .contains_key("evidence.retention_days");
        if !present {
            return Ok(7);
        }
        Ok(self.get_int("evidence.retention_days")? as u64)
    }

    // Test data & users

    pub fn testdata_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("testdata.dir", "fixtures"))
    }

    /// Username configured for a named role (`standard`, `locked`, ...).
    pub fn user_for(&self, role: &str) -> Option<String> {
        self.get(&format!("users.{role}"))
    }

    pub fn password(&self) -> Option<String> {
        self.get("users.password")
    }

    // Mobile metadata

    pub fn mobile_enabled(&self) -> bool {
        self.get_bool("mobile.enabled")
    }

    pub fn device_name(&self) -> Option<String> {
        self.get("mobile.device_name")
    }

    pub fn platform_name(&self) -> Option<String> {
        self.get("mobile.platform_name")
    }

    pub fn platform_version(&self) -> Option<String> {
        self.get("mobile.platform_version")
    }

    fn duration_secs(&self, key: &str) -> Result<Duration, ConfigError> {
        let secs = self.get_int(key)?;
        if secs < 0 {
            return Err(ConfigError::Parse {
                key: key.to_string(),
                value: Some(secs.to_string()),
            });
        }
        Ok(Duration::from_secs(secs as u64))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.path)
            .field(
                "keys",
                &self.values.read().expect("settings lock poisoned").len(),
            )
            .finish()
    }
}

fn read_values(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let table: toml::Table = content.parse().map_err(|source| ConfigError::Syntax {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    let mut values = HashMap::new();
    flatten(&table, "", &mut values);
    Ok(values)
}

/// Flatten nested tables into dot-joined keys. Arrays are skipped; the
/// store only holds scalar settings.
fn flatten(table: &toml::Table, prefix: &str, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(inner, &full, out),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            toml::Value::Integer(i) => {
                out.insert(full, i.to_string());
            }
            toml::Value::Float(x) => {
                out.insert(full, x.to_string());
            }
            toml::Value::Boolean(b) => {
                out.insert(full, b.to_string());
            }
            toml::Value::Datetime(dt) => {
                out.insert(full, dt.to_string());
            }
            toml::Value::Array(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn flattens_nested_tables() {
        let file = write_config(
            r#"
            [app]
            url = "https://shop.example"

            [timeouts]
            explicit_wait = 10
            "#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(
            settings.get("app.url").as_deref(),
            Some("https://shop.example")
        );
        assert_eq!(settings.get_int("timeouts.explicit_wait").unwrap(), 10);
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let file = write_config("[app]\nurl = \"x\"\n");
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.get("no.such.key").is_none());
        assert_eq!(settings.get_or("no.such.key", "fallback"), "fallback");
    }

    #[test]
    fn int_parse_failure_is_an_error() {
        let file = write_config("[timeouts]\nexplicit_wait = \"soon\"\n");
        let settings = Settings::load(file.path()).unwrap();
        let err = settings.get_int("timeouts.explicit_wait").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn bool_parse_failure_is_false() {
        // The asymmetry with get_int is intentional.
        let file = write_config("[grid]\nenabled = \"yes-please\"\nreally = true\n");
        let settings = Settings::load(file.path()).unwrap();
        assert!(!settings.get_bool("grid.enabled"));
        assert!(settings.get_bool("grid.really"));
        assert!(!settings.get_bool("grid.absent"));
    }

    #[test]
    fn unreadable_file_is_fatal() {
        let err = Settings::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn reload_replaces_the_map() {
        let mut file = write_config("[app]\nurl = \"before\"\n");
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.app_url(), "before");

        use std::io::Seek;
        file.as_file_mut().set_len(0).unwrap();
        file.as_file_mut().rewind().unwrap();
        file.write_all(b"[app]\nurl = \"after\"\n").unwrap();
        file.flush().unwrap();

        settings.reload().unwrap();
        assert_eq!(settings.app_url(), "after");
    }

    #[test]
    fn overrides_win() {
        let file = write_config("[browser]\nkind = \"chrome\"\n");
        let settings = Settings::load_with_overrides(
            file.path(),
            &[("browser.kind".to_string(), "firefox".to_string())],
        )
        .unwrap();
        assert_eq!(settings.browser(), "firefox");
    }

    #[test]
    fn duration_accessors_reject_negative() {
        let file = write_config("[timeouts]\nexplicit_wait = -3\n");
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.explicit_wait().is_err());
    }
}
