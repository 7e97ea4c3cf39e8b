//! Runtime settings: built-in defaults, then `.env`, then an optional JSON
//! file, then individual environment variables.

use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_PATH_VAR: &str = "GITBOARD_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub status_ttl_ms: u64,
    pub tick_ms: u64,
    pub commit_char_limit: usize,
    pub diff_page_overlap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_ttl_ms: 3000,
            tick_ms: 250,
            commit_char_limit: 500,
            diff_page_overlap: 2,
        }
    }
}

impl Config {
    /// Loads the effective configuration. A bad config file is returned as the
    /// second element so the caller can report it; defaults stand in for it.
    pub fn load() -> (Self, Option<ConfigError>) {
        let _ = dotenvy::dotenv();

        let mut problem = None;
        let mut cfg = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => match Self::from_file(Path::new(&path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    problem = Some(e);
                    Self::default()
                }
            },
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        (cfg, problem)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        override_from(&lookup, "GITBOARD_STATUS_TTL_MS", &mut self.status_ttl_ms);
        override_from(&lookup, "GITBOARD_TICK_MS", &mut self.tick_ms);
        override_from(&lookup, "GITBOARD_COMMIT_LIMIT", &mut self.commit_char_limit);
        override_from(&lookup, "GITBOARD_DIFF_OVERLAP", &mut self.diff_page_overlap);
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(16))
    }
}

fn override_from<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable setting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn file_values_fill_in_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gitboard.json");
        fs::write(&path, r#"{ "status_ttl_ms": 1500 }"#).unwrap();

        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.status_ttl_ms, 1500);
        assert_eq!(cfg.tick_ms, 250);
        assert_eq!(cfg.commit_char_limit, 500);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gitboard.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn env_overrides_win_and_garbage_is_ignored() {
        let env: HashMap<&str, &str> = [
            ("GITBOARD_TICK_MS", "100"),
            ("GITBOARD_COMMIT_LIMIT", "many"),
            ("GITBOARD_DIFF_OVERLAP", " 0 "),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.tick_ms, 100);
        assert_eq!(cfg.commit_char_limit, 500);
        assert_eq!(cfg.diff_page_overlap, 0);
        assert_eq!(cfg.status_ttl(), Duration::from_millis(3000));
    }
}
