//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Overrides `api_base_url` when set
pub const API_URL_ENV: &str = "VOD_ADMIN_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_file_page_size")]
    pub file_page_size: u32,
    /// File count above which the full-edit prompt warns about load cost
    #[serde(default = "default_full_edit_warn_threshold")]
    pub full_edit_warn_threshold: u64,
    /// Fetch the pre-joined tree instead of the flat category list
    #[serde(default)]
    pub use_tree_endpoint: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_base_url() -> String { "http://localhost:8081/api".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_request_timeout() -> u64 { 30 }
fn default_user_agent() -> String { concat!("vod-catalog-admin/", env!("CARGO_PKG_VERSION")).to_string() }
fn default_file_page_size() -> u32 { 25 }
fn default_full_edit_warn_threshold() -> u64 { 200 }
fn default_log_filter() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            file_page_size: default_file_page_size(),
            full_edit_warn_threshold: default_full_edit_warn_threshold(),
            use_tree_endpoint: false,
            log_filter: default_log_filter(),
        }
    }
}

/// Per-user directory holding config and preferences
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("vod_catalog_admin");
    fs::create_dir_all(&path).ok();
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    /// Load from the user config dir, then apply the environment override.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }
        config
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config is not valid JSON, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        self.save_to(&Self::config_path());
    }

    pub fn save_to(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    warn!(path = %path.display(), error = %e, "could not write config");
                }
            }
            Err(e) => warn!(error = %e, "could not encode config"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"file_page_size": 50}"#).unwrap();
        assert_eq!(config.file_page_size, 50);
        assert_eq!(config.api_base_url, "http://localhost:8081/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.use_tree_endpoint);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("vod_admin_config_{}.json", std::process::id()));
        let config = AppConfig {
            api_base_url: "http://catalog.example/api".to_string(),
            use_tree_endpoint: true,
            ..AppConfig::default()
        };
        config.save_to(&path);
        assert_eq!(AppConfig::load_from(&path), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unreadable_config_falls_back() {
        let path = std::env::temp_dir().join(format!("vod_admin_bad_config_{}.json", std::process::id()));
        fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
        let _ = fs::remove_file(&path);
    }
}
