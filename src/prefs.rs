//! Persisted operator preferences (last selected category and the like)

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Last selected category id
pub const LAST_CATEGORY_KEY: &str = "vod.last_category_id";

pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store, used by tests
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// JSON-file backed store, rewritten on every change
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    pub fn default_path() -> PathBuf {
        crate::config::app_dir().join("preferences.json")
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read(&path);
        Self { path, values }
    }

    fn read(path: &Path) -> BTreeMap<String, String> {
        if !path.exists() {
            return BTreeMap::new();
        }
        match fs::read_to_string(path).map(|content| serde_json::from_str(&content)) {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "preferences are not valid JSON, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read preferences, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.values) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.path, content) {
                    warn!(path = %self.path.display(), error = %e, "could not write preferences");
                }
            }
            Err(e) => warn!(error = %e, "could not encode preferences"),
        }
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_preferences() {
        let mut prefs = MemoryPreferences::new().with(LAST_CATEGORY_KEY, "4");
        assert_eq!(prefs.get(LAST_CATEGORY_KEY).as_deref(), Some("4"));
        prefs.set(LAST_CATEGORY_KEY, "9");
        assert_eq!(prefs.get(LAST_CATEGORY_KEY).as_deref(), Some("9"));
        prefs.remove(LAST_CATEGORY_KEY);
        assert_eq!(prefs.get(LAST_CATEGORY_KEY), None);
    }

    #[test]
    fn test_file_preferences_survive_reopen() {
        let path = std::env::temp_dir().join(format!("vod_admin_prefs_{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        let mut prefs = FilePreferences::open(&path);
        assert_eq!(prefs.get(LAST_CATEGORY_KEY), None);
        prefs.set(LAST_CATEGORY_KEY, "12");

        let reopened = FilePreferences::open(&path);
        assert_eq!(reopened.get(LAST_CATEGORY_KEY).as_deref(), Some("12"));

        let mut reopened = reopened;
        reopened.remove(LAST_CATEGORY_KEY);
        assert_eq!(FilePreferences::open(&path).get(LAST_CATEGORY_KEY), None);
        let _ = fs::remove_file(&path);
    }
}
