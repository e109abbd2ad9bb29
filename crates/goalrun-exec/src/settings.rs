//! Read-only settings store.

use std::collections::HashMap;

/// Read-only lookup of string-valued options.
pub trait SettingsStore: Send + Sync {
    /// Look up a setting by key.
    fn get(&self, key: &str) -> Option<String>;

    /// Look up a setting, treating the empty string as absent.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

/// Map-backed settings store.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: HashMap<String, String>,
}

impl InMemorySettings {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a setting.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl FromIterator<(String, String)> for InMemorySettings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_non_empty_filters_empty_values() {
        let settings = InMemorySettings::new()
            .with("build.log.level", "debug")
            .with("build.stacktrace.level", "");

        assert_eq!(
            settings.get_non_empty("build.log.level").as_deref(),
            Some("debug")
        );
        assert_eq!(settings.get_non_empty("build.stacktrace.level"), None);
        assert_eq!(settings.get_non_empty("missing"), None);
    }
}
