//! INI file configuration adapter.

use crate::domain::error::SweeptraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// Section and key names are case-insensitive; values are trimmed.
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SweeptraderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, SweeptraderError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, file: &str) -> Result<Self, SweeptraderError> {
        let mut config = Ini::new();
        config
            .read(content)
            .map_err(|reason| SweeptraderError::ConfigParse {
                file: file.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
