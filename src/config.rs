//! Process-wide socket settings
//!
//! Settings are read from `<config dir>/card-sockets/config.json` when present.
//! Every field has a default from [`crate::constants`], so a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::cards::SocketType;
use crate::constants;
use crate::error::{SocketError, SocketResult};

static GLOBAL_SETTINGS: OnceCell<SocketSettings> = OnceCell::new();

/// Tunables for socket naming, limits and content display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocketSettings {
    pub socket_id_prefix: String,
    pub input_name_prefix: String,
    pub output_name_prefix: String,
    pub max_sockets_per_side: usize,
    /// When false, non-JSON strings display as plain text instead of Markdown
    pub markdown_enabled: bool,
    pub log_filter: String,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            socket_id_prefix: constants::socket::DEFAULT_ID_PREFIX.to_string(),
            input_name_prefix: constants::socket::DEFAULT_INPUT_NAME_PREFIX.to_string(),
            output_name_prefix: constants::socket::DEFAULT_OUTPUT_NAME_PREFIX.to_string(),
            max_sockets_per_side: constants::socket::DEFAULT_MAX_SOCKETS_PER_SIDE,
            markdown_enabled: true,
            log_filter: constants::settings::DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl SocketSettings {
    /// Default settings file path, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::settings::CONFIG_DIR_NAME)
                .join(constants::settings::CONFIG_FILE_NAME)
        })
    }

    /// Load settings from a specific file
    pub fn load(path: &Path) -> SocketResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SocketError::config(path, format!("failed to read: {e}")))?;
        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| SocketError::config(path, format!("failed to parse: {e}")))?;
        settings.validate(path)?;
        debug!("Loaded socket settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, or from the default location when `path` is None.
    /// A missing file yields defaults; an unreadable or invalid one is an error.
    pub fn load_or_default(path: Option<&Path>) -> SocketResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!("No platform config directory, using default socket settings");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Write settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> SocketResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> SocketResult<()> {
        self.check().map_err(|message| SocketError::config(path, message))
    }

    fn check(&self) -> Result<(), &'static str> {
        if self.max_sockets_per_side == 0 {
            return Err("maxSocketsPerSide must be at least 1");
        }
        if self.socket_id_prefix.trim().is_empty() {
            return Err("socketIdPrefix must not be blank");
        }
        Ok(())
    }

    /// Install process-wide settings. Only the first call wins; invalid
    /// settings are rejected without installing anything.
    pub fn install(settings: SocketSettings) -> SocketResult<bool> {
        settings.check().map_err(SocketError::invalid_argument)?;
        match GLOBAL_SETTINGS.set(settings) {
            Ok(()) => {
                info!("Socket settings installed");
                Ok(true)
            }
            Err(_) => {
                warn!("Socket settings already installed, ignoring second install");
                Ok(false)
            }
        }
    }

    /// The installed settings, or defaults if nothing was installed
    pub fn global() -> &'static SocketSettings {
        GLOBAL_SETTINGS.get_or_init(SocketSettings::default)
    }

    /// Name prefix for sockets of the given type
    pub fn name_prefix(&self, socket_type: SocketType) -> &str {
        match socket_type {
            SocketType::Input => &self.input_name_prefix,
            SocketType::Output => &self.output_name_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "inputNamePrefix": "In", "markdownEnabled": false }"#).unwrap();

        let settings = SocketSettings::load(&path).unwrap();
        assert_eq!(settings.input_name_prefix, "In");
        assert!(!settings.markdown_enabled);
        assert_eq!(settings.output_name_prefix, "Output");
        assert_eq!(settings.max_sockets_per_side, 256);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let settings = SocketSettings::load_or_default(Some(&path)).unwrap();
        assert_eq!(settings, SocketSettings::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SocketSettings::load_or_default(Some(&path)).unwrap_err();
        assert!(matches!(err, SocketError::Config { .. }));

        fs::write(&path, r#"{ "maxSocketsPerSide": 0 }"#).unwrap();
        let err = SocketSettings::load(&path).unwrap_err();
        assert!(err.to_string().contains("maxSocketsPerSide"));
    }

    #[test]
    fn test_install_rejects_invalid_settings() {
        let zero_limit = SocketSettings {
            max_sockets_per_side: 0,
            ..SocketSettings::default()
        };
        let err = SocketSettings::install(zero_limit).unwrap_err();
        assert!(matches!(err, SocketError::InvalidArgument { .. }));

        let blank_prefix = SocketSettings {
            socket_id_prefix: "  ".into(),
            ..SocketSettings::default()
        };
        assert!(SocketSettings::install(blank_prefix).is_err());
        assert!(SocketSettings::global().max_sockets_per_side >= 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = SocketSettings {
            socket_id_prefix: "sock".into(),
            max_sockets_per_side: 8,
            ..SocketSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(SocketSettings::load(&path).unwrap(), settings);
    }
}
