//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Database file name inside the resolved data folder
pub const DATABASE_FILE: &str = "lsb.db";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Full path of the SQLite database inside the data folder
pub fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join(DATABASE_FILE)
}

/// Locate the configuration file for the platform
///
/// Checks the per-user config dir first (`lsb/config.toml`), then the
/// system-wide `/etc/lsb/config.toml` on unix.
fn find_config_file() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("lsb").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/lsb/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lsb"))
        .unwrap_or_else(|| PathBuf::from("./lsb_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let folder = resolve_data_folder(Some("/tmp/lsb-test"), "LSB_TEST_UNSET_VAR");
        assert_eq!(folder, PathBuf::from("/tmp/lsb-test"));
    }

    #[test]
    fn falls_back_to_default_when_nothing_set() {
        let folder = resolve_data_folder(None, "LSB_TEST_UNSET_VAR");
        // Default ends with the product folder name
        assert!(folder.ends_with("lsb") || folder.ends_with("lsb_data"));
    }

    #[test]
    fn database_path_appends_file_name() {
        let path = database_path(Path::new("/var/lib/lsb"));
        assert_eq!(path, PathBuf::from("/var/lib/lsb/lsb.db"));
    }
}
