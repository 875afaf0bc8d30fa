//! Load `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table and the `[bridge]` table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{BridgeSettings, LoadError};

/// `$XDG_CONFIG_HOME` when set and non-empty, else `~/.config` (same on every OS).
fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .ok_or_else(|| LoadError::XdgPath("home directory not found".to_string()))
}

/// Path of the app config file, or `None` when it does not exist.
pub(crate) fn config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub bridge: BridgeSettings,
}

/// Reads the config file at `path`. `None` yields an empty config.
pub(crate) fn load(path: Option<&Path>) -> Result<ConfigFile, LoadError> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let content = std::fs::read_to_string(path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_path_returns_empty_config() {
        let config = load(None).unwrap();
        assert!(config.env.is_empty());
        assert_eq!(config.bridge, BridgeSettings::default());
    }

    #[test]
    fn reads_env_and_bridge_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[env]
OPENAI_API_KEY = "from_toml"

[bridge]
provider = "openai"
request_timeout_secs = 90
default_base_url = "http://localhost:11434/v1"
log_file = "/tmp/llm-bridge.log"
"#,
        );

        let config = load(Some(&path)).unwrap();

        assert_eq!(config.env.get("OPENAI_API_KEY"), Some(&"from_toml".to_string()));
        assert_eq!(config.bridge.provider.as_deref(), Some("openai"));
        assert_eq!(config.bridge.request_timeout_secs, Some(90));
        assert_eq!(
            config.bridge.default_base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        assert_eq!(
            config.bridge.log_file.as_deref(),
            Some(Path::new("/tmp/llm-bridge.log"))
        );
    }

    #[test]
    fn other_tables_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[other]\nkey = \"ignored\"\n");

        let config = load(Some(&path)).unwrap();

        assert!(config.env.is_empty());
        assert!(config.bridge.provider.is_none());
    }

    #[test]
    fn invalid_toml_returns_xdg_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "not valid toml [[[\n");

        let result = load(Some(&path));

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn wrong_type_in_bridge_table_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[bridge]\nrequest_timeout_secs = \"soon\"\n");

        assert!(matches!(load(Some(&path)), Err(LoadError::XdgParse(_))));
    }
}
