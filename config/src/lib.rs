//! Load configuration from XDG `config.toml` and project `.env`, apply env keys to the
//! process environment with priority **existing env > .env > XDG**, and return the
//! `[bridge]` settings table.
//!
//! ```toml
//! # ~/.config/llm-bridge/config.toml
//! [env]
//! OPENAI_API_KEY = "sk-..."
//!
//! [bridge]
//! provider = "openai"
//! request_timeout_secs = 120
//! default_base_url = "https://api.openai.com/v1"
//! log_file = "/var/log/llm-bridge.log"
//! ```

#[cfg(feature = "tracing-init")]
pub mod tracing_init;
mod xdg_toml;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(#[from] dotenv::Error),
}

/// `[bridge]` table of `config.toml`. Every key is optional; cli flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeSettings {
    /// Remote-call capability to use (e.g. `"openai"`).
    pub provider: Option<String>,
    /// Per-request deadline in seconds; unset means wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Endpoint used when a request has no `base_url`.
    pub default_base_url: Option<String>,
    /// Append logs to this file; unset drops logs.
    pub log_file: Option<PathBuf>,
}

/// Reads `.env` from `override_dir` or the current directory. Missing file yields an empty map.
fn dotenv_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return Ok(HashMap::new()),
        },
    };
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let mut out = HashMap::new();
    for item in dotenv::from_path_iter(&path)? {
        let (key, value) = item?;
        out.insert(key, value);
    }
    Ok(out)
}

/// Sets each key that is not already in the environment, preferring `.env` over XDG.
fn apply_env(dotenv: &HashMap<String, String>, xdg: &HashMap<String, String>) {
    let keys: HashSet<&String> = dotenv.keys().chain(xdg.keys()).collect();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(value) = dotenv.get(key).or_else(|| xdg.get(key)) {
            std::env::set_var(key, value);
        }
    }
}

fn load_from(
    xdg_path: Option<&Path>,
    override_dir: Option<&Path>,
) -> Result<BridgeSettings, LoadError> {
    let file = xdg_toml::load(xdg_path)?;
    let dotenv = dotenv_map(override_dir)?;
    apply_env(&dotenv, &file.env);
    Ok(file.bridge)
}

/// Loads XDG `config.toml` and optional project `.env`, sets environment variables only
/// for keys that are **not** already set, and returns the `[bridge]` settings.
///
/// * `app_name`: e.g. `"llm-bridge"`, used for `$XDG_CONFIG_HOME/<app_name>/config.toml`.
/// * `override_dir`: look for `.env` here instead of the current directory.
pub fn load_and_apply(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<BridgeSettings, LoadError> {
    let path = xdg_toml::config_path(app_name)?;
    load_from(path.as_deref(), override_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn xdg_file(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn existing_env_wins() {
        env::set_var("BRIDGE_CFG_TEST_EXISTING", "from_env");
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "BRIDGE_CFG_TEST_EXISTING=from_dotenv\n",
        )
        .unwrap();

        load_from(None, Some(dotenv_dir.path())).unwrap();

        assert_eq!(
            env::var("BRIDGE_CFG_TEST_EXISTING").as_deref(),
            Ok("from_env")
        );
        env::remove_var("BRIDGE_CFG_TEST_EXISTING");
    }

    #[test]
    fn no_config_anywhere_is_ok() {
        let empty = tempfile::tempdir().unwrap();
        let settings = load_from(None, Some(empty.path())).unwrap();
        assert_eq!(settings, BridgeSettings::default());
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let path = xdg_file(
            xdg_dir.path(),
            "[env]\nBRIDGE_CFG_TEST_PRIORITY = \"from_xdg\"\n",
        );
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "BRIDGE_CFG_TEST_PRIORITY=from_dotenv\n",
        )
        .unwrap();
        env::remove_var("BRIDGE_CFG_TEST_PRIORITY");

        load_from(Some(&path), Some(dotenv_dir.path())).unwrap();
        let value = env::var("BRIDGE_CFG_TEST_PRIORITY").unwrap();
        env::remove_var("BRIDGE_CFG_TEST_PRIORITY");

        assert_eq!(value, "from_dotenv");
    }

    #[test]
    fn xdg_applied_when_no_dotenv() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let path = xdg_file(
            xdg_dir.path(),
            "[env]\nBRIDGE_CFG_TEST_XDG_ONLY = \"from_xdg\"\n",
        );
        let empty = tempfile::tempdir().unwrap();
        env::remove_var("BRIDGE_CFG_TEST_XDG_ONLY");

        load_from(Some(&path), Some(empty.path())).unwrap();
        let value = env::var("BRIDGE_CFG_TEST_XDG_ONLY").unwrap();
        env::remove_var("BRIDGE_CFG_TEST_XDG_ONLY");

        assert_eq!(value, "from_xdg");
    }

    #[test]
    fn returns_bridge_table() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let path = xdg_file(
            xdg_dir.path(),
            "[bridge]\nprovider = \"openai\"\nrequest_timeout_secs = 30\n",
        );
        let empty = tempfile::tempdir().unwrap();

        let settings = load_from(Some(&path), Some(empty.path())).unwrap();

        assert_eq!(settings.provider.as_deref(), Some("openai"));
        assert_eq!(settings.request_timeout_secs, Some(30));
        assert!(settings.log_file.is_none());
    }

    #[test]
    fn dotenv_quoted_values_are_unquoted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# comment\nBRIDGE_A=\"hello world\"\nBRIDGE_B=plain\n",
        )
        .unwrap();

        let map = dotenv_map(Some(dir.path())).unwrap();

        assert_eq!(map.get("BRIDGE_A"), Some(&"hello world".to_string()));
        assert_eq!(map.get("BRIDGE_B"), Some(&"plain".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn missing_dotenv_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dotenv_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn invalid_xdg_toml_fails_with_xdg_parse_error() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let path = xdg_file(xdg_dir.path(), "invalid [[[\n");
        let empty = tempfile::tempdir().unwrap();

        let result = load_from(Some(&path), Some(empty.path()));

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
