//! Command-line arguments and their merge with the `[bridge]` config table.
//!
//! Precedence per setting: flag, then its environment variable (clap `env`), then
//! `config.toml`, then the built-in default.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::BridgeSettings;

use crate::provider::DEFAULT_PROVIDER;

#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "llm-bridge")]
#[command(about = "Line-delimited bridge: chat-completion requests on stdin, JSON events on stdout")]
pub struct Args {
    /// Remote-call provider (default: openai)
    #[arg(long, env = "LLM_BRIDGE_PROVIDER", value_name = "NAME")]
    pub provider: Option<String>,

    /// Per-request timeout in seconds; 0 or unset waits forever
    #[arg(long, env = "LLM_BRIDGE_REQUEST_TIMEOUT_SECS", value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Endpoint used when a request has no base_url
    #[arg(long, env = "OPENAI_BASE_URL", value_name = "URL")]
    pub default_base_url: Option<String>,

    /// Append logs to this file; without it logs are dropped
    #[arg(long, env = "LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Effective settings for one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub provider: String,
    pub request_timeout: Option<Duration>,
    pub default_base_url: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl RunSettings {
    pub fn resolve(args: Args, file: BridgeSettings) -> Self {
        let provider = args
            .provider
            .or(file.provider)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let request_timeout = args
            .request_timeout_secs
            .or(file.request_timeout_secs)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);
        let default_base_url = args
            .default_base_url
            .or(file.default_base_url)
            .filter(|u| !u.trim().is_empty());
        Self {
            provider,
            request_timeout,
            default_base_url,
            log_file: args.log_file.or(file.log_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_table() {
        let args = Args::try_parse_from([
            "llm-bridge",
            "--provider",
            "openai",
            "--request-timeout-secs",
            "30",
        ])
        .unwrap();
        let file = BridgeSettings {
            provider: Some("other".into()),
            request_timeout_secs: Some(5),
            default_base_url: Some("http://localhost:8000/v1".into()),
            log_file: None,
        };

        let settings = RunSettings::resolve(args, file);

        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            settings.default_base_url.as_deref(),
            Some("http://localhost:8000/v1")
        );
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = RunSettings::resolve(Args::default(), BridgeSettings::default());

        assert_eq!(settings.provider, DEFAULT_PROVIDER);
        assert_eq!(settings.request_timeout, None);
        assert_eq!(settings.default_base_url, None);
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let args = Args {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        let settings = RunSettings::resolve(args, BridgeSettings::default());
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn blank_provider_falls_back_to_default() {
        let args = Args {
            provider: Some("  ".into()),
            ..Default::default()
        };
        let settings = RunSettings::resolve(args, BridgeSettings::default());
        assert_eq!(settings.provider, DEFAULT_PROVIDER);
    }
}
