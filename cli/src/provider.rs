//! Provider registry: maps a configured name onto a remote-call capability.

use std::str::FromStr;

use stream_event::ErrorCode;
use thiserror::Error;

pub const DEFAULT_PROVIDER: &str = "openai";

/// Remote-call capabilities compiled into this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
}

impl Provider {
    pub const ALL: &'static [Provider] = &[Provider::OpenAi];

    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("provider `{name}` is not available (known providers: {known})")]
pub struct UnknownProvider {
    pub name: String,
    pub known: String,
}

impl UnknownProvider {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::MissingProvider
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownProvider {
                name: wanted.to_string(),
                known: Provider::ALL
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
