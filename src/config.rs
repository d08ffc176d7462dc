use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::cipher::CodecKind;
use crate::dispatch::DedupConfig;
use crate::quiz::DEFAULT_TIMEOUT_SECS;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub quiz_dir: PathBuf,
    pub cipher: CodecKind,
    pub cipher_secret: Option<String>,
    pub dedup: DedupConfig,
    pub default_timeout_secs: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            quiz_dir: PathBuf::from("quizzes"),
            cipher: CodecKind::Noop,
            cipher_secret: None,
            dedup: DedupConfig::default(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cipher = match get("LIVEQUIZ_CIPHER") {
            Some(value) => {
                CodecKind::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                    key: "LIVEQUIZ_CIPHER",
                    reason: format!(
                        "expected one of {}",
                        CodecKind::iter()
                            .map(|k| k.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                    value,
                })?
            }
            None => defaults.cipher,
        };

        let ttl_secs: i64 = parse_number(
            "LIVEQUIZ_DEDUP_TTL_SECS",
            get("LIVEQUIZ_DEDUP_TTL_SECS"),
            defaults.dedup.ttl.num_seconds(),
        )?;
        let capacity: usize = parse_number(
            "LIVEQUIZ_DEDUP_CAPACITY",
            get("LIVEQUIZ_DEDUP_CAPACITY"),
            defaults.dedup.capacity,
        )?;

        Ok(Self {
            bind_addr: get("LIVEQUIZ_BIND_ADDR").unwrap_or(defaults.bind_addr),
            quiz_dir: get("LIVEQUIZ_QUIZ_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.quiz_dir),
            cipher,
            cipher_secret: get("LIVEQUIZ_CIPHER_SECRET"),
            dedup: DedupConfig {
                ttl: Duration::seconds(ttl_secs),
                capacity,
            },
            default_timeout_secs: parse_number(
                "LIVEQUIZ_DEFAULT_TIMEOUT_SECS",
                get("LIVEQUIZ_DEFAULT_TIMEOUT_SECS"),
                defaults.default_timeout_secs,
            )?,
        })
    }
}

fn parse_number<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
    }
}
