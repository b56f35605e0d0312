use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const DEFAULT_LLM_MODEL: &str = "qwen-turbo";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub transcription_api_key: String,
    pub transcription_base_url: String,
    pub transcription_model: String,
    pub transcription_language: String,
    /// Polling period shared by both schedulers.
    pub scheduler_interval: Duration,
    /// How long a scheduler claim on an interview stays valid.
    pub scheduler_lease: Duration,
    /// Upper bound for a single call to the generation or transcription service.
    pub upstream_timeout: Duration,
    /// Number of questions requested per interview.
    pub question_count: u32,
    pub max_audio_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_api_key = require_env("LLM_API_KEY")?;
        let llm_base_url = optional_env("LLM_BASE_URL", DEFAULT_LLM_BASE_URL);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            transcription_api_key: optional_env("TRANSCRIPTION_API_KEY", &llm_api_key),
            transcription_base_url: optional_env("TRANSCRIPTION_BASE_URL", &llm_base_url),
            transcription_model: optional_env("TRANSCRIPTION_MODEL", DEFAULT_TRANSCRIPTION_MODEL),
            transcription_language: optional_env("TRANSCRIPTION_LANGUAGE", "zh"),
            llm_model: optional_env("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_api_key,
            llm_base_url,
            scheduler_interval: Duration::from_secs(parse_env("SCHEDULER_INTERVAL_SECS", 300)?),
            scheduler_lease: Duration::from_secs(parse_env("SCHEDULER_LEASE_SECS", 900)?),
            upstream_timeout: Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECS", 120)?),
            question_count: parse_env("QUESTION_COUNT", 10)?,
            max_audio_bytes: parse_env("MAX_AUDIO_BYTES", 25 * 1024 * 1024)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for router tests; no variable is read from the environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/interview_test".to_string(),
            llm_api_key: "test-key".to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            transcription_api_key: "test-key".to_string(),
            transcription_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcription_language: "zh".to_string(),
            scheduler_interval: Duration::from_secs(300),
            scheduler_lease: Duration::from_secs(900),
            upstream_timeout: Duration::from_secs(5),
            question_count: 3,
            max_audio_bytes: 1024,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
