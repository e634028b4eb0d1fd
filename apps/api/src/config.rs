use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default upload limit for resume files: 5 MiB.
const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
/// Sessions idle longer than this are evicted. One hour.
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 60 * 60;

/// Which backend produces fit recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommenderBackend {
    Llm,
    Keyword,
}

impl RecommenderBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "keyword" => Ok(Self::Keyword),
            other => bail!("RECOMMENDER must be 'llm' or 'keyword', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub recommender: RecommenderBackend,
    pub max_resume_bytes: usize,
    pub session_idle_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let recommender = match std::env::var("RECOMMENDER") {
            Ok(v) => RecommenderBackend::parse(&v)?,
            Err(_) => RecommenderBackend::Llm,
        };

        Ok(Config {
            // The job searcher always goes through the LLM, so the key is required.
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            recommender,
            max_resume_bytes: match std::env::var("MAX_RESUME_BYTES") {
                Ok(v) => v
                    .parse::<usize>()
                    .context("MAX_RESUME_BYTES must be a positive integer")?,
                Err(_) => DEFAULT_MAX_RESUME_BYTES,
            },
            session_idle_ttl: Duration::from_secs(
                std::env::var("SESSION_IDLE_TTL_SECS")
                    .unwrap_or_else(|_| DEFAULT_SESSION_IDLE_TTL_SECS.to_string())
                    .parse::<u64>()
                    .context("SESSION_IDLE_TTL_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
