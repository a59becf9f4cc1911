use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::MatchingConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Minutes a matching job may sit in processing before the sweep fails it.
    pub job_timeout_minutes: i64,
    /// Result-set cap for a match search.
    pub match_top_n: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            job_timeout_minutes: env::var("MATCHING_JOB_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("MATCHING_JOB_TIMEOUT_MINUTES must be a valid number")?,
            match_top_n: env::var("MATCH_TOP_N")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("MATCH_TOP_N must be a valid number")?,
        })
    }

    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            job_timeout: chrono::Duration::minutes(self.job_timeout_minutes),
            top_n: self.match_top_n,
        }
    }
}
