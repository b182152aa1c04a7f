use std::env;
use std::path::PathBuf;
use crate::error::{Result, ScrapeError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const STORAGE_PATH: &'static str = "SONGSCRAPE_STORAGE_PATH";
    pub const STORAGE_KEY: &'static str = "SONGSCRAPE_STORAGE_KEY";
    pub const START_URL: &'static str = "SONGSCRAPE_START_URL";
    pub const DEFAULT_GENRE: &'static str = "SONGSCRAPE_DEFAULT_GENRE";
    pub const USER_AGENT: &'static str = "SONGSCRAPE_USER_AGENT";
    pub const REQUEST_TIMEOUT_SECONDS: &'static str = "SONGSCRAPE_REQUEST_TIMEOUT_SECONDS";
    pub const FIRST_ARTIST_INDEX: &'static str = "SONGSCRAPE_FIRST_ARTIST_INDEX";
    pub const MAX_ARTISTS: &'static str = "SONGSCRAPE_MAX_ARTISTS";
    pub const MAX_TITLES: &'static str = "SONGSCRAPE_MAX_TITLES";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(ScrapeError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Parse environment variable as PathBuf with validation
    pub fn parse_path(var_name: &str, should_exist: bool) -> Result<Option<PathBuf>> {
        if let Some(path_str) = Self::parse_string(var_name, None)? {
            let path = PathBuf::from(path_str);

            if should_exist && !path.exists() {
                return Err(ScrapeError::Validation(format!(
                    "Path specified in {} does not exist: {}",
                    var_name,
                    path.display()
                )));
            }

            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<u64>().map_err(|_| {
                ScrapeError::Validation(format!(
                    "Invalid number in {}: '{}'. Must be a positive integer",
                    var_name, value_str
                ))
            })?;

            Self::check_range(var_name, value, min, max)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as usize with range validation
    pub fn parse_usize(var_name: &str, min: usize, max: usize) -> Result<Option<usize>> {
        Ok(Self::parse_u64(var_name, min as u64, max as u64)?.map(|value| value as usize))
    }

    fn check_range(var_name: &str, value: u64, min: u64, max: u64) -> Result<()> {
        if value < min || value > max {
            return Err(ScrapeError::Validation(format!(
                "Value in {} must be between {} and {}, got {}",
                var_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Get all SONGSCRAPE environment variables for debugging
    pub fn get_all_vars() -> Vec<(String, String)> {
        env::vars()
            .filter(|(key, _)| key.starts_with("SONGSCRAPE_"))
            .collect()
    }
}
