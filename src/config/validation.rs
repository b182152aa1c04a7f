use std::path::Path;
use crate::core::page::document::parse_selector;
use crate::core::page::source::parse_location;
use crate::core::schedule::DelayRange;
use crate::error::{Result, ScrapeError};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a page location (absolute URL or snapshot path)
    pub fn validate_location(location: &str, field_name: &str) -> Result<()> {
        parse_location(location).map_err(|e| {
            ScrapeError::Validation(format!("Invalid {} location '{}': {}", field_name, location, e))
        })?;
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ScrapeError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate a randomized delay: non-zero and not inverted
    pub fn validate_delay_range(range: &DelayRange, field_name: &str) -> Result<()> {
        if range.min == 0 {
            return Err(ScrapeError::Validation(format!(
                "{} minimum must be greater than zero",
                field_name
            )));
        }
        if range.min > range.max {
            return Err(ScrapeError::Validation(format!(
                "{} minimum {} is greater than maximum {}",
                field_name, range.min, range.max
            )));
        }
        Ok(())
    }

    pub fn validate_not_empty(value: &str, field_name: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ScrapeError::Validation(format!("{} must not be empty", field_name)));
        }
        Ok(())
    }

    /// Validate a CSS selector parses
    pub fn validate_selector(selector: &str, field_name: &str) -> Result<()> {
        parse_selector(selector).map_err(|e| {
            ScrapeError::Validation(format!("Invalid {} selector: {}", field_name, e))
        })?;
        Ok(())
    }

    /// Validate storage file extension
    pub fn validate_db_path(path: &Path) -> Result<()> {
        if let Some(ext) = path.extension() {
            if ext != "db" && ext != "sqlite" && ext != "sqlite3" {
                return Err(ScrapeError::Validation(format!(
                    "Storage file should have .db, .sqlite, or .sqlite3 extension, got: {}",
                    path.display()
                )));
            }
        } else {
            return Err(ScrapeError::Validation(format!(
                "Storage file should have an extension (.db, .sqlite, .sqlite3), got: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_location() {
        assert!(ConfigValidator::validate_location("https://music.example.com/genre/rock", "start").is_ok());
        assert!(ConfigValidator::validate_location("snapshots/listing.html", "start").is_ok());
    }

    #[test]
    fn test_validate_range() {
        assert!(ConfigValidator::validate_range(5u64, 1u64, 10u64, "test").is_ok());
        assert!(ConfigValidator::validate_range(15u64, 1u64, 10u64, "test").is_err());
        assert!(ConfigValidator::validate_range(0u64, 1u64, 10u64, "test").is_err());
    }

    #[test]
    fn test_validate_delay_range() {
        assert!(ConfigValidator::validate_delay_range(&DelayRange::new(2500, 3500), "d").is_ok());
        assert!(ConfigValidator::validate_delay_range(&DelayRange::new(200, 200), "d").is_ok());
        assert!(ConfigValidator::validate_delay_range(&DelayRange::new(0, 100), "d").is_err());
        assert!(ConfigValidator::validate_delay_range(&DelayRange::new(500, 100), "d").is_err());
    }

    #[test]
    fn test_validate_selector() {
        assert!(ConfigValidator::validate_selector(".sidebar-track .sidebar-track__title a", "title").is_ok());
        assert!(ConfigValidator::validate_selector("a[", "title").is_err());
    }

    #[test]
    fn test_validate_db_path() {
        assert!(ConfigValidator::validate_db_path(&PathBuf::from("test.db")).is_ok());
        assert!(ConfigValidator::validate_db_path(&PathBuf::from("test.sqlite")).is_ok());
        assert!(ConfigValidator::validate_db_path(&PathBuf::from("test.sqlite3")).is_ok());
        assert!(ConfigValidator::validate_db_path(&PathBuf::from("test.txt")).is_err());
        assert!(ConfigValidator::validate_db_path(&PathBuf::from("test")).is_err());
    }
}
