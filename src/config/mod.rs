//! Configuration module for the volunteer backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::completion::{RequiredField, DEFAULT_REQUIRED_FIELDS};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Profile fields counted by the completion percentage
    pub required_fields: Vec<RequiredField>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("VOLUNTEER_API_PSK").ok();

        let db_path = env::var("VOLUNTEER_DB_PATH")
            .unwrap_or_else(|_| "./data/volunteers.sqlite".to_string())
            .into();

        let bind_addr = env::var("VOLUNTEER_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid VOLUNTEER_BIND_ADDR format");

        let log_level = env::var("VOLUNTEER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let required_fields = env::var("VOLUNTEER_REQUIRED_FIELDS")
            .map(|list| parse_required_fields(&list))
            .unwrap_or_else(|_| DEFAULT_REQUIRED_FIELDS.to_vec());

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            required_fields,
        }
    }
}

/// Parse a comma-separated field list, skipping unknown names and duplicates.
pub fn parse_required_fields(list: &str) -> Vec<RequiredField> {
    let mut fields = Vec::new();
    for name in list.split(',').filter(|s| !s.trim().is_empty()) {
        match name.parse::<RequiredField>() {
            Ok(field) if !fields.contains(&field) => fields.push(field),
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring VOLUNTEER_REQUIRED_FIELDS entry: {}", e),
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("VOLUNTEER_API_PSK");
        env::remove_var("VOLUNTEER_DB_PATH");
        env::remove_var("VOLUNTEER_BIND_ADDR");
        env::remove_var("VOLUNTEER_LOG_LEVEL");
        env::remove_var("VOLUNTEER_REQUIRED_FIELDS");

        let config = Config::from_env();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/volunteers.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.required_fields, DEFAULT_REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn test_parse_required_fields() {
        let fields = parse_required_fields("firstName, phone,unknown,,phone,skills");

        assert_eq!(
            fields,
            vec![
                RequiredField::FirstName,
                RequiredField::Phone,
                RequiredField::Skills
            ]
        );
        assert!(parse_required_fields("").is_empty());
    }
}
