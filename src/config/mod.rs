//! Configuration module for the forum backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Site-level presentation settings
    pub site: SiteSettings,
}

/// Site settings consumed by the category-list assembly: the synthetic
/// uncategorized entry's identity and the featured-topic fetch bound.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub uncategorized_name: String,
    pub uncategorized_color: String,
    pub uncategorized_text_color: String,
    /// Upper bound on topics fetched for the uncategorized entry
    pub featured_topics_limit: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("FORUM_DB_PATH")
            .unwrap_or_else(|_| "./data/forum.sqlite".to_string())
            .into();

        let bind_addr = env::var("FORUM_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid FORUM_BIND_ADDR format");

        let log_level = env::var("FORUM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let uncategorized_name =
            env::var("FORUM_UNCATEGORIZED_NAME").unwrap_or_else(|_| "Uncategorized".to_string());
        let uncategorized_color =
            env::var("FORUM_UNCATEGORIZED_COLOR").unwrap_or_else(|_| "AB9364".to_string());
        let uncategorized_text_color =
            env::var("FORUM_UNCATEGORIZED_TEXT_COLOR").unwrap_or_else(|_| "FFFFFF".to_string());
        let featured_topics_limit = env::var("FORUM_FEATURED_TOPICS_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(6);

        Self {
            db_path,
            bind_addr,
            log_level,
            site: SiteSettings {
                uncategorized_name,
                uncategorized_color,
                uncategorized_text_color,
                featured_topics_limit,
            },
        }
    }
}
