//! Configuration module for Campus-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file yields `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use campus_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Worker pool size: {}", config.crawler.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, RateLimitConfig, SearchConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
