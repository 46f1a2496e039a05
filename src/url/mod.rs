//! URL handling module for Campus-Scout
//!
//! This module provides URL normalization for frontier de-duplication,
//! domain and origin extraction for rate limiting and same-site checks,
//! and wildcard matching for the configured skip list.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, is_same_site, origin_key, site_host};
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::normalize_url;
