//! URL handling module for Site-Radius
//!
//! This module provides URL normalization, domain extraction, and the
//! same-site test that keeps the crawl on the seed's host.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_site};
pub use normalize::normalize_url;
