//! Security analysis and warning detection.
//!
//! This module analyzes HTTP responses and TLS configurations to identify
//! security issues and best practice violations:
//! - Missing HTTPS
//! - Weak TLS versions
//! - Missing security headers (HSTS, CSP, etc.)
//!
//! Warnings are stored in the database for later analysis.

mod analysis;
mod types;
mod url_validation;

pub use analysis::analyze_security;
pub use types::SecurityWarning;
pub use url_validation::validate_url_safe;
