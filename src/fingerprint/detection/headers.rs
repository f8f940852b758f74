//! Header-based technology detection.
//!
//! This module matches technologies based on HTTP response headers,
//! following wappalyzergo's `checkHeaders()` and `matchMapString(headers, headersPart)` logic.

use std::collections::HashMap;

use crate::fingerprint::patterns::matches_pattern;
use crate::fingerprint::ruleset::get_ruleset;

/// Result of header matching for a single technology
#[derive(Debug, Clone)]
pub struct HeaderMatchResult {
    pub tech_name: String,
    pub version: Option<String>,
}

/// Checks all technologies against headers and returns matches.
///
/// This matches wappalyzergo's `checkHeaders()` â†’ `matchMapString(headers, headersPart)` flow.
pub async fn check_headers(
    headers: &HashMap<String, String>,
) -> anyhow::Result<Vec<HeaderMatchResult>> {
    let ruleset = get_ruleset()
        .await
        .ok_or_else(|| {
            anyhow::anyhow!("Ruleset not initialized. Call init_ruleset() before running detection.")
        })?;

    let mut results = Vec::new();

    for (tech_name, tech) in &ruleset.technologies {
        if tech.headers.is_empty() {
            continue;
        }

        let mut matched = false;
        let mut version: Option<String> = None;

        for (header_name, pattern) in &tech.headers {
            if let Some(header_value) = headers.get(header_name) {
                if pattern.is_empty() {
                    // Empty pattern means header exists (value doesn't matter)
                    matched = true;
                    break;
                }

                let result = matches_pattern(pattern, header_value);
                if result.matched {
                    matched = true;
                    if version.is_none() && result.version.is_some() {
                        version = result.version.clone();
                    }
                    // wappalyzergo breaks after first match with version
                    if version.is_some() {
                        break;
                    }
                }
            }
        }

        if matched {
            results.push(HeaderMatchResult {
                tech_name: tech_name.clone(),
                version,
            });
        }
    }

    Ok(results)
}
