//! Analysis configuration loaded from `provgraph.toml`.
//!
//! Every section and field is optional; missing values fall back to the
//! library defaults.
//!
//! ```toml
//! [pagerank]
//! damping = 0.9
//! tolerance = 1e-6
//! max_iter = 100
//!
//! [dagify]
//! max_cycles = 10000
//! # max_iterations = 500
//!
//! [ancestry]
//! keying = "last_grandparent"   # or "predecessor"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use provgraph_core::cycles::DagifyConfig;
use provgraph_triage::{AncestorKeying, PageRankConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "provgraph.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub pagerank: PageRankConfig,
    #[serde(default)]
    pub dagify: DagifyConfig,
    #[serde(default)]
    pub ancestry: AncestryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AncestryConfig {
    #[serde(default)]
    pub keying: AncestorKeying,
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, `provgraph.toml` in `cwd` is
/// used when present, else the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> Result<AnalysisConfig> {
    let candidate = match path {
        Some(explicit) => explicit.to_path_buf(),
        None => {
            let default = cwd.join(CONFIG_FILE);
            if !default.is_file() {
                debug!("no config file, using defaults");
                return Ok(AnalysisConfig::default());
            }
            default
        }
    };

    let raw = std::fs::read_to_string(&candidate)
        .with_context(|| format!("read config {}", candidate.display()))?;
    let config: AnalysisConfig =
        toml::from_str(&raw).with_context(|| format!("parse config {}", candidate.display()))?;
    debug!(path = %candidate.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: AnalysisConfig = toml::from_str("").expect("parse");
        assert!((config.pagerank.damping - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.dagify.max_cycles, 10_000);
        assert_eq!(config.ancestry.keying, AncestorKeying::LastGrandparent);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AnalysisConfig = toml::from_str(
            "[pagerank]\ndamping = 0.85\n\n[dagify]\nmax_iterations = 3\n\n[ancestry]\nkeying = \"predecessor\"\n",
        )
        .expect("parse");
        assert!((config.pagerank.damping - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.pagerank.max_iter, 100);
        assert_eq!(config.dagify.max_iterations, Some(3));
        assert_eq!(config.dagify.max_cycles, 10_000);
        assert_eq!(config.ancestry.keying, AncestorKeying::Predecessor);
    }

    #[test]
    fn missing_default_file_is_fine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(None, dir.path()).expect("load");
        assert_eq!(config.dagify.max_iterations, None);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(err.to_string().contains("read config"));
    }
}
