use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Tunables for every engine pass, loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub importance: ImportanceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Soft limit on open issues before callers are warned. Never enforced.
    #[serde(default = "default_warn_node_count")]
    pub warn_node_count: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            warn_node_count: default_warn_node_count(),
        }
    }
}

/// Geometry of the layered drawing. All lengths are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub padding: f64,
    pub node_width: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub header_height: f64,
    pub line_height: f64,
    pub max_description_lines: usize,
    pub chars_per_line: usize,
    pub barycenter_iterations: usize,
    pub include_closed: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 40.0,
            node_width: 240.0,
            horizontal_gap: 80.0,
            vertical_gap: 24.0,
            header_height: 56.0,
            line_height: 18.0,
            max_description_lines: 3,
            chars_per_line: 32,
            barycenter_iterations: 4,
            include_closed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Duration used for every bound when an issue has no estimate.
    pub default_expected_days: u32,
    /// Schedule closed issues too instead of treating them as finished.
    pub include_closed: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_expected_days: 3,
            include_closed: false,
        }
    }
}

/// How dependents are counted when scoring a blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportancePolicy {
    /// Every open dependent counts once.
    #[default]
    Uniform,
    /// Dependents count `5 - priority`, so P0 work weighs five times P4.
    PriorityWeighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportanceConfig {
    #[serde(default)]
    pub policy: ImportancePolicy,
}

const fn default_warn_node_count() -> usize {
    20
}

/// Load a config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<PlanConfig> {
    if !path.exists() {
        return Ok(PlanConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<PlanConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Candidate config locations, highest precedence first.
///
/// An explicit path wins, then `.plangraph/config.toml` under `project_root`,
/// then the per-user config directory.
pub fn config_search_path(explicit: Option<&Path>, project_root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
        return paths;
    }
    paths.push(project_root.join(".plangraph/config.toml"));
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("plangraph/config.toml"));
    }
    paths
}

/// Resolve the effective config: the first existing file on the search path.
///
/// An explicit path that does not exist fails with [`ConfigError::NotFound`]
/// rather than falling back silently.
pub fn resolve_config(explicit: Option<&Path>, project_root: &Path) -> Result<PlanConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
    }

    for path in config_search_path(explicit, project_root) {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            return load_config(&path);
        }
    }

    Ok(PlanConfig::default())
}
