//! The JSON plan file every command reads (and mutating commands rewrite).
//!
//! ```json
//! {
//!   "issues": [{ "id": "A", "title": "Design", "dependencies": [] }],
//!   "estimates": { "A": { "min_days": 1, "expected_days": 2, "max_days": 4 } },
//!   "critical_path": ["A"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use plangraph_core::GraphEngine;
use plangraph_core::model::{DurationEstimate, Issue};
use plangraph_plan::EstimateSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub estimates: BTreeMap<String, DurationEstimate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_path: Option<Vec<String>>,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn engine(&self) -> GraphEngine {
        GraphEngine::from_issues(self.issues.iter().cloned())
    }

    /// Ids that appear on more than one issue, sorted. The engine keeps only
    /// the last of each, so these plans must not be written back.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let duplicates: BTreeSet<&str> = self
            .issues
            .iter()
            .map(|issue| issue.id.as_str())
            .filter(|id| !seen.insert(*id))
            .collect();
        duplicates.into_iter().collect()
    }

    /// Replace the issue list with the engine's current state.
    pub fn update_from(&mut self, engine: &GraphEngine) {
        self.issues = engine.issues().to_vec();
    }

    pub fn estimate_set(&self) -> EstimateSet {
        EstimateSet {
            estimates: self
                .estimates
                .iter()
                .map(|(id, estimate)| (id.clone(), estimate.clone()))
                .collect(),
            critical_path: self.critical_path.clone(),
        }
    }
}
