use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigParseError,
    PlanFileInvalid,
    DuplicateIssueId,
    IssueNotFound,
    SelfReference,
    CycleDetected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PlanFileInvalid => "E1003",
            Self::DuplicateIssueId => "E1004",
            Self::IssueNotFound => "E2001",
            Self::SelfReference => "E2002",
            Self::CycleDetected => "E2003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Config file not found",
            Self::ConfigParseError => "Config file parse error",
            Self::PlanFileInvalid => "Plan file could not be read",
            Self::DuplicateIssueId => "Plan file repeats an issue id",
            Self::IssueNotFound => "Issue not found",
            Self::SelfReference => "Issue cannot depend on itself",
            Self::CycleDetected => "Cycle would be created",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound => Some("Check the --config path or drop the flag."),
            Self::ConfigParseError => Some("Fix syntax in .plangraph/config.toml and retry."),
            Self::PlanFileInvalid => Some("Check that the plan file is valid JSON with an `issues` array."),
            Self::DuplicateIssueId => Some("Give every issue a unique id before editing the plan."),
            Self::IssueNotFound => None,
            Self::SelfReference => Some("Pick a different prerequisite."),
            Self::CycleDetected => Some("Remove/adjust dependency links to keep the graph acyclic."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Hard failures of the guarded mutation API.
///
/// A failed mutation never changes the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("issue '{0}' cannot depend on itself")]
    SelfReference(String),

    #[error("issue not found: {0}")]
    NotFound(String),

    #[error("adding {dependent} -> {prerequisite} would create a cycle: {}", path.join(" → "))]
    CycleDetected {
        dependent: String,
        prerequisite: String,
        /// Closed loop starting and ending at `dependent`.
        path: Vec<String>,
    },
}

/// Config resolution failures that are not parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ConfigNotFound,
        }
    }
}

impl GraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SelfReference(_) => ErrorCode::SelfReference,
            Self::NotFound(_) => ErrorCode::IssueNotFound,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ErrorCode, GraphError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigNotFound,
            ErrorCode::ConfigParseError,
            ErrorCode::PlanFileInvalid,
            ErrorCode::DuplicateIssueId,
            ErrorCode::IssueNotFound,
            ErrorCode::SelfReference,
            ErrorCode::CycleDetected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CycleDetected.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn cycle_error_displays_path() {
        let err = GraphError::CycleDetected {
            dependent: "A".to_string(),
            prerequisite: "C".to_string(),
            path: vec!["A".into(), "C".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.code(), ErrorCode::CycleDetected);
        let display = err.to_string();
        assert!(display.contains("A → C → B → A"), "display: {display}");
    }

    #[test]
    fn missing_config_has_its_own_code() {
        let err = ConfigError::NotFound("nope.toml".into());
        assert_eq!(err.code(), ErrorCode::ConfigNotFound);
        assert_eq!(err.code().code(), "E1001");
        assert!(err.to_string().contains("nope.toml"));
    }
}
