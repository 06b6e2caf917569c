use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three lifecycle states of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    /// `true` for anything that still has work left (open or in progress).
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Issue priority, `0` (most urgent) through `4` (least urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Self = Self(0);
    pub const LOWEST: Self = Self(4);

    /// Build a priority, clamping anything above 4 to 4.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > Self::LOWEST.0 {
            Self::LOWEST
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for Priority {
    type Error = ParseEnumError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= Self::LOWEST.0 {
            Ok(Self(value))
        } else {
            Err(ParseEnumError {
                expected: "priority (0-4)",
                got: value.to_string(),
            })
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// Duration estimate for one issue, in whole days.
///
/// Usually supplied by an external estimator; `confidence` and `reasoning`
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub min_days: u32,
    pub expected_days: u32,
    pub max_days: u32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl DurationEstimate {
    /// An estimate where all three bounds are `days`.
    #[must_use]
    pub const fn fixed(days: u32) -> Self {
        Self {
            min_days: days,
            expected_days: days,
            max_days: days,
            confidence: 0.0,
            reasoning: None,
        }
    }
}

/// One node of the dependency graph.
///
/// `dependencies` lists prerequisite ids in insertion order; an issue cannot
/// start until every prerequisite is closed. Only `id` is required when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<DurationEstimate>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Default for Issue {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: None,
            status: Status::Open,
            priority: Priority::default(),
            estimate: None,
            dependencies: Vec::new(),
        }
    }
}

impl Issue {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_estimate(mut self, estimate: DurationEstimate) -> Self {
        self.estimate = Some(estimate);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a prerequisite without any validation. Duplicates are ignored.
    #[must_use]
    pub fn depends_on(mut self, prerequisite: impl Into<String>) -> Self {
        let prerequisite = prerequisite.into();
        if !self.dependencies.contains(&prerequisite) {
            self.dependencies.push(prerequisite);
        }
        self
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "in_progress" | "doing" => Ok(Self::InProgress),
            "closed" | "done" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let digits = normalized.strip_prefix('p').unwrap_or(&normalized);
        digits
            .parse::<u8>()
            .ok()
            .and_then(|value| Self::try_from(value).ok())
            .ok_or_else(|| ParseEnumError {
                expected: "priority (0-4)",
                got: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{DurationEstimate, Issue, Priority, Status};
    use std::str::FromStr;

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(serde_json::to_string(&Status::Open).unwrap(), "\"open\"");
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<Status>("\"closed\"").unwrap(),
            Status::Closed
        );
        assert_eq!(serde_json::to_string(&Priority::new(1)).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<Priority>("3").unwrap(),
            Priority::new(3)
        );
    }

    #[test]
    fn priority_out_of_range_is_rejected_by_serde_and_clamped_by_new() {
        assert!(serde_json::from_str::<Priority>("7").is_err());
        assert_eq!(Priority::new(9), Priority::LOWEST);
        assert_eq!(Priority::default().value(), 2);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Status::from_str("In Progress").unwrap(), Status::InProgress);
        assert_eq!(Status::from_str("done").unwrap(), Status::Closed);
        assert_eq!(Priority::from_str("P0").unwrap(), Priority::HIGHEST);
        assert!(Status::from_str("blocked").is_err());
        assert!(Priority::from_str("p5").is_err());
    }

    #[test]
    fn issue_deserializes_with_defaults() {
        let issue: Issue = serde_json::from_str(r#"{"id": "a", "title": "A"}"#).unwrap();
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.priority, Priority::default());
        assert!(issue.dependencies.is_empty());
        assert!(issue.estimate.is_none());
    }

    #[test]
    fn issue_without_id_is_rejected() {
        let err = serde_json::from_str::<Issue>(r#"{"title": "A"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"), "error: {err}");

        let bare: Issue = serde_json::from_str(r#"{"id": "b"}"#).unwrap();
        assert_eq!(bare.id, "b");
        assert!(bare.title.is_empty());
    }

    #[test]
    fn depends_on_keeps_set_semantics() {
        let issue = Issue::new("c", "C").depends_on("a").depends_on("b").depends_on("a");
        assert_eq!(issue.dependencies, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn fixed_estimate_has_equal_bounds() {
        let estimate = DurationEstimate::fixed(4);
        assert_eq!(estimate.min_days, 4);
        assert_eq!(estimate.expected_days, 4);
        assert_eq!(estimate.max_days, 4);
    }
}
