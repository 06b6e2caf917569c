//! Issue data model shared by every engine component.

pub mod issue;

pub use issue::{DurationEstimate, Issue, ParseEnumError, Priority, Status};
