// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::set_id::SetId;

/// A human-readable error, printed by `main` before exiting.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("invalid configuration: {value}"))
    }
}

#[cfg(test)]
impl From<reqwest::Error> for ErrorReport {
    fn from(value: reqwest::Error) -> Self {
        ErrorReport::new(format!("HTTP error: {value}"))
    }
}

/// Errors raised by the drill engine and the answer evaluators. These are
/// usage errors: the caller can re-prompt and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillError {
    /// There are no cards to drill.
    EmptySet,
    /// The session has completed, so there is no current card.
    NoActiveCard,
    /// A self-reported verdict was submitted before the card was flipped.
    NotRevealed,
    /// The result of the previous answer is still on screen.
    ShowingResult,
}

impl Display for DrillError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DrillError::EmptySet => write!(f, "the study set has no cards."),
            DrillError::NoActiveCard => write!(f, "the drill session has no active card."),
            DrillError::NotRevealed => write!(f, "flip the card before marking it."),
            DrillError::ShowingResult => write!(f, "the previous result is still being shown."),
        }
    }
}

impl Error for DrillError {}

impl From<DrillError> for ErrorReport {
    fn from(value: DrillError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// Errors raised by the card stores.
#[derive(Debug)]
pub enum StoreError {
    /// No study set with the given ID exists.
    NotFound(SetId),
    /// The study set exists, but has no cards.
    Empty(SetId),
    /// The caller does not own the study set.
    Forbidden(SetId),
    /// The submitted study set failed validation.
    Invalid(String),
    /// The underlying storage failed.
    Backend(ErrorReport),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "study set {id} not found."),
            StoreError::Empty(id) => write!(f, "study set {id} has no flashcards."),
            StoreError::Forbidden(id) => {
                write!(f, "you don't have permission to modify study set {id}.")
            }
            StoreError::Invalid(message) => write!(f, "{message}"),
            StoreError::Backend(report) => write!(f, "{report}"),
        }
    }
}

impl Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Backend(value.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Backend(value.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Backend(value.into())
    }
}

impl From<ErrorReport> for StoreError {
    fn from(value: ErrorReport) -> Self {
        StoreError::Backend(value)
    }
}

impl From<StoreError> for ErrorReport {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Backend(report) => report,
            other => ErrorReport::new(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let err: Fallible<()> = fail("directory does not exist.");
        assert_eq!(
            err.unwrap_err().to_string(),
            "error: directory does not exist."
        );
    }

    #[test]
    fn test_store_error_into_report() {
        let err = StoreError::NotFound(SetId::new("42"));
        let report: ErrorReport = err.into();
        assert_eq!(report.to_string(), "error: study set 42 not found.");
    }

    #[test]
    fn test_backend_error_is_not_wrapped_twice() {
        let err = StoreError::Backend(ErrorReport::new("disk full"));
        let report: ErrorReport = err.into();
        assert_eq!(report.to_string(), "error: disk full");
    }
}
