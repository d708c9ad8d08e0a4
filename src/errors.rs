//! Error types for the coaching controller.
//!
//! Fatal errors (`ValidationError`, `CatalogIntegrityError`) abort the turn
//! and leave the caller's `SessionState` untouched. `CollaboratorFailure` is
//! never surfaced as a turn failure: every call site resolves it to its
//! fail-open default.

use thiserror::Error;

/// Malformed input handed to the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A signal delta component fell outside `[-5, 5]`.
    #[error("delta for {field} out of range: {value} (allowed -5..=5)")]
    DeltaOutOfRange { field: &'static str, value: i8 },

    /// An emotional-state field fell outside `[0, 5]`.
    #[error("emotional state {field} out of range: {value} (allowed 0..=5)")]
    StateOutOfRange { field: &'static str, value: u8 },

    /// A step id referenced by configuration or a resumed session is unknown.
    #[error("unknown step id: {step_id}")]
    UnknownStep { step_id: String },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// The step catalog disagrees with itself. Always a programming defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogIntegrityError {
    /// The session points at a step the catalog does not contain.
    #[error("current step not found in catalog: {step_id}")]
    MissingStep { step_id: String },

    /// A transition function returned an id the catalog does not contain.
    #[error("transition from {from} returned unknown step id: {to}")]
    UnknownTransition { from: String, to: String },
}

/// An external collaborator (refiner, rewriter, generator) misbehaved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorFailure {
    /// The collaborator returned an error.
    #[error("{collaborator} failed: {message}")]
    Failed {
        collaborator: &'static str,
        message: String,
    },

    /// The collaborator did not answer within its deadline.
    #[error("{collaborator} timed out after {timeout_ms}ms")]
    TimedOut {
        collaborator: &'static str,
        timeout_ms: u64,
    },

    /// The collaborator answered with nothing usable.
    #[error("{collaborator} returned no usable output")]
    Empty { collaborator: &'static str },
}

impl CollaboratorFailure {
    pub fn failed(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            collaborator,
            message: message.into(),
        }
    }
}

/// Turn-level error returned by the orchestrator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    CatalogIntegrity(#[from] CatalogIntegrityError),

    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether the error indicates a defect in the step catalog.
    pub fn is_catalog_defect(&self) -> bool {
        matches!(self, Self::CatalogIntegrity(_))
    }
}

/// Errors loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("environment variable {name} has invalid value {value:?}")]
    Env { name: &'static str, value: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
