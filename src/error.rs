#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the langstat crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a thoroughly documented error surface for library consumers.

use std::path::{Path, PathBuf};

use crate::publish::PublishState;

/// Unified error type returned by every stage of the publishing pipeline.
///
/// Each variant captures sufficient context for diagnostics while avoiding
/// accidental exposure of sensitive data: access tokens never appear in any
/// message, and git output is redacted before it is stored in
/// [`Error::Git`].
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors raised while touching the local filesystem.
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// Location that triggered the failure.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors of the configuration document.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration or an input violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps serialization errors when writing the statistics snapshot.
    #[error("failed to serialize statistics: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Returned when an API payload does not match the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Requested URL (never contains credentials).
        url:    String,
        /// Underlying decoding error.
        source: serde_json::Error
    },
    /// The API rejected the access token.
    #[error("authentication rejected by {url}")]
    Unauthorized {
        /// Requested URL (never contains credentials).
        url: String
    },
    /// The retry budget ran out before the API returned a successful status.
    #[error("request to {url} still failing with status {status} after {attempts} attempts")]
    Degraded {
        /// Requested URL (never contains credentials).
        url:      String,
        /// Status code of the last response.
        status:   u16,
        /// Number of requests issued before giving up.
        attempts: u32
    },
    /// Service errors when interacting with external APIs.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    },
    /// A version-control subprocess exited unsuccessfully.
    #[error("git {operation} failed: {message}")]
    Git {
        /// Operation that failed (`clone`, `add`, `commit`, `push`).
        operation: String,
        /// Redacted diagnostic output.
        message:   String
    },
    /// A publish step was requested from a state that does not allow it.
    #[error("cannot {operation} while publisher is {state}")]
    InvalidTransition {
        /// Requested operation.
        operation: &'static str,
        /// State the publisher was in.
        state:     PublishState
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the service error.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// This method is primarily intended for CLI contexts where the variant
    /// name does not add value to end users. The returned string matches the
    /// [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
