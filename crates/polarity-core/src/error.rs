// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Polarity.

use thiserror::Error;

/// Top-level error type for all Polarity operations.
///
/// Every variant is fatal to a run: nothing in this system is retried.
#[derive(Debug, Error)]
pub enum PolarityError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    // -- Document access --
    #[error("document access failed: {0}")]
    DocumentAccess(String),

    // -- External tools (split/render/merge) --
    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PolarityError {
    /// Shorthand for an [`PolarityError::ExternalTool`] failure.
    pub fn external(
        tool: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PolarityError>;
