// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Actionable hints printed under fatal errors.
//
// The error message says what failed. The hint says what the user can do
// about it, when there is something obvious to do.

use crate::error::PolarityError;

/// Suggest a next step for `err`, if one is known.
pub fn hint_for(err: &PolarityError) -> Option<String> {
    match err {
        PolarityError::InvalidConfiguration(detail) => {
            if detail.contains("pages but the layout") {
                Some(
                    "The layout describes a different edition of the book. Pass a matching \
                     layout with --layout."
                        .to_string(),
                )
            } else {
                Some("Check the --config and --layout files.".to_string())
            }
        }

        PolarityError::DocumentAccess(detail) => {
            if detail.contains("failed to open") {
                Some("Make sure the input path points to a readable, unencrypted PDF.".to_string())
            } else {
                None
            }
        }

        PolarityError::ExternalTool { tool, status, .. } => {
            if status.contains("not found") || status.contains("spawn") {
                Some(format!(
                    "`{tool}` could not be started. Install it (pdfseparate and pdfunite ship \
                     with poppler-utils, gs with Ghostscript) or use --strategy native-split."
                ))
            } else if status.contains("timed out") {
                Some("Raise the limit with --timeout.".to_string())
            } else {
                None
            }
        }

        PolarityError::Io(_) | PolarityError::Serialization(_) => None,
    }
}
