// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// polarity-document: document processing for Polarity.
//
// Provides content-stream color rewriting (K-channel inversion and per-channel
// transfer functions) and PDF operations (open, flatten, stream read/write,
// split, merge, annotation copy, atomic save).

pub mod content;
pub mod pdf;

// Re-export the primary items so callers can use `polarity_document::transform` etc.
pub use content::{
    ColorMapping, ColorOperator, RewriteStats, apply_transfer, transform, transform_with,
    transform_with_stats,
};
pub use pdf::{PdfDocument, StreamHandle, copy_annotations, merge_files};
