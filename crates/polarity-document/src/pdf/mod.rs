// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: opening, flattening, stream access, splitting, merging,
// annotation copy and atomic saving.

pub mod annotations;
mod clone;
pub mod document;
pub mod pages;

pub use annotations::copy_annotations;
pub use document::{PdfDocument, StreamHandle};
pub use pages::merge_files;
