// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page tool backends for the split/render/merge pipeline.

pub mod external;
pub mod native;

use std::future::Future;
use std::path::{Path, PathBuf};

use polarity_core::{Strategy, TransferFunction};
use polarity_core::error::{PolarityError, Result};
use polarity_document::RewriteStats;

pub use external::ExternalTools;
pub use native::NativeTools;

/// The three per-page operations the split/render/merge pipeline needs.
///
/// Implementations must be safe to call concurrently; `render` is invoked for
/// many pages at once.
pub trait PageTools: Send + Sync {
    /// The strategy this backend implements.
    fn strategy(&self) -> Strategy;

    /// Write every page of `input` to its own file in `dir`, returning the
    /// files in page order.
    fn split(&self, input: &Path, dir: &Path) -> impl Future<Output = Result<Vec<PathBuf>>> + Send;

    /// Write `page` to `output` with `transfer` applied to its colors.
    ///
    /// Returns the operators rewritten if the backend can tell.
    fn render(
        &self,
        page: &Path,
        transfer: &TransferFunction,
        output: &Path,
    ) -> impl Future<Output = Result<RewriteStats>> + Send;

    /// Concatenate `inputs` in order into `output`.
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// File name used for page `page` of a split document.
pub fn page_file_name(page: u32) -> String {
    format!("page-{page}.pdf")
}

/// Collect `page-<n>.pdf` files from `dir`, ordered by page number.
///
/// Fails if the numbering has gaps.
pub async fn collect_page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let page = name
            .to_str()
            .and_then(|name| name.strip_prefix("page-"))
            .and_then(|rest| rest.strip_suffix(".pdf"))
            .and_then(|number| number.parse::<u32>().ok());
        if let Some(page) = page {
            numbered.push((page, entry.path()));
        }
    }
    numbered.sort_unstable_by_key(|(page, _)| *page);

    for (expected, (page, _)) in (1u32..).zip(&numbered) {
        if *page != expected {
            return Err(PolarityError::DocumentAccess(format!(
                "split output in {} is missing page {}",
                dir.display(),
                expected
            )));
        }
    }
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}
