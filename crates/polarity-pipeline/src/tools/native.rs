// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process page tools built on lopdf.
//
// Splitting and merging copy page objects between documents. Rendering
// pushes every CMYK operator on the page through the transfer function
// instead of rasterising, so vector content stays vector content.

use std::path::{Path, PathBuf};

use polarity_core::{Strategy, TransferFunction};
use polarity_core::error::Result;
use polarity_document::{PdfDocument, RewriteStats, apply_transfer, merge_files};
use tracing::{debug, instrument};

use super::PageTools;
use crate::blocking;

/// Page tools that never leave the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTools;

/// Apply `transfer` to every page of the document at `page` and save it to
/// `output`.
fn render_file(page: &Path, transfer: &TransferFunction, output: &Path) -> Result<RewriteStats> {
    let mut pdf = PdfDocument::open(page)?;
    let mut stats = RewriteStats::default();
    for index in 1..=pdf.page_count() {
        let handle = pdf.flatten_content(index)?;
        let content = pdf.read_stream(handle)?;
        let (filtered, page_stats) = apply_transfer(&content, transfer);
        pdf.write_stream(handle, filtered)?;
        stats += page_stats;
    }
    pdf.save(output)?;
    Ok(stats)
}

impl PageTools for NativeTools {
    fn strategy(&self) -> Strategy {
        Strategy::NativeSplit
    }

    #[instrument(skip(self))]
    async fn split(&self, input: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        let input = input.to_path_buf();
        let dir = dir.to_path_buf();
        blocking(move || PdfDocument::open(&input)?.split_into(&dir)).await
    }

    #[instrument(skip(self, transfer))]
    async fn render(
        &self,
        page: &Path,
        transfer: &TransferFunction,
        output: &Path,
    ) -> Result<RewriteStats> {
        let page = page.to_path_buf();
        let output = output.to_path_buf();
        let transfer = *transfer;
        let stats = blocking(move || render_file(&page, &transfer, &output)).await?;
        debug!(fills = stats.fills, strokes = stats.strokes, "Page filtered");
        Ok(stats)
    }

    #[instrument(skip_all, fields(inputs = inputs.len()))]
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let inputs = inputs.to_vec();
        let output = output.to_path_buf();
        blocking(move || merge_files(&inputs, &output)).await
    }
}
