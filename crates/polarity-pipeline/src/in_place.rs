// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-place rewrite: flatten each target page's content into one stream,
// invert its K channel, write it back, and save the document.
//
// Stream reads and writes go through the single `PdfDocument` in page order.
// Only the pure transform runs on the worker pool.

use std::path::Path;
use std::time::Instant;

use polarity_core::error::{PolarityError, Result};
use polarity_core::{PolarityConfig, RunMode, Strategy};
use polarity_document::{PdfDocument, RewriteStats, StreamHandle, transform_with_stats};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::check_page_count;
use crate::report::RunReport;

/// A target page's stream, before or after transformation.
struct PageStream {
    page: u32,
    handle: StreamHandle,
    content: Vec<u8>,
    stats: RewriteStats,
}

/// Rewrite the target pages of `input` for `mode` and save to `output`.
#[instrument(skip(config, input, output), fields(input = %input.display()))]
pub fn rewrite(
    config: &PolarityConfig,
    mode: RunMode,
    input: &Path,
    output: &Path,
) -> Result<RunReport> {
    let started = Instant::now();
    let classification = config.layout.classify()?;
    let mut pdf = PdfDocument::open(input)?;
    check_page_count(&classification, pdf.page_count())?;

    let targets = classification.targets(mode);
    info!(targets = targets.len(), "Rewriting pages in place");

    let mut work = Vec::with_capacity(targets.len());
    for &page in targets {
        let handle = pdf.flatten_content(page)?;
        let content = pdf.read_stream(handle)?;
        work.push(PageStream {
            page,
            handle,
            content,
            stats: RewriteStats::default(),
        });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|err| {
            PolarityError::InvalidConfiguration(format!("cannot start worker pool: {}", err))
        })?;
    let rules = config.inversion;
    let rewritten: Vec<PageStream> = pool.install(|| {
        work.into_par_iter()
            .map(|stream| {
                let (content, stats) = transform_with_stats(&stream.content, &rules);
                PageStream {
                    content,
                    stats,
                    ..stream
                }
            })
            .collect()
    });

    let mut operators = RewriteStats::default();
    for stream in rewritten {
        debug!(
            page = stream.page,
            fills = stream.stats.fills,
            strokes = stream.stats.strokes,
            "Page rewritten"
        );
        operators += stream.stats;
        pdf.write_stream(stream.handle, stream.content)?;
    }

    if config.compress {
        pdf.compress();
    }
    pdf.save(output)?;

    Ok(RunReport {
        strategy: Strategy::InPlace,
        mode,
        total_pages: pdf.page_count(),
        pages_transformed: targets.len(),
        operators,
        annotations: None,
        elapsed: started.elapsed(),
    })
}
