// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split / render / merge: the fallback pipeline.
//
// The document is split into single-page files inside a private working
// directory. Target pages are rendered through the transfer function, at
// most `jobs` at a time. All pages are then merged in ascending order, and
// the original's annotations, outline and named destinations are copied onto
// the merged result, which is saved atomically to the output path. The
// working directory is removed whether or not the run succeeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polarity_core::error::{PolarityError, Result};
use polarity_core::{PolarityConfig, RunMode};
use polarity_document::{PdfDocument, RewriteStats, copy_annotations};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use crate::report::RunReport;
use crate::tools::{PageTools, page_file_name};
use crate::{blocking, check_page_count};

/// Produce the dark variant of `input` at `output` using `tools`.
#[instrument(skip_all, fields(strategy = %tools.strategy(), input = %input.display()))]
pub async fn run<T>(
    tools: Arc<T>,
    config: &PolarityConfig,
    input: &Path,
    output: &Path,
) -> Result<RunReport>
where
    T: PageTools + 'static,
{
    let started = Instant::now();
    let classification = config.layout.classify()?;
    let document_pages = {
        let input = input.to_path_buf();
        blocking(move || Ok(PdfDocument::open(&input)?.page_count())).await?
    };
    check_page_count(&classification, document_pages)?;

    let workdir = tempfile::Builder::new().prefix("polarity-").tempdir()?;
    let split_dir = workdir.path().join("pages");
    let render_dir = workdir.path().join("rendered");
    tokio::fs::create_dir_all(&split_dir).await?;
    tokio::fs::create_dir_all(&render_dir).await?;

    let pages = tools.split(input, &split_dir).await?;
    if pages.len() != document_pages as usize {
        return Err(PolarityError::DocumentAccess(format!(
            "split produced {} pages, expected {}",
            pages.len(),
            document_pages
        )));
    }

    let targets = classification.targets(RunMode::Dark);
    info!(targets = targets.len(), jobs = config.jobs, "Rendering pages");
    let (mut rendered, operators) = render_pages(
        Arc::clone(&tools),
        config,
        &pages,
        targets.iter().copied(),
        &render_dir,
    )
    .await?;

    let ordered: Vec<PathBuf> = pages
        .into_iter()
        .enumerate()
        .map(|(index, original)| rendered.remove(&(index as u32 + 1)).unwrap_or(original))
        .collect();
    let merged = workdir.path().join("merged.pdf");
    tools.merge(&ordered, &merged).await?;

    let annotations = {
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        let compress = config.compress;
        blocking(move || {
            let copied = copy_annotations(&input, &merged, &output)?;
            if compress {
                let mut pdf = PdfDocument::open(&output)?;
                pdf.compress();
                pdf.save(&output)?;
            }
            Ok(copied)
        })
        .await?
    };

    Ok(RunReport {
        strategy: tools.strategy(),
        mode: RunMode::Dark,
        total_pages: document_pages,
        pages_transformed: targets.len(),
        operators,
        annotations: Some(annotations),
        elapsed: started.elapsed(),
    })
}

/// Render `targets` through the transfer function, at most `config.jobs` at
/// once. Returns the rendered file for each page.
async fn render_pages<T>(
    tools: Arc<T>,
    config: &PolarityConfig,
    pages: &[PathBuf],
    targets: impl Iterator<Item = u32>,
    render_dir: &Path,
) -> Result<(BTreeMap<u32, PathBuf>, RewriteStats)>
where
    T: PageTools + 'static,
{
    let limit = config.jobs.max(1);
    let mut tasks = JoinSet::new();
    let mut rendered = BTreeMap::new();
    let mut operators = RewriteStats::default();

    // Dropping `tasks` on an early return aborts the remaining renders.
    for page in targets {
        while let Some(joined) = tasks.try_join_next() {
            record(joined, &mut rendered, &mut operators)?;
        }
        while tasks.len() >= limit {
            if let Some(joined) = tasks.join_next().await {
                record(joined, &mut rendered, &mut operators)?;
            }
        }
        let tools = Arc::clone(&tools);
        let transfer = config.transfer;
        let source = pages[page as usize - 1].clone();
        let target = render_dir.join(page_file_name(page));
        tasks.spawn(async move {
            let stats = tools.render(&source, &transfer, &target).await?;
            Ok::<_, PolarityError>((page, target, stats))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        record(joined, &mut rendered, &mut operators)?;
    }
    Ok((rendered, operators))
}

type RenderOutcome = Result<(u32, PathBuf, RewriteStats)>;

/// Fold one finished render into the results, surfacing its error.
fn record(
    joined: std::result::Result<RenderOutcome, tokio::task::JoinError>,
    rendered: &mut BTreeMap<u32, PathBuf>,
    operators: &mut RewriteStats,
) -> Result<()> {
    let (page, path, stats) =
        joined.map_err(|err| PolarityError::Io(std::io::Error::other(err)))??;
    debug!(page, "Page rendered");
    *operators += stats;
    rendered.insert(page, path);
    Ok(())
}
