// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// polarity-pipeline: page pipelines for Polarity.
//
// Two ways of producing the output document:
//   - `in_place`: rewrite target pages' content streams inside the document
//     and save it (the default).
//   - `split_merge`: split into single pages, filter target pages through a
//     `PageTools` backend, merge, and copy annotations back.

pub mod in_place;
pub mod report;
pub mod split_merge;
pub mod tools;

use std::path::Path;
use std::sync::Arc;

use polarity_core::error::{PolarityError, Result};
use polarity_core::{Classification, PolarityConfig, RunMode, Strategy};
use tracing::{info, instrument, warn};

pub use report::RunReport;
pub use tools::{ExternalTools, NativeTools, PageTools};

/// Produce `output` from `input` with the given strategy and mode.
///
/// Split-based strategies always produce the dark variant; a `Normal` request
/// is overridden with a warning.
#[instrument(skip(config, input, output), fields(input = %input.display()))]
pub async fn run(
    config: &PolarityConfig,
    strategy: Strategy,
    mode: RunMode,
    input: &Path,
    output: &Path,
) -> Result<RunReport> {
    config.validate()?;

    let mode = match strategy.forced_mode() {
        Some(forced) if forced != mode => {
            warn!(%strategy, requested = %mode, %forced, "Strategy only supports one mode");
            forced
        }
        _ => mode,
    };
    info!(%strategy, %mode, output = %output.display(), "Starting run");

    match strategy {
        Strategy::InPlace => {
            let config = config.clone();
            let input = input.to_path_buf();
            let output = output.to_path_buf();
            blocking(move || in_place::rewrite(&config, mode, &input, &output)).await
        }
        Strategy::External => {
            let tools = Arc::new(ExternalTools::new(config.tools.clone()));
            split_merge::run(tools, config, input, output).await
        }
        Strategy::NativeSplit => {
            let tools = Arc::new(NativeTools);
            split_merge::run(tools, config, input, output).await
        }
    }
}

/// Fail unless the layout and the document agree on the page count.
pub fn check_page_count(classification: &Classification, document_pages: u32) -> Result<()> {
    if classification.total_pages() != document_pages {
        return Err(PolarityError::InvalidConfiguration(format!(
            "document has {} pages but the layout describes {}",
            document_pages,
            classification.total_pages()
        )));
    }
    Ok(())
}

/// Run blocking lopdf work on the blocking thread pool.
pub(crate) async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| PolarityError::Io(std::io::Error::other(err)))?
}
