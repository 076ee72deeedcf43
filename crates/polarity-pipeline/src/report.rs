// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summary of a finished run.

use std::fmt;
use std::time::Duration;

use polarity_core::{RunMode, Strategy};
use polarity_document::RewriteStats;

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub strategy: Strategy,
    /// The mode actually used, after any override by the strategy.
    pub mode: RunMode,
    /// Pages in the output document.
    pub total_pages: u32,
    /// Pages whose content was transformed.
    pub pages_transformed: usize,
    /// Color operators rewritten. Zero for external renderers, which do not
    /// report what they changed.
    pub operators: RewriteStats,
    /// Annotations copied back after a merge; `None` for in-place runs.
    pub annotations: Option<usize>,
    pub elapsed: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): transformed {} of {} pages",
            self.strategy, self.mode, self.pages_transformed, self.total_pages
        )?;
        if self.operators.total() > 0 {
            write!(
                f,
                ", {} fill and {} stroke operators",
                self.operators.fills, self.operators.strokes
            )?;
        }
        if let Some(annotations) = self.annotations {
            write!(f, ", {annotations} annotations restored")?;
        }
        write!(f, " in {:.2}s", self.elapsed.as_secs_f64())
    }
}
