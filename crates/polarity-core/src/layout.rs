// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout configuration and classification.
//
// A book's layout is a fixed list of pages that are printed on a dark
// background. Everything else is light. The classifier turns that list into a
// partition of the document's pages that the pipeline can iterate in order.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PolarityError, Result};
use crate::types::RunMode;

/// One entry of the designated page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageSpec {
    /// A single 1-based page index.
    Page(u32),
    /// Every `step`-th page from `first` up to and including `last`.
    Range {
        first: u32,
        last: u32,
        #[serde(default = "default_step")]
        step: u32,
    },
}

fn default_step() -> u32 {
    1
}

impl PageSpec {
    /// Contiguous inclusive range.
    pub fn span(first: u32, last: u32) -> Self {
        Self::Range {
            first,
            last,
            step: 1,
        }
    }

    /// Inclusive range visiting every `step`-th page.
    pub fn stride(first: u32, last: u32, step: u32) -> Self {
        Self::Range { first, last, step }
    }

    /// Expand into the page indices this entry names, in ascending order.
    pub fn pages(&self) -> Result<Vec<u32>> {
        match *self {
            Self::Page(page) => Ok(vec![page]),
            Self::Range { first, last, step } => {
                if step == 0 {
                    return Err(PolarityError::InvalidConfiguration(format!(
                        "page range {first}..={last} has a zero step"
                    )));
                }
                if first > last {
                    return Err(PolarityError::InvalidConfiguration(format!(
                        "page range {first}..={last} is empty"
                    )));
                }
                Ok((first..=last).step_by(step as usize).collect())
            }
        }
    }
}

/// The fixed page layout of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Number of pages the layout describes.
    pub total_pages: u32,
    /// Pages printed on a dark background in the source document.
    pub inverted: Vec<PageSpec>,
}

impl LayoutConfig {
    /// Layout of the 322-page pinout reference book.
    pub fn pinouts_book() -> Self {
        use PageSpec::Page;

        Self {
            total_pages: 322,
            inverted: vec![
                // Header
                Page(1),
                Page(2),
                Page(3),
                // Connectors
                Page(8),
                Page(9),
                PageSpec::stride(10, 64, 2),
                // Memory
                Page(66),
                Page(67),
                PageSpec::stride(68, 78, 2),
                // Boards
                Page(80),
                Page(81),
                PageSpec::stride(82, 284, 2),
                // Chips
                Page(286),
                Page(287),
                PageSpec::stride(288, 318, 2),
                // Footer
                Page(320),
                Page(321),
                Page(322),
            ],
        }
    }

    /// Load a layout from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let layout: Self = serde_json::from_str(&text)?;
        debug!(
            path = %path.as_ref().display(),
            total_pages = layout.total_pages,
            entries = layout.inverted.len(),
            "Layout loaded"
        );
        Ok(layout)
    }

    /// Expand the entries and partition the document's pages.
    pub fn classify(&self) -> Result<Classification> {
        let mut designated = Vec::new();
        for spec in &self.inverted {
            designated.extend(spec.pages()?);
        }
        classify(self.total_pages, designated)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::pinouts_book()
    }
}

/// Partition of `1..=total_pages` into inverted and keep pages.
///
/// Both sets are ordered, disjoint, and together cover every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    total_pages: u32,
    inverted: BTreeSet<u32>,
    keep: BTreeSet<u32>,
}

impl Classification {
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Pages designated by the layout.
    pub fn inverted(&self) -> &BTreeSet<u32> {
        &self.inverted
    }

    /// Every page the layout does not designate.
    pub fn keep(&self) -> &BTreeSet<u32> {
        &self.keep
    }

    /// The pages a run in `mode` transforms.
    pub fn targets(&self, mode: RunMode) -> &BTreeSet<u32> {
        match mode {
            RunMode::Normal => &self.inverted,
            RunMode::Dark => &self.keep,
        }
    }
}

/// Partition `1..=total` into the `designated` pages and their complement.
///
/// Duplicates in `designated` are harmless. Fails with
/// [`PolarityError::InvalidConfiguration`] when `total` is zero or when any
/// designated page falls outside `1..=total`.
pub fn classify(total: u32, designated: impl IntoIterator<Item = u32>) -> Result<Classification> {
    if total == 0 {
        return Err(PolarityError::InvalidConfiguration(
            "layout must describe at least one page".to_string(),
        ));
    }

    let mut inverted = BTreeSet::new();
    for page in designated {
        if page == 0 || page > total {
            return Err(PolarityError::InvalidConfiguration(format!(
                "page {page} is outside the document (1..={total})"
            )));
        }
        inverted.insert(page);
    }

    let keep: BTreeSet<u32> = (1..=total).filter(|p| !inverted.contains(p)).collect();

    debug!(
        total,
        inverted = inverted.len(),
        keep = keep.len(),
        "Pages classified"
    );

    Ok(Classification {
        total_pages: total,
        inverted,
        keep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_page_example() {
        let classes = classify(10, [1, 2, 9, 10]).unwrap();
        let inverted: Vec<u32> = classes.inverted().iter().copied().collect();
        let keep: Vec<u32> = classes.keep().iter().copied().collect();
        assert_eq!(inverted, vec![1, 2, 9, 10]);
        assert_eq!(keep, vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn out_of_range_page_rejected() {
        assert!(matches!(
            classify(10, [11]),
            Err(PolarityError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            classify(10, [0]),
            Err(PolarityError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_total_rejected() {
        assert!(classify(0, Vec::new()).is_err());
    }

    #[test]
    fn targets_follow_mode() {
        let classes = classify(4, [1]).unwrap();
        assert!(classes.targets(RunMode::Normal).contains(&1));
        assert!(!classes.targets(RunMode::Dark).contains(&1));
        assert_eq!(classes.targets(RunMode::Dark).len(), 3);
    }

    #[test]
    fn stride_expands_inclusive() {
        let pages = PageSpec::stride(10, 16, 2).pages().unwrap();
        assert_eq!(pages, vec![10, 12, 14, 16]);
    }

    #[test]
    fn degenerate_ranges_rejected() {
        assert!(PageSpec::stride(1, 5, 0).pages().is_err());
        assert!(PageSpec::span(5, 1).pages().is_err());
    }

    #[test]
    fn pinouts_book_partition() {
        let classes = LayoutConfig::pinouts_book().classify().unwrap();
        assert_eq!(classes.total_pages(), 322);
        assert_eq!(classes.inverted().len(), 166);
        assert_eq!(classes.keep().len(), 156);

        for page in [1, 3, 8, 10, 64, 66, 68, 80, 284, 286, 318, 322] {
            assert!(classes.inverted().contains(&page), "page {page}");
        }
        for page in [4, 7, 11, 63, 65, 79, 285, 319] {
            assert!(classes.keep().contains(&page), "page {page}");
        }
    }

    #[test]
    fn page_spec_json_forms() {
        let json = r#"{"total_pages": 6, "inverted": [1, {"first": 2, "last": 4}, {"first": 5, "last": 6, "step": 2}]}"#;
        let layout: LayoutConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            layout.inverted,
            vec![
                PageSpec::Page(1),
                PageSpec::span(2, 4),
                PageSpec::stride(5, 6, 2)
            ]
        );
        let inverted: Vec<u32> = layout.classify().unwrap().inverted().iter().copied().collect();
        assert_eq!(inverted, vec![1, 2, 3, 4, 5]);
    }
}
