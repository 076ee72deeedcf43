// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Polarity.

use serde::{Deserialize, Serialize};

/// Which variant of the book a run produces.
///
/// The source document ships with a mix of light and dark pages. `Normal`
/// turns the dark pages light; `Dark` turns the light pages dark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Transform the designated (inverted) pages.
    #[default]
    Normal,
    /// Transform the complement (keep) pages.
    Dark,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// Whether a color operator sets the fill or the stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaintKind {
    /// `k`, non-stroking DeviceCMYK color.
    Fill,
    /// `K`, stroking DeviceCMYK color.
    Stroke,
}

impl PaintKind {
    /// The content-stream operator byte for this kind.
    pub fn operator(self) -> u8 {
        match self {
            Self::Fill => b'k',
            Self::Stroke => b'K',
        }
    }

    /// Inverse of [`PaintKind::operator`].
    pub fn from_operator(op: u8) -> Option<Self> {
        match op {
            b'k' => Some(Self::Fill),
            b'K' => Some(Self::Stroke),
            _ => None,
        }
    }
}

/// How the document is reassembled after its pages are transformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Rewrite each target page's content stream inside the document.
    #[default]
    InPlace,
    /// Split into single-page files, filter target pages through external
    /// renderers, merge, and copy annotations back.
    External,
    /// Same split/filter/merge sequence, performed in-process.
    NativeSplit,
}

impl Strategy {
    /// Split-based strategies always produce the dark variant.
    pub fn forced_mode(self) -> Option<RunMode> {
        match self {
            Self::InPlace => None,
            Self::External | Self::NativeSplit => Some(RunMode::Dark),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InPlace => f.write_str("in-place"),
            Self::External => f.write_str("external"),
            Self::NativeSplit => f.write_str("native-split"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_bytes_round_trip() {
        for kind in [PaintKind::Fill, PaintKind::Stroke] {
            assert_eq!(PaintKind::from_operator(kind.operator()), Some(kind));
        }
        assert_eq!(PaintKind::from_operator(b'g'), None);
    }

    #[test]
    fn split_strategies_force_dark() {
        assert_eq!(Strategy::InPlace.forced_mode(), None);
        assert_eq!(Strategy::External.forced_mode(), Some(RunMode::Dark));
        assert_eq!(Strategy::NativeSplit.forced_mode(), Some(RunMode::Dark));
    }

    #[test]
    fn run_mode_serialises_kebab_case() {
        let json = serde_json::to_string(&RunMode::Dark).unwrap();
        assert_eq!(json, "\"dark\"");
    }
}
