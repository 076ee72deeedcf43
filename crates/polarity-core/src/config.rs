// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PolarityError, Result};
use crate::layout::LayoutConfig;
use crate::types::PaintKind;

/// Settings for a single run. Every field has a default, so a JSON file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarityConfig {
    /// Page layout of the book being processed.
    pub layout: LayoutConfig,
    /// K-channel inversion rules used by the in-place rewrite.
    pub inversion: InversionRules,
    /// Per-channel transfer function used by the split strategies.
    pub transfer: TransferFunction,
    /// External programs for the split/render/merge strategy.
    pub tools: ToolConfig,
    /// Upper bound on concurrently processed pages.
    pub jobs: usize,
    /// Compress streams when saving the output document.
    pub compress: bool,
}

impl Default for PolarityConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            inversion: InversionRules::default(),
            transfer: TransferFunction::default(),
            tools: ToolConfig::default(),
            jobs: default_jobs(),
            compress: false,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl PolarityConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        self.inversion.validate()?;
        self.tools.validate()?;
        if self.jobs == 0 {
            return Err(PolarityError::InvalidConfiguration(
                "jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rules for inverting the K channel of CMYK color operators.
///
/// The source book fills dark backgrounds with a near-black `sentinel` rather
/// than pure black. Fills at the sentinel become pure white and pure white
/// fills become the sentinel. Every other value is complemented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InversionRules {
    /// Near-black fill value that maps to pure white.
    pub sentinel: f64,
    /// Absolute tolerance when comparing K against `0` and `sentinel`.
    pub tolerance: f64,
    /// Most fractional digits ever emitted for a rewritten K value.
    pub max_fraction_digits: u32,
}

impl Default for InversionRules {
    fn default() -> Self {
        Self {
            sentinel: 0.98,
            tolerance: 1e-9,
            max_fraction_digits: 10,
        }
    }
}

impl InversionRules {
    /// The K value that replaces `key` on an operator of `kind`.
    pub fn replacement_key(&self, kind: PaintKind, key: f64) -> f64 {
        let near = |target: f64| (key - target).abs() <= self.tolerance;
        match kind {
            PaintKind::Fill if near(self.sentinel) => 0.0,
            PaintKind::Fill if near(0.0) => self.sentinel,
            _ => 1.0 - key,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sentinel > 0.0 && self.sentinel <= 1.0) {
            return Err(PolarityError::InvalidConfiguration(format!(
                "sentinel {} must lie in (0, 1]",
                self.sentinel
            )));
        }
        // Zero and the sentinel must never both match the same value.
        if !(self.tolerance >= 0.0 && self.tolerance < self.sentinel / 2.0) {
            return Err(PolarityError::InvalidConfiguration(format!(
                "tolerance {} must be non-negative and below half the sentinel",
                self.tolerance
            )));
        }
        if self.max_fraction_digits == 0 || self.max_fraction_digits > 15 {
            return Err(PolarityError::InvalidConfiguration(format!(
                "max_fraction_digits {} must be between 1 and 15",
                self.max_fraction_digits
            )));
        }
        // A zero fill is rewritten to the sentinel, so the sentinel must
        // survive being written at `max_fraction_digits`.
        let digits = self.max_fraction_digits as usize;
        let written: f64 = format!("{:.digits$}", self.sentinel)
            .parse()
            .map_err(|err| PolarityError::InvalidConfiguration(format!("sentinel: {}", err)))?;
        if (written - self.sentinel).abs() > self.tolerance {
            return Err(PolarityError::InvalidConfiguration(format!(
                "sentinel {} cannot be written with {} fractional digits",
                self.sentinel, self.max_fraction_digits
            )));
        }
        Ok(())
    }
}

/// An affine transfer curve `offset + scale * x`, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelTransfer {
    pub scale: f64,
    pub offset: f64,
}

impl ChannelTransfer {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    pub fn apply(&self, value: f64) -> f64 {
        (self.offset + self.scale * value).clamp(0.0, 1.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Render-time transfer functions, one per CMYK channel.
///
/// The default pushes C, M and Y through `1.2 - x` and passes K through,
/// which approximates a polarity flip when applied by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    pub cyan: ChannelTransfer,
    pub magenta: ChannelTransfer,
    pub yellow: ChannelTransfer,
    pub black: ChannelTransfer,
}

impl Default for TransferFunction {
    fn default() -> Self {
        let invert = ChannelTransfer {
            scale: -1.0,
            offset: 1.2,
        };
        Self {
            cyan: invert,
            magenta: invert,
            yellow: invert,
            black: ChannelTransfer::IDENTITY,
        }
    }
}

impl TransferFunction {
    /// Channels in C, M, Y, K order.
    pub fn channels(&self) -> [ChannelTransfer; 4] {
        [self.cyan, self.magenta, self.yellow, self.black]
    }
}

/// External programs used by the split/render/merge strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Splits a PDF into one file per page (poppler `pdfseparate`).
    pub split: String,
    /// Renders a page through a transfer function (Ghostscript `gs`).
    pub render: String,
    /// Concatenates single-page PDFs (poppler `pdfunite`).
    pub merge: String,
    /// Per-invocation time limit in seconds.
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            split: "pdfseparate".to_string(),
            render: "gs".to_string(),
            merge: "pdfunite".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(PolarityError::InvalidConfiguration(
                "tool timeout must be at least one second".to_string(),
            ));
        }
        for (role, program) in [
            ("split", &self.split),
            ("render", &self.render),
            ("merge", &self.merge),
        ] {
            if program.trim().is_empty() {
                return Err(PolarityError::InvalidConfiguration(format!(
                    "no program configured for {role}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PolarityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inversion.sentinel, 0.98);
        assert!(config.jobs >= 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PolarityConfig =
            serde_json::from_str(r#"{"inversion": {"sentinel": 0.95}, "jobs": 2}"#).unwrap();
        assert_eq!(config.inversion.sentinel, 0.95);
        assert_eq!(config.inversion.tolerance, 1e-9);
        assert_eq!(config.jobs, 2);
        assert_eq!(config.layout.total_pages, 322);
        assert_eq!(config.tools.render, "gs");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polarity.json");
        std::fs::write(&path, r#"{"compress": true, "tools": {"timeout_secs": 5}}"#).unwrap();

        let config = PolarityConfig::load(&path).unwrap();
        assert!(config.compress);
        assert_eq!(config.tools.timeout(), Duration::from_secs(5));
        assert_eq!(config.tools.split, "pdfseparate");
    }

    #[test]
    fn invalid_values_rejected() {
        let mut rules = InversionRules::default();
        rules.sentinel = 0.0;
        assert!(rules.validate().is_err());

        let mut rules = InversionRules::default();
        rules.tolerance = 0.5;
        assert!(rules.validate().is_err());

        let mut config = PolarityConfig::default();
        config.jobs = 0;
        assert!(matches!(
            config.validate(),
            Err(PolarityError::InvalidConfiguration(_))
        ));

        let mut tools = ToolConfig::default();
        tools.merge = " ".to_string();
        assert!(tools.validate().is_err());
    }

    #[test]
    fn sentinel_must_fit_fraction_digits() {
        let mut rules = InversionRules::default();
        rules.max_fraction_digits = 1;
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("cannot be written with 1 fractional digits"));

        rules.max_fraction_digits = 2;
        assert!(rules.validate().is_ok());

        rules.sentinel = 0.9;
        rules.max_fraction_digits = 1;
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn replacement_key_case_split() {
        let rules = InversionRules::default();
        assert_eq!(rules.replacement_key(PaintKind::Fill, 0.98), 0.0);
        assert_eq!(rules.replacement_key(PaintKind::Fill, 0.0), 0.98);
        assert_eq!(rules.replacement_key(PaintKind::Stroke, 0.0), 1.0);
        assert!((rules.replacement_key(PaintKind::Stroke, 0.98) - 0.02).abs() < 1e-12);
        assert!((rules.replacement_key(PaintKind::Fill, 0.25) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn default_transfer_flips_cmy_only() {
        let transfer = TransferFunction::default();
        assert!((transfer.cyan.apply(0.2) - 1.0).abs() < 1e-12);
        assert!((transfer.cyan.apply(0.7) - 0.5).abs() < 1e-12);
        assert_eq!(transfer.magenta.apply(0.0), 1.0);
        assert!(transfer.black.is_identity());
        assert_eq!(transfer.black.apply(0.4), 0.4);
    }
}
