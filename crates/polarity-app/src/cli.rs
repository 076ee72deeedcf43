// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their translation into a run configuration.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use polarity_core::error::Result;
use polarity_core::{LayoutConfig, PolarityConfig, RunMode, Strategy};

#[derive(Debug, Parser)]
#[command(name = "polarity")]
#[command(version, about = "Invert the K channel of a PDF book's light or dark pages")]
pub struct Cli {
    /// Path to the original PDF.
    pub input: PathBuf,

    /// Path to write the output PDF to.
    pub output: PathBuf,

    /// Produce the dark variant: turn light pages dark instead of dark pages light.
    #[arg(short, long)]
    pub dark: bool,

    /// How the output document is assembled.
    #[arg(long, value_enum, default_value_t = StrategyArg::InPlace)]
    pub strategy: StrategyArg,

    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON page layout, replacing the built-in pinouts book layout.
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Pages processed concurrently.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Time limit for each external tool invocation.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Compress streams in the output document.
    #[arg(long)]
    pub compress: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less log output (-q warnings only, -qq errors only).
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Rewrite content streams inside the document.
    InPlace,
    /// pdfseparate, Ghostscript and pdfunite.
    External,
    /// Split, filter and merge without external programs.
    NativeSplit,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::InPlace => Strategy::InPlace,
            StrategyArg::External => Strategy::External,
            StrategyArg::NativeSplit => Strategy::NativeSplit,
        }
    }
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.dark {
            RunMode::Dark
        } else {
            RunMode::Normal
        }
    }

    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (v, _) if v >= 2 => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }

    /// Load `--config` (or the defaults) and apply the other flags on top.
    pub fn resolve_config(&self) -> Result<PolarityConfig> {
        let mut config = match &self.config {
            Some(path) => PolarityConfig::load(path)?,
            None => PolarityConfig::default(),
        };
        if let Some(path) = &self.layout {
            config.layout = LayoutConfig::load(path)?;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(timeout) = self.timeout {
            config.tools.timeout_secs = timeout;
        }
        if self.compress {
            config.compress = true;
        }
        config.validate()?;
        Ok(config)
    }
}
