// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polarity core: types, configuration, page classification and error
// definitions shared across all crates.

pub mod config;
pub mod error;
pub mod hints;
pub mod layout;
pub mod types;

pub use config::{ChannelTransfer, InversionRules, PolarityConfig, ToolConfig, TransferFunction};
pub use error::PolarityError;
pub use layout::{Classification, LayoutConfig, PageSpec, classify};
pub use types::*;
