// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-channel transfer functions applied to CMYK operators.
//
// A renderer applies a transfer function to every painted color at output
// time. For vector content the same effect can be had by pushing each CMYK
// operator through the curves directly, which is what the in-process split
// strategy does.

use polarity_core::TransferFunction;

use super::{ColorMapping, ColorOperator, RewriteStats, rewrite_stream};

impl ColorMapping for TransferFunction {
    fn map(&self, op: &ColorOperator<'_>) -> [Option<f64>; 4] {
        let mut out = [None; 4];
        for ((slot, curve), channel) in out.iter_mut().zip(self.channels()).zip(op.channels) {
            if !curve.is_identity() {
                *slot = Some(curve.apply(channel.value));
            }
        }
        out
    }
}

/// Apply `transfer` to every CMYK fill and stroke operator in `stream`.
pub fn apply_transfer(stream: &[u8], transfer: &TransferFunction) -> (Vec<u8>, RewriteStats) {
    rewrite_stream(stream, transfer)
}
