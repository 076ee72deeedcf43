// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// K-channel inversion.
//
// Only the black channel moves. Fills at the book's near-black sentinel go to
// pure white and pure white fills go to the sentinel, so a dark page does not
// turn into a harsh full-black one (or a grey one on the way back). Every
// other K value, and every stroke, is complemented.

use polarity_core::InversionRules;

use super::{ColorMapping, ColorOperator, RewriteStats, rewrite_stream};

impl ColorMapping for InversionRules {
    fn map(&self, op: &ColorOperator<'_>) -> [Option<f64>; 4] {
        [
            None,
            None,
            None,
            Some(self.replacement_key(op.kind, op.black())),
        ]
    }

    fn fraction_digits(&self) -> usize {
        self.max_fraction_digits as usize
    }
}

/// Invert the K channel of every CMYK fill and stroke operator in `stream`
/// using the default rules (sentinel `0.98`).
pub fn transform(stream: &[u8]) -> Vec<u8> {
    transform_with(stream, &InversionRules::default())
}

/// [`transform`] with explicit rules.
pub fn transform_with(stream: &[u8], rules: &InversionRules) -> Vec<u8> {
    rewrite_stream(stream, rules).0
}

/// [`transform_with`], also reporting how many operators were rewritten.
pub fn transform_with_stats(stream: &[u8], rules: &InversionRules) -> (Vec<u8>, RewriteStats) {
    rewrite_stream(stream, rules)
}
