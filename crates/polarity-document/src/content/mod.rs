// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream color rewriting.
//
// A page's content stream is scanned for DeviceCMYK color operators of the
// shape `c m y k k` (fill) and `c m y k K` (stroke). Each match is parsed into
// a `ColorOperator`, handed to a `ColorMapping`, and re-emitted. Bytes outside
// a match, and channels the mapping leaves alone, are copied through as-is.

pub mod invert;
pub mod transfer;

use std::sync::LazyLock;

use polarity_core::PaintKind;
use regex::bytes::{Captures, Regex};

pub use invert::{transform, transform_with, transform_with_stats};
pub use transfer::apply_transfer;

/// Fractional digits used when a mapping does not ask for its own precision.
pub const DEFAULT_FRACTION_DIGITS: usize = 10;

/// Four operands, each `digits`, `digits.digits` or `.digits`, followed by the
/// operator byte. Fill and stroke are separate patterns so that each pass only
/// ever sees its own operator.
macro_rules! cmyk_pattern {
    ($op:literal) => {
        concat!(
            r"((?:[0-9]*\.)?[0-9]+) ",
            r"((?:[0-9]*\.)?[0-9]+) ",
            r"((?:[0-9]*\.)?[0-9]+) ",
            r"((?:[0-9]*\.)?[0-9]+) ",
            "(",
            $op,
            ")"
        )
    };
}

static FILL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(cmyk_pattern!("k")).expect("fill pattern is valid"));

static STROKE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(cmyk_pattern!("K")).expect("stroke pattern is valid"));

/// One numeric operand of a color operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel<'a> {
    /// The operand exactly as it appeared in the stream.
    pub raw: &'a [u8],
    /// Parsed magnitude.
    pub value: f64,
}

/// A parsed `c m y k k` / `c m y k K` occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorOperator<'a> {
    /// Operands in C, M, Y, K order.
    pub channels: [Channel<'a>; 4],
    pub kind: PaintKind,
}

impl<'a> ColorOperator<'a> {
    /// Build an operator from a pattern match. Returns `None` if an operand
    /// does not parse, which leaves the match untouched.
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let mut channels = [Channel {
            raw: &[],
            value: 0.0,
        }; 4];
        for (index, channel) in channels.iter_mut().enumerate() {
            let raw = caps.get(index + 1)?.as_bytes();
            let value = std::str::from_utf8(raw).ok()?.parse::<f64>().ok()?;
            *channel = Channel { raw, value };
        }
        let op = caps.get(5)?.as_bytes().first().copied()?;
        let kind = PaintKind::from_operator(op)?;
        Some(Self { channels, kind })
    }

    /// Parse a standalone operator such as `b"0 0 0 .98 k"`.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        [&*FILL_PATTERN, &*STROKE_PATTERN].into_iter().find_map(|re| {
            re.captures(bytes)
                .filter(|caps| caps.get(0).is_some_and(|m| m.len() == bytes.len()))
                .and_then(|caps| Self::from_captures(&caps))
        })
    }

    pub fn cyan(&self) -> f64 {
        self.channels[0].value
    }

    pub fn magenta(&self) -> f64 {
        self.channels[1].value
    }

    pub fn yellow(&self) -> f64 {
        self.channels[2].value
    }

    pub fn black(&self) -> f64 {
        self.channels[3].value
    }

    /// Serialise with `replacements` applied. `None` keeps a channel's bytes.
    fn render(&self, replacements: [Option<f64>; 4], digits: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        for (channel, replacement) in self.channels.iter().zip(replacements) {
            match replacement {
                Some(value) => out.extend_from_slice(format_unit(value, digits).as_bytes()),
                None => out.extend_from_slice(channel.raw),
            }
            out.push(b' ');
        }
        out.push(self.kind.operator());
        out
    }
}

/// A rule that rewrites the channels of CMYK color operators.
pub trait ColorMapping {
    /// New values for `op`'s channels in C, M, Y, K order. `None` keeps the
    /// original operand bytes.
    fn map(&self, op: &ColorOperator<'_>) -> [Option<f64>; 4];

    /// Fractional digits emitted for rewritten values.
    fn fraction_digits(&self) -> usize {
        DEFAULT_FRACTION_DIGITS
    }
}

/// Number of operators a rewrite touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub fills: usize,
    pub strokes: usize,
}

impl RewriteStats {
    pub fn total(&self) -> usize {
        self.fills + self.strokes
    }
}

impl std::ops::AddAssign for RewriteStats {
    fn add_assign(&mut self, other: Self) {
        self.fills += other.fills;
        self.strokes += other.strokes;
    }
}

/// Rewrite every fill operator, then every stroke operator, in `stream`.
///
/// The two passes are independent full scans; the fill pass never sees a
/// stroke operator and vice versa.
pub fn rewrite_stream<M: ColorMapping + ?Sized>(
    stream: &[u8],
    mapping: &M,
) -> (Vec<u8>, RewriteStats) {
    let (after_fill, fills) = rewrite_pass(&FILL_PATTERN, stream, mapping);
    let (after_stroke, strokes) = rewrite_pass(&STROKE_PATTERN, &after_fill, mapping);
    (after_stroke, RewriteStats { fills, strokes })
}

fn rewrite_pass<M: ColorMapping + ?Sized>(
    pattern: &Regex,
    stream: &[u8],
    mapping: &M,
) -> (Vec<u8>, usize) {
    let digits = mapping.fraction_digits();
    let mut count = 0;
    let rewritten = pattern.replace_all(stream, |caps: &Captures<'_>| {
        match ColorOperator::from_captures(caps) {
            Some(op) => {
                count += 1;
                op.render(mapping.map(&op), digits)
            }
            None => caps[0].to_vec(),
        }
    });
    (rewritten.into_owned(), count)
}

/// Format `value` as the shortest decimal in `[0, 1]` at `digits` precision.
///
/// No exponent, no trailing zeros, and no leading zero before the point, so
/// the result always matches the operand pattern again: `0`, `1`, `.98`.
pub fn format_unit(value: f64, digits: usize) -> String {
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    let mut text = format!("{clamped:.digits$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        return "0".to_string();
    }
    if let Some(fraction) = text.strip_prefix("0.") {
        return format!(".{fraction}");
    }
    text
}
