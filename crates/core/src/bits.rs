// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bit-field primitives shared by the decoder.
//!
//! All instruction fields are described as inclusive bit ranges `[high, low]`
//! of a 32-bit word, matching the ISA manual's tables.

/// Extract bits `[high, low]` (inclusive) of `word`, right-justified.
///
/// A malformed range is a programming error, not a runtime condition.
pub fn extract(word: u32, high: u32, low: u32) -> u32 {
    assert!(low <= high && high < 32, "malformed bit range [{high}:{low}]");
    let width = high - low + 1;
    if width == 32 {
        word
    } else {
        (word >> low) & ((1 << width) - 1)
    }
}

/// Reinterpret the low `width` bits of `value` as a two's-complement integer.
///
/// If the top bit of the `width`-bit field is clear the value is returned
/// unchanged; if it is set, the result is `value - 2^width`.
pub fn sign_extend(value: u32, width: u32) -> i32 {
    assert!((1..=32).contains(&width), "malformed width {width}");
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}
