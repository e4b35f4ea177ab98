// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Fixed-point decoding for on-chain amounts.
//!
//! Soroban contracts report amounts as signed 128-bit integers split into a
//! (hi, lo) pair, scaled by a per-asset decimal exponent. Classic operations
//! use 64-bit stroop amounts at the native 7-decimal precision. Conversion
//! goes through arbitrary-precision integers so amounts beyond 2^53 survive
//! intact.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// The chain's native fixed-point precision (stroops).
pub const NATIVE_SCALE: u32 = 7;

/// Reassemble a two's-complement 128-bit integer from its (hi, lo) parts and
/// scale it down by `10^scale`.
///
/// Pure and total: every input maps to a decimal, `scale == 0` is the plain
/// integer value.
pub fn i128_parts_to_decimal(hi: i64, lo: u64, scale: u32) -> BigDecimal {
    let value = ((hi as i128) << 64) | (lo as i128);
    BigDecimal::new(BigInt::from(value), scale as i64)
}

/// Convert a classic 64-bit stroop amount to its decimal value.
pub fn stroops_to_decimal(amount: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(amount), NATIVE_SCALE as i64)
}

/// Rational offer price `n / d` as a decimal.
///
/// A zero denominator never appears in a validated ledger; mapped to zero
/// rather than panicking so a corrupt entry stays localized.
pub fn price_ratio(n: i32, d: i32) -> BigDecimal {
    if d == 0 {
        return BigDecimal::from(0);
    }
    BigDecimal::from(n) / BigDecimal::from(d)
}
