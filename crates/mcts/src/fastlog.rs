//! Precomputed natural logarithms for the UCT exploration term.
//!
//! Parent visit counts are small integers, so `ln(n)` is looked up in a
//! table built once on first use instead of being recomputed for every
//! child on every selection.

use once_cell::sync::Lazy;

/// Visit counts below this are served from the table.
const TABLE_SIZE: usize = 1 << 16;

static LN_TABLE: Lazy<Box<[f64]>> = Lazy::new(|| {
    (0..TABLE_SIZE)
        .map(|n| if n == 0 { 0.0 } else { (n as f64).ln() })
        .collect()
});

/// Natural logarithm of a visit count.
///
/// `ln(0)` is defined as 0.0 so an unvisited parent yields no exploration
/// bonus instead of a NaN.
#[inline]
pub fn ln(n: u32) -> f64 {
    LN_TABLE
        .get(n as usize)
        .copied()
        .unwrap_or_else(|| f64::from(n).ln())
}
