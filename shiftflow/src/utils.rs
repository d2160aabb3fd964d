//! Utilities.

use std::iter::IntoIterator;

/// Returns floor log2.
pub const fn flog2(val: usize) -> usize {
    if val <= 1 {
        0
    } else {
        1 + flog2(val >> 1)
    }
}

/// Returns the `n` low bits of `value`, least significant first. Bits beyond 64 are `false`.
pub fn u64_to_bitvec(n: usize, value: u64) -> Vec<bool> {
    (0..n).map(|i| if i >= u64::BITS as usize { false } else { (value >> i) & 1 == 1 }).collect()
}

/// Packs bits (least significant first) into an integer. Bits beyond 64 are ignored.
pub fn bitvec_to_u64(bits: &[bool]) -> u64 {
    bits.iter().take(u64::BITS as usize).enumerate().fold(0, |acc, (i, bit)| acc | (u64::from(*bit) << i))
}

/// Combines all elements into one String, separated by `sep`. Returns `None` if all elements are `None`.
pub fn join_options<I>(sep: &str, iterable: I) -> Option<String>
where I: IntoIterator<Item = Option<String>> {
    let iterable = iterable.into_iter().flatten().collect::<Vec<_>>();
    if iterable.is_empty() {
        None
    } else {
        Some(iterable.join(sep))
    }
}

/// Indents every line in the string.
pub fn indent(str: String, indent: usize) -> String {
    str.lines().map(|l| format!("{}{}", " ".repeat(indent), l)).collect::<Vec<_>>().join("\n")
}
