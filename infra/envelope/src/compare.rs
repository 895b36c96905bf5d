use std::hint::black_box;
use subtle::ConstantTimeEq;

/// Compares two byte strings in time that depends only on their lengths.
///
/// Unequal lengths return `false` immediately (length is not secret). Otherwise every
/// position is visited, tallying matches and mismatches from `subtle`'s branch-free
/// byte comparison; the result requires zero mismatches and a full match count.
///
/// ```rust
/// use keyrot_envelope::uniform_time_eq;
///
/// assert!(uniform_time_eq(b"signature", b"signature"));
/// assert!(!uniform_time_eq(b"signature", b"signaturf"));
/// assert!(!uniform_time_eq(b"sig", b"signature"));
/// ```
#[must_use]
pub fn uniform_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut mismatched = 0usize;
    let mut matched = 0usize;
    for (x, y) in a.iter().zip(b) {
        let eq = x.ct_eq(y).unwrap_u8();
        matched += usize::from(eq);
        mismatched += usize::from(eq ^ 1);
    }

    (black_box(mismatched) == 0) & (black_box(matched) == a.len())
}
