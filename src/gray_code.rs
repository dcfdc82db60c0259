//! Gray code ordering of ring slots.
//!
//! Membership proofs enumerate ring slots in Gray code order, so consecutive
//! set coefficients differ in exactly one bit and the verifier can update each
//! coefficient with two field multiplications instead of a full product.

/// The Gray code of slot `n`.
pub(crate) fn gray_code(n: usize) -> usize {
    n ^ n >> 1
}

/// The bit position that flips between `gray_code(n - 1)` and `gray_code(n)`.
/// `n` must be non-zero.
pub(crate) fn flipped_bit(n: usize) -> usize {
    debug_assert!(n > 0);
    n.trailing_zeros() as usize
}
