//! Error types for membership proofs and for the ring VRF API.
use curve25519_dalek::scalar::Scalar;
use thiserror::Error;

/// Errors raised by the one-of-many membership proof engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("set is too small for the proof domain")]
    SetIsTooSmall,

    #[error("set is too large for the proof domain")]
    SetIsTooLarge,

    #[error("index is outside of the proof domain")]
    IndexOutOfBounds,

    #[error("non-canonical scalar in proof")]
    InvalidScalar(Scalar),

    #[error("proof vectors do not match the proof domain")]
    InvalidProofSize,

    /// An identity point was about to be appended to a transcript.
    #[error("identity point in proof transcript")]
    VerificationError,

    #[error("proof verification failed")]
    VerificationFailed,
}

pub type ProofResult<T> = core::result::Result<T, ProofError>;

/// Errors returned by the ring VRF API.
///
/// Cryptographic rejection of a signature is not an error; see
/// [`Verification::Rejected`](crate::verifier::Verification::Rejected).
#[derive(Debug, Error)]
pub enum RingVrfError {
    #[error("parse error{}: {}", .index.map(|i| format!(" at key {}", i)).unwrap_or_default(), .reason)]
    Parse {
        index: Option<usize>,
        reason: &'static str,
    },

    #[error("ring size mismatch: declared {declared}, got {actual} keys")]
    RingSizeMismatch { declared: usize, actual: usize },

    #[error("ring size {ring_size} exceeds the SRS maximum of {max}")]
    UnsupportedRingSize { ring_size: usize, max: usize },

    #[error("unsupported SRS domain of {bits} bits")]
    UnsupportedDomain { bits: usize },

    #[error("invalid public key at index {index}")]
    InvalidKey { index: usize },

    #[error("invalid secret key")]
    InvalidSecret,

    #[error("secret key does not match ring member {index}")]
    KeyIndexMismatch { index: usize },

    #[error("SRS length {len} matches no supported domain")]
    Format { len: usize },

    #[error("corrupt SRS generator at index {index}")]
    CorruptData { index: usize },

    #[error("SRS i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(&'static str),

    #[error("membership proof error: {0}")]
    Proof(#[from] ProofError),
}

pub type Result<T> = core::result::Result<T, RingVrfError>;

/// Status codes reported across the C boundary.
pub mod status {
    pub const OK: i32 = 0;
    pub const REJECTED: i32 = 1;
    pub const NULL_ARGUMENT: i32 = -1;
    pub const PARSE: i32 = -2;
    pub const RING_SIZE_MISMATCH: i32 = -3;
    pub const UNSUPPORTED_RING_SIZE: i32 = -4;
    pub const INVALID_KEY: i32 = -5;
    pub const INVALID_SECRET: i32 = -6;
    pub const KEY_INDEX_MISMATCH: i32 = -7;
    pub const SRS_FORMAT: i32 = -8;
    pub const SRS_CORRUPT: i32 = -9;
    pub const IO: i32 = -10;
    pub const SERIALIZATION: i32 = -11;
    pub const PROOF: i32 = -12;
    pub const ALLOCATION: i32 = -13;
}

impl RingVrfError {
    /// The C boundary status code for this error class.
    pub fn status_code(&self) -> i32 {
        match self {
            RingVrfError::Parse { .. } => status::PARSE,
            RingVrfError::RingSizeMismatch { .. } => status::RING_SIZE_MISMATCH,
            RingVrfError::UnsupportedRingSize { .. } => status::UNSUPPORTED_RING_SIZE,
            RingVrfError::UnsupportedDomain { .. } => status::SRS_FORMAT,
            RingVrfError::InvalidKey { .. } => status::INVALID_KEY,
            RingVrfError::InvalidSecret => status::INVALID_SECRET,
            RingVrfError::KeyIndexMismatch { .. } => status::KEY_INDEX_MISMATCH,
            RingVrfError::Format { .. } => status::SRS_FORMAT,
            RingVrfError::CorruptData { .. } => status::SRS_CORRUPT,
            RingVrfError::Io(_) => status::IO,
            RingVrfError::Serialization(_) => status::SERIALIZATION,
            RingVrfError::Proof(_) => status::PROOF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let e = RingVrfError::Parse {
            index: Some(3),
            reason: "invalid hex",
        };
        assert_eq!(e.to_string(), "parse error at key 3: invalid hex");
        let e = RingVrfError::Parse {
            index: None,
            reason: "invalid hex",
        };
        assert_eq!(e.to_string(), "parse error: invalid hex");
        let e = RingVrfError::RingSizeMismatch {
            declared: 6,
            actual: 5,
        };
        assert_eq!(e.to_string(), "ring size mismatch: declared 6, got 5 keys");
    }

    #[test]
    fn status_codes_are_distinct_per_class() {
        assert_eq!(
            RingVrfError::KeyIndexMismatch { index: 2 }.status_code(),
            status::KEY_INDEX_MISMATCH
        );
        assert_eq!(
            RingVrfError::from(ProofError::SetIsTooSmall).status_code(),
            status::PROOF
        );
        assert!(RingVrfError::InvalidSecret.status_code() < 0);
    }
}
