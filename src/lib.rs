//! Anonymous ring VRF signatures over the ristretto255 group.
//!
//! A ring VRF lets any member of a ring of public keys sign a message on
//! behalf of the ring, without revealing which member signed, while producing
//! a verifiable random output that depends only on the signer's secret key and
//! the VRF input. Signing the same input in two different rings yields the same
//! output, so the output works as a stable anonymous identifier per input.
//!
//! A signature bundles:
//! * a Pedersen VRF proof, which ties the VRF pre-output to a blinded
//!   commitment to the signer's key, and
//! * a [One-out-of-Many](https://eprint.iacr.org/2014/764) membership proof,
//!   which shows that the blinded key commitment opens to some ring member.
//!
//! Both proofs share one [`merlin`] transcript, which also binds the ring
//! commitment, the VRF input and the auxiliary data.
//!
//! # Examples
//! Sign as the third member of a ring of six, and verify:
//! ```
//! # use rand::rngs::OsRng; // You should use a more secure RNG
//! # use ring_vrf::{aggregate, sign, verify, Ring, SecretKey, Srs, Verification, VrfInput};
//! #
//! // Set up public parameters for rings of up to 2^4 members
//! let srs = Srs::generate(4).unwrap();
//!
//! // Build a ring of six public keys
//! let secrets = (0..6)
//!     .map(|_| SecretKey::random(&mut OsRng))
//!     .collect::<Vec<SecretKey>>();
//! let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), 6).unwrap();
//!
//! // Sign anonymously as member 2
//! let signature = sign(&secrets[2], &ring, &srs, b"foo", b"bar", 2).unwrap();
//! let bytes = signature.to_bytes().unwrap();
//!
//! // Verify, without any knowledge of the signer, and recover the VRF output
//! let output = match verify(&ring, &srs, b"foo", b"bar", &bytes).unwrap() {
//!     Verification::Valid(output) => output,
//!     Verification::Rejected => panic!("valid signature rejected"),
//! };
//! assert_eq!(output, secrets[2].vrf_output(&VrfInput::new(b"foo")));
//!
//! // Verification fails for different auxiliary data
//! assert_eq!(
//!     verify(&ring, &srs, b"foo", b"baz", &bytes).unwrap(),
//!     Verification::Rejected
//! );
//! ```
//! Ring commitments can be computed once and shared between signers and
//! verifiers:
//! ```
//! # use rand::rngs::OsRng;
//! # use ring_vrf::{sign_with_commitment, verify_with_commitment, CommitmentCache, Ring, SecretKey, Srs};
//! #
//! let srs = Srs::generate(3).unwrap();
//! let secrets = (0..3)
//!     .map(|_| SecretKey::random(&mut OsRng))
//!     .collect::<Vec<SecretKey>>();
//! let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), 3).unwrap();
//!
//! let cache = CommitmentCache::new();
//! let commitment = cache.get_or_aggregate(&ring, &srs).unwrap();
//! let signature = sign_with_commitment(&secrets[0], &ring, &srs, &commitment, b"foo", b"", 0)
//!     .unwrap()
//!     .to_bytes()
//!     .unwrap();
//! assert!(verify_with_commitment(&ring, &srs, &commitment, b"foo", b"", &signature)
//!     .unwrap()
//!     .is_valid());
//! ```
//!
//! # Structured reference strings
//! Every operation runs against an [`Srs`]: the public generators for rings of
//! up to `2^N` members. An SRS file is the plain concatenation of its
//! compressed generators, see [`srs`]. [`Srs::generate`] derives one
//! deterministically, and [`SrsCache`] memoizes loaded files by path.
//!
//! # Perfomance
//! These proofs depend heavily on
//! [curve25519-dalek](https://docs.rs/curve25519-dalek) for elliptic curve
//! operations on the ristretto255 group. Proof size and verification time grow
//! logarithmically and linearly in the ring size, respectively.
//!
//! Benchmarks are run using [criterion.rs](https://docs.rs/criterion):
//! ```bash
//! cargo bench
//! ```
//!
//! # References
//! * [One-out-of-Many Proofs: Or How to Leak a Secret and Spend a Coin](https://eprint.iacr.org/2014/764)
//! * [Short Accountable Ring Signatures Based on DDH](https://eprint.iacr.org/2015/643)
//! * [Lelandus: Towards Confidentiality and Anonymity of Blockchain Transactions From Standard Assumptions](https://eprint.iacr.org/2019/373)
//! * [Ring Verifiable Random Functions and Zero-Knowledge Continuations](https://eprint.iacr.org/2023/002)

//-----------------------------------------------------------------------------
// Public modules
//-----------------------------------------------------------------------------
pub mod curve;
pub mod errors;
pub mod keys;
pub mod proofs;
pub mod prover;
pub mod ring;
pub mod signature;
pub mod srs;
pub mod verifier;
pub mod vrf;

#[cfg(feature = "ffi")]
pub mod ffi;

//-----------------------------------------------------------------------------
// Internal modules
//-----------------------------------------------------------------------------
pub(crate) mod gray_code;
pub(crate) mod transcript;

//-----------------------------------------------------------------------------
// Re-exports
//-----------------------------------------------------------------------------
pub use errors::{Result, RingVrfError};
pub use keys::{PublicKey, SecretKey};
pub use prover::{sign, sign_with_commitment};
pub use ring::{aggregate, CommitmentCache, Ring, RingCommitment};
pub use signature::RingVrfSignature;
pub use srs::{Srs, SrsCache};
pub use transcript::RING_VRF_TRANSCRIPT_LABEL;
pub use verifier::{verify, verify_signature, verify_with_commitment, Verification};
pub use vrf::{VrfInput, VrfOutput, VrfPreOutput};
