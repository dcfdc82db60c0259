//! Ring VRF verification.
//!
//! Verification distinguishes caller errors from rejection: a ring that does
//! not parse, or does not fit the SRS, is an `Err`, while any signature that
//! fails to decode or to verify is [`Verification::Rejected`].
#![allow(non_snake_case)]
use crate::errors::Result;
use crate::proofs::OneOfManyProofs;
use crate::ring::{aggregate, Ring, RingCommitment};
use crate::signature::RingVrfSignature;
use crate::srs::Srs;
use crate::transcript::ring_vrf_transcript;
use crate::vrf::{VrfInput, VrfOutput};

/// The outcome of verifying a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The signature is valid; carries the signer's VRF output.
    Valid(VrfOutput),
    Rejected,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    pub fn output(&self) -> Option<&VrfOutput> {
        match self {
            Verification::Valid(output) => Some(output),
            Verification::Rejected => None,
        }
    }
}

/// Verify an encoded signature over `input` and `aux` against `ring`.
///
/// ```
/// # use rand::rngs::OsRng;
/// # use ring_vrf::keys::SecretKey;
/// # use ring_vrf::prover::sign;
/// # use ring_vrf::ring::Ring;
/// # use ring_vrf::srs::Srs;
/// # use ring_vrf::verifier::{verify, Verification};
/// let srs = Srs::generate(3).unwrap();
/// let secrets = (0..6)
///     .map(|_| SecretKey::random(&mut OsRng))
///     .collect::<Vec<SecretKey>>();
/// let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), 6).unwrap();
/// let signature = sign(&secrets[2], &ring, &srs, b"foo", b"bar", 2)
///     .unwrap()
///     .to_bytes()
///     .unwrap();
///
/// let result = verify(&ring, &srs, b"foo", b"bar", &signature).unwrap();
/// assert!(result.is_valid());
/// assert_eq!(
///     verify(&ring, &srs, b"foo", b"baz", &signature).unwrap(),
///     Verification::Rejected
/// );
/// ```
pub fn verify(
    ring: &Ring,
    srs: &Srs,
    input: &[u8],
    aux: &[u8],
    signature: &[u8],
) -> Result<Verification> {
    let commitment = aggregate(ring, srs)?;
    verify_with_commitment(ring, srs, &commitment, input, aux, signature)
}

/// Verify a decoded signature.
pub fn verify_signature(
    ring: &Ring,
    srs: &Srs,
    input: &[u8],
    aux: &[u8],
    signature: &RingVrfSignature,
) -> Result<Verification> {
    let commitment = aggregate(ring, srs)?;
    check(ring, srs, &commitment, input, aux, signature)
}

/// Verify an encoded signature with a precomputed ring commitment.
///
/// `commitment` must be the output of [`aggregate`] for exactly this `ring`
/// and `srs`. Only its ring length is checked in release builds; any other
/// commitment rejects every signature.
pub fn verify_with_commitment(
    ring: &Ring,
    srs: &Srs,
    commitment: &RingCommitment,
    input: &[u8],
    aux: &[u8],
    signature: &[u8],
) -> Result<Verification> {
    match RingVrfSignature::from_bytes(signature) {
        Some(signature) => check(ring, srs, commitment, input, aux, &signature),
        None => {
            // Caller errors still surface for undecodable signatures.
            commitment.check_ring(ring, srs)?;
            Ok(Verification::Rejected)
        }
    }
}

fn check(
    ring: &Ring,
    srs: &Srs,
    commitment: &RingCommitment,
    input: &[u8],
    aux: &[u8],
    signature: &RingVrfSignature,
) -> Result<Verification> {
    commitment.check_ring(ring, srs)?;
    let n_bits = ring.proof_bits();
    if signature.n_bits() != n_bits {
        return Ok(Verification::Rejected);
    }
    let gens = srs.proof_gens(n_bits)?;

    let input = VrfInput::new(input);
    let K = &signature.key_commitment;
    let mut transcript =
        match ring_vrf_transcript(commitment, &input, &signature.pre_output, aux, K) {
            Ok(t) => t,
            Err(_) => return Ok(Verification::Rejected),
        };
    if signature
        .vrf_proof
        .verify(
            &mut transcript,
            srs.blinding_generator(),
            &input,
            &signature.pre_output,
            K,
        )
        .is_err()
    {
        return Ok(Verification::Rejected);
    }

    let set = ring.padded_points(n_bits);
    if set
        .iter()
        .verify_with_offset(&gens, &mut transcript, &signature.ring_proof, K)
        .is_err()
    {
        return Ok(Verification::Rejected);
    }
    Ok(Verification::Valid(signature.output()))
}
