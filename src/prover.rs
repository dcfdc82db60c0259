//! Ring VRF signing.
#![allow(non_snake_case)]
use crate::errors::{Result, RingVrfError};
use crate::keys::SecretKey;
use crate::proofs::OneOfManyProofs;
use crate::ring::{aggregate, Ring, RingCommitment};
use crate::signature::RingVrfSignature;
use crate::srs::Srs;
use crate::transcript::ring_vrf_transcript;
use crate::vrf::{PedersenVrfProof, VrfInput};
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

/// Sign `input` and `aux` as the ring member at `signer_index`.
///
/// The signature proves that the signer holds the secret key of some ring
/// member, without revealing which, and carries the VRF pre-output for
/// `input`. Every call blinds the signer afresh, so two signatures over the
/// same message differ while their VRF outputs agree.
///
/// ```
/// # use rand::rngs::OsRng;
/// # use ring_vrf::keys::SecretKey;
/// # use ring_vrf::prover::sign;
/// # use ring_vrf::ring::Ring;
/// # use ring_vrf::srs::Srs;
/// let srs = Srs::generate(3).unwrap();
/// let secrets = (0..5)
///     .map(|_| SecretKey::random(&mut OsRng))
///     .collect::<Vec<SecretKey>>();
/// let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), 5).unwrap();
///
/// let signature = sign(&secrets[2], &ring, &srs, b"foo", b"bar", 2).unwrap();
/// assert_eq!(signature.output(), secrets[2].vrf_output(&ring_vrf::vrf::VrfInput::new(b"foo")));
/// assert!(sign(&secrets[2], &ring, &srs, b"foo", b"bar", 3).is_err());
/// ```
pub fn sign(
    secret: &SecretKey,
    ring: &Ring,
    srs: &Srs,
    input: &[u8],
    aux: &[u8],
    signer_index: usize,
) -> Result<RingVrfSignature> {
    check_signer(secret, ring, signer_index)?;
    let commitment = aggregate(ring, srs)?;
    sign_with_commitment(secret, ring, srs, &commitment, input, aux, signer_index)
}

/// Sign with a precomputed ring commitment, eg. one held in a
/// [`CommitmentCache`](crate::ring::CommitmentCache).
///
/// `commitment` must be the output of [`aggregate`] for exactly this `ring`
/// and `srs`. Only its ring length is checked in release builds; any other
/// commitment yields a signature that does not verify.
pub fn sign_with_commitment(
    secret: &SecretKey,
    ring: &Ring,
    srs: &Srs,
    commitment: &RingCommitment,
    input: &[u8],
    aux: &[u8],
    signer_index: usize,
) -> Result<RingVrfSignature> {
    check_signer(secret, ring, signer_index)?;
    commitment.check_ring(ring, srs)?;
    let n_bits = ring.proof_bits();
    let gens = srs.proof_gens(n_bits)?;

    let input = VrfInput::new(input);
    let pre_output = secret.vrf_pre_output(&input);
    let mut blinding = Scalar::random(&mut rand::thread_rng());
    let K = secret.public().as_point() + blinding * gens.blinding();

    let mut transcript = ring_vrf_transcript(commitment, &input, &pre_output, aux, &K)?;
    let vrf_proof = PedersenVrfProof::prove(
        &mut transcript,
        secret,
        &blinding,
        srs.blinding_generator(),
        &input,
    )?;

    // At the signer's slot, `P_l - K = -b*G` commits to zero.
    let set = ring.padded_points(n_bits);
    let witness = -blinding;
    let ring_proof = set
        .iter()
        .prove_with_offset(&gens, &mut transcript, signer_index, &witness, &K);
    blinding.zeroize();

    Ok(RingVrfSignature {
        pre_output,
        key_commitment: K,
        vrf_proof,
        ring_proof: ring_proof?,
    })
}

fn check_signer(secret: &SecretKey, ring: &Ring, signer_index: usize) -> Result<()> {
    match ring.get(signer_index) {
        Some(member) if member == secret.public() => Ok(()),
        _ => Err(RingVrfError::KeyIndexMismatch {
            index: signer_index,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PublicKey;
    use rand::rngs::OsRng;

    fn setup(n: usize) -> (Srs, Vec<SecretKey>, Ring) {
        let srs = Srs::generate(4).unwrap();
        let secrets = (0..n)
            .map(|_| SecretKey::random(&mut OsRng))
            .collect::<Vec<SecretKey>>();
        let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), n).unwrap();
        (srs, secrets, ring)
    }

    #[test]
    fn signer_must_match_index() {
        let (srs, secrets, ring) = setup(6);
        assert!(sign(&secrets[2], &ring, &srs, b"foo", b"bar", 2).is_ok());
        assert!(matches!(
            sign(&secrets[2], &ring, &srs, b"foo", b"bar", 3).unwrap_err(),
            RingVrfError::KeyIndexMismatch { index: 3 }
        ));
        assert!(matches!(
            sign(&secrets[2], &ring, &srs, b"foo", b"bar", 6).unwrap_err(),
            RingVrfError::KeyIndexMismatch { index: 6 }
        ));
        let outsider = SecretKey::random(&mut OsRng);
        assert!(matches!(
            sign(&outsider, &ring, &srs, b"foo", b"bar", 0).unwrap_err(),
            RingVrfError::KeyIndexMismatch { index: 0 }
        ));
    }

    #[test]
    fn index_is_checked_before_ring_size() {
        let srs = Srs::generate(2).unwrap();
        let (_, secrets, ring) = setup(5);
        assert!(matches!(
            sign(&secrets[0], &ring, &srs, b"foo", b"bar", 1).unwrap_err(),
            RingVrfError::KeyIndexMismatch { index: 1 }
        ));
        assert!(matches!(
            sign(&secrets[0], &ring, &srs, b"foo", b"bar", 0).unwrap_err(),
            RingVrfError::UnsupportedRingSize {
                ring_size: 5,
                max: 4
            }
        ));
    }

    #[test]
    fn signatures_are_blinded() {
        let (srs, secrets, ring) = setup(3);
        let a = sign(&secrets[1], &ring, &srs, b"foo", b"bar", 1).unwrap();
        let b = sign(&secrets[1], &ring, &srs, b"foo", b"bar", 1).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.key_commitment, b.key_commitment);
        assert_eq!(a.pre_output(), b.pre_output());
        assert_ne!(a.key_commitment, *secrets[1].public().as_point());
    }

    #[test]
    fn commitment_must_match_ring() {
        let (srs, secrets, ring) = setup(4);
        let shorter = Ring::new(
            ring.keys()[..3].iter().copied().collect::<Vec<PublicKey>>(),
            3,
        )
        .unwrap();
        let commitment = aggregate(&shorter, &srs).unwrap();
        assert!(matches!(
            sign_with_commitment(&secrets[0], &ring, &srs, &commitment, b"foo", b"", 0)
                .unwrap_err(),
            RingVrfError::RingSizeMismatch {
                declared: 3,
                actual: 4
            }
        ));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "ring commitment does not match")]
    fn foreign_commitment_of_same_length() {
        let (srs, secrets, ring) = setup(4);
        let (_, _, other) = setup(4);
        let commitment = aggregate(&other, &srs).unwrap();
        let _ = sign_with_commitment(&secrets[0], &ring, &srs, &commitment, b"foo", b"", 0);
    }

    #[test]
    fn single_member_ring() {
        let (srs, secrets, ring) = setup(1);
        let sig = sign(&secrets[0], &ring, &srs, b"foo", b"bar", 0).unwrap();
        assert_eq!(sig.n_bits(), 2);
    }
}
