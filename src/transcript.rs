//! Defines a `TranscriptProtocol` trait for using a Merlin transcript.
use crate::errors::{ProofError, ProofResult};
use crate::ring::RingCommitment;
use crate::vrf::{VrfInput, VrfPreOutput};

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;

use merlin::Transcript;

/// Label every ring VRF transcript starts from.
pub const RING_VRF_TRANSCRIPT_LABEL: &[u8] = b"ring-vrf";

pub trait TranscriptProtocol {
    /// Append a domain separator for a ring VRF signature over a ring of `n`
    /// members.
    fn ring_vrf_domain_sep(&mut self, n: u64);

    /// Append a domain separator for the Pedersen VRF part of a signature.
    fn pedersen_vrf_domain_sep(&mut self);

    /// Append a domain separator for a one-of-many proof over an `n` bit set.
    fn one_of_many_proof_domain_sep(&mut self, n: u64);

    /// Append a domain separator for a length-`n` bit commitment proof.
    fn bit_proof_domain_sep(&mut self, n: u64);

    /// Append a `scalar` with the given `label`.
    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar);

    /// Append a `point` with the given `label`.
    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto);

    /// Check that a point is not the identity, then append it to the
    /// transcript.  Otherwise, return an error.
    fn validate_and_append_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> ProofResult<()>;

    /// Compute a `label`ed challenge variable.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn ring_vrf_domain_sep(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"ring-vrf v1");
        self.append_u64(b"ring-len", n);
    }

    fn pedersen_vrf_domain_sep(&mut self) {
        self.append_message(b"dom-sep", b"pedersen-vrf v1");
    }

    fn one_of_many_proof_domain_sep(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"oom-proof v1");
        self.append_u64(b"n", n);
    }

    fn bit_proof_domain_sep(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"bit-proof v1");
        self.append_u64(b"n", n);
    }

    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.append_message(label, scalar.as_bytes());
    }

    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.append_message(label, point.as_bytes());
    }

    fn validate_and_append_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> ProofResult<()> {
        use curve25519_dalek::traits::IsIdentity;

        if point.is_identity() {
            Err(ProofError::VerificationError)
        } else {
            self.append_message(label, point.as_bytes());
            Ok(())
        }
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);

        Scalar::from_bytes_mod_order_wide(&buf)
    }
}

/// Start the transcript of a ring VRF signature, binding the ring commitment,
/// the VRF input, the pre-output, the auxiliary data and the key commitment.
pub(crate) fn ring_vrf_transcript(
    commitment: &RingCommitment,
    input: &VrfInput,
    pre_output: &VrfPreOutput,
    aux: &[u8],
    key_commitment: &RistrettoPoint,
) -> ProofResult<Transcript> {
    let mut t = Transcript::new(RING_VRF_TRANSCRIPT_LABEL);
    t.ring_vrf_domain_sep(commitment.ring_len() as u64);
    t.append_message(b"ring", &commitment.to_bytes());
    t.append_message(b"input", input.as_bytes());
    t.append_point(b"I", &input.as_point().compress());
    t.validate_and_append_point(b"O", &pre_output.as_point().compress())?;
    t.append_message(b"aux", aux);
    t.validate_and_append_point(b"K", &key_commitment.compress())?;
    Ok(t)
}
