//! VRF input, output, and the Pedersen VRF proof.
//!
//! A Pedersen VRF proves that a pre-output `O = x*I` was computed with the
//! secret `x` opened by a key commitment `K = x*B + b*G`, without revealing
//! `x` or the public key `x*B`.
#![allow(non_snake_case)]
use crate::curve::{self, BASEPOINT, POINT_LEN};
use crate::errors::{ProofError, ProofResult};
use crate::keys::SecretKey;
use crate::transcript::TranscriptProtocol;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const VRF_INPUT_DOMAIN: &[u8] = b"ring-vrf input";
const VRF_OUTPUT_DOMAIN: &[u8] = b"ring-vrf output";

/// Length of a VRF output.
pub const VRF_OUTPUT_LEN: usize = 32;

/// A VRF input, mapped onto the curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrfInput {
    data: Vec<u8>,
    point: RistrettoPoint,
}

impl VrfInput {
    pub fn new(data: &[u8]) -> VrfInput {
        VrfInput {
            data: data.to_vec(),
            point: curve::hash_to_point(VRF_INPUT_DOMAIN, &[data]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }
}

/// The VRF pre-output `x*I`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VrfPreOutput(RistrettoPoint);

impl VrfPreOutput {
    pub(crate) fn from_point(point: RistrettoPoint) -> VrfPreOutput {
        VrfPreOutput(point)
    }

    pub fn as_point(&self) -> &RistrettoPoint {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; POINT_LEN] {
        curve::encode_point(&self.0)
    }

    /// Hash the pre-output down to the VRF output.
    pub fn output(&self) -> VrfOutput {
        let wide = curve::hash_wide(VRF_OUTPUT_DOMAIN, &[&self.to_bytes()]);
        let mut out = [0u8; VRF_OUTPUT_LEN];
        out.copy_from_slice(&wide[..VRF_OUTPUT_LEN]);
        VrfOutput(out)
    }
}

/// The pseudorandom output of the VRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VrfOutput([u8; VRF_OUTPUT_LEN]);

impl VrfOutput {
    pub fn as_bytes(&self) -> &[u8; VRF_OUTPUT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; VRF_OUTPUT_LEN]> for VrfOutput {
    fn from(bytes: [u8; VRF_OUTPUT_LEN]) -> VrfOutput {
        VrfOutput(bytes)
    }
}

/// Proof that a pre-output and a key commitment share one secret.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PedersenVrfProof {
    pub(crate) R: RistrettoPoint,
    pub(crate) R_I: RistrettoPoint,
    pub(crate) s: Scalar,
    pub(crate) s_b: Scalar,
}

impl PedersenVrfProof {
    /// Prove `K = x*B + b*G` and `O = x*I` for the same `x`.
    ///
    /// The caller must already have bound `I`, `O` and `K` to the transcript.
    pub(crate) fn prove(
        transcript: &mut Transcript,
        secret: &SecretKey,
        blinding: &Scalar,
        G: &RistrettoPoint,
        input: &VrfInput,
    ) -> ProofResult<PedersenVrfProof> {
        transcript.pedersen_vrf_domain_sep();

        // Nonces come from the transcript RNG rekeyed with the witness (`x`, `b`).
        let mut rng = {
            let builder = transcript
                .build_rng()
                .rekey_with_witness_bytes(b"x", secret.as_scalar().as_bytes())
                .rekey_with_witness_bytes(b"b", blinding.as_bytes());

            use rand::thread_rng;
            builder.finalize(&mut thread_rng())
        };
        let k = Scalar::random(&mut rng);
        let k_b = Scalar::random(&mut rng);

        let R = k * BASEPOINT + k_b * G;
        let R_I = k * input.as_point();
        transcript.validate_and_append_point(b"R", &R.compress())?;
        transcript.validate_and_append_point(b"R_I", &R_I.compress())?;

        let c = transcript.challenge_scalar(b"pedersen-vrf-challenge");
        let s = k + c * secret.as_scalar();
        let s_b = k_b + c * blinding;
        transcript.append_scalar(b"s", &s);
        transcript.append_scalar(b"s_b", &s_b);

        Ok(PedersenVrfProof { R, R_I, s, s_b })
    }

    /// Check the proof against a key commitment `K` and pre-output `O`.
    pub(crate) fn verify(
        &self,
        transcript: &mut Transcript,
        G: &RistrettoPoint,
        input: &VrfInput,
        pre_output: &VrfPreOutput,
        K: &RistrettoPoint,
    ) -> ProofResult<()> {
        transcript.pedersen_vrf_domain_sep();
        transcript.validate_and_append_point(b"R", &self.R.compress())?;
        transcript.validate_and_append_point(b"R_I", &self.R_I.compress())?;

        let c = transcript.challenge_scalar(b"pedersen-vrf-challenge");
        transcript.append_scalar(b"s", &self.s);
        transcript.append_scalar(b"s_b", &self.s_b);

        if !self.s.is_canonical() {
            return Err(ProofError::InvalidScalar(self.s));
        }
        if !self.s_b.is_canonical() {
            return Err(ProofError::InvalidScalar(self.s_b));
        }

        if self.s * BASEPOINT + self.s_b * G != self.R + c * K {
            return Err(ProofError::VerificationFailed);
        }
        if self.s * input.as_point() != self.R_I + c * pre_output.as_point() {
            return Err(ProofError::VerificationFailed);
        }
        Ok(())
    }
}
