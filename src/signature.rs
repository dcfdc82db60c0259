//! Ring VRF signatures and their wire format.
//!
//! ```text
//! O || K || R || R_I || s || s_b      Pedersen VRF proof
//! n_bits                              one byte
//! B || A || C || D                    bit commitments
//! f1_j[n_bits] || z_A || z_C          bit proof responses
//! G_k[n_bits] || z                    membership proof
//! ```
//!
//! Points and scalars take 32 bytes each. Decoding requires the exact length,
//! canonical scalars and non-identity points.
#![allow(non_snake_case)]
use crate::curve::{self, POINT_LEN, SCALAR_LEN};
use crate::errors::{Result, RingVrfError};
use crate::proofs::{BitProof, OneOfManyProof};
use crate::ring::MIN_PROOF_BITS;
use crate::srs::MAX_DOMAIN_BITS;
use crate::vrf::{PedersenVrfProof, VrfOutput, VrfPreOutput};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An anonymous ring VRF signature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingVrfSignature {
    pub(crate) pre_output: VrfPreOutput,
    pub(crate) key_commitment: RistrettoPoint,
    pub(crate) vrf_proof: PedersenVrfProof,
    pub(crate) ring_proof: OneOfManyProof,
}

impl RingVrfSignature {
    /// Encoded length of a signature whose ring proof covers `n_bits` bits.
    pub fn encoded_len(n_bits: usize) -> usize {
        4 * POINT_LEN
            + 2 * SCALAR_LEN
            + 1
            + 4 * POINT_LEN
            + (n_bits + 2) * SCALAR_LEN
            + n_bits * POINT_LEN
            + SCALAR_LEN
    }

    pub fn pre_output(&self) -> &VrfPreOutput {
        &self.pre_output
    }

    /// The VRF output carried by this signature. Only meaningful once the
    /// signature has been verified.
    pub fn output(&self) -> VrfOutput {
        self.pre_output.output()
    }

    pub fn n_bits(&self) -> usize {
        self.ring_proof.n_bits()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let n_bits = self.ring_proof.G_k.len();
        if !(MIN_PROOF_BITS..=MAX_DOMAIN_BITS).contains(&n_bits) {
            return Err(RingVrfError::Serialization("ring proof size out of range"));
        }
        let bits = &self.ring_proof.bit_proof;
        if bits.f1_j.len() != n_bits {
            return Err(RingVrfError::Serialization("bit proof size mismatch"));
        }

        let mut out = Vec::with_capacity(RingVrfSignature::encoded_len(n_bits));
        let point = |out: &mut Vec<u8>, p: &RistrettoPoint| {
            out.extend_from_slice(&curve::encode_point(p))
        };
        point(&mut out, self.pre_output.as_point());
        point(&mut out, &self.key_commitment);
        point(&mut out, &self.vrf_proof.R);
        point(&mut out, &self.vrf_proof.R_I);
        out.extend_from_slice(self.vrf_proof.s.as_bytes());
        out.extend_from_slice(self.vrf_proof.s_b.as_bytes());

        out.push(n_bits as u8);
        point(&mut out, &self.ring_proof.B);
        point(&mut out, &bits.A);
        point(&mut out, &bits.C);
        point(&mut out, &bits.D);
        for f in &bits.f1_j {
            out.extend_from_slice(f.as_bytes());
        }
        out.extend_from_slice(bits.z_A.as_bytes());
        out.extend_from_slice(bits.z_C.as_bytes());
        for G in &self.ring_proof.G_k {
            point(&mut out, G);
        }
        out.extend_from_slice(self.ring_proof.z.as_bytes());
        Ok(out)
    }

    /// Decode a signature. Returns `None` for anything but an exact, canonical
    /// encoding.
    pub fn from_bytes(bytes: &[u8]) -> Option<RingVrfSignature> {
        let mut r = Reader(bytes);

        let pre_output = VrfPreOutput::from_point(r.point()?);
        let key_commitment = r.point()?;
        let vrf_proof = PedersenVrfProof {
            R: r.point()?,
            R_I: r.point()?,
            s: r.scalar()?,
            s_b: r.scalar()?,
        };

        let n_bits = r.byte()? as usize;
        if !(MIN_PROOF_BITS..=MAX_DOMAIN_BITS).contains(&n_bits)
            || bytes.len() != RingVrfSignature::encoded_len(n_bits)
        {
            return None;
        }
        let B = r.point()?;
        let A = r.point()?;
        let C = r.point()?;
        let D = r.point()?;
        let f1_j = (0..n_bits)
            .map(|_| r.scalar())
            .collect::<Option<Vec<Scalar>>>()?;
        let bit_proof = BitProof {
            A,
            C,
            D,
            f1_j,
            z_A: r.scalar()?,
            z_C: r.scalar()?,
        };
        let G_k = (0..n_bits)
            .map(|_| r.point())
            .collect::<Option<Vec<RistrettoPoint>>>()?;
        let z = r.scalar()?;
        if !r.0.is_empty() {
            return None;
        }

        Some(RingVrfSignature {
            pre_output,
            key_commitment,
            vrf_proof,
            ring_proof: OneOfManyProof {
                B,
                bit_proof,
                G_k,
                z,
            },
        })
    }
}

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.0.len() < n {
            return None;
        }
        let (head, tail) = self.0.split_at(n);
        self.0 = tail;
        Some(head)
    }

    fn byte(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn point(&mut self) -> Option<RistrettoPoint> {
        curve::decode_point(self.take(POINT_LEN)?)
    }

    fn scalar(&mut self) -> Option<Scalar> {
        curve::decode_scalar(self.take(SCALAR_LEN)?)
    }
}
