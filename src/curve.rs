//! Ristretto group helpers shared by the keys, the SRS, the ring commitment
//! and both proofs: canonical point and scalar codecs, hashing into the
//! group and into the scalar field.
use curve25519_dalek::constants;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use sha3::{Digest, Sha3_512};

/// Length of a compressed Ristretto point.
pub const POINT_LEN: usize = 32;

/// Length of a canonically encoded scalar.
pub const SCALAR_LEN: usize = 32;

/// The generator that public keys and VRF secrets are defined against.
pub const BASEPOINT: RistrettoPoint = constants::RISTRETTO_BASEPOINT_POINT;

/// Decode a compressed point. Rejects wrong lengths, non-canonical encodings
/// and the identity.
pub fn decode_point(bytes: &[u8]) -> Option<RistrettoPoint> {
    if bytes.len() != POINT_LEN {
        return None;
    }
    let mut buf = [0u8; POINT_LEN];
    buf.copy_from_slice(bytes);
    let point = CompressedRistretto(buf).decompress()?;
    if point.is_identity() {
        None
    } else {
        Some(point)
    }
}

pub fn encode_point(point: &RistrettoPoint) -> [u8; POINT_LEN] {
    point.compress().to_bytes()
}

/// Decode a scalar, rejecting anything not reduced mod the group order.
pub fn decode_scalar(bytes: &[u8]) -> Option<Scalar> {
    if bytes.len() != SCALAR_LEN {
        return None;
    }
    let mut buf = [0u8; SCALAR_LEN];
    buf.copy_from_slice(bytes);
    Scalar::from_canonical_bytes(buf)
}

/// Hash a list of messages into the group under a domain label.
///
/// Each message is length-prefixed so that distinct splits of the same bytes
/// hash to distinct points.
pub fn hash_to_point(domain: &[u8], msgs: &[&[u8]]) -> RistrettoPoint {
    RistrettoPoint::from_hash(hasher(domain, msgs))
}

/// Hash a list of messages into the scalar field under a domain label.
pub fn hash_to_scalar(domain: &[u8], msgs: &[&[u8]]) -> Scalar {
    Scalar::from_hash(hasher(domain, msgs))
}

/// Hash a list of messages to 64 bytes under a domain label.
pub fn hash_wide(domain: &[u8], msgs: &[&[u8]]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(hasher(domain, msgs).result().as_slice());
    out
}

fn hasher(domain: &[u8], msgs: &[&[u8]]) -> Sha3_512 {
    let mut h = Sha3_512::new();
    h.input((domain.len() as u64).to_le_bytes());
    h.input(domain);
    for m in msgs {
        h.input((m.len() as u64).to_le_bytes());
        h.input(m);
    }
    h
}
