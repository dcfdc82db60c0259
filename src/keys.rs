//! Ring member keys.
//!
//! A secret key is a non-zero scalar `x`; its public key is `x*B` for the
//! Ristretto basepoint `B`, encoded as a 32 byte compressed point.
use crate::curve::{self, POINT_LEN, SCALAR_LEN};
use crate::errors::{Result, RingVrfError};
use crate::vrf::{VrfInput, VrfOutput, VrfPreOutput};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_TABLE;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const SECRET_SEED_DOMAIN: &[u8] = b"ring-vrf secret seed";

/// A ring member's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "[u8; 32]", into = "[u8; 32]")
)]
pub struct PublicKey {
    point: RistrettoPoint,
    bytes: [u8; POINT_LEN],
}

impl PublicKey {
    /// Parse a compressed public key. Identity and non-canonical encodings
    /// are refused.
    pub fn from_bytes(bytes: &[u8]) -> Option<PublicKey> {
        curve::decode_point(bytes).map(PublicKey::from_point)
    }

    /// Parse a hex encoded public key. `index` names the key's ring position
    /// in any error.
    pub fn from_hex(hex_str: &str, index: usize) -> Result<PublicKey> {
        let raw = hex::decode(hex_str.trim()).map_err(|_| RingVrfError::Parse {
            index: Some(index),
            reason: "invalid hex",
        })?;
        if raw.len() != POINT_LEN {
            return Err(RingVrfError::Parse {
                index: Some(index),
                reason: "public key must be 32 bytes",
            });
        }
        PublicKey::from_bytes(&raw).ok_or(RingVrfError::InvalidKey { index })
    }

    pub(crate) fn from_point(point: RistrettoPoint) -> PublicKey {
        PublicKey {
            point,
            bytes: curve::encode_point(&point),
        }
    }

    pub fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }

    pub fn as_bytes(&self) -> &[u8; POINT_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl TryFrom<[u8; POINT_LEN]> for PublicKey {
    type Error = &'static str;

    fn try_from(bytes: [u8; POINT_LEN]) -> core::result::Result<PublicKey, Self::Error> {
        PublicKey::from_bytes(&bytes).ok_or("invalid public key")
    }
}

impl From<PublicKey> for [u8; POINT_LEN] {
    fn from(key: PublicKey) -> [u8; POINT_LEN] {
        key.bytes
    }
}

/// A ring member's secret key. Zeroized on drop.
#[derive(Clone)]
pub struct SecretKey {
    scalar: Scalar,
    public: PublicKey,
}

impl SecretKey {
    /// Derive a secret key from seed bytes of any length.
    pub fn from_seed(seed: &[u8]) -> Result<SecretKey> {
        SecretKey::from_scalar(curve::hash_to_scalar(SECRET_SEED_DOMAIN, &[seed]))
    }

    /// Derive a secret key from a hex encoded 32 byte seed.
    pub fn from_hex_seed(hex_str: &str) -> Result<SecretKey> {
        let mut raw = hex::decode(hex_str.trim()).map_err(|_| RingVrfError::Parse {
            index: None,
            reason: "invalid secret hex",
        })?;
        if raw.len() != SCALAR_LEN {
            raw.zeroize();
            return Err(RingVrfError::Parse {
                index: None,
                reason: "secret seed must be 32 bytes",
            });
        }
        let secret = SecretKey::from_seed(&raw);
        raw.zeroize();
        secret
    }

    /// Use a canonically encoded scalar as the secret key.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<SecretKey> {
        let scalar = curve::decode_scalar(bytes).ok_or(RingVrfError::InvalidSecret)?;
        SecretKey::from_scalar(scalar)
    }

    /// Draw a fresh secret key.
    pub fn random<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> SecretKey {
        loop {
            if let Ok(secret) = SecretKey::from_scalar(Scalar::random(rng)) {
                return secret;
            }
        }
    }

    fn from_scalar(scalar: Scalar) -> Result<SecretKey> {
        if scalar == Scalar::zero() {
            return Err(RingVrfError::InvalidSecret);
        }
        let public = PublicKey::from_point(&scalar * &RISTRETTO_BASEPOINT_TABLE);
        Ok(SecretKey { scalar, public })
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn as_scalar(&self) -> &Scalar {
        &self.scalar
    }

    /// The VRF pre-output `x*I` for `input`.
    pub fn vrf_pre_output(&self, input: &VrfInput) -> VrfPreOutput {
        VrfPreOutput::from_point(self.scalar * input.as_point())
    }

    /// Evaluate the VRF directly, without any ring proof.
    pub fn vrf_output(&self, input: &VrfInput) -> VrfOutput {
        self.vrf_pre_output(input).output()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecretKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
