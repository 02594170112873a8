use crate::curve::{Point, Scalar};
use crate::error::{Result, SchnorrError};
use rand_core::{CryptoRng, RngCore};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

pub struct KeyPair {
    pub(crate) private_key: Secret<Scalar>,
    pub public_key: Point,
    x_only: XOnlyPublicKey,
}

use std::fmt;
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Format the KeyPair struct without including private_key
        write!(f, "KeyPair {{ public_key: {:?} }}", self.public_key)
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        KeyPair {
            private_key: Secret::new(self.private_key.expose_secret().clone()),
            public_key: self.public_key.clone(),
            x_only: self.x_only,
        }
    }
}

impl KeyPair {
    pub fn generate<R>(rng: &mut R) -> Result<KeyPair>
    where
        R: CryptoRng + RngCore,
    {
        let private_key = Secret::new(Scalar::random_nonzero(rng)?);
        KeyPair::from_secret_scalar(private_key)
    }

    /// Builds the key pair for `d`, rejecting `d = 0`.
    pub fn from_secret_scalar(private_key: Secret<Scalar>) -> Result<KeyPair> {
        if private_key.expose_secret().is_zero() {
            return Err(SchnorrError::InvalidPrivateKey);
        }
        let public_key = Point::mul_base(private_key.expose_secret());
        let x_only = XOnlyPublicKey::from_point(&public_key)?;
        Ok(KeyPair {
            private_key,
            public_key,
            x_only,
        })
    }

    /// Decodes a 32-byte big-endian private scalar in `[1, N-1]`.
    pub fn from_bytes(bytes: &[u8]) -> Result<KeyPair> {
        if bytes.is_empty() {
            return Err(SchnorrError::NoKeyProvided);
        }
        let bytes: &[u8; 32] = bytes
            .try_into()
            .map_err(|_| SchnorrError::InvalidInputLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        let scalar = Scalar::from_be_bytes_canonical(bytes).ok_or(SchnorrError::InvalidPrivateKey)?;
        KeyPair::from_secret_scalar(Secret::new(scalar))
    }

    pub fn public_key(&self) -> &Point {
        &self.public_key
    }

    pub fn x_only_public_key(&self) -> XOnlyPublicKey {
        self.x_only
    }

    /// The private scalar for the even-y twin of the public key: `d` when
    /// `P` has even y, `N - d` otherwise.
    pub(crate) fn even_y_private_key(&self) -> Secret<Scalar> {
        let d = self.private_key.expose_secret();
        if self.public_key.has_even_y() {
            Secret::new(d.clone())
        } else {
            Secret::new(-d)
        }
    }
}

/// A public key encoded as its 32-byte x coordinate, y implicitly even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XOnlyPublicKey([u8; 32]);

impl XOnlyPublicKey {
    pub fn from_point(point: &Point) -> Result<Self> {
        Ok(XOnlyPublicKey(point.x_only()?))
    }

    /// Accepts exactly 32 bytes; does not check that the x coordinate lifts.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SchnorrError::NoKeyProvided);
        }
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SchnorrError::InvalidInputLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(XOnlyPublicKey(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        XOnlyPublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lifts back to the even-y point with this x coordinate.
    pub fn to_point(&self) -> Result<Point> {
        Point::lift_x(&self.0)
    }
}
