use super::params::CurveParams;
use crate::error::{Result, SchnorrError};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// An integer modulo the secp256k1 group order N, always in `[0, N)`.
///
/// Used for private keys, nonces, challenges and signature `s` values.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Scalar(BigUint);

fn order() -> &'static BigUint {
    CurveParams::secp256k1().order()
}

/// Fits a big-endian byte string into 32 bytes: shorter input is left-padded
/// with zeros, longer input keeps its rightmost 32 bytes.
pub fn to_bytes32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    if bytes.len() > 32 {
        out.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        out[32 - bytes.len()..].copy_from_slice(bytes);
    }
    out
}

impl Scalar {
    pub fn zero() -> Self {
        Scalar(BigUint::zero())
    }

    pub fn one() -> Self {
        Scalar(BigUint::one())
    }

    pub fn from_u64(value: u64) -> Self {
        Scalar(BigUint::from(value) % order())
    }

    /// Folds any integer, negative ones included, into `[0, N)`.
    pub fn reduce(value: &BigInt) -> Self {
        let n = BigInt::from_biguint(Sign::Plus, order().clone());
        // mod_floor with a positive modulus is never negative.
        let (_, magnitude) = value.mod_floor(&n).into_parts();
        Scalar(magnitude)
    }

    /// Interprets bytes of any length as a big-endian integer and reduces it.
    pub fn from_be_bytes_reduced(bytes: &[u8]) -> Self {
        Scalar(BigUint::from_bytes_be(bytes) % order())
    }

    /// Decodes exactly 32 big-endian bytes, rejecting values not below N.
    pub fn from_be_bytes_canonical(bytes: &[u8; 32]) -> Option<Self> {
        let value = BigUint::from_bytes_be(bytes);
        if &value < order() {
            Some(Scalar(value))
        } else {
            None
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        to_bytes32(&self.0.to_bytes_be())
    }

    /// Draws 32 random bytes, reduces them modulo N and retries on zero.
    ///
    /// A failing entropy source is reported immediately and never retried.
    pub fn random_nonzero<R>(rng: &mut R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        loop {
            let mut buf = [0u8; 32];
            rng.try_fill_bytes(&mut buf)
                .map_err(|e| SchnorrError::EntropySourceFailure(e.to_string()))?;
            let candidate = Scalar::from_be_bytes_reduced(&buf);
            buf.zeroize();
            if !candidate.is_zero() {
                return Ok(candidate);
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Inverse modulo N, `None` for zero.
    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let params = CurveParams::secp256k1();
        Some(Scalar(
            self.0.modpow(params.order_inverse_exponent(), order()),
        ))
    }

    /// Bit `i` of the canonical value, least significant first.
    pub(crate) fn bit(&self, i: u64) -> bool {
        self.0.bit(i)
    }

    pub(crate) fn bits(&self) -> u64 {
        self.0.bits()
    }
}

fn add(a: &Scalar, b: &Scalar) -> Scalar {
    Scalar((&a.0 + &b.0) % order())
}

fn sub(a: &Scalar, b: &Scalar) -> Scalar {
    Scalar((order() + &a.0 - &b.0) % order())
}

fn mul(a: &Scalar, b: &Scalar) -> Scalar {
    Scalar((&a.0 * &b.0) % order())
}

fn neg(a: &Scalar) -> Scalar {
    Scalar((order() - &a.0) % order())
}

forward_binop!(Scalar, Add, add, add);
forward_binop!(Scalar, Sub, sub, sub);
forward_binop!(Scalar, Mul, mul, mul);

impl std::ops::Neg for &Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        neg(self)
    }
}

impl std::ops::Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        neg(&self)
    }
}

impl std::iter::Sum for Scalar {
    fn sum<I: Iterator<Item = Scalar>>(iter: I) -> Scalar {
        iter.fold(Scalar::zero(), |acc, s| acc + s)
    }
}

impl<'a> std::iter::Sum<&'a Scalar> for Scalar {
    fn sum<I: Iterator<Item = &'a Scalar>>(iter: I) -> Scalar {
        iter.fold(Scalar::zero(), |acc, s| acc + s)
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.set_zero();
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Scalar(0x{:064x})", self.0)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_be_bytes())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| D::Error::invalid_length(bytes.len(), &"32 bytes"))?;
        Scalar::from_be_bytes_canonical(&bytes)
            .ok_or_else(|| D::Error::custom("scalar is not below the group order"))
    }
}
