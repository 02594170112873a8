use super::params::CurveParams;
use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;

/// An element of the secp256k1 base field, always reduced modulo p.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

fn prime() -> &'static BigUint {
    CurveParams::secp256k1().field_prime()
}

impl FieldElement {
    /// Wraps a value that the caller guarantees is already below p.
    pub(crate) fn from_reduced(value: BigUint) -> Self {
        FieldElement(value)
    }

    pub fn zero() -> Self {
        FieldElement(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        FieldElement(BigUint::from(value) % prime())
    }

    /// Decodes a 32-byte big-endian value; `None` if it is not below p.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let value = BigUint::from_bytes_be(bytes);
        if &value < prime() {
            Some(FieldElement(value))
        } else {
            None
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        super::to_bytes32(&self.0.to_bytes_be())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_even(&self) -> bool {
        !self.0.bit(0)
    }

    pub fn square(&self) -> Self {
        FieldElement((&self.0 * &self.0) % prime())
    }

    /// Multiplicative inverse by Fermat's little theorem; zero maps to `None`.
    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let params = CurveParams::secp256k1();
        Some(FieldElement(
            self.0.modpow(params.field_inverse_exponent(), prime()),
        ))
    }

    /// Square root, if one exists. Of the two roots `r` and `p - r`, this
    /// returns whichever the exponentiation lands on; callers pick parity.
    pub fn sqrt(&self) -> Option<Self> {
        let params = CurveParams::secp256k1();
        let candidate = FieldElement(self.0.modpow(params.field_sqrt_exponent(), prime()));
        if &candidate.square() == self {
            Some(candidate)
        } else {
            None
        }
    }

    /// `2 * self`, `3 * self`, ... without going through a generic multiply.
    pub(crate) fn mul_small(&self, factor: u32) -> Self {
        FieldElement((&self.0 * factor) % prime())
    }
}

fn add(a: &FieldElement, b: &FieldElement) -> FieldElement {
    FieldElement((&a.0 + &b.0) % prime())
}

fn sub(a: &FieldElement, b: &FieldElement) -> FieldElement {
    FieldElement((prime() + &a.0 - &b.0) % prime())
}

fn mul(a: &FieldElement, b: &FieldElement) -> FieldElement {
    FieldElement((&a.0 * &b.0) % prime())
}

fn neg(a: &FieldElement) -> FieldElement {
    FieldElement((prime() - &a.0) % prime())
}

forward_binop!(FieldElement, Add, add, add);
forward_binop!(FieldElement, Sub, sub, sub);
forward_binop!(FieldElement, Mul, mul, mul);

impl std::ops::Neg for &FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        neg(self)
    }
}

impl std::ops::Neg for FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        neg(&self)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FieldElement(0x{:064x})", self.0)
    }
}
