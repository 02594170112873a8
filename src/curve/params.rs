use super::field::FieldElement;
use super::point::Point;
use num_bigint::BigUint;
use std::sync::OnceLock;

const FIELD_PRIME: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFC, 0x2F,
];

const GROUP_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

const GENERATOR_X: [u8; 32] = [
    0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B, 0x07,
    0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8, 0x17, 0x98,
];

const GENERATOR_Y: [u8; 32] = [
    0x48, 0x3A, 0xDA, 0x77, 0x26, 0xA3, 0xC4, 0x65, 0x5D, 0xA4, 0xFB, 0xFC, 0x0E, 0x11, 0x08, 0xA8,
    0xFD, 0x17, 0xB4, 0x48, 0xA6, 0x85, 0x54, 0x19, 0x9C, 0x47, 0xD0, 0x8F, 0xFB, 0x10, 0xD4, 0xB8,
];

const CURVE_B: u32 = 7;

static SECP256K1: OnceLock<CurveParams> = OnceLock::new();

/// Immutable description of the secp256k1 curve.
///
/// Built once on first use and shared read-only by the field, scalar and
/// point code. Exponents used for inversion and square roots are derived
/// here so they are not recomputed per operation.
#[derive(Debug)]
pub struct CurveParams {
    field_prime: BigUint,
    order: BigUint,
    b: FieldElement,
    generator: Point,
    field_inverse_exponent: BigUint,
    field_sqrt_exponent: BigUint,
    order_inverse_exponent: BigUint,
}

impl CurveParams {
    pub fn secp256k1() -> &'static CurveParams {
        SECP256K1.get_or_init(|| {
            let field_prime = BigUint::from_bytes_be(&FIELD_PRIME);
            let order = BigUint::from_bytes_be(&GROUP_ORDER);
            let two = BigUint::from(2u32);
            // p = 3 mod 4, so sqrt(a) = a^((p+1)/4) whenever a root exists.
            let field_sqrt_exponent = (&field_prime + 1u32) >> 2;
            let generator = Point::from_affine_unchecked(
                FieldElement::from_reduced(BigUint::from_bytes_be(&GENERATOR_X)),
                FieldElement::from_reduced(BigUint::from_bytes_be(&GENERATOR_Y)),
            );

            CurveParams {
                field_inverse_exponent: &field_prime - &two,
                order_inverse_exponent: &order - &two,
                field_sqrt_exponent,
                b: FieldElement::from_reduced(BigUint::from(CURVE_B)),
                field_prime,
                order,
                generator,
            }
        })
    }

    /// The base field prime p.
    pub fn field_prime(&self) -> &BigUint {
        &self.field_prime
    }

    /// The group order N.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    /// The curve constant b in `y^2 = x^3 + b`.
    pub fn b(&self) -> &FieldElement {
        &self.b
    }

    pub fn generator(&self) -> &Point {
        &self.generator
    }

    pub(crate) fn field_inverse_exponent(&self) -> &BigUint {
        &self.field_inverse_exponent
    }

    pub(crate) fn field_sqrt_exponent(&self) -> &BigUint {
        &self.field_sqrt_exponent
    }

    pub(crate) fn order_inverse_exponent(&self) -> &BigUint {
        &self.order_inverse_exponent
    }
}
