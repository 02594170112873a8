use super::field::FieldElement;
use super::params::CurveParams;
use super::scalar::Scalar;
use crate::error::{Result, SchnorrError};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A point on secp256k1: either the identity or an affine pair on the curve.
///
/// Points can only be built through checked constructors (`from_affine`,
/// `lift_x`, `parse_compressed`) or group operations, so every value of this
/// type satisfies the curve equation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Point(Repr);

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Identity,
    Affine { x: FieldElement, y: FieldElement },
}

/// Jacobian coordinates `(X, Y, Z)` for `(X/Z^2, Y/Z^3)`; `Z = 0` is the identity.
/// Only used inside scalar multiplication so that a single inversion is paid
/// per multiplication.
struct Jacobian {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl Point {
    pub fn identity() -> Self {
        Point(Repr::Identity)
    }

    pub fn generator() -> Self {
        CurveParams::secp256k1().generator().clone()
    }

    pub(crate) fn from_affine_unchecked(x: FieldElement, y: FieldElement) -> Self {
        Point(Repr::Affine { x, y })
    }

    pub fn from_affine(x: FieldElement, y: FieldElement) -> Result<Self> {
        let point = Point::from_affine_unchecked(x, y);
        if point.is_on_curve() {
            Ok(point)
        } else {
            Err(SchnorrError::PointNotOnCurve)
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.0, Repr::Identity)
    }

    /// The identity is on the curve by convention.
    pub fn is_on_curve(&self) -> bool {
        match &self.0 {
            Repr::Identity => true,
            Repr::Affine { x, y } => y.square() == curve_rhs(x),
        }
    }

    pub fn x(&self) -> Option<&FieldElement> {
        match &self.0 {
            Repr::Identity => None,
            Repr::Affine { x, .. } => Some(x),
        }
    }

    pub fn y(&self) -> Option<&FieldElement> {
        match &self.0 {
            Repr::Identity => None,
            Repr::Affine { y, .. } => Some(y),
        }
    }

    /// `false` for the identity, which has no y coordinate.
    pub fn has_even_y(&self) -> bool {
        self.y().map_or(false, FieldElement::is_even)
    }

    /// Recovers the point with the given x coordinate and an even y.
    pub fn lift_x(x_bytes: &[u8; 32]) -> Result<Self> {
        let x = FieldElement::from_be_bytes(x_bytes).ok_or(SchnorrError::InvalidXCoordinate)?;
        let y = curve_rhs(&x).sqrt().ok_or(SchnorrError::InvalidXCoordinate)?;
        let y = if y.is_even() { y } else { -y };
        Ok(Point::from_affine_unchecked(x, y))
    }

    /// 32-byte big-endian x coordinate.
    pub fn x_only(&self) -> Result<[u8; 32]> {
        self.x()
            .map(FieldElement::to_be_bytes)
            .ok_or(SchnorrError::PointAtInfinity)
    }

    /// SEC1 compressed encoding: parity prefix `0x02`/`0x03` followed by x.
    pub fn serialize_compressed(&self) -> Result<[u8; 33]> {
        let x = self.x_only()?;
        let mut out = [0u8; 33];
        out[0] = if self.has_even_y() { 0x02 } else { 0x03 };
        out[1..].copy_from_slice(&x);
        Ok(out)
    }

    pub fn parse_compressed(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SchnorrError::NoKeyProvided);
        }
        if bytes.len() != 33 {
            return Err(SchnorrError::InvalidInputLength {
                expected: 33,
                actual: bytes.len(),
            });
        }
        let mut x_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&bytes[1..]);
        let even = Point::lift_x(&x_bytes)?;
        match bytes[0] {
            0x02 => Ok(even),
            0x03 => Ok(-even),
            _ => Err(SchnorrError::InvalidXCoordinate),
        }
    }

    pub fn double(&self) -> Self {
        match &self.0 {
            Repr::Identity => Point::identity(),
            Repr::Affine { x, y } => {
                if y.is_zero() {
                    return Point::identity();
                }
                // lambda = 3x^2 / 2y
                let Some(denominator) = y.mul_small(2).invert() else {
                    return Point::identity();
                };
                let lambda = x.square().mul_small(3) * denominator;
                let x3 = lambda.square() - x.mul_small(2);
                let y3 = &lambda * (x - &x3) - y;
                Point::from_affine_unchecked(x3, y3)
            }
        }
    }

    /// Double-and-add over the bits of `k`, most significant first.
    pub fn scalar_mul(&self, k: &Scalar) -> Self {
        if k.is_zero() || self.is_identity() {
            return Point::identity();
        }
        let base = Jacobian::from_point(self);
        let mut acc = Jacobian::identity();
        for i in (0..k.bits()).rev() {
            acc = acc.double();
            if k.bit(i) {
                acc = acc.add(&base);
            }
        }
        acc.to_point()
    }

    /// `k * G`.
    pub fn mul_base(k: &Scalar) -> Self {
        CurveParams::secp256k1().generator().scalar_mul(k)
    }
}

/// `x^3 + b`
fn curve_rhs(x: &FieldElement) -> FieldElement {
    x.square() * x + CurveParams::secp256k1().b()
}

/// Affine addition, special-casing the identity, `P = -Q` and `P = Q`.
fn add(p: &Point, q: &Point) -> Point {
    let (x1, y1, x2, y2) = match (&p.0, &q.0) {
        (Repr::Identity, _) => return q.clone(),
        (_, Repr::Identity) => return p.clone(),
        (Repr::Affine { x: x1, y: y1 }, Repr::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
    };

    if x1 == x2 {
        if y1 == y2 {
            return p.double();
        }
        return Point::identity();
    }

    let Some(denominator) = (x2 - x1).invert() else {
        return Point::identity();
    };
    let lambda = (y2 - y1) * denominator;
    let x3 = lambda.square() - x1 - x2;
    let y3 = &lambda * (x1 - &x3) - y1;
    Point::from_affine_unchecked(x3, y3)
}

fn sub(p: &Point, q: &Point) -> Point {
    add(p, &-q)
}

fn neg(p: &Point) -> Point {
    match &p.0 {
        Repr::Identity => Point::identity(),
        Repr::Affine { x, y } => Point::from_affine_unchecked(x.clone(), -y),
    }
}

forward_binop!(Point, Add, add, add);
forward_binop!(Point, Sub, sub, sub);

impl std::ops::Neg for &Point {
    type Output = Point;
    fn neg(self) -> Point {
        neg(self)
    }
}

impl std::ops::Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        neg(&self)
    }
}

impl<'a, 'b> std::ops::Mul<&'b Point> for &'a Scalar {
    type Output = Point;
    fn mul(self, point: &'b Point) -> Point {
        point.scalar_mul(self)
    }
}

impl<'a, 'b> std::ops::Mul<&'b Scalar> for &'a Point {
    type Output = Point;
    fn mul(self, k: &'b Scalar) -> Point {
        self.scalar_mul(k)
    }
}

impl std::iter::Sum for Point {
    fn sum<I: Iterator<Item = Point>>(iter: I) -> Point {
        iter.fold(Point::identity(), |acc, p| acc + p)
    }
}

impl<'a> std::iter::Sum<&'a Point> for Point {
    fn sum<I: Iterator<Item = &'a Point>>(iter: I) -> Point {
        iter.fold(Point::identity(), |acc, p| acc + p)
    }
}

impl Jacobian {
    fn identity() -> Self {
        Jacobian {
            x: FieldElement::from_u64(1),
            y: FieldElement::from_u64(1),
            z: FieldElement::zero(),
        }
    }

    fn from_point(point: &Point) -> Self {
        match &point.0 {
            Repr::Identity => Jacobian::identity(),
            Repr::Affine { x, y } => Jacobian {
                x: x.clone(),
                y: y.clone(),
                z: FieldElement::from_u64(1),
            },
        }
    }

    fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    fn to_point(&self) -> Point {
        let Some(z_inv) = self.z.invert() else {
            return Point::identity();
        };
        let z_inv2 = z_inv.square();
        let z_inv3 = &z_inv2 * &z_inv;
        Point::from_affine_unchecked(&self.x * &z_inv2, &self.y * &z_inv3)
    }

    // dbl-2009-l (a = 0)
    fn double(&self) -> Self {
        if self.is_identity() || self.y.is_zero() {
            return Jacobian::identity();
        }
        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = ((&self.x + &b).square() - &a - &c).mul_small(2);
        let e = a.mul_small(3);
        let f = e.square();
        let x3 = &f - &d.mul_small(2);
        let y3 = &e * (&d - &x3) - c.mul_small(8);
        let z3 = (&self.y * &self.z).mul_small(2);
        Jacobian {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    // add-1998-cmo-2
    fn add(&self, other: &Jacobian) -> Self {
        if self.is_identity() {
            return Jacobian {
                x: other.x.clone(),
                y: other.y.clone(),
                z: other.z.clone(),
            };
        }
        if other.is_identity() {
            return Jacobian {
                x: self.x.clone(),
                y: self.y.clone(),
                z: self.z.clone(),
            };
        }
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = &self.x * &z2z2;
        let u2 = &other.x * &z1z1;
        let s1 = &self.y * &other.z * &z2z2;
        let s2 = &other.y * &self.z * &z1z1;

        if u1 == u2 {
            if s1 == s2 {
                return self.double();
            }
            return Jacobian::identity();
        }

        let h = &u2 - &u1;
        let r = &s2 - &s1;
        let h2 = h.square();
        let h3 = &h * &h2;
        let u1h2 = &u1 * &h2;
        let x3 = r.square() - &h3 - u1h2.mul_small(2);
        let y3 = &r * (&u1h2 - &x3) - &s1 * &h3;
        let z3 = &h * &self.z * &other.z;
        Jacobian {
            x: x3,
            y: y3,
            z: z3,
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            Repr::Identity => write!(f, "Point(identity)"),
            Repr::Affine { x, y } => f
                .debug_struct("Point")
                .field("x", x)
                .field("y", y)
                .finish(),
        }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let bytes = self.serialize_compressed().map_err(S::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        Point::parse_compressed(&bytes).map_err(D::Error::custom)
    }
}
