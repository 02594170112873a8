//! secp256k1 arithmetic: the base field, the scalar field modulo the group
//! order N, and the group of curve points `y^2 = x^3 + 7`.
//!
//! Everything here is implemented on top of arbitrary-precision integers.
//! Values are always kept reduced, so equality is plain structural equality.
//! None of this code is constant-time.

// Implements a binary operator for every owned/borrowed operand combination
// by forwarding to a function taking two references.
macro_rules! forward_binop {
    ($t:ty, $tr:ident, $method:ident, $f:path) => {
        impl<'a, 'b> std::ops::$tr<&'b $t> for &'a $t {
            type Output = $t;
            fn $method(self, rhs: &'b $t) -> $t {
                $f(self, rhs)
            }
        }

        impl<'b> std::ops::$tr<&'b $t> for $t {
            type Output = $t;
            fn $method(self, rhs: &'b $t) -> $t {
                $f(&self, rhs)
            }
        }

        impl<'a> std::ops::$tr<$t> for &'a $t {
            type Output = $t;
            fn $method(self, rhs: $t) -> $t {
                $f(self, &rhs)
            }
        }

        impl std::ops::$tr<$t> for $t {
            type Output = $t;
            fn $method(self, rhs: $t) -> $t {
                $f(&self, &rhs)
            }
        }
    };
}

pub mod field;
pub mod params;
pub mod point;
pub mod scalar;

pub use field::FieldElement;
pub use params::CurveParams;
pub use point::Point;
pub use scalar::{to_bytes32, Scalar};
