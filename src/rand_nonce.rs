use crate::curve::{Point, Scalar};
use crate::error::Result;
use rand_core::{CryptoRng, RngCore};
use secrecy::{ExposeSecret, Secret};

/// A fresh signing nonce `k` together with its commitment `R = k·G`.
///
/// Not `Clone`: a nonce backs exactly one partial signature. The secret
/// half is zeroized on drop.
pub struct RandomNonce {
    pub r_public: Point,
    pub(crate) r_private: Secret<Scalar>,
}

use std::fmt;
impl fmt::Debug for RandomNonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RandomNonce {{ r_public: {:?} }}", self.r_public)
    }
}

impl RandomNonce {
    pub fn new_rand<R>(rng: &mut R) -> Result<RandomNonce>
    where
        R: CryptoRng + RngCore,
    {
        let r_private = Secret::new(Scalar::random_nonzero(rng)?);
        let r_public = Point::mul_base(r_private.expose_secret());
        Ok(RandomNonce {
            r_private,
            r_public,
        })
    }
}
