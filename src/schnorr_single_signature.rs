use crate::curve::{FieldElement, Point, Scalar};
use crate::error::{Result, SchnorrError};
use crate::keys_management::{KeyPair, XOnlyPublicKey};
use crate::tagged_hash::{challenge, tagged_hash, Tag};
use rand_core::{CryptoRng, RngCore};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// BIP340 Schnorr signature: `r` is the x coordinate of the nonce point `R`
/// (whose y is even), `s` the response scalar. Encodes to 64 bytes `r || s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrSignature {
    pub r: [u8; 32],
    pub s: Scalar,
}

impl SchnorrSignature {
    /// Signs `message` with all-zero auxiliary randomness, so the same
    /// message and key always produce the same signature.
    ///
    /// The message is signed as given. Callers that sign a SHA-256 digest
    /// rather than the raw bytes pass `tagged_hash::hash256(message)` here
    /// and to `verify`.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to be signed. Must not be empty.
    /// * `key_pair` - The key pair for signing.
    #[tracing::instrument(name = "Signing the message with BIP340", skip_all, fields(message_len = message.len()))]
    pub fn sign(message: &[u8], key_pair: &KeyPair) -> Result<Self> {
        Self::sign_with_aux_rand(message, key_pair, &[0u8; 32])
    }

    /// Signs `message` following BIP340, mixing `aux_rand` into the nonce.
    ///
    /// The nonce is `k = H_nonce((d XOR H_aux(aux_rand)) || P || m)`, where
    /// `d` is the even-y private scalar. Returns `(r, s)` with
    /// `r = x(k·G)` and `s = k + H_challenge(r || P || m)·d`.
    pub fn sign_with_aux_rand(message: &[u8], key_pair: &KeyPair, aux_rand: &[u8; 32]) -> Result<Self> {
        if message.is_empty() {
            return Err(SchnorrError::EmptyMessage);
        }

        let d = key_pair.even_y_private_key();
        let p_x = key_pair.x_only_public_key();

        let aux_hash = tagged_hash(Tag::Aux, &[aux_rand]);
        let mut t = d.expose_secret().to_be_bytes();
        for (t_byte, aux_byte) in t.iter_mut().zip(aux_hash.iter()) {
            *t_byte ^= aux_byte;
        }
        let nonce_hash = tagged_hash(Tag::Nonce, &[&t, p_x.as_bytes(), message]);
        t.zeroize();

        let k = Scalar::from_be_bytes_reduced(&nonce_hash);
        if k.is_zero() {
            tracing::error!("nonce derivation produced zero");
            return Err(SchnorrError::DegenerateNonce);
        }

        let cap_r = Point::mul_base(&k);
        let k = if cap_r.has_even_y() { k } else { -k };
        let r = cap_r.x_only()?;

        let e = challenge(&r, p_x.as_bytes(), message);
        let s = &k + &(&e * d.expose_secret());

        Ok(SchnorrSignature { r, s })
    }

    /// Verifies the signature: accepts iff `R' = s·G - e·P` is not the
    /// identity, has even y and `x(R') = r`. `P` is taken with even y.
    ///
    /// Never fails loudly; every malformed input yields `false`.
    #[tracing::instrument(name = "Verifying the BIP340 signature", skip_all, fields(message_len = message.len()))]
    pub fn verify(&self, public_key: &Point, message: &[u8]) -> bool {
        verify_raw(message, public_key, &self.r, &self.s)
    }

    /// Joins separately transported `r` and `s` halves.
    pub fn from_parts(r: [u8; 32], s: [u8; 32]) -> Result<Self> {
        let s = Scalar::from_be_bytes_canonical(&s).ok_or(SchnorrError::MalformedSignatureEncoding)?;
        if FieldElement::from_be_bytes(&r).is_none() {
            return Err(SchnorrError::MalformedSignatureEncoding);
        }
        Ok(SchnorrSignature { r, s })
    }

    /// Parses the 64-byte `r || s` encoding, rejecting `r >= p` and `s >= N`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(SchnorrError::InvalidInputLength {
                expected: 64,
                actual: bytes.len(),
            });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self::from_parts(r, s)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s.to_be_bytes());
        out
    }
}

/// Core BIP340 verification over raw components; shared with aggregate
/// signature verification.
pub(crate) fn verify_raw(message: &[u8], public_key: &Point, r: &[u8; 32], s: &Scalar) -> bool {
    if message.is_empty() || public_key.is_identity() {
        return false;
    }
    if FieldElement::from_be_bytes(r).is_none() {
        return false;
    }
    let p_even = if public_key.has_even_y() {
        public_key.clone()
    } else {
        -public_key
    };
    let Ok(p_x) = p_even.x_only() else {
        return false;
    };

    let e = challenge(r, &p_x, message);
    let r_candidate = Point::mul_base(s) - p_even.scalar_mul(&e);

    if r_candidate.is_identity() || !r_candidate.has_even_y() {
        return false;
    }
    match r_candidate.x_only() {
        Ok(x) => &x == r,
        Err(_) => false,
    }
}

/// Signs `message` with `key_pair`; see [`SchnorrSignature::sign`].
pub fn sign(message: &[u8], key_pair: &KeyPair) -> Result<SchnorrSignature> {
    SchnorrSignature::sign(message, key_pair)
}

/// Verifies `signature` over `message` against `public_key`.
pub fn verify(message: &[u8], public_key: &Point, signature: &SchnorrSignature) -> bool {
    signature.verify(public_key, message)
}

/// Verifies a 64-byte encoded signature; bad encodings verify as `false`.
pub fn verify_bytes(message: &[u8], public_key: &Point, signature: &[u8]) -> bool {
    match SchnorrSignature::from_bytes(signature) {
        Ok(signature) => signature.verify(public_key, message),
        Err(_) => false,
    }
}

/// Verifies against an x-only key. Fails only when the key does not lift to
/// a curve point.
pub fn verify_with_xonly(message: &[u8], signature: &SchnorrSignature, x_only: &XOnlyPublicKey) -> Result<bool> {
    if message.is_empty() {
        return Err(SchnorrError::EmptyMessage);
    }
    let public_key = x_only.to_point()?;
    Ok(signature.verify(&public_key, message))
}

pub fn x_only_from_pub(public_key: &Point) -> Result<XOnlyPublicKey> {
    XOnlyPublicKey::from_point(public_key)
}

pub fn parse_x_only(x_only: &[u8; 32]) -> Result<Point> {
    Point::lift_x(x_only)
}

/// Generates a fresh key, signs `message` and checks the signature.
pub fn sign_and_verify<R>(message: &[u8], rng: &mut R) -> Result<bool>
where
    R: CryptoRng + RngCore,
{
    let keys = KeyPair::generate(rng)?;
    let signature = SchnorrSignature::sign(message, &keys)?;
    Ok(signature.verify(keys.public_key(), message))
}
