//! # BIP340 Threshold Signature Library
//!
//! This Rust library implements BIP340 Schnorr signatures over secp256k1, with the curve
//! arithmetic built from first principles on arbitrary-precision integers, and a two-round
//! threshold extension whose aggregate signatures verify as ordinary BIP340 signatures.
//!
//! ## BIP340 Signatures
//!
//! - Key Pair Generation: a private scalar d in [1, N-1] and the public point P = d * G.
//!   Public keys travel as 32-byte x-only encodings; the y coordinate is implicitly even.
//! - Signing: with d' = d or N - d so that d' * G has even y,
//!   k = H_nonce((d' XOR H_aux(a)) || x(P) || m), R = k * G (k negated if R has odd y),
//!   e = H_challenge(x(R) || x(P) || m) and s = k + e * d'. The signature is x(R) || s.
//! - Verification: R' = s * G - e * P must have even y and x(R') = r.
//!
//! H_tag is the BIP340 tagged hash SHA256(SHA256(tag) || SHA256(tag) || data).
//!
//! ## Threshold Signatures
//!
//! - Setup: participants register their public keys. With additive keys the aggregate key
//!   is P_agg = sum of all P_i; with Shamir shares dealt from a degree t-1 polynomial f it
//!   is f(0) * G and any t participants can sign.
//! - Round 1: every signer draws a single-use nonce k_i and publishes R_i = k_i * G.
//! - The coordinator sums R_agg = sum of R_i and publishes the challenge
//!   e = H_challenge(x(R_agg) || x(P_agg) || m).
//! - Round 2: each signer returns s_i = k_i' + e * l_i * d_i', where l_i is its Lagrange
//!   coefficient (one for additive keys) and primes mark the even-y sign flips.
//! - The coordinator checks every share, sums s = sum of s_i and the result (x(R_agg), s)
//!   verifies under P_agg exactly like a single-signer signature.
//!
//! ## Usage
//!
//! ```
//! use bip340_threshold::keys_management::KeyPair;
//! use bip340_threshold::schnorr_single_signature::SchnorrSignature;
//! use rand::rngs::OsRng;
//!
//! let keys = KeyPair::generate(&mut OsRng).unwrap();
//! let signature = SchnorrSignature::sign(b"Hello World", &keys).unwrap();
//! assert!(signature.verify(keys.public_key(), b"Hello World"));
//! ```

pub mod curve;
pub mod error;
pub mod keys_management;
pub mod rand_nonce;
pub mod schnorr_single_signature;
pub mod schnorr_threshold;
pub mod tagged_hash;

#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::error::{Result, SchnorrError};
pub use crate::schnorr_threshold::setup;
pub use crate::schnorr_threshold::threshold_protocol::aggregator;
pub use crate::schnorr_threshold::threshold_protocol::party;
pub use crate::schnorr_threshold::threshold_protocol::protocol_messages;
