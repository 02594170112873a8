//! Domain-separated SHA-256 as defined by BIP340:
//! `H_tag(x) = SHA256(SHA256(tag) || SHA256(tag) || x)`.
use crate::curve::Scalar;
use sha2::{Digest, Sha256};

/// Every hashing purpose in the crate has its own tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Aux,
    Nonce,
    Challenge,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Aux => "BIP0340/aux",
            Tag::Nonce => "BIP0340/nonce",
            Tag::Challenge => "BIP0340/challenge",
        }
    }
}

/// Plain SHA-256.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Hashes the concatenation of `chunks` under `tag`.
pub fn tagged_hash(tag: Tag, chunks: &[&[u8]]) -> [u8; 32] {
    let tag_hash = hash256(tag.as_str().as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}

/// `H_challenge(r || P || m) mod N`, shared by single-signer and aggregate
/// signatures so that the two are indistinguishable to a verifier.
pub fn challenge(r_x: &[u8; 32], p_x: &[u8; 32], message: &[u8]) -> Scalar {
    Scalar::from_be_bytes_reduced(&tagged_hash(Tag::Challenge, &[r_x, p_x, message]))
}
