// Messages exchanged between participants and the coordinator. Everything here
// is public data and serializes with serde for whatever transport carries it.
use crate::curve::{Point, Scalar};
use crate::error::{Result, SchnorrError};
use crate::schnorr_single_signature::{verify_raw, SchnorrSignature};
use crate::schnorr_threshold::setup::KeyScheme;
use crate::schnorr_threshold::threshold_math::{build_challenge, share_point, signing_weight};
use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};

/// A participant announcing its public key to the coordinator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyMessage {
    pub index: usize,
    pub public_key: Point,
}

/// Round 1 output: `R_i = k_i·G`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NonceCommitment {
    pub index: usize,
    pub r_public: Point,
}

/// Published by the coordinator once every commitment of the session is in.
///
/// Participants recompute `e` from these fields rather than trusting a
/// coordinator-supplied scalar.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub message: Vec<u8>,
    pub scheme: KeyScheme,
    pub aggregate_key: Point,
    pub aggregate_nonce: Point,
    pub commitments: Vec<NonceCommitment>,
}

impl Challenge {
    /// x-only encoding of `R_agg`, the `r` half of the final signature.
    pub fn r(&self) -> Result<[u8; 32]> {
        self.aggregate_nonce.x_only()
    }

    pub fn e(&self) -> Result<Scalar> {
        build_challenge(&self.aggregate_nonce, &self.aggregate_key, &self.message)
    }

    /// Indices of the session's signers, in commitment order.
    pub fn signers(&self) -> Vec<usize> {
        self.commitments.iter().map(|c| c.index).collect()
    }

    /// Every signer appears once and has a share point.
    pub fn check_signers(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for commitment in &self.commitments {
            if !seen.insert(commitment.index) {
                return Err(SchnorrError::DuplicateParticipantIndex(commitment.index));
            }
            share_point(commitment.index)?;
        }
        Ok(())
    }

    pub fn commitment(&self, index: usize) -> Option<&NonceCommitment> {
        self.commitments.iter().find(|c| c.index == index)
    }

    /// Signers negate their nonce when `R_agg` has odd y.
    pub fn nonce_negated(&self) -> bool {
        !self.aggregate_nonce.has_even_y()
    }

    /// Signers negate their key when `P_agg` has odd y.
    pub fn key_negated(&self) -> bool {
        !self.aggregate_key.has_even_y()
    }

    /// `λ_i` for this session's signer set.
    pub fn weight(&self, index: usize) -> Result<Scalar> {
        signing_weight(self.scheme, index, &self.signers())
    }
}

/// Round 2 output: `s_i`, bound to its session by the x-only `R_agg`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PartialSignature {
    pub index: usize,
    pub s: Scalar,
    pub session_nonce: [u8; 32],
}

/// Combined `(r, s)` plus the indices that contributed. It is an ordinary
/// BIP340 signature under the aggregate key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AggregateSignature {
    pub r: [u8; 32],
    pub s: Scalar,
    pub signers: Vec<usize>,
}

impl AggregateSignature {
    pub fn verify(&self, message: &[u8], aggregate_key: &Point) -> bool {
        verify_raw(message, aggregate_key, &self.r, &self.s)
    }

    pub fn to_signature(&self) -> SchnorrSignature {
        SchnorrSignature {
            r: self.r,
            s: self.s.clone(),
        }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.to_signature().to_bytes()
    }
}
