/// This module defines the Participant, the signer side of the two-round
/// threshold protocol. A participant owns its key and at most one pending
/// nonce; the nonce is taken out of its slot when used, so a second
/// partial signature with the same nonce is impossible.
use super::protocol_messages::*;
use crate::curve::Point;
use crate::error::{Result, SchnorrError};
use crate::keys_management::KeyPair;
use crate::rand_nonce::RandomNonce;
use crate::schnorr_threshold::threshold_math::{aggregate_nonces, partial_signature};
use rand_core::{CryptoRng, RngCore};
use std::fmt::{Debug, Formatter};

pub struct Participant {
    index: usize,
    keys: KeyPair,
    nonce: Option<RandomNonce>,
}

impl Debug for Participant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("index", &self.index)
            .field("public_key", &self.keys.public_key)
            .field("nonce_pending", &self.nonce.is_some())
            .finish()
    }
}

impl Participant {
    pub fn new(index: usize, keys: KeyPair) -> Self {
        Participant {
            index,
            keys,
            nonce: None,
        }
    }

    /// Create a participant with a freshly generated key.
    pub fn generate<R>(index: usize, rng: &mut R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        Ok(Participant::new(index, KeyPair::generate(rng)?))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn public_key(&self) -> &Point {
        &self.keys.public_key
    }

    pub fn public_key_message(&self) -> PublicKeyMessage {
        PublicKeyMessage {
            index: self.index,
            public_key: self.keys.public_key.clone(),
        }
    }

    /// Round 1: draw a fresh nonce `k_i` and publish `R_i = k_i·G`.
    ///
    /// An earlier nonce that was never used to sign is discarded.
    #[tracing::instrument(name = "Committing nonce", skip_all, fields(index = self.index))]
    pub fn commit_nonce<R>(&mut self, rng: &mut R) -> Result<NonceCommitment>
    where
        R: CryptoRng + RngCore,
    {
        let nonce = RandomNonce::new_rand(rng)?;
        let commitment = NonceCommitment {
            index: self.index,
            r_public: nonce.r_public.clone(),
        };
        self.nonce = Some(nonce);
        Ok(commitment)
    }

    /// Round 2: compute `s_i` for the session fixed by `challenge`.
    ///
    /// The challenge is checked in full before the pending nonce is used; on
    /// any error the nonce stays pending.
    ///
    /// # Errors
    ///
    /// * `NonceReuseViolation` - no unused nonce is pending.
    /// * `ChallengeNotYetDetermined` - the challenge does not include this
    ///   participant's current commitment.
    /// * `SessionMismatch` - the challenge's `R_agg` is not the sum of its
    ///   commitments.
    /// * `DuplicateParticipantIndex`, `UnknownParticipantIndex` - the signer
    ///   set repeats an index or names one that cannot hold a share.
    #[tracing::instrument(name = "Computing partial signature", skip_all, fields(index = self.index))]
    pub fn partial_sign(&mut self, challenge: &Challenge) -> Result<PartialSignature> {
        let Some(pending) = self.nonce.as_ref() else {
            tracing::warn!("no pending nonce");
            return Err(SchnorrError::NonceReuseViolation(self.index));
        };

        match challenge.commitment(self.index) {
            Some(commitment) if commitment.r_public == pending.r_public => {}
            _ => {
                tracing::debug!("challenge does not cover the pending nonce");
                return Err(SchnorrError::ChallengeNotYetDetermined(self.index));
            }
        }

        if let Err(err) = challenge.check_signers() {
            tracing::warn!(%err, "malformed signer set");
            return Err(err);
        }

        let commitments: Vec<Point> = challenge.commitments.iter().map(|c| c.r_public.clone()).collect();
        match aggregate_nonces(&commitments) {
            Ok(cap_r) if cap_r == challenge.aggregate_nonce => {}
            _ => {
                tracing::warn!("aggregate nonce does not match the commitments");
                return Err(SchnorrError::SessionMismatch);
            }
        }

        let session_nonce = challenge.r()?;
        let e = challenge.e()?;
        let weight = challenge.weight(self.index)?;

        let Some(nonce) = self.nonce.take() else {
            return Err(SchnorrError::NonceReuseViolation(self.index));
        };
        let s = partial_signature(
            &nonce.r_private,
            &self.keys.private_key,
            &e,
            &weight,
            challenge.nonce_negated(),
            challenge.key_negated(),
        );
        drop(nonce);

        Ok(PartialSignature {
            index: self.index,
            s,
            session_nonce,
        })
    }

    /// Whether a committed nonce is waiting to be used.
    pub fn has_pending_nonce(&self) -> bool {
        self.nonce.is_some()
    }
}
