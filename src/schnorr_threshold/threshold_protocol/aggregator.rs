/// This module defines the Aggregator, the coordinator of a threshold
/// signing session. It collects nonce commitments, publishes the challenge,
/// checks each partial signature against its signer's public data and
/// combines them into one BIP340 signature under the aggregate key.
///
/// Each step consumes the aggregator and returns it in the next state, so
/// steps cannot be skipped or repeated.
use super::protocol_messages::*;
use crate::error::{Result, SchnorrError};
use crate::schnorr_threshold::setup::MultisigSetup;
use crate::schnorr_threshold::threshold_math::{
    aggregate_nonces, combine, verify_aggregate, verify_partial_signature,
};
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

/// Aggregator struct, which manages one signing session over a setup.
pub struct Aggregator<'a, S: AggregationState> {
    setup: &'a MultisigSetup,
    message: &'a [u8],
    state: S,
}

impl<S: AggregationState> Debug for Aggregator<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("message_len", &self.message.len())
            .field("aggregate_key", self.setup.aggregate_key())
            .field("state", &S::NAME)
            .finish()
    }
}

/// Represents the possible states of the Aggregator.
pub trait AggregationState {
    const NAME: &'static str;
}

/// Initial state: waiting for round-1 commitments.
pub struct Created;

/// The challenge is fixed: waiting for partial signatures.
pub struct NoncesCollected {
    challenge: Challenge,
}

/// Every committed signer delivered a valid share.
pub struct Signed {
    challenge: Challenge,
    partials: Vec<PartialSignature>,
}

/// Shares summed into a signature that has not been checked yet.
pub struct Combined {
    signature: AggregateSignature,
}

/// The signature verifies under the aggregate key.
pub struct Verified {
    signature: AggregateSignature,
}

impl AggregationState for Created {
    const NAME: &'static str = "Created";
}
impl AggregationState for NoncesCollected {
    const NAME: &'static str = "NoncesCollected";
}
impl AggregationState for Signed {
    const NAME: &'static str = "Signed";
}
impl AggregationState for Combined {
    const NAME: &'static str = "Combined";
}
impl AggregationState for Verified {
    const NAME: &'static str = "Verified";
}

impl<'a, S: AggregationState> Aggregator<'a, S> {
    pub fn setup(&self) -> &'a MultisigSetup {
        self.setup
    }

    pub fn message(&self) -> &'a [u8] {
        self.message
    }

    fn advance<T: AggregationState>(self, state: T) -> Aggregator<'a, T> {
        Aggregator {
            setup: self.setup,
            message: self.message,
            state,
        }
    }
}

impl<'a> Aggregator<'a, Created> {
    /// Open a signing session for `message` over `setup`.
    ///
    /// Returns an `Err` if the message is empty.
    pub fn new(setup: &'a MultisigSetup, message: &'a [u8]) -> Result<Self> {
        if message.is_empty() {
            return Err(SchnorrError::EmptyMessage);
        }
        Ok(Aggregator {
            setup,
            message,
            state: Created,
        })
    }

    /// Aggregate the round-1 commitments and fix the challenge.
    ///
    /// # Arguments
    ///
    /// * `commitments` - One commitment per signer taking part in the session.
    ///
    /// Returns the aggregator in the `NoncesCollected` state together with
    /// the `Challenge` to broadcast to the signers. Fails if an index is
    /// unregistered or repeated, or if fewer than `threshold` signers committed.
    #[tracing::instrument(name = "Collecting nonce commitments", skip_all, fields(commitments = commitments.len()))]
    pub fn collect_nonces(
        self,
        commitments: Vec<NonceCommitment>,
    ) -> Result<(Aggregator<'a, NoncesCollected>, Challenge)> {
        let mut seen = BTreeSet::new();
        for commitment in &commitments {
            if self.setup.participant(commitment.index).is_none() {
                tracing::warn!(index = commitment.index, "commitment from unregistered participant");
                return Err(SchnorrError::UnknownParticipantIndex(commitment.index));
            }
            if !seen.insert(commitment.index) {
                tracing::warn!(index = commitment.index, "duplicate commitment");
                return Err(SchnorrError::DuplicateParticipantIndex(commitment.index));
            }
        }
        if seen.len() < self.setup.threshold() {
            tracing::warn!(provided = seen.len(), "not enough signers committed");
            return Err(SchnorrError::InsufficientSigners {
                required: self.setup.threshold(),
                provided: seen.len(),
            });
        }

        let nonces: Vec<_> = commitments.iter().map(|c| c.r_public.clone()).collect();
        let aggregate_nonce = aggregate_nonces(&nonces)?;

        let challenge = Challenge {
            message: self.message.to_vec(),
            scheme: self.setup.scheme(),
            aggregate_key: self.setup.aggregate_key().clone(),
            aggregate_nonce,
            commitments,
        };
        // Computed once here so a bad session fails before anyone signs.
        challenge.e()?;

        tracing::debug!("challenge fixed");
        let published = challenge.clone();
        Ok((self.advance(NoncesCollected { challenge }), published))
    }
}

impl<'a> Aggregator<'a, NoncesCollected> {
    pub fn challenge(&self) -> &Challenge {
        &self.state.challenge
    }

    /// Collect and check the partial signatures of every committed signer.
    ///
    /// Each share must belong to this session and satisfy
    /// `s_i·G == R_i' + e·λ_i·P_i'`.
    #[tracing::instrument(name = "Collecting partial signatures", skip_all, fields(partials = partials.len()))]
    pub fn collect_partial_signatures(
        self,
        partials: Vec<PartialSignature>,
    ) -> Result<Aggregator<'a, Signed>> {
        let challenge = &self.state.challenge;
        let r = challenge.r()?;
        let e = challenge.e()?;

        let mut seen = BTreeSet::new();
        for partial in &partials {
            if partial.session_nonce != r {
                tracing::warn!(index = partial.index, "partial signature from another session");
                return Err(SchnorrError::SessionMismatch);
            }
            let (Some(commitment), Some(info)) = (
                challenge.commitment(partial.index),
                self.setup.participant(partial.index),
            ) else {
                tracing::warn!(index = partial.index, "partial signature from a non-signer");
                return Err(SchnorrError::UnknownParticipantIndex(partial.index));
            };
            if !seen.insert(partial.index) {
                tracing::warn!(index = partial.index, "duplicate partial signature");
                return Err(SchnorrError::DuplicateParticipantIndex(partial.index));
            }

            let weight = challenge.weight(partial.index)?;
            if !verify_partial_signature(
                &partial.s,
                &commitment.r_public,
                &info.public_key,
                &e,
                &weight,
                challenge.nonce_negated(),
                challenge.key_negated(),
            ) {
                tracing::warn!(index = partial.index, "invalid partial signature");
                return Err(SchnorrError::InvalidPartialSignature(partial.index));
            }
        }

        let required = challenge.commitments.len();
        if seen.len() < required {
            tracing::warn!(provided = seen.len(), "missing partial signatures");
            return Err(SchnorrError::InsufficientSigners {
                required,
                provided: seen.len(),
            });
        }

        let NoncesCollected { challenge } = self.state;
        let state = Signed { challenge, partials };
        Ok(Aggregator {
            setup: self.setup,
            message: self.message,
            state,
        })
    }
}

impl<'a> Aggregator<'a, Signed> {
    pub fn challenge(&self) -> &Challenge {
        &self.state.challenge
    }

    pub fn partial_signatures(&self) -> &[PartialSignature] {
        &self.state.partials
    }

    /// Sum the verified shares: `s = sum of s_i`, `r = x(R_agg)`.
    pub fn combine(self) -> Result<Aggregator<'a, Combined>> {
        let signature = combine(&self.state.partials, self.setup)?;
        Ok(self.advance(Combined { signature }))
    }
}

impl<'a> Aggregator<'a, Combined> {
    pub fn signature(&self) -> &AggregateSignature {
        &self.state.signature
    }

    /// Verify the combined signature as a plain BIP340 signature under the
    /// aggregate key.
    pub fn verify(self) -> Result<Aggregator<'a, Verified>> {
        if !verify_aggregate(self.message, &self.state.signature, self.setup.aggregate_key()) {
            tracing::warn!("aggregate signature does not verify");
            return Err(SchnorrError::InvalidAggregateSignature);
        }
        let Combined { signature } = self.state;
        Ok(Aggregator {
            setup: self.setup,
            message: self.message,
            state: Verified { signature },
        })
    }
}

impl Aggregator<'_, Verified> {
    /// Get the aggregated signature.
    pub fn signature(&self) -> &AggregateSignature {
        &self.state.signature
    }

    pub fn into_signature(self) -> AggregateSignature {
        self.state.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schnorr_threshold::threshold_protocol::party::Participant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn commit(participants: &mut [Participant], rng: &mut StdRng) -> Vec<NonceCommitment> {
        participants
            .iter_mut()
            .map(|p| p.commit_nonce(&mut *rng).unwrap())
            .collect()
    }

    #[test]
    fn test_full_session_with_all_signers() {
        let mut rng = StdRng::seed_from_u64(1);
        let (setup, mut participants) = MultisigSetup::generate(3, 3, &mut rng).unwrap();
        let message = b"Hello World";

        let aggregator = Aggregator::new(&setup, message).unwrap();
        let commitments = commit(&mut participants, &mut rng);
        let (aggregator, challenge) = aggregator.collect_nonces(commitments).unwrap();

        let partials = participants
            .iter_mut()
            .map(|p| p.partial_sign(&challenge).unwrap())
            .collect();
        let signature = aggregator
            .collect_partial_signatures(partials)
            .unwrap()
            .combine()
            .unwrap()
            .verify()
            .unwrap()
            .into_signature();

        assert_eq!(signature.signers, vec![0, 1, 2]);
        assert!(signature.verify(message, setup.aggregate_key()));
    }

    #[test]
    fn test_empty_message_rejected() {
        let (setup, _) = MultisigSetup::generate(1, 1, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(
            Aggregator::new(&setup, b"").unwrap_err(),
            SchnorrError::EmptyMessage
        );
    }

    #[test]
    fn test_collect_nonces_validation() {
        let mut rng = StdRng::seed_from_u64(3);
        let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut rng).unwrap();
        let commitments = commit(&mut participants, &mut rng);

        let too_few = vec![commitments[0].clone()];
        assert_eq!(
            Aggregator::new(&setup, b"m").unwrap().collect_nonces(too_few).unwrap_err(),
            SchnorrError::InsufficientSigners {
                required: 2,
                provided: 1
            }
        );

        let duplicated = vec![commitments[1].clone(), commitments[1].clone()];
        assert_eq!(
            Aggregator::new(&setup, b"m").unwrap().collect_nonces(duplicated).unwrap_err(),
            SchnorrError::DuplicateParticipantIndex(1)
        );

        let mut unknown = commitments[2].clone();
        unknown.index = 9;
        assert_eq!(
            Aggregator::new(&setup, b"m")
                .unwrap()
                .collect_nonces(vec![commitments[0].clone(), unknown])
                .unwrap_err(),
            SchnorrError::UnknownParticipantIndex(9)
        );
    }

    #[test]
    fn test_forged_share_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut rng).unwrap();
        let commitments = commit(&mut participants[..2], &mut rng);
        let (aggregator, challenge) = Aggregator::new(&setup, b"m")
            .unwrap()
            .collect_nonces(commitments)
            .unwrap();

        let mut partials: Vec<PartialSignature> = participants[..2]
            .iter_mut()
            .map(|p| p.partial_sign(&challenge).unwrap())
            .collect();
        partials[1].s = &partials[1].s + &crate::curve::Scalar::one();

        assert_eq!(
            aggregator.collect_partial_signatures(partials).unwrap_err(),
            SchnorrError::InvalidPartialSignature(1)
        );
    }

    #[test]
    fn test_missing_share_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut rng).unwrap();
        let commitments = commit(&mut participants, &mut rng);
        let (aggregator, challenge) = Aggregator::new(&setup, b"m")
            .unwrap()
            .collect_nonces(commitments)
            .unwrap();

        // Two of three committed signers answer; the third commitment is
        // part of R_agg so the session cannot complete without it.
        let partials = participants[..2]
            .iter_mut()
            .map(|p| p.partial_sign(&challenge).unwrap())
            .collect();
        assert_eq!(
            aggregator.collect_partial_signatures(partials).unwrap_err(),
            SchnorrError::InsufficientSigners {
                required: 3,
                provided: 2
            }
        );
    }

    #[test]
    fn test_debug_reports_state() {
        let (setup, _) = MultisigSetup::generate(1, 1, &mut StdRng::seed_from_u64(6)).unwrap();
        let aggregator = Aggregator::new(&setup, b"m").unwrap();
        assert!(format!("{:?}", aggregator).contains("Created"));
    }
}
