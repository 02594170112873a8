//! Threshold signing: `t` of `n` participants jointly produce a BIP340
//! signature under one aggregate key, in two rounds separated by the
//! coordinator publishing the challenge.
pub mod setup;
pub mod threshold_math;
pub mod threshold_protocol;

use crate::error::{Result, SchnorrError};
use rand_core::{CryptoRng, RngCore};
use setup::MultisigSetup;
use threshold_protocol::aggregator::Aggregator;
use threshold_protocol::party::Participant;
use threshold_protocol::protocol_messages::{AggregateSignature, NonceCommitment, PartialSignature};

/// Runs both rounds locally with `signers` as the session's signer set and
/// returns the verified aggregate signature.
#[tracing::instrument(name = "Signing with a local quorum", skip_all, fields(signers = signers.len()))]
pub fn sign_with_quorum<R>(
    message: &[u8],
    signers: &mut [Participant],
    setup: &MultisigSetup,
    rng: &mut R,
) -> Result<AggregateSignature>
where
    R: CryptoRng + RngCore,
{
    let aggregator = Aggregator::new(setup, message)?;

    let commitments = signers
        .iter_mut()
        .map(|signer| signer.commit_nonce(&mut *rng))
        .collect::<Result<Vec<NonceCommitment>>>()?;
    let (aggregator, challenge) = aggregator.collect_nonces(commitments)?;

    let partials = signers
        .iter_mut()
        .map(|signer| signer.partial_sign(&challenge))
        .collect::<Result<Vec<PartialSignature>>>()?;

    Ok(aggregator
        .collect_partial_signatures(partials)?
        .combine()?
        .verify()?
        .into_signature())
}

/// Deals a fresh `threshold`-of-`total` group, signs `message` with the
/// first `threshold` participants and checks the result under the
/// aggregate key.
pub fn sign_and_verify_threshold<R>(message: &[u8], threshold: usize, total: usize, rng: &mut R) -> Result<bool>
where
    R: CryptoRng + RngCore,
{
    let (setup, mut participants) = MultisigSetup::deal(total, threshold, rng)?;
    let quorum = participants
        .get_mut(..threshold)
        .ok_or(SchnorrError::ThresholdExceedsTotal { threshold, total })?;
    let signature = sign_with_quorum(message, quorum, &setup, rng)?;
    Ok(threshold_math::verify_aggregate(message, &signature, setup.aggregate_key()))
}
