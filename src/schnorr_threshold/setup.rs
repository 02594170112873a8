use super::threshold_math::{aggregate_public_keys, evaluate_polynomial, lagrange_coefficient, share_point};
use super::threshold_protocol::party::Participant;
use super::threshold_protocol::protocol_messages::PublicKeyMessage;
use crate::curve::{Point, Scalar};
use crate::error::{Result, SchnorrError};
use crate::keys_management::{KeyPair, XOnlyPublicKey};
use rand_core::{CryptoRng, RngCore};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use zeroize::Zeroize;

/// How the participants' keys relate to the aggregate key.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyScheme {
    /// Independent keys, `P_agg = sum of P_i`. Only a session in which every
    /// participant signs verifies under `P_agg`.
    Additive,
    /// Shares of one group secret dealt with a degree `t-1` polynomial.
    /// Any `t` participants can sign for `P_agg = f(0)·G`.
    Shamir,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub index: usize,
    pub public_key: Point,
}

/// Public description of a signing group: who is in it, how many of them
/// must sign, and the key the aggregate signature verifies under.
///
/// Holds no secrets. Deserialization runs the same checks as construction,
/// so a setup received from elsewhere is as trustworthy as a local one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "RawSetup")]
pub struct MultisigSetup {
    scheme: KeyScheme,
    participants: Vec<ParticipantInfo>,
    threshold: usize,
    aggregate_key: Point,
}

impl MultisigSetup {
    /// Registers independently generated keys; the aggregate key is their sum.
    #[tracing::instrument(name = "Creating multisig setup", skip_all, fields(participants = public_keys.len(), threshold = threshold))]
    pub fn new(public_keys: Vec<PublicKeyMessage>, threshold: usize) -> Result<Self> {
        check_threshold(public_keys.len(), threshold)?;

        let participants: Vec<ParticipantInfo> = public_keys
            .into_iter()
            .map(|k| ParticipantInfo {
                index: k.index,
                public_key: k.public_key,
            })
            .collect();
        check_participants(&participants)?;

        let points: Vec<Point> = participants.iter().map(|p| p.public_key.clone()).collect();
        let aggregate_key = aggregate_public_keys(&points)?;

        Ok(MultisigSetup {
            scheme: KeyScheme::Additive,
            participants,
            threshold,
            aggregate_key,
        })
    }

    /// Generates `total` fresh additive participants, indexed `0..total`.
    pub fn generate<R>(total: usize, threshold: usize, rng: &mut R) -> Result<(Self, Vec<Participant>)>
    where
        R: CryptoRng + RngCore,
    {
        check_threshold(total, threshold)?;
        let participants = (0..total)
            .map(|index| Participant::generate(index, &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        let announcements = participants.iter().map(Participant::public_key_message).collect();
        let setup = MultisigSetup::new(announcements, threshold)?;
        Ok((setup, participants))
    }

    /// Trusted-dealer Shamir split of a fresh group secret.
    ///
    /// Participant `i` receives `f(i + 1)`; the polynomial and group secret
    /// are wiped before returning.
    #[tracing::instrument(name = "Dealing Shamir shares", skip_all, fields(total = total, threshold = threshold))]
    pub fn deal<R>(total: usize, threshold: usize, rng: &mut R) -> Result<(Self, Vec<Participant>)>
    where
        R: CryptoRng + RngCore,
    {
        check_threshold(total, threshold)?;

        let mut coefficients = (0..threshold)
            .map(|_| Scalar::random_nonzero(&mut *rng))
            .collect::<Result<Vec<_>>>()?;
        let aggregate_key = Point::mul_base(&coefficients[0]);

        let mut participants = Vec::with_capacity(total);
        let mut infos = Vec::with_capacity(total);
        for index in 0..total {
            let keys = match share_point(index)
                .map(|x| evaluate_polynomial(&coefficients, &x))
                .and_then(|share| KeyPair::from_secret_scalar(Secret::new(share)))
            {
                Ok(keys) => keys,
                Err(err) => {
                    coefficients.iter_mut().for_each(Zeroize::zeroize);
                    return Err(err);
                }
            };
            infos.push(ParticipantInfo {
                index,
                public_key: keys.public_key.clone(),
            });
            participants.push(Participant::new(index, keys));
        }
        coefficients.iter_mut().for_each(Zeroize::zeroize);

        tracing::debug!("dealt shares");
        Ok((
            MultisigSetup {
                scheme: KeyScheme::Shamir,
                participants: infos,
                threshold,
                aggregate_key,
            },
            participants,
        ))
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn total(&self) -> usize {
        self.participants.len()
    }

    pub fn participants(&self) -> &[ParticipantInfo] {
        &self.participants
    }

    pub fn participant(&self, index: usize) -> Option<&ParticipantInfo> {
        self.participants.iter().find(|p| p.index == index)
    }

    pub fn aggregate_key(&self) -> &Point {
        &self.aggregate_key
    }

    pub fn aggregate_x_only(&self) -> Result<XOnlyPublicKey> {
        XOnlyPublicKey::from_point(&self.aggregate_key)
    }
}

// Wire form of a setup, checked before it becomes a `MultisigSetup`.
#[derive(Deserialize)]
struct RawSetup {
    scheme: KeyScheme,
    participants: Vec<ParticipantInfo>,
    threshold: usize,
    aggregate_key: Point,
}

impl TryFrom<RawSetup> for MultisigSetup {
    type Error = SchnorrError;

    fn try_from(raw: RawSetup) -> Result<Self> {
        check_threshold(raw.participants.len(), raw.threshold)?;
        check_participants(&raw.participants)?;

        // Additive: the sum of all keys. Shamir: interpolating any `t` keys
        // at zero, here the first `t`.
        let expected = match raw.scheme {
            KeyScheme::Additive => {
                let points: Vec<Point> = raw.participants.iter().map(|p| p.public_key.clone()).collect();
                aggregate_public_keys(&points)?
            }
            KeyScheme::Shamir => {
                let signers: Vec<usize> = raw.participants[..raw.threshold].iter().map(|p| p.index).collect();
                let mut interpolated = Point::identity();
                for participant in &raw.participants[..raw.threshold] {
                    let lambda = lagrange_coefficient(participant.index, &signers)?;
                    interpolated = interpolated + participant.public_key.scalar_mul(&lambda);
                }
                interpolated
            }
        };
        if expected != raw.aggregate_key {
            tracing::warn!(scheme = ?raw.scheme, "aggregate key does not match the participants");
            return Err(SchnorrError::AggregateKeyMismatch);
        }

        Ok(MultisigSetup {
            scheme: raw.scheme,
            participants: raw.participants,
            threshold: raw.threshold,
            aggregate_key: raw.aggregate_key,
        })
    }
}

// Indices are unique and cover exactly `0..n`; no key is the identity.
fn check_participants(participants: &[ParticipantInfo]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for participant in participants {
        if participant.index >= participants.len() {
            tracing::warn!(index = participant.index, total = participants.len(), "participant index out of range");
            return Err(SchnorrError::UnknownParticipantIndex(participant.index));
        }
        if !seen.insert(participant.index) {
            tracing::warn!(index = participant.index, "participant registered twice");
            return Err(SchnorrError::DuplicateParticipantIndex(participant.index));
        }
        if participant.public_key.is_identity() {
            return Err(SchnorrError::PointAtInfinity);
        }
    }
    Ok(())
}

fn check_threshold(total: usize, threshold: usize) -> Result<()> {
    if total == 0 {
        return Err(SchnorrError::EmptyParticipants);
    }
    if threshold == 0 {
        return Err(SchnorrError::InvalidThreshold);
    }
    if threshold > total {
        return Err(SchnorrError::ThresholdExceedsTotal { threshold, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_setup_validation() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            MultisigSetup::new(vec![], 1).unwrap_err(),
            SchnorrError::EmptyParticipants
        );
        assert_eq!(
            MultisigSetup::generate(3, 0, &mut rng).unwrap_err(),
            SchnorrError::InvalidThreshold
        );
        assert_eq!(
            MultisigSetup::deal(3, 4, &mut rng).unwrap_err(),
            SchnorrError::ThresholdExceedsTotal {
                threshold: 4,
                total: 3
            }
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = Participant::generate(0, &mut rng).unwrap();
        let b = Participant::generate(0, &mut rng).unwrap();
        assert_eq!(
            MultisigSetup::new(vec![a.public_key_message(), b.public_key_message()], 1).unwrap_err(),
            SchnorrError::DuplicateParticipantIndex(0)
        );
    }

    #[test]
    fn test_indices_outside_participant_range_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let a = Participant::generate(5, &mut rng).unwrap();
        let b = Participant::generate(9, &mut rng).unwrap();
        assert_eq!(
            MultisigSetup::new(vec![a.public_key_message(), b.public_key_message()], 1).unwrap_err(),
            SchnorrError::UnknownParticipantIndex(5)
        );

        let c = Participant::generate(0, &mut rng).unwrap();
        let d = Participant::generate(2, &mut rng).unwrap();
        assert_eq!(
            MultisigSetup::new(vec![c.public_key_message(), d.public_key_message()], 2).unwrap_err(),
            SchnorrError::UnknownParticipantIndex(2)
        );
    }

    #[test]
    fn test_additive_aggregate_key_is_sum() {
        let (setup, participants) = MultisigSetup::generate(3, 2, &mut StdRng::seed_from_u64(3)).unwrap();
        let sum: Point = participants.iter().map(|p| p.public_key().clone()).sum();
        assert_eq!(setup.aggregate_key(), &sum);
        assert_eq!(setup.scheme(), KeyScheme::Additive);
        assert_eq!(setup.total(), 3);
        assert_eq!(setup.threshold(), 2);
        assert!(setup.participant(2).is_some());
        assert!(setup.participant(3).is_none());
    }

    #[test]
    fn test_dealt_shares_interpolate_group_key() {
        let (setup, _) = MultisigSetup::deal(5, 3, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(setup.scheme(), KeyScheme::Shamir);

        for signers in [[0usize, 1, 2], [1, 3, 4], [0, 2, 4]] {
            let interpolated: Point = signers
                .iter()
                .map(|&i| {
                    let lambda = lagrange_coefficient(i, &signers).unwrap();
                    setup.participant(i).unwrap().public_key.scalar_mul(&lambda)
                })
                .sum();
            assert_eq!(&interpolated, setup.aggregate_key());
        }
    }

    #[test]
    fn test_setup_serializes_without_secrets() {
        let (setup, _) = MultisigSetup::deal(2, 2, &mut StdRng::seed_from_u64(5)).unwrap();
        let json = serde_json::to_string(&setup).unwrap();
        let back: MultisigSetup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, setup);

        let (additive, _) = MultisigSetup::generate(3, 2, &mut StdRng::seed_from_u64(7)).unwrap();
        let json = serde_json::to_string(&additive).unwrap();
        assert_eq!(serde_json::from_str::<MultisigSetup>(&json).unwrap(), additive);
    }

    fn tampered(setup: &MultisigSetup, edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value = serde_json::to_value(setup).unwrap();
        edit(&mut value);
        value.to_string()
    }

    fn rejection(json: &str) -> String {
        serde_json::from_str::<MultisigSetup>(json).unwrap_err().to_string()
    }

    #[test]
    fn test_deserialization_enforces_setup_invariants() {
        let (setup, _) = MultisigSetup::deal(3, 2, &mut StdRng::seed_from_u64(8)).unwrap();

        let zero_threshold = tampered(&setup, |v| v["threshold"] = 0.into());
        assert!(rejection(&zero_threshold).contains(&SchnorrError::InvalidThreshold.to_string()));

        let oversized = tampered(&setup, |v| v["threshold"] = 4.into());
        assert!(rejection(&oversized).contains("exceeds the number of participants"));

        let out_of_range = tampered(&setup, |v| v["participants"][2]["index"] = 7.into());
        assert!(rejection(&out_of_range).contains(&SchnorrError::UnknownParticipantIndex(7).to_string()));

        let repeated = tampered(&setup, |v| v["participants"][2]["index"] = 1.into());
        assert!(rejection(&repeated).contains(&SchnorrError::DuplicateParticipantIndex(1).to_string()));

        let other_key = MultisigSetup::deal(3, 2, &mut StdRng::seed_from_u64(9)).unwrap().0;
        let swapped = tampered(&setup, |v| {
            v["aggregate_key"] = serde_json::to_value(other_key.aggregate_key()).unwrap()
        });
        assert!(rejection(&swapped).contains(&SchnorrError::AggregateKeyMismatch.to_string()));

        let relabelled = tampered(&setup, |v| v["scheme"] = "Additive".into());
        assert!(rejection(&relabelled).contains(&SchnorrError::AggregateKeyMismatch.to_string()));
    }
}
