use bip340_threshold::aggregator::Aggregator;
use bip340_threshold::party::Participant;
use bip340_threshold::protocol_messages::{
    AggregateSignature, Challenge, NonceCommitment, PartialSignature, PublicKeyMessage,
};
use bip340_threshold::schnorr_single_signature::SchnorrSignature;
use bip340_threshold::schnorr_threshold::sign_with_quorum;
use bip340_threshold::schnorr_threshold::threshold_math::{combine, verify_aggregate};
use bip340_threshold::setup::{KeyScheme, MultisigSetup};
use bip340_threshold::SchnorrError;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;

// Every message crosses a JSON "wire" in these tests.
fn transport<T: Serialize + DeserializeOwned>(message: &T) -> T {
    serde_json::from_str(&serde_json::to_string(message).unwrap()).unwrap()
}

fn round_one(signers: &mut [Participant], rng: &mut StdRng) -> Vec<NonceCommitment> {
    signers
        .iter_mut()
        .map(|p| transport(&p.commit_nonce(&mut *rng).unwrap()))
        .collect()
}

fn round_two(signers: &mut [Participant], challenge: &Challenge) -> Vec<PartialSignature> {
    let challenge = transport(challenge);
    signers
        .iter_mut()
        .map(|p| transport(&p.partial_sign(&challenge).unwrap()))
        .collect()
}

#[test]
fn additive_session_over_the_wire() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut participants: Vec<Participant> = (0..3)
        .map(|i| Participant::generate(i, &mut rng).unwrap())
        .collect();
    let announcements: Vec<PublicKeyMessage> = participants
        .iter()
        .map(|p| transport(&p.public_key_message()))
        .collect();
    let setup: MultisigSetup = transport(&MultisigSetup::new(announcements, 3).unwrap());
    assert_eq!(setup.scheme(), KeyScheme::Additive);

    let message = b"Send 0.000001 BTC to Bob";
    let aggregator = Aggregator::new(&setup, message).unwrap();
    let (aggregator, challenge) = aggregator
        .collect_nonces(round_one(&mut participants, &mut rng))
        .unwrap();
    let partials = round_two(&mut participants, &challenge);
    let signature: AggregateSignature = transport(
        &aggregator
            .collect_partial_signatures(partials)
            .unwrap()
            .combine()
            .unwrap()
            .verify()
            .unwrap()
            .into_signature(),
    );

    // Indistinguishable from a single-signer signature under P_agg.
    let plain = SchnorrSignature::from_bytes(&signature.to_bytes()).unwrap();
    assert!(plain.verify(setup.aggregate_key(), message));
    assert!(verify_aggregate(message, &signature, setup.aggregate_key()));
    assert!(!verify_aggregate(b"Hello World", &signature, setup.aggregate_key()));
}

#[test]
fn combine_enforces_threshold_and_indices() {
    let mut rng = StdRng::seed_from_u64(2);
    let (setup, mut participants) = MultisigSetup::deal(4, 3, &mut rng).unwrap();
    let message = b"combine";

    let (_, challenge) = Aggregator::new(&setup, message)
        .unwrap()
        .collect_nonces(round_one(&mut participants[..3], &mut rng))
        .unwrap();
    let partials = round_two(&mut participants[..3], &challenge);

    let signature = combine(&partials, &setup).unwrap();
    assert_eq!(signature.signers, vec![0, 1, 2]);
    assert!(verify_aggregate(message, &signature, setup.aggregate_key()));

    assert_eq!(
        combine(&partials[..2], &setup),
        Err(SchnorrError::InsufficientSigners {
            required: 3,
            provided: 2
        })
    );
    assert_eq!(
        combine(&[], &setup),
        Err(SchnorrError::InsufficientSigners {
            required: 3,
            provided: 0
        })
    );

    let duplicated = vec![partials[0].clone(), partials[1].clone(), partials[1].clone()];
    assert_eq!(
        combine(&duplicated, &setup),
        Err(SchnorrError::DuplicateParticipantIndex(1))
    );

    let mut stranger = partials[2].clone();
    stranger.index = 42;
    assert_eq!(
        combine(&[partials[0].clone(), partials[1].clone(), stranger], &setup),
        Err(SchnorrError::UnknownParticipantIndex(42))
    );
}

#[test]
fn combine_rejects_mixed_sessions() {
    let mut rng = StdRng::seed_from_u64(3);
    let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut rng).unwrap();

    let (_, first) = Aggregator::new(&setup, b"first")
        .unwrap()
        .collect_nonces(round_one(&mut participants[..2], &mut rng))
        .unwrap();
    let first_partials = round_two(&mut participants[..2], &first);

    let (_, second) = Aggregator::new(&setup, b"second")
        .unwrap()
        .collect_nonces(round_one(&mut participants[1..], &mut rng))
        .unwrap();
    let second_partials = round_two(&mut participants[1..], &second);

    let mixed = vec![first_partials[0].clone(), second_partials[1].clone()];
    assert_eq!(combine(&mixed, &setup), Err(SchnorrError::SessionMismatch));
}

#[test]
fn nonce_is_single_use_across_sessions() {
    let mut rng = StdRng::seed_from_u64(4);
    let (setup, mut participants) = MultisigSetup::deal(2, 2, &mut rng).unwrap();
    let (_, challenge) = Aggregator::new(&setup, b"once")
        .unwrap()
        .collect_nonces(round_one(&mut participants, &mut rng))
        .unwrap();

    participants[0].partial_sign(&challenge).unwrap();
    assert_eq!(
        participants[0].partial_sign(&challenge),
        Err(SchnorrError::NonceReuseViolation(0))
    );
}

#[test]
fn partial_sign_before_challenge_is_rejected() {
    let mut rng = StdRng::seed_from_u64(5);
    let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut rng).unwrap();

    // Participant 2 commits after the challenge was fixed without it.
    let (_, challenge) = Aggregator::new(&setup, b"late")
        .unwrap()
        .collect_nonces(round_one(&mut participants[..2], &mut rng))
        .unwrap();
    participants[2].commit_nonce(&mut rng).unwrap();
    assert_eq!(
        participants[2].partial_sign(&challenge),
        Err(SchnorrError::ChallengeNotYetDetermined(2))
    );
}

#[test]
fn setup_rejects_bad_thresholds() {
    let mut rng = StdRng::seed_from_u64(6);
    let participant = Participant::generate(0, &mut rng).unwrap();
    assert_eq!(
        MultisigSetup::new(vec![participant.public_key_message()], 0),
        Err(SchnorrError::InvalidThreshold)
    );
    assert_eq!(
        MultisigSetup::new(vec![participant.public_key_message()], 2),
        Err(SchnorrError::ThresholdExceedsTotal {
            threshold: 2,
            total: 1
        })
    );
    assert_eq!(MultisigSetup::new(vec![], 1), Err(SchnorrError::EmptyParticipants));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_quorum_of_dealt_shares_verifies(
        seed in any::<u64>(),
        mask in 1u8..32,
        message in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (setup, participants) = MultisigSetup::deal(5, 2, &mut rng).unwrap();
        let mut quorum: Vec<Participant> = participants
            .into_iter()
            .filter(|p| mask & (1 << p.index()) != 0)
            .collect();

        let result = sign_with_quorum(&message, &mut quorum, &setup, &mut rng);
        if quorum.len() >= setup.threshold() {
            let signature = result.unwrap();
            prop_assert!(signature.verify(&message, setup.aggregate_key()));
            prop_assert_eq!(signature.signers.len(), quorum.len());
        } else {
            prop_assert_eq!(
                result,
                Err(SchnorrError::InsufficientSigners { required: 2, provided: quorum.len() })
            );
        }
    }
}
