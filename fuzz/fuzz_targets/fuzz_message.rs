#![no_main]

use libfuzzer_sys::fuzz_target;

use bip340_threshold::aggregator::Aggregator;
use bip340_threshold::schnorr_single_signature::{verify_bytes, SchnorrSignature};
use bip340_threshold::schnorr_threshold::setup::MultisigSetup;
use rand::rngs::StdRng;
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes are a message to sign; empty messages are refused.
    let mut seeded_rng = StdRng::seed_from_u64(123);
    let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut seeded_rng).expect("Error");

    let aggregator = match Aggregator::new(&setup, data) {
        Ok(aggregator) => aggregator,
        Err(_) => {
            assert!(data.is_empty());
            return;
        }
    };

    // The first round of nonce commitments from two of three signers
    let commitments = participants[..2]
        .iter_mut()
        .map(|p| p.commit_nonce(&mut seeded_rng).expect("Error"))
        .collect();
    let (aggregator, challenge) = aggregator.collect_nonces(commitments).expect("Error");

    // The second round of partial signatures
    let partials = participants[..2]
        .iter_mut()
        .map(|p| p.partial_sign(&challenge).expect("Error"))
        .collect();
    let signature = aggregator
        .collect_partial_signatures(partials)
        .expect("Error")
        .combine()
        .expect("Error")
        .verify()
        .expect("Error")
        .into_signature();

    // Aggregate signatures are plain BIP340 signatures
    assert!(verify_bytes(data, setup.aggregate_key(), &signature.to_bytes()));

    // Arbitrary bytes as a signature encoding must never panic
    if let Ok(parsed) = SchnorrSignature::from_bytes(data) {
        let _ = parsed.verify(setup.aggregate_key(), data);
    }
});
