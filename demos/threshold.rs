use bip340_threshold::aggregator::Aggregator;
use bip340_threshold::schnorr_single_signature::verify_bytes;
use bip340_threshold::setup::MultisigSetup;
use rand::rngs::OsRng;

fn main() {
    // Message to be signed
    let message_to_sign = b"Hello World";

    // Randomness source
    let mut csprng = OsRng;

    // A trusted dealer splits a group key between 3 participants, any 2 can sign
    let (setup, mut participants) = MultisigSetup::deal(3, 2, &mut csprng).expect("Error");
    let aggregator = Aggregator::new(&setup, message_to_sign).expect("Error");

    // The first round of nonce commitments, participants 0 and 2 take part
    let mut signers: Vec<_> = participants
        .iter_mut()
        .filter(|p| p.index() != 1)
        .collect();
    let commitments = signers
        .iter_mut()
        .map(|p| p.commit_nonce(&mut csprng).expect("Error"))
        .collect();
    let (aggregator, challenge) = aggregator.collect_nonces(commitments).expect("Error");

    // The second round of partial signatures
    let partials = signers
        .iter_mut()
        .map(|p| p.partial_sign(&challenge).expect("Error"))
        .collect();
    let aggregator = aggregator
        .collect_partial_signatures(partials)
        .expect("Error");

    // Combination and verification under the group key
    let signature = aggregator
        .combine()
        .expect("Error")
        .verify()
        .expect("Error")
        .into_signature();

    // The aggregate is an ordinary 64-byte BIP340 signature
    let result = verify_bytes(message_to_sign, setup.aggregate_key(), &signature.to_bytes());

    println!("Signers: {:?}", signature.signers);
    println!("Verification result: {:?}", result);
    assert!(result);
}
