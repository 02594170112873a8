use bip340_threshold::keys_management::KeyPair;
use bip340_threshold::schnorr_single_signature::{verify_with_xonly, SchnorrSignature};
use rand::rngs::OsRng;

fn main() {
    let mut csprng = OsRng;
    // Create signer keys
    let keys = KeyPair::generate(&mut csprng).expect("Error");

    // Message to be signed
    let message = b"Hello World";

    // Signature generation
    let signature = SchnorrSignature::sign(message, &keys).expect("Error");
    println!("Signature: {}", hex::encode(signature.to_bytes()));

    // Verification of the signature against the full point and the x-only key
    let result = signature.verify(keys.public_key(), message);
    let x_only_result = verify_with_xonly(message, &signature, &keys.x_only_public_key()).expect("Error");

    println!("Verification result: {:?}", result);
    assert!(result && x_only_result);
}

