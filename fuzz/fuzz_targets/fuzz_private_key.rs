#![no_main]

use libfuzzer_sys::fuzz_target;

use bip340_threshold::curve::{to_bytes32, Scalar};
use bip340_threshold::keys_management::KeyPair;
use bip340_threshold::schnorr_single_signature::SchnorrSignature;
use secrecy::Secret;

fuzz_target!(|data: &[u8]| {
    // Message to be signed
    let message = b"Hello world";

    // Raw bytes either decode to a valid key or are rejected with an error
    if let Ok(keys) = KeyPair::from_bytes(data) {
        let signature = SchnorrSignature::sign(message, &keys).expect("Error");
        assert!(signature.verify(keys.public_key(), message));
    }

    // Reduced into the scalar field, only zero is refused
    let scalar = Scalar::from_be_bytes_reduced(&to_bytes32(data));
    match KeyPair::from_secret_scalar(Secret::new(scalar.clone())) {
        Ok(keys) => {
            let signature = SchnorrSignature::sign(message, &keys).expect("Error");
            assert!(signature.verify(keys.public_key(), message));
        }
        Err(_) => assert!(scalar.is_zero()),
    }
});
