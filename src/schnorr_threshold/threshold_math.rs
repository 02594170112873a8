use crate::curve::{Point, Scalar};
use crate::error::{Result, SchnorrError};
use crate::schnorr_single_signature::verify_raw;
use crate::schnorr_threshold::setup::{KeyScheme, MultisigSetup};
use crate::schnorr_threshold::threshold_protocol::protocol_messages::{
    AggregateSignature, PartialSignature,
};
use crate::tagged_hash::challenge;
use secrecy::{ExposeSecret, Secret};
use std::collections::BTreeSet;

// Aggregates the setup's public keys:
// P_agg = sum of all P_i
//
// Addition is commutative, so the order of `public_keys` is irrelevant.
// A sum equal to the identity has no x-only encoding and is rejected.
#[tracing::instrument(name = "Aggregating public keys", skip_all, fields(keys = public_keys.len()))]
pub fn aggregate_public_keys(public_keys: &[Point]) -> Result<Point> {
    if public_keys.is_empty() {
        return Err(SchnorrError::EmptyParticipants);
    }
    let cap_p: Point = public_keys.iter().sum();
    if cap_p.is_identity() {
        return Err(SchnorrError::PointAtInfinity);
    }
    Ok(cap_p)
}

// Sums the nonce commitments of the signers taking part in a session:
// R_agg = sum of R_i
#[tracing::instrument(name = "Aggregating nonces", skip_all, fields(nonces = nonces.len()))]
pub fn aggregate_nonces(nonces: &[Point]) -> Result<Point> {
    if nonces.is_empty() {
        return Err(SchnorrError::EmptyParticipants);
    }
    let cap_r: Point = nonces.iter().sum();
    if cap_r.is_identity() {
        return Err(SchnorrError::DegenerateNonce);
    }
    Ok(cap_r)
}

// Computes e = H_challenge(x(R_agg) || x(P_agg) || m)
pub fn build_challenge(cap_r: &Point, cap_p: &Point, message: &[u8]) -> Result<Scalar> {
    Ok(challenge(&cap_r.x_only()?, &cap_p.x_only()?, message))
}

/// Lagrange coefficient at zero for participant `index` over the signer set:
/// `λ_i = prod_{j != i} x_j / (x_j - x_i)` with `x = index + 1`.
///
/// `index` must be one of `signers` and `signers` must not repeat.
pub fn lagrange_coefficient(index: usize, signers: &[usize]) -> Result<Scalar> {
    let mut seen = BTreeSet::new();
    for &signer in signers {
        if !seen.insert(signer) {
            return Err(SchnorrError::DuplicateParticipantIndex(signer));
        }
    }
    if !seen.contains(&index) {
        return Err(SchnorrError::UnknownParticipantIndex(index));
    }

    let x_i = share_point(index)?;
    let mut numerator = Scalar::one();
    let mut denominator = Scalar::one();
    for &signer in signers.iter().filter(|&&signer| signer != index) {
        let x_j = share_point(signer)?;
        denominator = &denominator * &(&x_j - &x_i);
        numerator = &numerator * &x_j;
    }
    let inverse = denominator.invert().ok_or(SchnorrError::InvalidThreshold)?;
    Ok(&numerator * &inverse)
}

/// The factor `λ_i` a signer applies to its key: always one for additive
/// keys, the Lagrange coefficient for Shamir shares.
pub fn signing_weight(scheme: KeyScheme, index: usize, signers: &[usize]) -> Result<Scalar> {
    match scheme {
        KeyScheme::Additive => Ok(Scalar::one()),
        KeyScheme::Shamir => lagrange_coefficient(index, signers),
    }
}

// Participant `index` holds the share evaluated at index + 1; zero is the secret.
// An index with no such point can never have been dealt a share.
pub(crate) fn share_point(index: usize) -> Result<Scalar> {
    u64::try_from(index)
        .ok()
        .and_then(|x| x.checked_add(1))
        .map(Scalar::from_u64)
        .ok_or(SchnorrError::UnknownParticipantIndex(index))
}

/// Evaluates `f(x) = c_0 + c_1·x + ... + c_{t-1}·x^{t-1}` by Horner's rule.
pub fn evaluate_polynomial(coefficients: &[Scalar], x: &Scalar) -> Scalar {
    coefficients
        .iter()
        .rev()
        .fold(Scalar::zero(), |acc, c| &(&acc * x) + c)
}

// Computes a signature share
// s_i = k_i' + e * λ_i * d_i'
// where k_i' and d_i' are negated when R_agg, respectively P_agg, has odd y.
// Every signer applies the same flips so the shares sum to a valid signature.
pub fn partial_signature(
    nonce: &Secret<Scalar>,
    private_key: &Secret<Scalar>,
    e: &Scalar,
    weight: &Scalar,
    nonce_negated: bool,
    key_negated: bool,
) -> Scalar {
    let k = conditional_negate(nonce.expose_secret(), nonce_negated);
    let d = conditional_negate(private_key.expose_secret(), key_negated);
    &k + &(&(e * weight) * &d)
}

// Checks a share against the signer's public data:
// s_i·G == R_i' + e * λ_i * P_i'
pub fn verify_partial_signature(
    s: &Scalar,
    r_public: &Point,
    public_key: &Point,
    e: &Scalar,
    weight: &Scalar,
    nonce_negated: bool,
    key_negated: bool,
) -> bool {
    let r_public = if nonce_negated { -r_public } else { r_public.clone() };
    let public_key = if key_negated { -public_key } else { public_key.clone() };
    Point::mul_base(s) == r_public + public_key.scalar_mul(&(e * weight))
}

// Sums the shares into the final s
pub fn aggregate_s(partial_signatures: &[Scalar]) -> Scalar {
    partial_signatures.iter().sum()
}

/// Combines partial signatures into an aggregate signature.
///
/// Every share must carry the same session nonce, come from a distinct
/// participant registered in `setup`, and there must be at least
/// `setup.threshold()` of them.
#[tracing::instrument(name = "Combining partial signatures", skip_all, fields(partials = partials.len(), threshold = setup.threshold()))]
pub fn combine(partials: &[PartialSignature], setup: &MultisigSetup) -> Result<AggregateSignature> {
    let Some(first) = partials.first() else {
        tracing::warn!("no partial signatures to combine");
        return Err(SchnorrError::InsufficientSigners {
            required: setup.threshold(),
            provided: 0,
        });
    };

    let mut signers = BTreeSet::new();
    for partial in partials {
        if partial.session_nonce != first.session_nonce {
            tracing::warn!(index = partial.index, "partial signature from another session");
            return Err(SchnorrError::SessionMismatch);
        }
        if setup.participant(partial.index).is_none() {
            tracing::warn!(index = partial.index, "partial signature from unregistered participant");
            return Err(SchnorrError::UnknownParticipantIndex(partial.index));
        }
        if !signers.insert(partial.index) {
            tracing::warn!(index = partial.index, "duplicate partial signature");
            return Err(SchnorrError::DuplicateParticipantIndex(partial.index));
        }
    }
    if signers.len() < setup.threshold() {
        tracing::warn!(provided = signers.len(), "not enough partial signatures");
        return Err(SchnorrError::InsufficientSigners {
            required: setup.threshold(),
            provided: signers.len(),
        });
    }

    let shares: Vec<Scalar> = partials.iter().map(|p| p.s.clone()).collect();
    Ok(AggregateSignature {
        r: first.session_nonce,
        s: aggregate_s(&shares),
        signers: signers.into_iter().collect(),
    })
}

/// Verifies an aggregate signature exactly as a single-signer BIP340
/// signature under `aggregate_key`.
#[tracing::instrument(name = "Verifying the aggregate signature", skip_all, fields(signers = signature.signers.len()))]
pub fn verify_aggregate(message: &[u8], signature: &AggregateSignature, aggregate_key: &Point) -> bool {
    verify_raw(message, aggregate_key, &signature.r, &signature.s)
}

fn conditional_negate(value: &Scalar, negate: bool) -> Scalar {
    if negate {
        -value
    } else {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys_management::KeyPair;
    use crate::schnorr_single_signature::SchnorrSignature;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keys(n: usize, seed: u64) -> Vec<KeyPair> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| KeyPair::generate(&mut rng).unwrap()).collect()
    }

    #[test]
    fn test_aggregate_public_keys_is_order_independent() {
        let key_pairs = keys(4, 1);
        let mut points: Vec<Point> = key_pairs.iter().map(|k| k.public_key.clone()).collect();
        let forward = aggregate_public_keys(&points).unwrap();
        points.reverse();
        assert_eq!(aggregate_public_keys(&points).unwrap(), forward);
    }

    #[test]
    fn test_aggregation_rejects_empty_and_identity() {
        assert_eq!(aggregate_public_keys(&[]), Err(SchnorrError::EmptyParticipants));
        assert_eq!(aggregate_nonces(&[]), Err(SchnorrError::EmptyParticipants));

        let g = Point::generator();
        assert_eq!(
            aggregate_public_keys(&[g.clone(), -&g]),
            Err(SchnorrError::PointAtInfinity)
        );
        assert_eq!(aggregate_nonces(&[g.clone(), -&g]), Err(SchnorrError::DegenerateNonce));
    }

    #[test]
    fn test_lagrange_coefficients_interpolate_at_zero() {
        // f(x) = 5 + 3x + 2x^2, so f(0) = 5 from any three points.
        let coefficients = [Scalar::from_u64(5), Scalar::from_u64(3), Scalar::from_u64(2)];
        let signers = [0usize, 2, 4];
        let recovered: Scalar = signers
            .iter()
            .map(|&i| {
                let lambda = lagrange_coefficient(i, &signers).unwrap();
                &lambda * &evaluate_polynomial(&coefficients, &share_point(i).unwrap())
            })
            .sum();
        assert_eq!(recovered, Scalar::from_u64(5));
    }

    #[test]
    fn test_lagrange_coefficient_rejects_bad_sets() {
        assert_eq!(
            lagrange_coefficient(3, &[0, 1]),
            Err(SchnorrError::UnknownParticipantIndex(3))
        );
        assert_eq!(
            lagrange_coefficient(0, &[0, 1, 1]),
            Err(SchnorrError::DuplicateParticipantIndex(1))
        );
        assert_eq!(lagrange_coefficient(0, &[0]), Ok(Scalar::one()));
        assert_eq!(
            lagrange_coefficient(0, &[0, usize::MAX]),
            Err(SchnorrError::UnknownParticipantIndex(usize::MAX))
        );
        assert_eq!(
            lagrange_coefficient(usize::MAX, &[0, usize::MAX]),
            Err(SchnorrError::UnknownParticipantIndex(usize::MAX))
        );
    }

    #[test]
    fn test_signing_weight_is_one_for_additive_keys() {
        assert_eq!(
            signing_weight(KeyScheme::Additive, 7, &[1, 7]),
            Ok(Scalar::one())
        );
    }

    #[test]
    fn test_evaluate_polynomial() {
        let coefficients = [Scalar::from_u64(1), Scalar::from_u64(2), Scalar::from_u64(3)];
        // 1 + 2*4 + 3*16
        assert_eq!(
            evaluate_polynomial(&coefficients, &Scalar::from_u64(4)),
            Scalar::from_u64(57)
        );
        assert_eq!(evaluate_polynomial(&[], &Scalar::from_u64(4)), Scalar::zero());
    }

    #[test]
    fn test_shares_sum_to_valid_bip340_signature() {
        let key_pairs = keys(3, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let nonces: Vec<Scalar> = (0..3).map(|_| Scalar::random_nonzero(&mut rng).unwrap()).collect();

        let public_keys: Vec<Point> = key_pairs.iter().map(|k| k.public_key.clone()).collect();
        let commitments: Vec<Point> = nonces.iter().map(Point::mul_base).collect();
        let cap_p = aggregate_public_keys(&public_keys).unwrap();
        let cap_r = aggregate_nonces(&commitments).unwrap();
        let message = b"Hello World";
        let e = build_challenge(&cap_r, &cap_p, message).unwrap();
        let nonce_negated = !cap_r.has_even_y();
        let key_negated = !cap_p.has_even_y();

        let shares: Vec<Scalar> = (0..3)
            .map(|i| {
                let s = partial_signature(
                    &Secret::new(nonces[i].clone()),
                    &key_pairs[i].private_key,
                    &e,
                    &Scalar::one(),
                    nonce_negated,
                    key_negated,
                );
                assert!(verify_partial_signature(
                    &s,
                    &commitments[i],
                    &public_keys[i],
                    &e,
                    &Scalar::one(),
                    nonce_negated,
                    key_negated,
                ));
                s
            })
            .collect();

        let signature = SchnorrSignature {
            r: cap_r.x_only().unwrap(),
            s: aggregate_s(&shares),
        };
        assert!(signature.verify(&cap_p, message));
        assert!(!signature.verify(&public_keys[0], message));
    }

    #[test]
    fn test_verify_partial_signature_rejects_wrong_share() {
        let key_pairs = keys(1, 4);
        let k = Scalar::from_u64(99);
        let r = Point::mul_base(&k);
        let e = Scalar::from_u64(5);
        let s = partial_signature(
            &Secret::new(k),
            &key_pairs[0].private_key,
            &e,
            &Scalar::one(),
            false,
            false,
        );
        let p = key_pairs[0].public_key.clone();
        assert!(verify_partial_signature(&s, &r, &p, &e, &Scalar::one(), false, false));
        assert!(!verify_partial_signature(&(&s + &Scalar::one()), &r, &p, &e, &Scalar::one(), false, false));
        assert!(!verify_partial_signature(&s, &r, &p, &e, &Scalar::one(), true, false));
    }
}
