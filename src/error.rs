use thiserror::Error;

/// Errors surfaced by key handling, signing and the threshold protocol.
///
/// Verification never produces one of these: a malformed or invalid
/// signature simply verifies as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchnorrError {
    #[error("invalid input length: expected {expected} bytes, got {actual}")]
    InvalidInputLength { expected: usize, actual: usize },

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("no key was provided")]
    NoKeyProvided,

    #[error("private key must be in the range [1, N-1]")]
    InvalidPrivateKey,

    #[error("x coordinate does not correspond to a curve point")]
    InvalidXCoordinate,

    #[error("coordinates do not satisfy the curve equation")]
    PointNotOnCurve,

    #[error("operation is undefined for the point at infinity")]
    PointAtInfinity,

    #[error("malformed signature encoding")]
    MalformedSignatureEncoding,

    #[error("derived nonce is zero")]
    DegenerateNonce,

    #[error("at least one participant is required")]
    EmptyParticipants,

    #[error("threshold must be positive")]
    InvalidThreshold,

    #[error("threshold {threshold} exceeds the number of participants {total}")]
    ThresholdExceedsTotal { threshold: usize, total: usize },

    #[error("insufficient signers: {provided} provided, {required} required")]
    InsufficientSigners { required: usize, provided: usize },

    #[error("participant index {0} appears more than once")]
    DuplicateParticipantIndex(usize),

    #[error("participant index {0} is not registered in the setup")]
    UnknownParticipantIndex(usize),

    #[error("participant {0} has no unused nonce")]
    NonceReuseViolation(usize),

    #[error("challenge was fixed without the current commitment of participant {0}")]
    ChallengeNotYetDetermined(usize),

    #[error("partial signature from participant {0} is invalid")]
    InvalidPartialSignature(usize),

    #[error("aggregate signature does not verify")]
    InvalidAggregateSignature,

    #[error("aggregate key does not match the participants' keys")]
    AggregateKeyMismatch,

    #[error("partial signatures belong to different signing sessions")]
    SessionMismatch,

    #[error("entropy source failure: {0}")]
    EntropySourceFailure(String),
}

pub type Result<T> = std::result::Result<T, SchnorrError>;
