use serde::Serialize;
use x509ck_verify::VerificationOutcome;

/// How a run ended, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Status {
    Ok,
    /// Bad arguments, or the report itself could not be written.
    Usage,
    /// An input could not be read or decoded.
    Decode,
    AlgorithmMismatch,
    ModulusMismatch,
    ExponentMismatch,
    SignatureInvalid,
}

impl Status {
    pub(crate) fn exit_code(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Usage => 1,
            Status::Decode => 2,
            Status::AlgorithmMismatch => 3,
            Status::ModulusMismatch => 4,
            Status::ExponentMismatch => 5,
            Status::SignatureInvalid => 6,
        }
    }
}

impl From<&VerificationOutcome> for Status {
    fn from(outcome: &VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Ok => Status::Ok,
            VerificationOutcome::AlgorithmMismatch { .. } => Status::AlgorithmMismatch,
            VerificationOutcome::ModulusMismatch => Status::ModulusMismatch,
            VerificationOutcome::ExponentMismatch => Status::ExponentMismatch,
            VerificationOutcome::SignatureInvalid(_) => Status::SignatureInvalid,
        }
    }
}
