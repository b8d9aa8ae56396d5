use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] x509ck_asn1::error::Error),

    #[error("expected SEQUENCE for {0}")]
    ExpectedSequence(&'static str),

    #[error("expected {expected} elements, got {actual}")]
    InvalidElementCount {
        expected: &'static str,
        actual: usize,
    },

    #[error("expected INTEGER for {field}")]
    ExpectedInteger { field: &'static str },

    #[error("{field} is zero or negative")]
    NotPositive { field: &'static str },

    /// The input is a private key, just not a PKCS#1 one.
    #[error("found a {found} structure, expected a PKCS#1 RSAPrivateKey")]
    UnexpectedKeyFormat { found: &'static str },

    #[error("invalid version: {0} (must be 0 for two-prime or 1 for multi-prime)")]
    InvalidVersion(String),

    #[error("otherPrimeInfos present in a two-prime key")]
    UnexpectedOtherPrimeInfos,

    #[error("encrypted private keys are not supported")]
    EncryptedKey,

    #[error("invalid PEM: {0}")]
    InvalidPem(#[from] x509ck_pem::error::Error),

    #[error("invalid DER: {0}")]
    InvalidDer(#[from] x509ck_der::error::Error),
}

impl Error {
    /// `true` when the input is a PKCS#8 or SEC1 key rather than PKCS#1.
    pub fn is_unexpected_key_format(&self) -> bool {
        matches!(self, Error::UnexpectedKeyFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
