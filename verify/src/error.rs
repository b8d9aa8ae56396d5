use thiserror::Error;
use x509ck_pem::Label;

use crate::Role;

/// Failure to decode one of the inputs, tagged with the input's role.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{role}: not a valid PEM file ({source})")]
    InvalidPem {
        role: Role,
        #[source]
        source: x509ck_pem::error::Error,
    },

    #[error("{role}: not a certificate (found {label})")]
    NotACertificate { role: Role, label: Label },

    #[error("{role}: not a valid certificate ({source})")]
    MalformedCertificate {
        role: Role,
        #[source]
        source: x509ck_x509::error::Error,
    },

    #[error("{role}: not a valid private key ({source})")]
    MalformedKey {
        role: Role,
        #[source]
        source: x509ck_pkcs::Error,
    },
}

impl Error {
    /// Which input could not be decoded.
    pub fn role(&self) -> Role {
        match self {
            Error::InvalidPem { role, .. }
            | Error::NotACertificate { role, .. }
            | Error::MalformedCertificate { role, .. }
            | Error::MalformedKey { role, .. } => *role,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
