use std::path::{Path, PathBuf};

use thiserror::Error;
use x509ck_verify::Role;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("{role} '{}': {source}", .path.display())]
    Read {
        role: Role,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe(.path, .source))]
    Decode {
        path: PathBuf,
        #[source]
        source: x509ck_verify::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write the report: {0}")]
    Write(#[source] std::io::Error),
}

// `<role> '<path>': <reason>` for an input that did not decode.
fn describe(path: &Path, error: &x509ck_verify::Error) -> String {
    let role = error.role();
    let path = path.display();
    match error {
        x509ck_verify::Error::InvalidPem { .. } => {
            format!("{role} '{path}': not a valid PEM file")
        }
        x509ck_verify::Error::NotACertificate { .. } => {
            format!("{role} '{path}': not a certificate")
        }
        x509ck_verify::Error::MalformedCertificate { source, .. } => {
            format!("{role} '{path}': not a valid certificate ({source})")
        }
        x509ck_verify::Error::MalformedKey { source, .. } => {
            format!("{role} '{path}': not a valid private key ({source})")
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
