//! Checks that a certificate, an RSA private key and an optional certificate
//! authority belong together.
//!
//! [`verify`] decodes the three PEM inputs in order (CA, certificate, key) and
//! then runs a [`Verifier`] over them:
//!
//! 1. the certificate must carry an RSA public key,
//! 2. its modulus and then its public exponent must equal the key's,
//! 3. when a CA is given, the certificate's signature must verify with the
//!    CA's public key.
//!
//! The first failing check decides the [`VerificationOutcome`]. Validity
//! periods and CA constraints are not looked at.
//!
//! ```no_run
//! use x509ck_verify::{VerificationOutcome, verify};
//!
//! let ca = std::fs::read("ca.pem").unwrap();
//! let cert = std::fs::read("server.pem").unwrap();
//! let key = std::fs::read("server.key").unwrap();
//! assert_eq!(
//!     VerificationOutcome::Ok,
//!     verify(Some(ca.as_slice()), &cert, &key).unwrap()
//! );
//! ```

use std::fmt::Display;

use log::{debug, warn};
use x509ck::decoder::Decoder;
use x509ck_pem::{Label, Pem, PemBlock};
use x509ck_pkcs::RSAPrivateKey;
use x509ck_x509::{Certificate, PublicKey, PublicKeyAlgorithm, SignatureError};

pub mod error;

pub use error::{Error, Result};

/// The part an input plays in a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    CertificateAuthority,
    Certificate,
    PrivateKey,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::CertificateAuthority => write!(f, "certificate authority"),
            Role::Certificate => write!(f, "certificate"),
            Role::PrivateKey => write!(f, "private key"),
        }
    }
}

/// Result of the checks once every input decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Ok,
    /// The certificate's key is not an RSA key.
    AlgorithmMismatch { algorithm: PublicKeyAlgorithm },
    ModulusMismatch,
    ExponentMismatch,
    /// The certificate's signature does not verify with the CA's key.
    SignatureInvalid(SignatureError),
}

impl VerificationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationOutcome::Ok)
    }
}

/// Runs the checks over already decoded inputs.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    certificate: &'a Certificate,
    key: &'a RSAPrivateKey,
    authority: Option<&'a Certificate>,
}

impl<'a> Verifier<'a> {
    pub fn new(certificate: &'a Certificate, key: &'a RSAPrivateKey) -> Self {
        Verifier {
            certificate,
            key,
            authority: None,
        }
    }

    /// Also require the certificate to be signed by `authority`.
    pub fn with_authority(mut self, authority: &'a Certificate) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn run(&self) -> VerificationOutcome {
        let PublicKey::Rsa(public_key) = self.certificate.public_key() else {
            let algorithm = self.certificate.public_key_algorithm();
            debug!("certificate carries a {algorithm} key");
            return VerificationOutcome::AlgorithmMismatch { algorithm };
        };

        debug!(
            "comparing {}-bit certificate modulus with {}-bit key modulus",
            public_key.key_size(),
            self.key.key_size()
        );
        if public_key.modulus != self.key.modulus {
            return VerificationOutcome::ModulusMismatch;
        }
        debug!(
            "comparing public exponents (certificate {}, key {})",
            public_key.public_exponent, self.key.public_exponent
        );
        if public_key.public_exponent != self.key.public_exponent {
            return VerificationOutcome::ExponentMismatch;
        }

        let Some(authority) = self.authority else {
            debug!("no certificate authority given, skipping the signature check");
            return VerificationOutcome::Ok;
        };
        match self.certificate.check_signature_from(authority) {
            Ok(()) => VerificationOutcome::Ok,
            Err(e) => {
                debug!("signature check failed: {e}");
                VerificationOutcome::SignatureInvalid(e)
            }
        }
    }
}

/// Decodes the inputs and checks them against each other.
///
/// Inputs are decoded in the order CA, certificate, key; the first one that
/// fails to decode is reported as an [`Error`] carrying its [`Role`].
pub fn verify(ca: Option<&[u8]>, cert: &[u8], key: &[u8]) -> Result<VerificationOutcome> {
    let authority = ca
        .map(|ca| decode_certificate(ca, Role::CertificateAuthority))
        .transpose()?;
    let certificate = decode_certificate(cert, Role::Certificate)?;
    let key = decode_private_key(key)?;

    let mut verifier = Verifier::new(&certificate, &key);
    if let Some(authority) = &authority {
        verifier = verifier.with_authority(authority);
    }
    Ok(verifier.run())
}

/// Decodes the first PEM block of `input`, which must be a `CERTIFICATE`.
pub fn decode_certificate(input: &[u8], role: Role) -> Result<Certificate> {
    let block = match x509ck_pem::decode_block(input, &Label::Certificate) {
        Ok(block) => block,
        Err(x509ck_pem::error::Error::TypeMismatch { actual, .. }) => {
            return Err(Error::NotACertificate {
                role,
                label: actual,
            });
        }
        Err(source) => return Err(Error::InvalidPem { role, source }),
    };
    found_block(input, &block, role);
    let certificate: x509ck_x509::error::Result<Certificate> = block.decode();
    let certificate =
        certificate.map_err(|source| Error::MalformedCertificate { role, source })?;
    debug!(
        "{role}: decoded certificate for '{}' issued by '{}'",
        certificate.subject(),
        certificate.issuer()
    );
    Ok(certificate)
}

/// Decodes a PKCS#1 RSA private key from the first PEM block of `input`.
///
/// The block label is not checked, only its contents.
pub fn decode_private_key(input: &[u8]) -> Result<RSAPrivateKey> {
    let role = Role::PrivateKey;
    let block = decode_pem(input, role)?;
    let key: x509ck_pkcs::Result<RSAPrivateKey> = block.decode();
    let key = key.map_err(|source| Error::MalformedKey { role, source })?;
    debug!("{role}: decoded {}-bit RSA key", key.key_size());
    Ok(key)
}

fn decode_pem(input: &[u8], role: Role) -> Result<PemBlock> {
    let pem: x509ck_pem::error::Result<Pem> = input.decode();
    let block: x509ck_pem::error::Result<PemBlock> = pem.and_then(|pem| pem.decode());
    let block = block.map_err(|source| Error::InvalidPem { role, source })?;
    found_block(input, &block, role);
    Ok(block)
}

fn found_block(input: &[u8], block: &PemBlock, role: Role) {
    debug!(
        "{role}: found {} block ({} bytes)",
        block.label(),
        block.bytes().len()
    );
    warn_on_extra_blocks(input, role);
}

fn warn_on_extra_blocks(input: &[u8], role: Role) {
    let text = String::from_utf8_lossy(input);
    if let Ok(blocks) = x509ck_pem::parse_many(&text) {
        if blocks.len() > 1 {
            warn!(
                "{role}: ignoring {} PEM block(s) after the first",
                blocks.len() - 1
            );
        }
    }
}
