use thiserror::Error;
use x509ck_asn1::ObjectIdentifier;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("invalid tbsCertificate: {0}")]
    InvalidTBSCertificate(String),
    #[error("invalid version: {0}")]
    InvalidVersion(String),
    #[error("invalid certificate serial number: {0}")]
    InvalidCertificateSerialNumber(String),
    #[error("invalid algorithm identifier: {0}")]
    InvalidAlgorithmIdentifier(String),
    #[error("inner and outer signature algorithm identifiers don't match")]
    SignatureAlgorithmMismatch,
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid attribute type and value: {0}")]
    InvalidAttributeTypeAndValue(String),
    #[error("invalid validity: {0}")]
    InvalidValidity(String),
    #[error("invalid unique identifier: {0}")]
    InvalidUniqueIdentifier(String),
    #[error("invalid subject public key info: {0}")]
    InvalidSubjectPublicKeyInfo(String),
    #[error("invalid RSA public key: {0}")]
    InvalidRsaPublicKey(#[source] x509ck_pkcs::Error),
    #[error("invalid signature value: {0}")]
    InvalidSignatureValue(String),
    #[error("invalid extension: {0}")]
    InvalidExtension(String),
    #[error("duplicate extension {0}")]
    DuplicateExtension(ObjectIdentifier),
    #[error("ASN.1: {0}")]
    InvalidASN1(#[from] x509ck_asn1::error::Error),
    #[error("DER: {0}")]
    InvalidDer(#[from] x509ck_der::error::Error),
    #[error("PEM: {0}")]
    InvalidPem(#[from] x509ck_pem::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
