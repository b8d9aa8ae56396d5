use log::{debug, trace};
use rsa::{BigUint, Pkcs1v15Sign, Pss, RsaPublicKey};
use sha1::Sha1;
use sha2::digest::const_oid::AssociatedOid;
use sha2::digest::{Digest, DynDigest};
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;
use x509ck_pkcs::RSAPublicKey;

use crate::algorithm::{
    HashAlgorithm, MaskGenAlgorithm, PssParameters, PublicKeyAlgorithm, SignatureAlgorithm,
};
use crate::public_key::PublicKey;

// Largest modulus accepted for signature checks, in bits.
const MAX_RSA_MODULUS_BITS: usize = 16384;

/// Why a signature could not be verified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("insecure algorithm {0}")]
    InsecureAlgorithm(SignatureAlgorithm),
    #[error("algorithm unimplemented: {0}")]
    UnsupportedAlgorithm(SignatureAlgorithm),
    #[error(
        "signature algorithm {algorithm} specifies an {expected} public key, but have public key of type {actual}"
    )]
    KeyAlgorithmMismatch {
        algorithm: SignatureAlgorithm,
        expected: PublicKeyAlgorithm,
        actual: PublicKeyAlgorithm,
    },
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("{0}")]
    Verification(String),
}

/// Checks `signature` over `message` with `public_key` as `algorithm` prescribes.
pub fn verify_signature(
    algorithm: &SignatureAlgorithm,
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    if algorithm.is_insecure() {
        return Err(SignatureError::InsecureAlgorithm(algorithm.clone()));
    }
    let Some(expected) = algorithm.public_key_algorithm() else {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.clone()));
    };
    let actual = public_key.algorithm();
    if expected != actual {
        return Err(SignatureError::KeyAlgorithmMismatch {
            algorithm: algorithm.clone(),
            expected,
            actual,
        });
    }
    let PublicKey::Rsa(key) = public_key else {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.clone()));
    };

    if let SignatureAlgorithm::RsaPss(params) = algorithm {
        if !is_supported_pss(params) {
            return Err(SignatureError::UnsupportedAlgorithm(algorithm.clone()));
        }
    }

    let key = rsa_public_key(key)?;
    debug!(
        "verifying {algorithm} signature over {} bytes",
        message.len()
    );
    match algorithm {
        SignatureAlgorithm::Sha1WithRsa => pkcs1v15::<Sha1>(&key, message, signature),
        SignatureAlgorithm::Sha256WithRsa => pkcs1v15::<Sha256>(&key, message, signature),
        SignatureAlgorithm::Sha384WithRsa => pkcs1v15::<Sha384>(&key, message, signature),
        SignatureAlgorithm::Sha512WithRsa => pkcs1v15::<Sha512>(&key, message, signature),
        SignatureAlgorithm::RsaPss(params) => match params.hash {
            HashAlgorithm::Sha256 => pss::<Sha256>(&key, message, signature, params.salt_length),
            HashAlgorithm::Sha384 => pss::<Sha384>(&key, message, signature, params.salt_length),
            HashAlgorithm::Sha512 => pss::<Sha512>(&key, message, signature, params.salt_length),
            _ => Err(SignatureError::UnsupportedAlgorithm(algorithm.clone())),
        },
        _ => Err(SignatureError::UnsupportedAlgorithm(algorithm.clone())),
    }
}

// SHA-2 digests only, MGF1 over the same digest, salt as long as the digest,
// trailer field 0xbc
fn is_supported_pss(params: &PssParameters) -> bool {
    matches!(
        params.hash,
        HashAlgorithm::Sha256 | HashAlgorithm::Sha384 | HashAlgorithm::Sha512
    ) && params.mask_gen == MaskGenAlgorithm::Mgf1(params.hash.clone())
        && params.hash.output_size() == Some(params.salt_length)
        && params.trailer_field == 1
}

fn rsa_public_key(key: &RSAPublicKey) -> Result<RsaPublicKey, SignatureError> {
    let n = BigUint::from_bytes_be(&key.modulus.to_bytes_be());
    let e = BigUint::from_bytes_be(&key.public_exponent.to_bytes_be());
    RsaPublicKey::new_with_max_size(n, e, MAX_RSA_MODULUS_BITS)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))
}

fn pkcs1v15<D>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<(), SignatureError>
where
    D: Digest + AssociatedOid,
{
    let hashed = <D as Digest>::digest(message);
    trace!("PKCS#1 v1.5 digest: {} bytes", hashed.len());
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, signature)
        .map_err(|e| SignatureError::Verification(e.to_string()))
}

fn pss<D>(
    key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
    salt_length: usize,
) -> Result<(), SignatureError>
where
    D: 'static + Digest + DynDigest + Send + Sync,
{
    let hashed = <D as Digest>::digest(message);
    trace!("RSASSA-PSS digest: {} bytes, salt length {salt_length}", hashed.len());
    key.verify(Pss::new_with_salt::<D>(salt_length), &hashed, signature)
        .map_err(|e| SignatureError::Verification(e.to_string()))
}
