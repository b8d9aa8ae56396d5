use x509ck::decoder::{DecodableFrom, Decoder};
use x509ck_asn1::{ASN1Object, BitString, Element, ObjectIdentifier};
use x509ck_pkcs::RSAPublicKey;

use crate::algorithm::{AlgorithmIdentifier, AlgorithmParameters, PublicKeyAlgorithm};
use crate::error::{Error, Result};

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.7

SubjectPublicKeyInfo  ::=  SEQUENCE  {
    algorithm            AlgorithmIdentifier,
    subjectPublicKey     BIT STRING
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPublicKeyInfo {
    algorithm: AlgorithmIdentifier,
    subject_public_key: BitString,
    public_key: PublicKey,
}

impl SubjectPublicKeyInfo {
    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    pub fn subject_public_key(&self) -> &BitString {
        &self.subject_public_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn public_key_algorithm(&self) -> PublicKeyAlgorithm {
        PublicKeyAlgorithm::from(&self.algorithm.algorithm)
    }
}

impl DecodableFrom<Element> for SubjectPublicKeyInfo {}

impl Decoder<Element, SubjectPublicKeyInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SubjectPublicKeyInfo> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidSubjectPublicKeyInfo(
                "expected sequence".to_string(),
            ));
        };
        let [algorithm, Element::BitString(subject_public_key)] = elements.as_slice() else {
            return Err(Error::InvalidSubjectPublicKeyInfo(
                "expected an algorithm identifier and a bit string".to_string(),
            ));
        };
        let algorithm: AlgorithmIdentifier = algorithm.decode()?;
        if subject_public_key.unused_bits() != 0 {
            return Err(Error::InvalidSubjectPublicKeyInfo(
                "public key bit string has unused bits".to_string(),
            ));
        }
        let public_key = PublicKey::parse(&algorithm, subject_public_key.as_bytes())?;

        Ok(SubjectPublicKeyInfo {
            algorithm,
            subject_public_key: subject_public_key.clone(),
            public_key,
        })
    }
}

/// A subject public key, typed by its algorithm.
///
/// Only RSA keys are decoded into their components. The other variants keep
/// the raw key bytes so callers can report on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RSAPublicKey),
    Ec {
        curve: ObjectIdentifier,
        point: Vec<u8>,
    },
    Dsa(Vec<u8>),
    Ed25519(Vec<u8>),
    Unknown {
        algorithm: ObjectIdentifier,
        key: Vec<u8>,
    },
}

impl PublicKey {
    const ED25519_KEY_LENGTH: usize = 32;

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => PublicKeyAlgorithm::Rsa,
            PublicKey::Ec { .. } => PublicKeyAlgorithm::Ec,
            PublicKey::Dsa(_) => PublicKeyAlgorithm::Dsa,
            PublicKey::Ed25519(_) => PublicKeyAlgorithm::Ed25519,
            PublicKey::Unknown { algorithm, .. } => PublicKeyAlgorithm::Unknown(algorithm.clone()),
        }
    }

    pub fn as_rsa(&self) -> Option<&RSAPublicKey> {
        match self {
            PublicKey::Rsa(key) => Some(key),
            _ => None,
        }
    }

    fn parse(algorithm: &AlgorithmIdentifier, key: &[u8]) -> Result<PublicKey> {
        match PublicKeyAlgorithm::from(&algorithm.algorithm) {
            PublicKeyAlgorithm::Rsa => {
                // RFC 3279 2.3.1: the parameters field MUST be NULL
                if algorithm.parameters != Some(AlgorithmParameters::Null) {
                    return Err(Error::InvalidSubjectPublicKeyInfo(
                        "RSA key missing NULL parameters".to_string(),
                    ));
                }
                let object = ASN1Object::parse(key)
                    .map_err(|e| Error::InvalidRsaPublicKey(e.into()))?;
                let key: x509ck_pkcs::Result<RSAPublicKey> = object.decode();
                Ok(PublicKey::Rsa(key.map_err(Error::InvalidRsaPublicKey)?))
            }
            PublicKeyAlgorithm::Ec => {
                let Some(AlgorithmParameters::Elm(Element::ObjectIdentifier(curve))) =
                    &algorithm.parameters
                else {
                    return Err(Error::InvalidSubjectPublicKeyInfo(
                        "EC key without a named curve".to_string(),
                    ));
                };
                if key.is_empty() {
                    return Err(Error::InvalidSubjectPublicKeyInfo(
                        "empty EC point".to_string(),
                    ));
                }
                Ok(PublicKey::Ec {
                    curve: curve.clone(),
                    point: key.to_vec(),
                })
            }
            PublicKeyAlgorithm::Dsa => Ok(PublicKey::Dsa(key.to_vec())),
            PublicKeyAlgorithm::Ed25519 => {
                if algorithm.parameters.is_some() {
                    return Err(Error::InvalidSubjectPublicKeyInfo(
                        "Ed25519 key must not have parameters".to_string(),
                    ));
                }
                if key.len() != Self::ED25519_KEY_LENGTH {
                    return Err(Error::InvalidSubjectPublicKeyInfo(format!(
                        "Ed25519 key must be {} bytes, got {}",
                        Self::ED25519_KEY_LENGTH,
                        key.len()
                    )));
                }
                Ok(PublicKey::Ed25519(key.to_vec()))
            }
            PublicKeyAlgorithm::Unknown(algorithm) => Ok(PublicKey::Unknown {
                algorithm,
                key: key.to_vec(),
            }),
        }
    }
}
