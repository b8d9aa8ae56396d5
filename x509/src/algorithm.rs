use std::fmt::Display;

use x509ck::decoder::{DecodableFrom, Decoder};
use x509ck_asn1::{Element, ObjectIdentifier};

use crate::error::{Error, Result};

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.1.2

AlgorithmIdentifier  ::=  SEQUENCE  {
    algorithm               OBJECT IDENTIFIER,
    parameters              ANY DEFINED BY algorithm OPTIONAL
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub algorithm: ObjectIdentifier,
    pub parameters: Option<AlgorithmParameters>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmParameters {
    Null,
    Elm(Element),
}

impl AlgorithmIdentifier {
    // public key algorithms (RFC 3279, RFC 8410)
    pub const OID_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.1";
    pub const OID_ID_DSA: &'static str = "1.2.840.10040.4.1";
    pub const OID_EC_PUBLIC_KEY: &'static str = "1.2.840.10045.2.1";
    pub const OID_ED25519: &'static str = "1.3.101.112";

    // signature algorithms (RFC 3279, RFC 4055, RFC 5758)
    pub const OID_MD2_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.2";
    pub const OID_MD5_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.4";
    pub const OID_SHA1_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.5";
    pub const OID_SHA1_WITH_RSA_SIGNATURE: &'static str = "1.3.14.3.2.29";
    pub const OID_SHA256_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.11";
    pub const OID_SHA384_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.12";
    pub const OID_SHA512_WITH_RSA_ENCRYPTION: &'static str = "1.2.840.113549.1.1.13";
    pub const OID_RSASSA_PSS: &'static str = "1.2.840.113549.1.1.10";
    pub const OID_MGF1: &'static str = "1.2.840.113549.1.1.8";
    pub const OID_ECDSA_WITH_SHA256: &'static str = "1.2.840.10045.4.3.2";
    pub const OID_ECDSA_WITH_SHA384: &'static str = "1.2.840.10045.4.3.3";
    pub const OID_ECDSA_WITH_SHA512: &'static str = "1.2.840.10045.4.3.4";

    // digests
    pub const OID_MD2: &'static str = "1.2.840.113549.2.2";
    pub const OID_MD5: &'static str = "1.2.840.113549.2.5";
    pub const OID_SHA1: &'static str = "1.3.14.3.2.26";
    pub const OID_SHA224: &'static str = "2.16.840.1.101.3.4.2.4";
    pub const OID_SHA256: &'static str = "2.16.840.1.101.3.4.2.1";
    pub const OID_SHA384: &'static str = "2.16.840.1.101.3.4.2.2";
    pub const OID_SHA512: &'static str = "2.16.840.1.101.3.4.2.3";

    pub fn new(algorithm: ObjectIdentifier) -> Self {
        Self {
            algorithm,
            parameters: None,
        }
    }

    pub fn algorithm(&self) -> &ObjectIdentifier {
        &self.algorithm
    }

    pub fn parameters(&self) -> Option<&AlgorithmParameters> {
        self.parameters.as_ref()
    }
}

impl DecodableFrom<Element> for AlgorithmIdentifier {}

impl Decoder<Element, AlgorithmIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AlgorithmIdentifier> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidAlgorithmIdentifier(
                "expected sequence".to_string(),
            ));
        };
        match elements.as_slice() {
            [Element::ObjectIdentifier(oid)] => Ok(AlgorithmIdentifier::new(oid.clone())),
            [Element::ObjectIdentifier(oid), Element::Null] => Ok(AlgorithmIdentifier {
                algorithm: oid.clone(),
                parameters: Some(AlgorithmParameters::Null),
            }),
            [Element::ObjectIdentifier(oid), params] => Ok(AlgorithmIdentifier {
                algorithm: oid.clone(),
                parameters: Some(AlgorithmParameters::Elm(params.clone())),
            }),
            [_] | [_, _] => Err(Error::InvalidAlgorithmIdentifier(
                "algorithm must be an object identifier".to_string(),
            )),
            _ => Err(Error::InvalidAlgorithmIdentifier(format!(
                "expected 1 or 2 elements, got {}",
                elements.len()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md2,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Unknown(ObjectIdentifier),
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn output_size(&self) -> Option<usize> {
        match self {
            HashAlgorithm::Md2 | HashAlgorithm::Md5 => Some(16),
            HashAlgorithm::Sha1 => Some(20),
            HashAlgorithm::Sha224 => Some(28),
            HashAlgorithm::Sha256 => Some(32),
            HashAlgorithm::Sha384 => Some(48),
            HashAlgorithm::Sha512 => Some(64),
            HashAlgorithm::Unknown(_) => None,
        }
    }
}

impl From<&ObjectIdentifier> for HashAlgorithm {
    fn from(oid: &ObjectIdentifier) -> Self {
        match oid.to_string().as_str() {
            AlgorithmIdentifier::OID_MD2 => HashAlgorithm::Md2,
            AlgorithmIdentifier::OID_MD5 => HashAlgorithm::Md5,
            AlgorithmIdentifier::OID_SHA1 => HashAlgorithm::Sha1,
            AlgorithmIdentifier::OID_SHA224 => HashAlgorithm::Sha224,
            AlgorithmIdentifier::OID_SHA256 => HashAlgorithm::Sha256,
            AlgorithmIdentifier::OID_SHA384 => HashAlgorithm::Sha384,
            AlgorithmIdentifier::OID_SHA512 => HashAlgorithm::Sha512,
            _ => HashAlgorithm::Unknown(oid.clone()),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Md2 => write!(f, "MD2"),
            HashAlgorithm::Md5 => write!(f, "MD5"),
            HashAlgorithm::Sha1 => write!(f, "SHA1"),
            HashAlgorithm::Sha224 => write!(f, "SHA224"),
            HashAlgorithm::Sha256 => write!(f, "SHA256"),
            HashAlgorithm::Sha384 => write!(f, "SHA384"),
            HashAlgorithm::Sha512 => write!(f, "SHA512"),
            HashAlgorithm::Unknown(oid) => write!(f, "{oid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskGenAlgorithm {
    Mgf1(HashAlgorithm),
    Unknown(ObjectIdentifier),
}

/*
https://datatracker.ietf.org/doc/html/rfc4055#section-3.1

RSASSA-PSS-params  ::=  SEQUENCE  {
    hashAlgorithm      [0] HashAlgorithm DEFAULT sha1Identifier,
    maskGenAlgorithm   [1] MaskGenAlgorithm DEFAULT mgf1SHA1Identifier,
    saltLength         [2] INTEGER DEFAULT 20,
    trailerField       [3] INTEGER DEFAULT 1
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PssParameters {
    pub hash: HashAlgorithm,
    pub mask_gen: MaskGenAlgorithm,
    pub salt_length: usize,
    pub trailer_field: u64,
}

impl Default for PssParameters {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha1,
            mask_gen: MaskGenAlgorithm::Mgf1(HashAlgorithm::Sha1),
            salt_length: 20,
            trailer_field: 1,
        }
    }
}

impl DecodableFrom<Element> for PssParameters {}

impl Decoder<Element, PssParameters> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PssParameters> {
        let invalid = |msg: &str| Error::InvalidAlgorithmIdentifier(format!("RSASSA-PSS: {msg}"));
        let Element::Sequence(fields) = self else {
            return Err(invalid("expected sequence"));
        };
        let mut params = PssParameters::default();
        let mut last_slot = None;
        for field in fields {
            let Element::ContextSpecific {
                slot,
                constructed: true,
                element,
            } = field
            else {
                return Err(invalid("expected explicitly tagged field"));
            };
            if last_slot.is_some_and(|last| *slot <= last) {
                return Err(invalid("fields out of order"));
            }
            last_slot = Some(*slot);

            match slot {
                0 => {
                    let hash: AlgorithmIdentifier = element.decode()?;
                    params.hash = HashAlgorithm::from(&hash.algorithm);
                }
                1 => {
                    let mask_gen: AlgorithmIdentifier = element.decode()?;
                    params.mask_gen = if mask_gen.algorithm == AlgorithmIdentifier::OID_MGF1 {
                        let Some(AlgorithmParameters::Elm(hash)) = &mask_gen.parameters else {
                            return Err(invalid("MGF1 without hash algorithm"));
                        };
                        let hash: AlgorithmIdentifier = hash.decode()?;
                        MaskGenAlgorithm::Mgf1(HashAlgorithm::from(&hash.algorithm))
                    } else {
                        MaskGenAlgorithm::Unknown(mask_gen.algorithm)
                    };
                }
                2 => {
                    let Element::Integer(salt) = element.as_ref() else {
                        return Err(invalid("saltLength must be an integer"));
                    };
                    params.salt_length = salt
                        .to_u64()
                        .and_then(|salt| usize::try_from(salt).ok())
                        .ok_or_else(|| invalid("saltLength out of range"))?;
                }
                3 => {
                    let Element::Integer(trailer) = element.as_ref() else {
                        return Err(invalid("trailerField must be an integer"));
                    };
                    params.trailer_field = trailer
                        .to_u64()
                        .ok_or_else(|| invalid("trailerField out of range"))?;
                }
                _ => return Err(invalid(&format!("unexpected field [{slot}]"))),
            }
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Md2WithRsa,
    Md5WithRsa,
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    RsaPss(PssParameters),
    EcdsaWithSha256,
    EcdsaWithSha384,
    EcdsaWithSha512,
    Ed25519,
    Unknown(ObjectIdentifier),
}

impl SignatureAlgorithm {
    /// Key algorithm a signature of this kind is made with, if known.
    pub fn public_key_algorithm(&self) -> Option<PublicKeyAlgorithm> {
        match self {
            SignatureAlgorithm::Md2WithRsa
            | SignatureAlgorithm::Md5WithRsa
            | SignatureAlgorithm::Sha1WithRsa
            | SignatureAlgorithm::Sha256WithRsa
            | SignatureAlgorithm::Sha384WithRsa
            | SignatureAlgorithm::Sha512WithRsa
            | SignatureAlgorithm::RsaPss(_) => Some(PublicKeyAlgorithm::Rsa),
            SignatureAlgorithm::EcdsaWithSha256
            | SignatureAlgorithm::EcdsaWithSha384
            | SignatureAlgorithm::EcdsaWithSha512 => Some(PublicKeyAlgorithm::Ec),
            SignatureAlgorithm::Ed25519 => Some(PublicKeyAlgorithm::Ed25519),
            SignatureAlgorithm::Unknown(_) => None,
        }
    }

    pub fn is_insecure(&self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Md2WithRsa | SignatureAlgorithm::Md5WithRsa
        )
    }
}

impl TryFrom<&AlgorithmIdentifier> for SignatureAlgorithm {
    type Error = Error;

    fn try_from(identifier: &AlgorithmIdentifier) -> Result<Self> {
        let algorithm = match identifier.algorithm.to_string().as_str() {
            AlgorithmIdentifier::OID_MD2_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Md2WithRsa,
            AlgorithmIdentifier::OID_MD5_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Md5WithRsa,
            AlgorithmIdentifier::OID_SHA1_WITH_RSA_ENCRYPTION
            | AlgorithmIdentifier::OID_SHA1_WITH_RSA_SIGNATURE => SignatureAlgorithm::Sha1WithRsa,
            AlgorithmIdentifier::OID_SHA256_WITH_RSA_ENCRYPTION => {
                SignatureAlgorithm::Sha256WithRsa
            }
            AlgorithmIdentifier::OID_SHA384_WITH_RSA_ENCRYPTION => {
                SignatureAlgorithm::Sha384WithRsa
            }
            AlgorithmIdentifier::OID_SHA512_WITH_RSA_ENCRYPTION => {
                SignatureAlgorithm::Sha512WithRsa
            }
            AlgorithmIdentifier::OID_RSASSA_PSS => match &identifier.parameters {
                Some(AlgorithmParameters::Elm(params)) => SignatureAlgorithm::RsaPss(params.decode()?),
                // absent parameters mean every RFC 4055 default applies
                None | Some(AlgorithmParameters::Null) => {
                    SignatureAlgorithm::RsaPss(PssParameters::default())
                }
            },
            AlgorithmIdentifier::OID_ECDSA_WITH_SHA256 => SignatureAlgorithm::EcdsaWithSha256,
            AlgorithmIdentifier::OID_ECDSA_WITH_SHA384 => SignatureAlgorithm::EcdsaWithSha384,
            AlgorithmIdentifier::OID_ECDSA_WITH_SHA512 => SignatureAlgorithm::EcdsaWithSha512,
            AlgorithmIdentifier::OID_ED25519 => SignatureAlgorithm::Ed25519,
            _ => SignatureAlgorithm::Unknown(identifier.algorithm.clone()),
        };
        Ok(algorithm)
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureAlgorithm::Md2WithRsa => write!(f, "MD2-RSA"),
            SignatureAlgorithm::Md5WithRsa => write!(f, "MD5-RSA"),
            SignatureAlgorithm::Sha1WithRsa => write!(f, "SHA1-RSA"),
            SignatureAlgorithm::Sha256WithRsa => write!(f, "SHA256-RSA"),
            SignatureAlgorithm::Sha384WithRsa => write!(f, "SHA384-RSA"),
            SignatureAlgorithm::Sha512WithRsa => write!(f, "SHA512-RSA"),
            SignatureAlgorithm::RsaPss(params) => write!(f, "{}-RSAPSS", params.hash),
            SignatureAlgorithm::EcdsaWithSha256 => write!(f, "ECDSA-SHA256"),
            SignatureAlgorithm::EcdsaWithSha384 => write!(f, "ECDSA-SHA384"),
            SignatureAlgorithm::EcdsaWithSha512 => write!(f, "ECDSA-SHA512"),
            SignatureAlgorithm::Ed25519 => write!(f, "Ed25519"),
            SignatureAlgorithm::Unknown(oid) => write!(f, "{oid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyAlgorithm {
    Rsa,
    Dsa,
    Ec,
    Ed25519,
    Unknown(ObjectIdentifier),
}

impl From<&ObjectIdentifier> for PublicKeyAlgorithm {
    fn from(oid: &ObjectIdentifier) -> Self {
        match oid.to_string().as_str() {
            AlgorithmIdentifier::OID_RSA_ENCRYPTION => PublicKeyAlgorithm::Rsa,
            AlgorithmIdentifier::OID_ID_DSA => PublicKeyAlgorithm::Dsa,
            AlgorithmIdentifier::OID_EC_PUBLIC_KEY => PublicKeyAlgorithm::Ec,
            AlgorithmIdentifier::OID_ED25519 => PublicKeyAlgorithm::Ed25519,
            _ => PublicKeyAlgorithm::Unknown(oid.clone()),
        }
    }
}

impl Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicKeyAlgorithm::Rsa => write!(f, "RSA"),
            PublicKeyAlgorithm::Dsa => write!(f, "DSA"),
            PublicKeyAlgorithm::Ec => write!(f, "ECDSA"),
            PublicKeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
            PublicKeyAlgorithm::Unknown(oid) => write!(f, "unknown ({oid})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use x509ck::decoder::Decoder;
    use x509ck_asn1::{Element, Integer, ObjectIdentifier};

    use super::{
        AlgorithmIdentifier, AlgorithmParameters, HashAlgorithm, MaskGenAlgorithm, PssParameters,
        PublicKeyAlgorithm, SignatureAlgorithm,
    };

    fn oid(s: &str) -> Element {
        Element::ObjectIdentifier(ObjectIdentifier::from_str(s).unwrap())
    }

    fn explicit(slot: u32, element: Element) -> Element {
        Element::ContextSpecific {
            slot,
            constructed: true,
            element: Box::new(element),
        }
    }

    #[rstest(
        input,
        expected,
        case(
            Element::Sequence(vec![oid("1.2.840.113549.1.1.11"), Element::Null]),
            AlgorithmIdentifier {
                algorithm: ObjectIdentifier::from_str("1.2.840.113549.1.1.11").unwrap(),
                parameters: Some(AlgorithmParameters::Null),
            }
        ),
        case(
            Element::Sequence(vec![oid("1.3.101.112")]),
            AlgorithmIdentifier::new(ObjectIdentifier::from_str("1.3.101.112").unwrap())
        ),
        case(
            Element::Sequence(vec![oid("1.2.840.10045.2.1"), oid("1.2.840.10045.3.1.7")]),
            AlgorithmIdentifier {
                algorithm: ObjectIdentifier::from_str("1.2.840.10045.2.1").unwrap(),
                parameters: Some(AlgorithmParameters::Elm(oid("1.2.840.10045.3.1.7"))),
            }
        ),
    )]
    fn test_decode_algorithm_identifier(input: Element, expected: AlgorithmIdentifier) {
        let actual: AlgorithmIdentifier = input.decode().unwrap();
        assert_eq!(expected, actual);
    }

    #[rstest(
        input,
        case(Element::Null),
        case(Element::Sequence(vec![])),
        case(Element::Sequence(vec![Element::Null])),
        case(Element::Sequence(vec![oid("1.2.3"), Element::Null, Element::Null])),
    )]
    fn test_decode_algorithm_identifier_fails(input: Element) {
        let result: Result<AlgorithmIdentifier, _> = input.decode();
        assert!(result.is_err());
    }

    #[rstest(
        algorithm,
        expected,
        case("1.2.840.113549.1.1.2", SignatureAlgorithm::Md2WithRsa),
        case("1.2.840.113549.1.1.4", SignatureAlgorithm::Md5WithRsa),
        case("1.2.840.113549.1.1.5", SignatureAlgorithm::Sha1WithRsa),
        case("1.3.14.3.2.29", SignatureAlgorithm::Sha1WithRsa),
        case("1.2.840.113549.1.1.11", SignatureAlgorithm::Sha256WithRsa),
        case("1.2.840.113549.1.1.12", SignatureAlgorithm::Sha384WithRsa),
        case("1.2.840.113549.1.1.13", SignatureAlgorithm::Sha512WithRsa),
        case("1.2.840.10045.4.3.2", SignatureAlgorithm::EcdsaWithSha256),
        case("1.2.840.10045.4.3.3", SignatureAlgorithm::EcdsaWithSha384),
        case("1.2.840.10045.4.3.4", SignatureAlgorithm::EcdsaWithSha512),
        case("1.3.101.112", SignatureAlgorithm::Ed25519),
        case(
            "1.2.840.10040.4.3",
            SignatureAlgorithm::Unknown(ObjectIdentifier::from_str("1.2.840.10040.4.3").unwrap())
        ),
    )]
    fn test_signature_algorithm(algorithm: &str, expected: SignatureAlgorithm) {
        let identifier = AlgorithmIdentifier::new(ObjectIdentifier::from_str(algorithm).unwrap());
        assert_eq!(expected, SignatureAlgorithm::try_from(&identifier).unwrap());
    }

    #[test]
    fn test_pss_parameters() {
        let params = Element::Sequence(vec![
            explicit(0, Element::Sequence(vec![oid("2.16.840.1.101.3.4.2.1")])),
            explicit(
                1,
                Element::Sequence(vec![
                    oid("1.2.840.113549.1.1.8"),
                    Element::Sequence(vec![oid("2.16.840.1.101.3.4.2.1")]),
                ]),
            ),
            explicit(2, Element::Integer(Integer::from(32))),
        ]);
        let identifier = AlgorithmIdentifier {
            algorithm: ObjectIdentifier::from_str("1.2.840.113549.1.1.10").unwrap(),
            parameters: Some(AlgorithmParameters::Elm(params)),
        };
        let algorithm = SignatureAlgorithm::try_from(&identifier).unwrap();
        assert_eq!(
            SignatureAlgorithm::RsaPss(PssParameters {
                hash: HashAlgorithm::Sha256,
                mask_gen: MaskGenAlgorithm::Mgf1(HashAlgorithm::Sha256),
                salt_length: 32,
                trailer_field: 1,
            }),
            algorithm
        );
        assert_eq!("SHA256-RSAPSS", algorithm.to_string());
    }

    #[test]
    fn test_pss_parameters_defaults() {
        let identifier =
            AlgorithmIdentifier::new(ObjectIdentifier::from_str("1.2.840.113549.1.1.10").unwrap());
        assert_eq!(
            SignatureAlgorithm::RsaPss(PssParameters::default()),
            SignatureAlgorithm::try_from(&identifier).unwrap()
        );
    }

    #[rstest(
        params,
        case(Element::Null),
        case(Element::Sequence(vec![Element::Integer(Integer::from(32))])),
        case(Element::Sequence(vec![
            explicit(2, Element::Integer(Integer::from(32))),
            explicit(0, Element::Sequence(vec![oid("2.16.840.1.101.3.4.2.1")])),
        ])),
        case(Element::Sequence(vec![explicit(2, Element::Null)])),
        case(Element::Sequence(vec![explicit(4, Element::Integer(Integer::from(1)))])),
    )]
    fn test_pss_parameters_fails(params: Element) {
        let result: Result<PssParameters, _> = params.decode();
        assert!(result.is_err());
    }

    #[rstest(
        algorithm,
        expected,
        case("1.2.840.113549.1.1.1", PublicKeyAlgorithm::Rsa),
        case("1.2.840.10040.4.1", PublicKeyAlgorithm::Dsa),
        case("1.2.840.10045.2.1", PublicKeyAlgorithm::Ec),
        case("1.3.101.112", PublicKeyAlgorithm::Ed25519),
    )]
    fn test_public_key_algorithm(algorithm: &str, expected: PublicKeyAlgorithm) {
        let oid = ObjectIdentifier::from_str(algorithm).unwrap();
        assert_eq!(expected, PublicKeyAlgorithm::from(&oid));
    }

    #[test]
    fn test_insecure_algorithms() {
        assert!(SignatureAlgorithm::Md5WithRsa.is_insecure());
        assert!(SignatureAlgorithm::Md2WithRsa.is_insecure());
        assert!(!SignatureAlgorithm::Sha1WithRsa.is_insecure());
    }
}
