//! X.509 certificates as used by x509ck.
//!
//! [`Certificate`] keeps the exact DER bytes of its `tbsCertificate` so that
//! [`Certificate::check_signature_from`] verifies what was actually signed
//! rather than a re-encoding.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDateTime;
use log::debug;
use x509ck::decoder::{DecodableFrom, Decoder};
use x509ck_asn1::{BitString, Element, Integer, ObjectIdentifier};
use x509ck_der::Der;
use x509ck_pem::{Label, Pem, PemBlock};

use crate::error::{Error, Result};

pub mod algorithm;
pub mod error;
pub mod name;
pub mod public_key;
pub mod signature;

pub use algorithm::{AlgorithmIdentifier, PublicKeyAlgorithm, SignatureAlgorithm};
pub use name::Name;
pub use public_key::{PublicKey, SubjectPublicKeyInfo};
pub use signature::SignatureError;

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1

Certificate  ::=  SEQUENCE  {
    tbsCertificate       TBSCertificate,
    signatureAlgorithm   AlgorithmIdentifier,
    signatureValue       BIT STRING
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    tbs_certificate: TBSCertificate,
    signature_algorithm: SignatureAlgorithm,
    signature_value: BitString,
    tbs_bytes: Vec<u8>,
}

impl Certificate {
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let der: Der = bytes.decode()?;
        der.decode()
    }

    pub fn tbs_certificate(&self) -> &TBSCertificate {
        &self.tbs_certificate
    }

    pub fn version(&self) -> Version {
        self.tbs_certificate.version
    }

    pub fn serial_number(&self) -> &Integer {
        &self.tbs_certificate.serial_number
    }

    pub fn signature_algorithm(&self) -> &SignatureAlgorithm {
        &self.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        self.signature_value.as_bytes()
    }

    /// DER encoding of `tbsCertificate` exactly as it appeared in the input.
    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs_bytes
    }

    pub fn issuer(&self) -> &Name {
        &self.tbs_certificate.issuer
    }

    pub fn subject(&self) -> &Name {
        &self.tbs_certificate.subject
    }

    pub fn validity(&self) -> &Validity {
        &self.tbs_certificate.validity
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfo {
        &self.tbs_certificate.subject_public_key_info
    }

    pub fn public_key(&self) -> &PublicKey {
        self.tbs_certificate.subject_public_key_info.public_key()
    }

    pub fn public_key_algorithm(&self) -> PublicKeyAlgorithm {
        self.tbs_certificate
            .subject_public_key_info
            .public_key_algorithm()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.tbs_certificate.extensions
    }

    /// Verifies that this certificate was signed by `issuer`'s key.
    ///
    /// Only the signature is checked. Validity periods, name chaining and
    /// issuer constraints are left to the caller.
    pub fn check_signature_from(
        &self,
        issuer: &Certificate,
    ) -> std::result::Result<(), SignatureError> {
        debug!(
            "checking signature of '{}' with the key of '{}'",
            self.subject(),
            issuer.subject()
        );
        signature::verify_signature(
            &self.signature_algorithm,
            issuer.public_key(),
            &self.tbs_bytes,
            self.signature(),
        )
    }
}

impl DecodableFrom<Der> for Certificate {}

impl Decoder<Der, Certificate> for Der {
    type Error = Error;

    fn decode(&self) -> Result<Certificate> {
        let root = self.root();
        let Element::Sequence(elements) = Element::try_from(root)? else {
            return Err(Error::InvalidCertificate("expected sequence".to_string()));
        };
        let [tbs_certificate, signature_algorithm, signature_value] = elements.as_slice() else {
            return Err(Error::InvalidCertificate(format!(
                "expected 3 elements, got {}",
                elements.len()
            )));
        };
        let tbs_bytes = root
            .tlvs()
            .and_then(|tlvs| tlvs.first())
            .map(|tbs| tbs.encoded().to_vec())
            .ok_or_else(|| Error::InvalidCertificate("missing tbsCertificate".to_string()))?;

        let tbs_certificate: TBSCertificate = tbs_certificate.decode()?;
        let outer: AlgorithmIdentifier = signature_algorithm.decode()?;
        if outer != tbs_certificate.signature {
            return Err(Error::SignatureAlgorithmMismatch);
        }
        let signature_algorithm = SignatureAlgorithm::try_from(&outer)?;

        let Element::BitString(signature_value) = signature_value else {
            return Err(Error::InvalidSignatureValue(
                "expected bit string".to_string(),
            ));
        };
        if signature_value.unused_bits() != 0 {
            return Err(Error::InvalidSignatureValue(
                "signature has unused bits".to_string(),
            ));
        }

        Ok(Certificate {
            tbs_certificate,
            signature_algorithm,
            signature_value: signature_value.clone(),
            tbs_bytes,
        })
    }
}

impl DecodableFrom<PemBlock> for Certificate {}

impl Decoder<PemBlock, Certificate> for PemBlock {
    type Error = Error;

    fn decode(&self) -> Result<Certificate> {
        if *self.label() != Label::Certificate {
            return Err(x509ck_pem::error::Error::TypeMismatch {
                expected: Label::Certificate,
                actual: self.label().clone(),
            }
            .into());
        }
        Certificate::from_der(self.bytes())
    }
}

impl DecodableFrom<Pem> for Certificate {}

impl Decoder<Pem, Certificate> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Certificate> {
        let block: PemBlock = self.decode()?;
        block.decode()
    }
}

impl FromStr for Certificate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pem = Pem::from_str(s)?;
        pem.decode()
    }
}

/*
TBSCertificate  ::=  SEQUENCE  {
     version         [0]  EXPLICIT Version DEFAULT v1,
     serialNumber         CertificateSerialNumber,
     signature            AlgorithmIdentifier,
     issuer               Name,
     validity             Validity,
     subject              Name,
     subjectPublicKeyInfo SubjectPublicKeyInfo,
     issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
                          -- If present, version MUST be v2 or v3
     subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
                          -- If present, version MUST be v2 or v3
     extensions      [3]  EXPLICIT Extensions OPTIONAL
                          -- If present, version MUST be v3
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TBSCertificate {
    version: Version,
    serial_number: Integer,
    signature: AlgorithmIdentifier,
    issuer: Name,
    validity: Validity,
    subject: Name,
    subject_public_key_info: SubjectPublicKeyInfo,
    issuer_unique_id: Option<BitString>,
    subject_unique_id: Option<BitString>,
    extensions: Extensions,
}

impl TBSCertificate {
    pub fn signature(&self) -> &AlgorithmIdentifier {
        &self.signature
    }

    pub fn issuer_unique_id(&self) -> Option<&BitString> {
        self.issuer_unique_id.as_ref()
    }

    pub fn subject_unique_id(&self) -> Option<&BitString> {
        self.subject_unique_id.as_ref()
    }
}

impl DecodableFrom<Element> for TBSCertificate {}

impl Decoder<Element, TBSCertificate> for Element {
    type Error = Error;

    fn decode(&self) -> Result<TBSCertificate> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidTBSCertificate(
                "expected sequence".to_string(),
            ));
        };
        let (version, rest): (Version, &[Element]) = match elements.as_slice() {
            [
                Element::ContextSpecific {
                    slot: 0,
                    constructed: true,
                    element,
                },
                rest @ ..,
            ] => (element.decode()?, rest),
            rest => (Version::V1, rest),
        };
        let [
            serial_number,
            signature,
            issuer,
            validity,
            subject,
            subject_public_key_info,
            optional @ ..,
        ] = rest
        else {
            return Err(Error::InvalidTBSCertificate(format!(
                "expected at least 6 fields after the version, got {}",
                rest.len()
            )));
        };

        let Element::Integer(serial_number) = serial_number else {
            return Err(Error::InvalidCertificateSerialNumber(
                "expected integer".to_string(),
            ));
        };

        let mut issuer_unique_id = None;
        let mut subject_unique_id = None;
        let mut extensions = Extensions::default();
        let mut last_slot = None;
        for field in optional {
            let Element::ContextSpecific {
                slot,
                constructed,
                element,
            } = field
            else {
                return Err(Error::InvalidTBSCertificate(format!(
                    "unexpected field {field}"
                )));
            };
            if last_slot.is_some_and(|last| *slot <= last) {
                return Err(Error::InvalidTBSCertificate(
                    "optional fields out of order".to_string(),
                ));
            }
            last_slot = Some(*slot);

            match (slot, constructed) {
                (1 | 2, false) => {
                    if version == Version::V1 {
                        return Err(Error::InvalidUniqueIdentifier(
                            "unique identifiers require v2 or v3".to_string(),
                        ));
                    }
                    let Element::OctetString(raw) = element.as_ref() else {
                        return Err(Error::InvalidUniqueIdentifier(
                            "expected bit string".to_string(),
                        ));
                    };
                    let id = BitString::try_from(raw.as_bytes())?;
                    if *slot == 1 {
                        issuer_unique_id = Some(id);
                    } else {
                        subject_unique_id = Some(id);
                    }
                }
                (3, true) => {
                    if version != Version::V3 {
                        return Err(Error::InvalidExtension(
                            "extensions require v3".to_string(),
                        ));
                    }
                    extensions = element.decode()?;
                }
                _ => {
                    return Err(Error::InvalidTBSCertificate(format!(
                        "unexpected field [{slot}]"
                    )));
                }
            }
        }

        Ok(TBSCertificate {
            version,
            serial_number: serial_number.clone(),
            signature: signature.decode()?,
            issuer: issuer.decode()?,
            validity: validity.decode()?,
            subject: subject.decode()?,
            subject_public_key_info: subject_public_key_info.decode()?,
            issuer_unique_id,
            subject_unique_id,
            extensions,
        })
    }
}

// Version  ::=  INTEGER  {  v1(0), v2(1), v3(2)  }
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    V1 = 0,
    V2 = 1,
    V3 = 2,
}

impl DecodableFrom<Element> for Version {}

impl Decoder<Element, Version> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Version> {
        let Element::Integer(version) = self else {
            return Err(Error::InvalidVersion("expected integer".to_string()));
        };
        match version.to_u64() {
            Some(0) => Ok(Version::V1),
            Some(1) => Ok(Version::V2),
            Some(2) => Ok(Version::V3),
            _ => Err(Error::InvalidVersion(format!(
                "unknown version value: {version}"
            ))),
        }
    }
}

/*
Validity ::= SEQUENCE {
    notBefore      Time,
    notAfter       Time
}

Time ::= CHOICE {
    utcTime        UTCTime,
    generalTime    GeneralizedTime
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    not_before: NaiveDateTime,
    not_after: NaiveDateTime,
}

impl Validity {
    pub fn not_before(&self) -> NaiveDateTime {
        self.not_before
    }

    pub fn not_after(&self) -> NaiveDateTime {
        self.not_after
    }
}

impl DecodableFrom<Element> for Validity {}

impl Decoder<Element, Validity> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Validity> {
        let time = |element: &Element, field: &str| match element {
            Element::UTCTime(dt) | Element::GeneralizedTime(dt) => Ok(*dt),
            _ => Err(Error::InvalidValidity(format!("invalid {field} time"))),
        };
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidValidity("expected sequence".to_string()));
        };
        let [not_before, not_after] = elements.as_slice() else {
            return Err(Error::InvalidValidity(
                "expected 2 elements in sequence".to_string(),
            ));
        };
        Ok(Validity {
            not_before: time(not_before, "notBefore")?,
            not_after: time(not_after, "notAfter")?,
        })
    }
}

/*
Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension

Extension  ::=  SEQUENCE  {
    extnID      OBJECT IDENTIFIER,
    critical    BOOLEAN DEFAULT FALSE,
    extnValue   OCTET STRING
                -- contains the DER encoding of an ASN.1 value
                -- corresponding to the extension type identified
                -- by extnID
}
 */

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    extensions: Vec<Extension>,
}

impl Extensions {
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Extension> {
        self.extensions.iter().find(|extension| extension.id == id)
    }
}

impl DecodableFrom<Element> for Extensions {}

impl Decoder<Element, Extensions> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Extensions> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidExtension(
                "expected sequence of extensions".to_string(),
            ));
        };
        let mut seen = HashSet::new();
        let mut extensions = Vec::with_capacity(elements.len());
        for element in elements {
            let extension: Extension = element.decode()?;
            if !seen.insert(extension.id.clone()) {
                return Err(Error::DuplicateExtension(extension.id));
            }
            extensions.push(extension);
        }
        Ok(Extensions { extensions })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    id: ObjectIdentifier,
    critical: bool,
    value: Vec<u8>,
}

impl Extension {
    pub const OID_SUBJECT_KEY_IDENTIFIER: &'static str = "2.5.29.14";
    pub const OID_KEY_USAGE: &'static str = "2.5.29.15";
    pub const OID_SUBJECT_ALT_NAME: &'static str = "2.5.29.17";
    pub const OID_BASIC_CONSTRAINTS: &'static str = "2.5.29.19";
    pub const OID_EXTENDED_KEY_USAGE: &'static str = "2.5.29.37";
    pub const OID_AUTHORITY_KEY_IDENTIFIER: &'static str = "2.5.29.35";

    pub fn id(&self) -> &ObjectIdentifier {
        &self.id
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// DER encoded extension value (the contents of `extnValue`).
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl DecodableFrom<Element> for Extension {}

impl Decoder<Element, Extension> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Extension> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidExtension("expected sequence".to_string()));
        };
        let (id, critical, value) = match elements.as_slice() {
            [Element::ObjectIdentifier(id), Element::OctetString(value)] => (id, false, value),
            [
                Element::ObjectIdentifier(id),
                Element::Boolean(critical),
                Element::OctetString(value),
            ] => (id, *critical, value),
            _ => {
                return Err(Error::InvalidExtension(
                    "expected extnID, optional critical flag and extnValue".to_string(),
                ));
            }
        };
        // one well-formed TLV; the contents are left to whoever reads the extension
        let der: x509ck_der::error::Result<Der> = value.as_bytes().decode();
        der.map_err(|e| Error::InvalidExtension(format!("{id}: {e}")))?;

        Ok(Extension {
            id: id.clone(),
            critical,
            value: value.as_bytes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use x509ck::decoder::Decoder;
    use x509ck_asn1::{ASN1Object, BitString, Element, Integer, ObjectIdentifier, OctetString};
    use x509ck_pem::Label;

    use super::{Certificate, Extension, Extensions, TBSCertificate, Version};
    use crate::algorithm::{
        HashAlgorithm, MaskGenAlgorithm, PssParameters, PublicKeyAlgorithm, SignatureAlgorithm,
    };
    use crate::error::Error;
    use crate::public_key::PublicKey;
    use crate::signature::SignatureError;

    const CA: &str = include_str!("../../testdata/ca.pem");
    const OTHER_CA: &str = include_str!("../../testdata/other_ca.pem");
    const EC: &str = include_str!("../../testdata/ec.pem");
    const SERVER: &str = include_str!("../../testdata/server.pem");
    const SERVER_SHA1: &str = include_str!("../../testdata/server_sha1.pem");
    const SERVER_SHA384: &str = include_str!("../../testdata/server_sha384.pem");
    const SERVER_SHA512: &str = include_str!("../../testdata/server_sha512.pem");
    const SERVER_PSS: &str = include_str!("../../testdata/server_pss.pem");
    const SERVER_BY_EC: &str = include_str!("../../testdata/server_by_ec.pem");
    const SERVER_PRIVATE_EXT: &str = include_str!("../../testdata/server_private_ext.pem");
    const MALFORMED: &str = include_str!("../../testdata/malformed.pem");
    const SERVER_PKCS8_KEY: &str = include_str!("../../testdata/server_pkcs8.key");

    fn der(pem: &str) -> Vec<u8> {
        x509ck_pem::decode_block(pem.as_bytes(), &Label::Certificate)
            .unwrap()
            .into_bytes()
    }

    fn rfind(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .rposition(|window| window == needle)
            .unwrap()
    }

    #[test]
    fn test_parse_server_certificate() {
        let cert = Certificate::from_str(SERVER).unwrap();
        assert_eq!(Version::V1, cert.version());
        assert_eq!(
            vec![0x36u8, 0xbe, 0x05, 0x17, 0x85, 0xdb, 0x82, 0x84],
            cert.serial_number().to_bytes_be()
        );
        assert_eq!(&SignatureAlgorithm::Sha256WithRsa, cert.signature_algorithm());
        assert_eq!("C=JP, O=x509ck, CN=x509ck Test CA", cert.issuer().to_string());
        assert_eq!(
            "C=JP, O=x509ck, CN=server.x509ck.test",
            cert.subject().to_string()
        );
        assert!(cert.validity().not_before() < cert.validity().not_after());
        assert!(cert.extensions().is_empty());
        assert_eq!(256, cert.signature().len());
        assert_eq!(0x30, cert.tbs_bytes()[0]);

        assert_eq!(PublicKeyAlgorithm::Rsa, cert.public_key_algorithm());
        let PublicKey::Rsa(key) = cert.public_key() else {
            panic!("expected an RSA key");
        };
        assert_eq!(2048, key.key_size());
        assert_eq!(Integer::from(65537), key.public_exponent);
    }

    #[test]
    fn test_tbs_bytes_are_the_signed_bytes() {
        let bytes = der(SERVER);
        let cert = Certificate::from_der(&bytes).unwrap();
        // outer SEQUENCE header is 4 bytes long for a certificate of this size
        assert_eq!(&bytes[4..4 + cert.tbs_bytes().len()], cert.tbs_bytes());
    }

    #[test]
    fn test_parse_ca_certificate() {
        let cert = Certificate::from_str(CA).unwrap();
        assert_eq!(Version::V3, cert.version());
        assert_eq!(cert.issuer(), cert.subject());
        assert_eq!(Some("x509ck Test CA"), cert.subject().common_name());
        assert_eq!(3, cert.extensions().len());
        let basic_constraints = cert
            .extensions()
            .get(Extension::OID_BASIC_CONSTRAINTS)
            .unwrap();
        assert!(basic_constraints.is_critical());
        assert_eq!(&[0x30u8, 0x03, 0x01, 0x01, 0xff], basic_constraints.value());
    }

    #[test]
    fn test_parse_ec_certificate() {
        let cert = Certificate::from_str(EC).unwrap();
        assert_eq!(PublicKeyAlgorithm::Ec, cert.public_key_algorithm());
        assert_eq!(&SignatureAlgorithm::EcdsaWithSha256, cert.signature_algorithm());
        let PublicKey::Ec { curve, point } = cert.public_key() else {
            panic!("expected an EC key");
        };
        assert_eq!(*curve, "1.2.840.10045.3.1.7");
        assert_eq!(65, point.len());
        assert!(cert.public_key().as_rsa().is_none());
    }

    #[test]
    fn test_parse_pss_certificate() {
        let cert = Certificate::from_str(SERVER_PSS).unwrap();
        assert_eq!(
            &SignatureAlgorithm::RsaPss(PssParameters {
                hash: HashAlgorithm::Sha256,
                mask_gen: MaskGenAlgorithm::Mgf1(HashAlgorithm::Sha256),
                salt_length: 32,
                trailer_field: 1,
            }),
            cert.signature_algorithm()
        );
    }

    #[rstest]
    #[case::sha256(SERVER)]
    #[case::sha1(SERVER_SHA1)]
    #[case::sha384(SERVER_SHA384)]
    #[case::sha512(SERVER_SHA512)]
    #[case::pss(SERVER_PSS)]
    #[case::self_signed(CA)]
    fn test_check_signature_from(#[case] input: &str) {
        let ca = Certificate::from_str(CA).unwrap();
        let cert = Certificate::from_str(input).unwrap();
        assert_eq!(Ok(()), cert.check_signature_from(&ca));
    }

    #[test]
    fn test_check_signature_from_other_ca() {
        let ca = Certificate::from_str(OTHER_CA).unwrap();
        let cert = Certificate::from_str(SERVER).unwrap();
        assert!(matches!(
            cert.check_signature_from(&ca),
            Err(SignatureError::Verification(_))
        ));
    }

    #[test]
    fn test_check_signature_from_ec_issuer() {
        let ec = Certificate::from_str(EC).unwrap();
        let cert = Certificate::from_str(SERVER).unwrap();
        assert_eq!(
            Err(SignatureError::KeyAlgorithmMismatch {
                algorithm: SignatureAlgorithm::Sha256WithRsa,
                expected: PublicKeyAlgorithm::Rsa,
                actual: PublicKeyAlgorithm::Ec,
            }),
            cert.check_signature_from(&ec)
        );

        let cert = Certificate::from_str(SERVER_BY_EC).unwrap();
        assert_eq!(
            Err(SignatureError::UnsupportedAlgorithm(
                SignatureAlgorithm::EcdsaWithSha256
            )),
            cert.check_signature_from(&ec)
        );
    }

    #[test]
    fn test_check_signature_detects_tampering() {
        let ca = Certificate::from_str(CA).unwrap();
        let mut bytes = der(SERVER);
        // flip a byte inside the subject common name
        let at = rfind(&bytes, b"server.x509ck.test");
        bytes[at] ^= 0x01;
        let cert = Certificate::from_der(&bytes).unwrap();
        assert!(matches!(
            cert.check_signature_from(&ca),
            Err(SignatureError::Verification(_))
        ));
    }

    #[test]
    fn test_parse_fails_on_algorithm_mismatch() {
        let mut bytes = der(SERVER);
        // last sha256WithRSAEncryption OID is the outer signatureAlgorithm
        let at = rfind(
            &bytes,
            &[0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b],
        );
        bytes[at + 10] = 0x0c;
        assert_eq!(
            Err(Error::SignatureAlgorithmMismatch),
            Certificate::from_der(&bytes)
        );
    }

    #[test]
    fn test_parse_fails_when_only_outer_algorithm_drops_null() {
        let bytes = der(SERVER);
        let cert = Certificate::from_der(&bytes).unwrap();
        let tbs_end = 4 + cert.tbs_bytes().len();
        // sha256WithRSAEncryption followed by NULL, 15 bytes
        assert_eq!(&[0x30u8, 0x0d], &bytes[tbs_end..tbs_end + 2]);
        let signature_value = &bytes[tbs_end + 15..];

        let mut body = cert.tbs_bytes().to_vec();
        body.extend_from_slice(&[
            0x30, 0x0b, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b,
        ]);
        body.extend_from_slice(signature_value);
        let mut reencoded = vec![0x30, 0x82, (body.len() >> 8) as u8, body.len() as u8];
        reencoded.extend_from_slice(&body);

        assert_eq!(
            Err(Error::SignatureAlgorithmMismatch),
            Certificate::from_der(&reencoded)
        );
    }

    #[test]
    fn test_parse_fails_on_trailing_data() {
        let mut bytes = der(SERVER);
        bytes.push(0x00);
        assert!(matches!(
            Certificate::from_der(&bytes),
            Err(Error::InvalidDer(_))
        ));
    }

    #[test]
    fn test_parse_fails_on_signature_unused_bits() {
        let mut bytes = der(SERVER);
        let at = rfind(&bytes, &[0x03, 0x82, 0x01, 0x01, 0x00]);
        bytes[at + 4] = 0x01;
        assert!(Certificate::from_der(&bytes).is_err());
    }

    #[rstest]
    #[case::not_a_certificate(MALFORMED)]
    #[case::empty("")]
    #[case::json("{\"certificate\": true}")]
    fn test_parse_fails(#[case] input: &str) {
        assert!(Certificate::from_str(input).is_err());
    }

    #[test]
    fn test_parse_fails_on_wrong_label() {
        let result = Certificate::from_str(SERVER_PKCS8_KEY);
        let Err(Error::InvalidPem(e)) = result else {
            panic!("expected a PEM error, got {result:?}");
        };
        assert!(e.is_type_mismatch());
    }

    #[rstest]
    #[case::v1(Element::Integer(Integer::from(0)), Version::V1)]
    #[case::v2(Element::Integer(Integer::from(1)), Version::V2)]
    #[case::v3(Element::Integer(Integer::from(2)), Version::V3)]
    fn test_version_decode(#[case] input: Element, #[case] expected: Version) {
        let version: Version = input.decode().unwrap();
        assert_eq!(expected, version);
    }

    #[rstest]
    #[case::v4(Element::Integer(Integer::from(3)))]
    #[case::negative(Element::Integer(Integer::from(-1)))]
    #[case::null(Element::Null)]
    fn test_version_decode_fails(#[case] input: Element) {
        let result: Result<Version, Error> = input.decode();
        assert!(matches!(result, Err(Error::InvalidVersion(_))));
    }

    fn extension(oid: &str, value: &[u8]) -> Element {
        Element::Sequence(vec![
            Element::ObjectIdentifier(ObjectIdentifier::from_str(oid).unwrap()),
            Element::OctetString(OctetString::from(value)),
        ])
    }

    #[test]
    fn test_extensions_reject_duplicates() {
        let input = Element::Sequence(vec![
            extension("2.5.29.19", &[0x30, 0x00]),
            extension("2.5.29.19", &[0x30, 0x00]),
        ]);
        let result: Result<Extensions, Error> = input.decode();
        assert_eq!(
            Err(Error::DuplicateExtension(
                ObjectIdentifier::from_str("2.5.29.19").unwrap()
            )),
            result
        );
    }

    #[rstest]
    #[case::not_der(extension("2.5.29.19", &[0x30, 0x05, 0x01]))]
    #[case::trailing(extension("2.5.29.19", &[0x30, 0x00, 0x00]))]
    #[case::missing_value(Element::Sequence(vec![Element::ObjectIdentifier(
        ObjectIdentifier::from_str("2.5.29.19").unwrap()
    )]))]
    fn test_extension_decode_fails(#[case] input: Element) {
        let result: Result<Extension, Error> = input.decode();
        assert!(matches!(result, Err(Error::InvalidExtension(_))));
    }

    #[rstest]
    // IA5String holding a non-ASCII byte
    #[case(&[0x16, 0x03, 0x61, 0xe9, 0x62])]
    // BOOLEAN that is not 0x00 or 0xff
    #[case(&[0x01, 0x01, 0x01])]
    // UTCTime without seconds
    #[case(&[0x17, 0x0b, 0x32, 0x35, 0x30, 0x31, 0x30, 0x31, 0x30, 0x30, 0x30, 0x30, 0x5a])]
    fn test_extension_contents_are_not_interpreted(#[case] value: &[u8]) {
        let extension: Extension = extension("1.3.6.1.4.1.99999.1", value).decode().unwrap();
        assert_eq!(value, extension.value());
        assert!(!extension.is_critical());
    }

    #[test]
    fn test_parse_certificate_with_private_extension() {
        let ca = Certificate::from_str(CA).unwrap();
        let cert = Certificate::from_str(SERVER_PRIVATE_EXT).unwrap();
        assert_eq!(Version::V3, cert.version());
        let extension = cert.extensions().get("1.3.6.1.4.1.99999.1").unwrap();
        assert_eq!(&[0x16u8, 0x03, 0x61, 0xe9, 0x62], extension.value());
        assert_eq!(Ok(()), cert.check_signature_from(&ca));
    }

    // server.pem is a v1 certificate, so its TBSCertificate is the six
    // required fields without a version.
    fn tbs_with(version: Option<i64>, optional: Vec<Element>) -> Element {
        let cert = Certificate::from_str(SERVER).unwrap();
        let Element::Sequence(mut fields) = ASN1Object::parse(cert.tbs_bytes())
            .unwrap()
            .into_element()
        else {
            panic!("tbsCertificate is not a sequence");
        };
        assert_eq!(6, fields.len());
        if let Some(version) = version {
            fields.insert(
                0,
                Element::ContextSpecific {
                    slot: 0,
                    constructed: true,
                    element: Box::new(Element::Integer(Integer::from(version))),
                },
            );
        }
        fields.extend(optional);
        Element::Sequence(fields)
    }

    fn unique_id(slot: u32, id: &[u8]) -> Element {
        let mut raw = vec![0x00];
        raw.extend_from_slice(id);
        Element::ContextSpecific {
            slot,
            constructed: false,
            element: Box::new(Element::OctetString(OctetString::from(raw.as_slice()))),
        }
    }

    fn extensions_field() -> Element {
        Element::ContextSpecific {
            slot: 3,
            constructed: true,
            element: Box::new(Element::Sequence(vec![extension(
                "2.5.29.19",
                &[0x30, 0x00],
            )])),
        }
    }

    #[test]
    fn test_tbs_v2_with_unique_identifiers() {
        let input = tbs_with(
            Some(1),
            vec![unique_id(1, &[0xaa, 0xbb]), unique_id(2, &[0xcc])],
        );
        let tbs: TBSCertificate = input.decode().unwrap();
        assert_eq!(Version::V2, tbs.version);
        assert_eq!(
            Some(&BitString::new(0, vec![0xaa, 0xbb])),
            tbs.issuer_unique_id()
        );
        assert_eq!(Some(&BitString::new(0, vec![0xcc])), tbs.subject_unique_id());
        assert!(tbs.extensions.is_empty());
    }

    #[test]
    fn test_tbs_v3_with_every_optional_field() {
        let input = tbs_with(
            Some(2),
            vec![
                unique_id(1, &[0x01]),
                unique_id(2, &[0x02]),
                extensions_field(),
            ],
        );
        let tbs: TBSCertificate = input.decode().unwrap();
        assert_eq!(Version::V3, tbs.version);
        assert_eq!(1, tbs.extensions.len());
    }

    #[rstest]
    #[case::v1_issuer_unique_id(
        tbs_with(None, vec![unique_id(1, &[0x01])]),
        Error::InvalidUniqueIdentifier("unique identifiers require v2 or v3".to_string())
    )]
    #[case::explicit_v1_subject_unique_id(
        tbs_with(Some(0), vec![unique_id(2, &[0x01])]),
        Error::InvalidUniqueIdentifier("unique identifiers require v2 or v3".to_string())
    )]
    #[case::v2_extensions(
        tbs_with(Some(1), vec![extensions_field()]),
        Error::InvalidExtension("extensions require v3".to_string())
    )]
    #[case::v1_extensions(
        tbs_with(None, vec![extensions_field()]),
        Error::InvalidExtension("extensions require v3".to_string())
    )]
    #[case::subject_id_before_issuer_id(
        tbs_with(Some(2), vec![unique_id(2, &[0x02]), unique_id(1, &[0x01])]),
        Error::InvalidTBSCertificate("optional fields out of order".to_string())
    )]
    #[case::repeated_extensions(
        tbs_with(Some(2), vec![extensions_field(), extensions_field()]),
        Error::InvalidTBSCertificate("optional fields out of order".to_string())
    )]
    #[case::constructed_unique_id(
        tbs_with(Some(2), vec![Element::ContextSpecific {
            slot: 1,
            constructed: true,
            element: Box::new(Element::Null),
        }]),
        Error::InvalidTBSCertificate("unexpected field [1]".to_string())
    )]
    fn test_tbs_optional_field_rules(#[case] input: Element, #[case] expected: Error) {
        let result: Result<TBSCertificate, Error> = input.decode();
        assert_eq!(Err(expected), result);
    }
}
