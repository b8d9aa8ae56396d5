pub mod error;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use x509ck::decoder::{DecodableFrom, Decoder};

use crate::error::{Error, Result};

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

const PROC_TYPE_HEADER: &str = "Proc-Type";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// PKCS#8 private key (non-encrypted)
    PrivateKey,
    /// PKCS#8 encrypted private key
    EncryptedPrivateKey,
    /// PKCS#1 RSA private key
    RSAPrivateKey,
    /// SEC1 EC private key
    ECPrivateKey,
    /// X.509 SubjectPublicKeyInfo
    PublicKey,
    /// PKCS#1 RSA public key
    RSAPublicKey,
    /// X.509 Certificate
    Certificate,
    /// Any other RFC 7468 label, e.g. `X509 CRL`
    Other(String),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::PrivateKey => write!(f, "{}", PRIVATE_KEY_LABEL),
            Label::EncryptedPrivateKey => write!(f, "{}", ENCRYPTED_PRIVATE_KEY_LABEL),
            Label::RSAPrivateKey => write!(f, "{}", RSA_PRIVATE_KEY_LABEL),
            Label::ECPrivateKey => write!(f, "{}", EC_PRIVATE_KEY_LABEL),
            Label::PublicKey => write!(f, "{}", PUBLIC_KEY_LABEL),
            Label::RSAPublicKey => write!(f, "{}", RSA_PUBLIC_KEY_LABEL),
            Label::Certificate => write!(f, "{}", CERTIFICATE_LABEL),
            Label::Other(label) => write!(f, "{}", label),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            PRIVATE_KEY_LABEL => Label::PrivateKey,
            ENCRYPTED_PRIVATE_KEY_LABEL => Label::EncryptedPrivateKey,
            RSA_PRIVATE_KEY_LABEL => Label::RSAPrivateKey,
            EC_PRIVATE_KEY_LABEL => Label::ECPrivateKey,
            PUBLIC_KEY_LABEL => Label::PublicKey,
            RSA_PUBLIC_KEY_LABEL => Label::RSAPublicKey,
            CERTIFICATE_LABEL => Label::Certificate,
            other => Label::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Boundary {
    Begin(Label),
    End(Label),
}

struct BoundaryMatcher {
    re: Regex,
}

impl BoundaryMatcher {
    fn new() -> Result<Self> {
        // RFC 7468 labels: no leading, trailing or doubled hyphens.
        let re = Regex::new(r"^-----(BEGIN|END) ([^-]+(?:-[^-]+)*)-----$")
            .map_err(|_| Error::InvalidEncapsulationBoundary)?;
        Ok(BoundaryMatcher { re })
    }

    fn boundary(&self, line: &str) -> Option<Boundary> {
        let captured = self.re.captures(line)?;
        let label = Label::from(captured.get(2)?.as_str());
        match captured.get(1)?.as_str() {
            "BEGIN" => Some(Boundary::Begin(label)),
            _ => Some(Boundary::End(label)),
        }
    }
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
     https://www.rfc-editor.org/rfc/rfc1421.html#section-4.4 (headers)
*/

/// A parsed but still base64 encoded PEM block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    headers: Vec<(String, String)>,
    base64_data: String,
}

impl Pem {
    pub fn new(label: Label, base64_data: String) -> Self {
        Pem {
            label,
            headers: Vec::new(),
            base64_data,
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// RFC 1421 headers in the order they appeared.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Legacy OpenSSL encryption (`Proc-Type: 4,ENCRYPTED`).
    pub fn is_encrypted(&self) -> bool {
        self.header(PROC_TYPE_HEADER)
            .is_some_and(|v| v.contains("ENCRYPTED"))
    }

    pub fn data(&self) -> &str {
        &self.base64_data
    }
}

/// The decoded form of a [`Pem`]: its label, headers and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemBlock {
    label: Label,
    headers: Vec<(String, String)>,
    bytes: Vec<u8>,
}

impl PemBlock {
    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_encrypted(&self) -> bool {
        self.headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case(PROC_TYPE_HEADER) && v.contains("ENCRYPTED"))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>> {
        STANDARD.decode(self.data()).map_err(Error::Base64Decode)
    }
}

impl DecodableFrom<Pem> for PemBlock {}

impl Decoder<Pem, PemBlock> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<PemBlock> {
        let bytes: Vec<u8> = self.decode()?;
        Ok(PemBlock {
            label: self.label.clone(),
            headers: self.headers.clone(),
            bytes,
        })
    }
}

impl DecodableFrom<&str> for Pem {}

impl Decoder<&str, Pem> for &str {
    type Error = Error;

    fn decode(&self) -> Result<Pem> {
        Pem::from_str(self)
    }
}

impl DecodableFrom<&[u8]> for Pem {}

impl Decoder<&[u8], Pem> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Pem> {
        // Explanatory text around the block may be in any encoding.
        Pem::from_str(&String::from_utf8_lossy(self))
    }
}

/// Decode the first PEM block of `input` and require it to carry `expected`.
///
/// Structural problems are reported before a label mismatch, so a broken
/// block never surfaces as [`Error::TypeMismatch`].
pub fn decode_block(input: &[u8], expected: &Label) -> Result<PemBlock> {
    let pem: Pem = input.decode()?;
    let block: PemBlock = pem.decode()?;
    if block.label() != expected {
        return Err(Error::TypeMismatch {
            expected: expected.clone(),
            actual: block.label().clone(),
        });
    }
    Ok(block)
}

/// Parse every PEM block in a string.
///
/// Text between blocks is ignored. Fails if there is no block at all or if
/// any block is malformed.
///
/// # Example
/// ```
/// use x509ck_pem::parse_many;
///
/// let pem_data = "-----BEGIN CERTIFICATE-----\nAAA=\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nBBB=\n-----END CERTIFICATE-----";
/// let pems = parse_many(pem_data).unwrap();
/// assert_eq!(pems.len(), 2);
/// ```
pub fn parse_many(s: &str) -> Result<Vec<Pem>> {
    let matcher = BoundaryMatcher::new()?;
    let mut lines = s.lines().enumerate();
    let mut pems = Vec::new();
    while let Some(pem) = parse_block(&matcher, &mut lines)? {
        pems.push(pem);
    }
    if pems.is_empty() {
        return Err(Error::MissingPreEncapsulationBoundary);
    }
    Ok(pems)
}

impl FromStr for Pem {
    type Err = Error;

    /// Parses the first block; anything after its post-encapsulation
    /// boundary is left unread.
    fn from_str(s: &str) -> Result<Self> {
        let matcher = BoundaryMatcher::new()?;
        let mut lines = s.lines().enumerate();
        parse_block(&matcher, &mut lines)?.ok_or(Error::MissingPreEncapsulationBoundary)
    }
}

/*
* init -(BEGIN)-> headers -(blank)-> base64 -(END)-> done
*                    |_____________________^
*/
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
enum PemParsingState {
    #[default]
    Init,
    Headers,
    Base64,
}

fn parse_block<'a, I>(matcher: &BoundaryMatcher, lines: &mut I) -> Result<Option<Pem>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut state = PemParsingState::default();
    let mut label = Label::Other(String::new());
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut base64_data = String::new();

    for (index, line) in lines.by_ref() {
        let line = line.trim_end();
        let boundary = matcher.boundary(line);
        match state {
            PemParsingState::Init => {
                // Everything before the first BEGIN is explanatory text.
                if let Some(Boundary::Begin(begin)) = boundary {
                    label = begin;
                    state = PemParsingState::Headers;
                }
            }
            PemParsingState::Headers | PemParsingState::Base64 => match boundary {
                Some(Boundary::End(end)) => {
                    if end != label {
                        return Err(Error::LabelMismatch { begin: label, end });
                    }
                    if base64_data.is_empty() {
                        return Err(Error::MissingData);
                    }
                    return Ok(Some(Pem {
                        label,
                        headers,
                        base64_data,
                    }));
                }
                Some(Boundary::Begin(_)) => return Err(Error::MissingPostEncapsulationBoundary),
                None => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        if state == PemParsingState::Headers && !headers.is_empty() {
                            state = PemParsingState::Base64;
                        }
                        continue;
                    }
                    if state == PemParsingState::Headers {
                        if line.starts_with([' ', '\t']) {
                            if let Some((_, value)) = headers.last_mut() {
                                value.push(' ');
                                value.push_str(trimmed);
                                continue;
                            }
                        }
                        if let Some(header) = parse_header(trimmed) {
                            headers.push(header);
                            continue;
                        }
                        state = PemParsingState::Base64;
                    }
                    push_base64_line(&mut base64_data, trimmed, index + 1)?;
                }
            },
        }
    }

    match state {
        PemParsingState::Init => Ok(None),
        _ => Err(Error::MissingPostEncapsulationBoundary),
    }
}

fn parse_header(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

fn push_base64_line(data: &mut String, line: &str, line_number: usize) -> Result<()> {
    for c in line.chars() {
        match c {
            ' ' | '\t' => {}
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' | '=' => data.push(c),
            _ => return Err(Error::InvalidBase64Line { line: line_number }),
        }
    }
    Ok(())
}
