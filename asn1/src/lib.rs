use std::{fmt::Display, str::FromStr};

use chrono::NaiveDateTime;
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive};
use x509ck::decoder::{DecodableFrom, Decoder};
use x509ck_der::{Der, PrimitiveTag, Tag, Tlv};

use crate::error::{Error, Result};

pub mod error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ASN1Object {
    element: Element,
}

impl ASN1Object {
    pub fn new(element: Element) -> Self {
        ASN1Object { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn into_element(self) -> Element {
        self.element
    }

    /// Tokenize `bytes` as a single DER element and decode it.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let der: Der = bytes.decode()?;
        der.decode()
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;

    fn decode(&self) -> Result<ASN1Object> {
        let element = Element::try_from(self.root())?;
        Ok(ASN1Object { element })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Boolean(bool),
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    UTF8String(String),
    PrintableString(String),
    T61String(String),
    IA5String(String),
    BMPString(String),
    UTCTime(NaiveDateTime),
    GeneralizedTime(NaiveDateTime),
    Sequence(Vec<Element>),
    Set(Vec<Element>),
    /// Constructed context tags carry the decoded content (wrapped in a
    /// `Sequence` unless there is exactly one child); primitive ones carry
    /// their raw contents as an `OctetString`.
    ContextSpecific {
        slot: u32,
        constructed: bool,
        element: Box<Element>,
    },
    Unimplemented(Tlv),
}

impl Element {
    /// Character data of any of the string types.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::UTF8String(s)
            | Element::PrintableString(s)
            | Element::T61String(s)
            | Element::IA5String(s)
            | Element::BMPString(s) => Some(s),
            _ => None,
        }
    }
}

fn expect_form(tlv: &Tlv, constructed: bool) -> Result<()> {
    if tlv.tag().is_constructed() != constructed {
        return Err(Error::InvalidForm(*tlv.tag()));
    }
    Ok(())
}

fn primitive_data(tlv: &Tlv) -> Result<&[u8]> {
    expect_form(tlv, false)?;
    tlv.data().ok_or(Error::InvalidForm(*tlv.tag()))
}

fn children(tlv: &Tlv) -> Result<Vec<Element>> {
    expect_form(tlv, true)?;
    tlv.tlvs()
        .unwrap_or_default()
        .iter()
        .map(Element::try_from)
        .collect()
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self> {
        match tlv.tag() {
            Tag::Primitive { tag, .. } => match tag {
                PrimitiveTag::Boolean => match primitive_data(tlv)? {
                    [0x00] => Ok(Element::Boolean(false)),
                    [0xff] => Ok(Element::Boolean(true)),
                    _ => Err(Error::InvalidBoolean),
                },
                PrimitiveTag::Integer => {
                    Ok(Element::Integer(Integer::try_from(primitive_data(tlv)?)?))
                }
                PrimitiveTag::BitString => Ok(Element::BitString(BitString::try_from(
                    primitive_data(tlv)?,
                )?)),
                PrimitiveTag::OctetString => Ok(Element::OctetString(OctetString::from(
                    primitive_data(tlv)?,
                ))),
                PrimitiveTag::Null => {
                    if primitive_data(tlv)?.is_empty() {
                        Ok(Element::Null)
                    } else {
                        Err(Error::NullWithContent)
                    }
                }
                PrimitiveTag::ObjectIdentifier => Ok(Element::ObjectIdentifier(
                    ObjectIdentifier::try_from(primitive_data(tlv)?)?,
                )),
                PrimitiveTag::UTF8String => {
                    let s = std::str::from_utf8(primitive_data(tlv)?)
                        .map_err(|_| Error::Utf8StringInvalidUtf8)?;
                    Ok(Element::UTF8String(s.to_string()))
                }
                PrimitiveTag::PrintableString => Ok(Element::PrintableString(
                    parse_printable_string(primitive_data(tlv)?)?,
                )),
                // decoded as ISO-8859-1
                PrimitiveTag::T61String => Ok(Element::T61String(
                    primitive_data(tlv)?.iter().map(|&b| char::from(b)).collect(),
                )),
                PrimitiveTag::IA5String => {
                    let data = primitive_data(tlv)?;
                    if !data.is_ascii() {
                        return Err(Error::Ia5StringInvalidCharacter);
                    }
                    Ok(Element::IA5String(
                        data.iter().map(|&b| char::from(b)).collect(),
                    ))
                }
                PrimitiveTag::BMPString => Ok(Element::BMPString(parse_bmp_string(
                    primitive_data(tlv)?,
                )?)),
                PrimitiveTag::UTCTime => Ok(Element::UTCTime(parse_utc_time(primitive_data(
                    tlv,
                )?)?)),
                PrimitiveTag::GeneralizedTime => Ok(Element::GeneralizedTime(
                    parse_generalized_time(primitive_data(tlv)?)?,
                )),
                PrimitiveTag::Sequence => Ok(Element::Sequence(children(tlv)?)),
                PrimitiveTag::Set => Ok(Element::Set(children(tlv)?)),
                PrimitiveTag::Unimplemented(_) => Ok(Element::Unimplemented(tlv.clone())),
            },
            Tag::ContextSpecific { slot, constructed } => {
                let element = if *constructed {
                    let mut elements = children(tlv)?;
                    if elements.len() == 1 {
                        elements.remove(0)
                    } else {
                        Element::Sequence(elements)
                    }
                } else {
                    // IMPLICIT tagging: the schema above decides what the bytes mean.
                    Element::OctetString(OctetString::from(primitive_data(tlv)?))
                };
                Ok(Element::ContextSpecific {
                    slot: *slot,
                    constructed: *constructed,
                    element: Box::new(element),
                })
            }
            Tag::Other { .. } => Ok(Element::Unimplemented(tlv.clone())),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Boolean(b) => write!(f, "Boolean({})", b),
            Element::Integer(i) => write!(f, "Integer({})", i),
            Element::BitString(bs) => write!(f, "BitString({})", bs),
            Element::OctetString(os) => write!(f, "OctetString({})", os),
            Element::Null => write!(f, "Null"),
            Element::ObjectIdentifier(oid) => write!(f, "ObjectIdentifier({})", oid),
            Element::UTF8String(s) => write!(f, "UTF8String({})", s),
            Element::PrintableString(s) => write!(f, "PrintableString({})", s),
            Element::T61String(s) => write!(f, "T61String({})", s),
            Element::IA5String(s) => write!(f, "IA5String({})", s),
            Element::BMPString(s) => write!(f, "BMPString({})", s),
            Element::UTCTime(dt) => write!(f, "UTCTime({})", dt),
            Element::GeneralizedTime(dt) => write!(f, "GeneralizedTime({})", dt),
            Element::Sequence(seq) => write!(f, "Sequence({} elements)", seq.len()),
            Element::Set(set) => write!(f, "Set({} elements)", set.len()),
            Element::ContextSpecific { slot, element, .. } => {
                write!(f, "ContextSpecific([{}] {})", slot, element)
            }
            Element::Unimplemented(tlv) => write!(f, "Unimplemented({})", tlv.tag()),
        }
    }
}

// ASN.1 INTEGER is signed and arbitrarily sized. DER requires the shortest
// two's complement form, so redundant leading 0x00/0xff octets are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Integer {
    inner: BigInt,
}

impl Integer {
    pub fn as_bigint(&self) -> &BigInt {
        &self.inner
    }

    pub fn is_positive(&self) -> bool {
        self.inner.is_positive()
    }

    /// Magnitude of a non-negative value.
    pub fn to_biguint(&self) -> Option<BigUint> {
        self.inner.to_biguint()
    }

    /// Big-endian magnitude bytes, without a sign octet.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.inner.to_bytes_be().1
    }

    pub fn bits(&self) -> u64 {
        self.inner.bits()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.inner.to_u32()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.inner.to_u64()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.inner.to_i64()
    }
}

impl From<BigInt> for Integer {
    fn from(inner: BigInt) -> Self {
        Integer { inner }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl TryFrom<&[u8]> for Integer {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        match value {
            [] => Err(Error::IntegerNoData),
            [0x00, next, ..] if next & 0x80 == 0 => Err(Error::IntegerNotMinimal),
            [0xff, next, ..] if next & 0x80 != 0 => Err(Error::IntegerNotMinimal),
            _ => Ok(Integer {
                inner: BigInt::from_signed_bytes_be(value),
            }),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn components(&self) -> &[u64] {
        &self.inner
    }
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::ObjectIdentifierNoData);
        }

        let mut subidentifiers = Vec::new();
        let mut val = 0u64;
        let mut in_progress = false;
        for &b in value {
            if !in_progress && b == 0x80 {
                return Err(Error::ObjectIdentifierNotMinimal);
            }
            if val > u64::MAX >> 7 {
                return Err(Error::ObjectIdentifierOverflow);
            }
            val = (val << 7) | u64::from(b & 0x7f);
            in_progress = b & 0x80 != 0;
            if !in_progress {
                subidentifiers.push(val);
                val = 0;
            }
        }
        if in_progress {
            return Err(Error::ObjectIdentifierIncompleteEncoding);
        }

        // The first subidentifier packs the first two arcs as 40 * X + Y.
        let mut inner = Vec::with_capacity(subidentifiers.len() + 1);
        match subidentifiers[0] {
            first @ 0..40 => inner.extend([0, first]),
            first @ 40..80 => inner.extend([1, first - 40]),
            first => inner.extend([2, first - 80]),
        }
        inner.extend_from_slice(&subidentifiers[1..]);
        Ok(ObjectIdentifier { inner })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .inner
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .split('.')
            .map(|s| s.parse::<u64>().map_err(Error::ParseInt))
            .collect::<Result<Vec<u64>>>()?;
        if inner.len() < 2 {
            return Err(Error::ObjectIdentifierTooFewComponents);
        }
        Ok(ObjectIdentifier { inner })
    }
}

impl PartialEq<&str> for ObjectIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl PartialEq<ObjectIdentifier> for &str {
    fn eq(&self, other: &ObjectIdentifier) -> bool {
        other == self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl BitString {
    pub fn new(unused: u8, data: Vec<u8>) -> Self {
        BitString { unused, data }
    }

    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn bit_len(&self) -> usize {
        self.data.len() * 8 - usize::from(self.unused)
    }
}

impl AsRef<[u8]> for BitString {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&[u8]> for BitString {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let (&unused, data) = value.split_first().ok_or(Error::BitStringNoData)?;
        if unused > 7 || (unused > 0 && data.is_empty()) {
            return Err(Error::BitStringUnusedBitsOutOfRange(unused));
        }
        let padding_mask = (1u8 << unused) - 1;
        if data.last().is_some_and(|last| last & padding_mask != 0) {
            return Err(Error::BitStringInvalidPadding);
        }
        Ok(BitString {
            unused,
            data: data.to_vec(),
        })
    }
}

impl Display for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bits", self.bit_len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetString {
    inner: Vec<u8>,
}

impl OctetString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl From<&[u8]> for OctetString {
    fn from(value: &[u8]) -> Self {
        OctetString {
            inner: value.to_vec(),
        }
    }
}

impl Display for OctetString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self
            .inner
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":");
        write!(f, "{}", hex)
    }
}

fn parse_printable_string(data: &[u8]) -> Result<String> {
    let valid = data.iter().all(|&b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
            )
            // not in the PrintableString alphabet, but widely emitted
            || matches!(b, b'*' | b'&')
    });
    if !valid {
        return Err(Error::PrintableStringInvalidCharacter);
    }
    Ok(data.iter().map(|&b| char::from(b)).collect())
}

fn parse_bmp_string(data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(Error::BmpStringOddLength(data.len()));
    }
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect::<Vec<_>>();
    String::from_utf16(&units).map_err(|_| Error::BmpStringInvalidUtf16)
}

fn ascii_digits(s: &[u8]) -> bool {
    !s.is_empty() && s.iter().all(u8::is_ascii_digit)
}

// UTCTime in DER is always YYMMDDHHMMSSZ. Two digit years 50-99 are 19xx,
// 00-49 are 20xx (RFC 5280 4.1.2.5.1).
fn parse_utc_time(data: &[u8]) -> Result<NaiveDateTime> {
    let (digits, zone) = data
        .split_last()
        .map(|(zone, digits)| (digits, *zone))
        .ok_or(Error::UtcTimeInvalidFormat)?;
    if digits.len() != 12 || zone != b'Z' || !ascii_digits(digits) {
        return Err(Error::UtcTimeInvalidFormat);
    }
    let yy = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
    let century = if yy >= 50 { "19" } else { "20" };
    let text = format!(
        "{}{}",
        century,
        std::str::from_utf8(digits).map_err(|_| Error::UtcTimeInvalidFormat)?
    );
    NaiveDateTime::parse_from_str(&text, "%Y%m%d%H%M%S").map_err(|_| Error::UtcTimeInvalidFormat)
}

fn parse_generalized_time(data: &[u8]) -> Result<NaiveDateTime> {
    let (digits, zone) = data
        .split_last()
        .map(|(zone, digits)| (digits, *zone))
        .ok_or(Error::GeneralizedTimeInvalidFormat)?;
    if zone != b'Z' || digits.len() < 14 || !ascii_digits(&digits[..14]) {
        return Err(Error::GeneralizedTimeInvalidFormat);
    }
    let text = std::str::from_utf8(digits).map_err(|_| Error::GeneralizedTimeInvalidFormat)?;
    NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S%.f")
        .map_err(|_| Error::GeneralizedTimeInvalidFormat)
}
