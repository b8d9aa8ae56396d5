//! A strict DER tokenizer.
//!
//! Splits bytes into tag-length-value triples and nothing more. Only the
//! definite, minimally encoded length form is accepted, so every element
//! keeps the exact bytes it was parsed from (see [`Tlv::encoded`]).

use std::fmt::Display;

use nom::{IResult, Parser, bytes::complete::take, number::complete::be_u8};
use x509ck::decoder::{DecodableFrom, Decoder};

use crate::error::{Error, Result};

pub mod error;

pub const TAG_CONSTRUCTED: u8 = 0x20;
const TAG_CLASS_MASK: u8 = 0xc0;
const TAG_NUMBER_MASK: u8 = 0x1f;

/// Longest length field accepted, in octets (lengths up to 4 GiB).
const MAX_LENGTH_OCTETS: usize = 4;
/// Longest high tag number accepted, in base-128 octets.
const MAX_TAG_OCTETS: usize = 4;
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl From<u8> for TagClass {
    fn from(identifier: u8) -> Self {
        match (identifier & TAG_CLASS_MASK) >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }
}

/// Universal class tag numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveTag {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    UTF8String,
    Sequence,
    Set,
    PrintableString,
    T61String,
    IA5String,
    UTCTime,
    GeneralizedTime,
    BMPString,
    Unimplemented(u32),
}

impl From<u32> for PrimitiveTag {
    fn from(number: u32) -> Self {
        match number {
            0x01 => PrimitiveTag::Boolean,
            0x02 => PrimitiveTag::Integer,
            0x03 => PrimitiveTag::BitString,
            0x04 => PrimitiveTag::OctetString,
            0x05 => PrimitiveTag::Null,
            0x06 => PrimitiveTag::ObjectIdentifier,
            0x0c => PrimitiveTag::UTF8String,
            0x10 => PrimitiveTag::Sequence,
            0x11 => PrimitiveTag::Set,
            0x13 => PrimitiveTag::PrintableString,
            0x14 => PrimitiveTag::T61String,
            0x16 => PrimitiveTag::IA5String,
            0x17 => PrimitiveTag::UTCTime,
            0x18 => PrimitiveTag::GeneralizedTime,
            0x1e => PrimitiveTag::BMPString,
            n => PrimitiveTag::Unimplemented(n),
        }
    }
}

impl From<&PrimitiveTag> for u32 {
    fn from(tag: &PrimitiveTag) -> Self {
        match tag {
            PrimitiveTag::Boolean => 0x01,
            PrimitiveTag::Integer => 0x02,
            PrimitiveTag::BitString => 0x03,
            PrimitiveTag::OctetString => 0x04,
            PrimitiveTag::Null => 0x05,
            PrimitiveTag::ObjectIdentifier => 0x06,
            PrimitiveTag::UTF8String => 0x0c,
            PrimitiveTag::Sequence => 0x10,
            PrimitiveTag::Set => 0x11,
            PrimitiveTag::PrintableString => 0x13,
            PrimitiveTag::T61String => 0x14,
            PrimitiveTag::IA5String => 0x16,
            PrimitiveTag::UTCTime => 0x17,
            PrimitiveTag::GeneralizedTime => 0x18,
            PrimitiveTag::BMPString => 0x1e,
            PrimitiveTag::Unimplemented(n) => *n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Universal class
    Primitive {
        tag: PrimitiveTag,
        constructed: bool,
    },
    ContextSpecific {
        slot: u32,
        constructed: bool,
    },
    /// Application and private class tags, which X.509 does not use.
    Other {
        class: TagClass,
        number: u32,
        constructed: bool,
    },
}

impl Tag {
    pub fn new(class: TagClass, number: u32, constructed: bool) -> Self {
        match class {
            TagClass::Universal => Tag::Primitive {
                tag: PrimitiveTag::from(number),
                constructed,
            },
            TagClass::ContextSpecific => Tag::ContextSpecific {
                slot: number,
                constructed,
            },
            class => Tag::Other {
                class,
                number,
                constructed,
            },
        }
    }

    pub fn class(&self) -> TagClass {
        match self {
            Tag::Primitive { .. } => TagClass::Universal,
            Tag::ContextSpecific { .. } => TagClass::ContextSpecific,
            Tag::Other { class, .. } => *class,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Tag::Primitive { tag, .. } => u32::from(tag),
            Tag::ContextSpecific { slot, .. } => *slot,
            Tag::Other { number, .. } => *number,
        }
    }

    pub fn is_constructed(&self) -> bool {
        match self {
            Tag::Primitive { constructed, .. }
            | Tag::ContextSpecific { constructed, .. }
            | Tag::Other { constructed, .. } => *constructed,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Primitive { tag, .. } => write!(f, "{:?}", tag),
            Tag::ContextSpecific { slot, .. } => write!(f, "[{}]", slot),
            Tag::Other { class, number, .. } => write!(f, "{:?} [{}]", class, number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Tlv(Vec<Tlv>),
    Data(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    length: usize,
    value: Value,
    encoded: Vec<u8>,
}

impl Tlv {
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Length of the contents octets.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Contents of a primitive element.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(data) => Some(data),
            Value::Tlv(_) => None,
        }
    }

    /// Children of a constructed element.
    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Tlv(tlvs) => Some(tlvs),
            Value::Data(_) => None,
        }
    }

    /// The identifier, length and contents octets exactly as they appeared
    /// in the input.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn parse(input: &[u8]) -> Result<(&[u8], Tlv)> {
        Self::parse_at(input, 0)
    }

    fn parse_at(input: &[u8], depth: usize) -> Result<(&[u8], Tlv)> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let start = input;
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = take_bytes(input, length)?;
        let encoded = start[..start.len() - input.len()].to_vec();

        let value = if tag.is_constructed() {
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (rest, tlv) = Self::parse_at(data, depth + 1)?;
                data = rest;
                tlvs.push(tlv);
            }
            Value::Tlv(tlvs)
        } else {
            Value::Data(data.to_vec())
        };

        Ok((
            input,
            Tlv {
                tag,
                length,
                value,
                encoded,
            },
        ))
    }
}

fn next_byte(input: &[u8]) -> IResult<&[u8], u8> {
    be_u8(input)
}

fn take_bytes(input: &[u8], n: usize) -> IResult<&[u8], &[u8]> {
    take(n).parse(input)
}

fn parse_tag(input: &[u8]) -> Result<(&[u8], Tag)> {
    let (mut input, identifier) = next_byte(input)?;
    let class = TagClass::from(identifier);
    let constructed = identifier & TAG_CONSTRUCTED == TAG_CONSTRUCTED;

    if identifier & TAG_NUMBER_MASK != TAG_NUMBER_MASK {
        let number = u32::from(identifier & TAG_NUMBER_MASK);
        return Ok((input, Tag::new(class, number, constructed)));
    }

    // high tag number form: base-128, most significant group first
    let mut number = 0u32;
    let mut octets = 0;
    loop {
        let (rest, b) = next_byte(input)?;
        input = rest;
        if octets == 0 && b == 0x80 {
            return Err(Error::NonMinimalTag);
        }
        octets += 1;
        if octets > MAX_TAG_OCTETS {
            return Err(Error::TagTooLarge);
        }
        number = (number << 7) | u32::from(b & 0x7f);
        if b & 0x80 == 0 {
            break;
        }
    }
    if number < u32::from(TAG_NUMBER_MASK) {
        return Err(Error::NonMinimalTag);
    }
    Ok((input, Tag::new(class, number, constructed)))
}

fn parse_length(input: &[u8]) -> Result<(&[u8], usize)> {
    let (input, n) = next_byte(input)?;
    if n & 0x80 == 0 {
        // short form: 0-127
        return Ok((input, usize::from(n)));
    }

    // long form: the low 7 bits count the length octets that follow
    let octets = usize::from(n & 0x7f);
    if octets == 0 {
        return Err(Error::IndefiniteLength);
    }
    if octets > MAX_LENGTH_OCTETS {
        return Err(Error::LengthTooLarge(octets));
    }
    let (input, bs) = take_bytes(input, octets)?;
    if bs.first() == Some(&0) {
        return Err(Error::NonMinimalLength);
    }
    let length = bs.iter().fold(0usize, |n, &b| (n << 8) | usize::from(b));
    if length < 0x80 {
        return Err(Error::NonMinimalLength);
    }
    Ok((input, length))
}

/// A DER document: exactly one top-level element and no trailing bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    root: Tlv,
}

impl Der {
    pub fn new(root: Tlv) -> Self {
        Der { root }
    }

    pub fn root(&self) -> &Tlv {
        &self.root
    }

    pub fn into_root(self) -> Tlv {
        self.root
    }

    fn parse(input: &[u8]) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::Empty);
        }
        let (rest, root) = Tlv::parse(input)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(rest.len()));
        }
        Ok(Der { root })
    }
}

impl DecodableFrom<&[u8]> for Der {}

impl Decoder<&[u8], Der> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der> {
        Der::parse(self)
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der> {
        Der::parse(self)
    }
}
