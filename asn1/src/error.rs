//! Error types for ASN.1 element decoding.

use std::num::ParseIntError;

use thiserror::Error;
use x509ck_der::Tag;

/// Errors that can occur while turning DER TLVs into ASN.1 elements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid boolean")]
    InvalidBoolean,

    // Integer errors
    #[error("INTEGER: no data")]
    IntegerNoData,
    #[error("INTEGER: not minimally encoded")]
    IntegerNotMinimal,
    #[error("parse int error: {0}")]
    ParseInt(ParseIntError),

    #[error("NULL: unexpected content")]
    NullWithContent,

    // ObjectIdentifier errors
    #[error("OBJECT IDENTIFIER: no data")]
    ObjectIdentifierNoData,
    #[error("OBJECT IDENTIFIER: incomplete encoding")]
    ObjectIdentifierIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: component is not minimally encoded")]
    ObjectIdentifierNotMinimal,
    #[error("OBJECT IDENTIFIER: component overflows 64 bits")]
    ObjectIdentifierOverflow,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    ObjectIdentifierTooFewComponents,

    // BitString errors
    #[error("BIT STRING: no data")]
    BitStringNoData,
    #[error("BIT STRING: unused bits {0} out of range (must be 0-7)")]
    BitStringUnusedBitsOutOfRange(u8),
    #[error("BIT STRING: padding bits are not zero")]
    BitStringInvalidPadding,

    // String type errors
    #[error("UTF8String: invalid UTF-8")]
    Utf8StringInvalidUtf8,
    #[error("PrintableString: invalid character")]
    PrintableStringInvalidCharacter,
    #[error("IA5String: invalid character")]
    Ia5StringInvalidCharacter,
    #[error("BMPString: odd byte length {0}")]
    BmpStringOddLength(usize),
    #[error("BMPString: invalid UTF-16")]
    BmpStringInvalidUtf16,

    // Time errors
    #[error("UTCTime: invalid format")]
    UtcTimeInvalidFormat,
    #[error("GeneralizedTime: invalid format")]
    GeneralizedTimeInvalidFormat,

    #[error("{0}: invalid primitive/constructed form")]
    InvalidForm(Tag),

    #[error("invalid DER encoding: {0}")]
    FailedToDecodeDer(#[from] x509ck_der::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
