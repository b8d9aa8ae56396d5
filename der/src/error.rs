use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("parser error {0:?}")]
    Parser(nom::error::ErrorKind),
    #[error("parser incomplete: {0:?}")]
    ParserIncomplete(nom::Needed),
    #[error("empty input")]
    Empty,
    #[error("indefinite length form is not allowed")]
    IndefiniteLength,
    #[error("length is not minimally encoded")]
    NonMinimalLength,
    #[error("length of {0} octets is too large")]
    LengthTooLarge(usize),
    #[error("tag number is not minimally encoded")]
    NonMinimalTag,
    #[error("tag number is too large")]
    TagTooLarge,
    #[error("nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("{0} bytes of trailing data")]
    TrailingData(usize),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match e {
            nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::Parser(e.code),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
