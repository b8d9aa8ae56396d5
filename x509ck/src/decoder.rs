//! Type-directed decoding.
//!
//! A conversion from `T` to `D` is expressed by two impls:
//!
//! 1. `DecodableFrom<T> for D` marks `D` as a legal destination for `T`.
//! 2. `Decoder<T, D> for T` performs the conversion.
//!
//! The marker keeps the set of conversions closed: `der.decode()` only
//! type-checks for destinations that explicitly opted in, so a DER value can
//! become an `ASN1Object` but never, say, a `Pem`.
//!
//! ```no_run
//! use x509ck::decoder::{DecodableFrom, Decoder};
//!
//! struct Raw(Vec<u8>);
//! struct Length(usize);
//!
//! #[derive(Debug)]
//! struct Empty;
//!
//! impl DecodableFrom<Raw> for Length {}
//!
//! impl Decoder<Raw, Length> for Raw {
//!     type Error = Empty;
//!
//!     fn decode(&self) -> Result<Length, Self::Error> {
//!         if self.0.is_empty() {
//!             return Err(Empty);
//!         }
//!         Ok(Length(self.0.len()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into a `D`.
///
/// Implemented on the source type. Callers usually drive the conversion by
/// annotating the binding:
///
/// ```ignore
/// let der: Der = bytes.decode()?;
/// ```
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// Error returned when the source cannot be converted.
    type Error;

    /// Decodes `self` into `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait: `Self` can be decoded from `T`.
pub trait DecodableFrom<T> {}
