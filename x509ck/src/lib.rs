//! # x509ck
//!
//! Conversion traits shared by every layer of the x509ck workspace.
//!
//! Input travels through a fixed pipeline before the verifier sees it:
//!
//! ```text
//! &[u8] → Pem → Vec<u8> → Der → ASN1Object → Certificate / RSAPrivateKey
//! ```
//!
//! Each arrow is a `Decoder` implementation living in the crate that owns the
//! destination type, so the pipeline can be walked one step at a time:
//!
//! ```ignore
//! use x509ck::decoder::Decoder;
//! use x509ck_der::Der;
//! use x509ck_pem::Pem;
//!
//! let pem: Pem = pem_bytes.decode()?;
//! let bytes: Vec<u8> = pem.decode()?;
//! let der: Der = bytes.decode()?;
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
