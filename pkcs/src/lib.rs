//! RSA key structures.
//!
//! Only PKCS#1 is decoded. PKCS#8 and SEC1 keys are recognised so that
//! callers get a precise "wrong format" diagnostic instead of a generic
//! structure error.

pub mod pkcs1;

pub use pkcs1::{Error, RSAPrivateKey, RSAPublicKey, Result};
