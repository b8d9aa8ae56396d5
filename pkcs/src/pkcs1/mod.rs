pub mod error;
mod types;

pub use error::{Error, Result};
pub use types::{OtherPrimeInfo, RSAPrivateKey, RSAPublicKey, Version};
