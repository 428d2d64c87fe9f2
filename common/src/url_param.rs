//! Compact path/query segment encoding for listing page state.

use std::{fmt::Display, str::FromStr};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;


/// Wraps any serde value so it can be written into a URL: CBOR bytes, then
/// URL-safe base64. Parsing reverses both steps.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UrlParam<T>(pub T);

impl<T> From<T> for UrlParam<T> {
    fn from(value: T) -> Self {
        UrlParam(value)
    }
}

impl<T> UrlParam<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum StateParseError {
    #[error("Failed to decode base64: {0}")]
    DecodeError(#[from] base64::DecodeError),
    #[error("Failed to deserialize: {0}")]
    CiboriumError(#[from] ciborium::de::Error<std::io::Error>),
}

impl<T: Serialize> Display for UrlParam<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut cbor = Vec::new();
        // an unserializable value renders as an empty segment
        if ciborium::into_writer(&self.0, &mut cbor).is_ok() {
            f.write_str(&URL_SAFE.encode(cbor))?;
        }
        Ok(())
    }
}

impl<T: DeserializeOwned> FromStr for UrlParam<T> {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cbor = URL_SAFE.decode(s.trim().as_bytes())?;
        let value = ciborium::from_reader::<T, _>(cbor.as_slice())?;
        Ok(UrlParam(value))
    }
}
