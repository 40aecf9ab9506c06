use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::DateTime;
use chrono::Utc;

use crate::error::JournalError;
use crate::error::Result;

/// One daily capture. Never mutated after it is appended.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub message: String,
    pub image: ImageRef,
    pub date: DateTime<Utc>,
}

impl Entry {
    pub fn new(message: impl Into<String>, image: ImageRef, date: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            image,
            date,
        }
    }
}

/// Image stored inline as a `data:<mime>;base64,<payload>` URL.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn from_data_url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        split_data_url(&url)?;
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime(&self) -> Result<&str> {
        split_data_url(&self.0).map(|(mime, _)| mime)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = split_data_url(&self.0)?;
        STANDARD
            .decode(payload)
            .map_err(|e| JournalError::InvalidImage(e.to_string()))
    }

    /// Size of the decoded payload, computed without decoding.
    pub fn byte_len(&self) -> usize {
        match split_data_url(&self.0) {
            Ok((_, payload)) => {
                let pad = payload.bytes().rev().take_while(|b| *b == b'=').count();
                (payload.len() / 4 * 3).saturating_sub(pad)
            }
            Err(_) => 0,
        }
    }
}

fn split_data_url(url: &str) -> Result<(&str, &str)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| JournalError::InvalidImage("missing data: prefix".to_string()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| JournalError::InvalidImage("not a base64 data url".to_string()))?;
    if mime.is_empty() {
        return Err(JournalError::InvalidImage("empty mime type".to_string()));
    }
    Ok((mime, payload))
}
