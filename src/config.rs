use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::symbol::Mode;

/// How an encoded bitstream is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitstreamFormat {
    /// One printable '0'/'1' character per bit. Easy to inspect, eight times larger.
    Readable,
    /// Eight bits per byte, most significant first, with an explicit bit count.
    Packed,
}

impl BitstreamFormat {
    pub fn tag(self) -> &'static str {
        match self {
            BitstreamFormat::Readable => "BITS",
            BitstreamFormat::Packed => "PACKED",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "BITS" => Some(BitstreamFormat::Readable),
            "PACKED" => Some(BitstreamFormat::Packed),
            _ => None,
        }
    }
}

impl fmt::Display for BitstreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BitstreamFormat::Readable => "readable",
            BitstreamFormat::Packed => "packed",
        })
    }
}

impl FromStr for BitstreamFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "readable" | "bits" => Ok(BitstreamFormat::Readable),
            "packed" | "binary" => Ok(BitstreamFormat::Packed),
            other => Err(format!(
                "unknown bitstream format '{other}', expected 'readable' or 'packed'"
            )),
        }
    }
}

/// Engine settings. Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Storage for text-mode bitstreams.
    pub text_format: BitstreamFormat,
    /// Storage for image-mode bitstreams.
    pub image_format: BitstreamFormat,
    /// Decode every fresh encoding and compare it with the input before returning it.
    pub verify_after_encode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            text_format: BitstreamFormat::Readable,
            image_format: BitstreamFormat::Packed,
            verify_after_encode: false,
        }
    }
}

impl EngineConfig {
    pub fn format_for(&self, mode: Mode) -> BitstreamFormat {
        match mode {
            Mode::Text => self.text_format,
            Mode::Image => self.image_format,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}
