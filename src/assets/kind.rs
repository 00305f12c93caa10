//! Asset kinds recognised by the service resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Asset resolution error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The kind is not one of the enumerated asset kinds
    #[error("unknown asset kind '{0}' (expected image, font or media)")]
    UnknownAssetKind(String),
    /// A service is already bound for this kind
    #[error("an asset service ('{service}') is already bound for {kind} assets")]
    ServiceAlreadyBound { kind: AssetKind, service: String },
}

/// Kind of a build asset. Each kind has at most one bound service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Font,
    Media,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Image, AssetKind::Font, AssetKind::Media];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Font => "font",
            AssetKind::Media => "media",
        }
    }

    /// Classify a file by extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<AssetKind> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "bmp" | "tif" | "tiff" | "svg" => {
                Some(AssetKind::Image)
            }
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Some(AssetKind::Font),
            "mp4" | "webm" | "ogg" | "mp3" | "wav" | "flac" => Some(AssetKind::Media),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AssetKind::Image),
            "font" => Ok(AssetKind::Font),
            "media" => Ok(AssetKind::Media),
            other => Err(AssetError::UnknownAssetKind(other.to_string())),
        }
    }
}
