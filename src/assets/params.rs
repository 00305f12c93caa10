//! Transform parameters passed to asset services.

use crate::config::Options;
use serde::{Deserialize, Serialize};

/// Output encodings the local image service can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Parameters for one asset transform. Unset fields leave that aspect alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Lossy encoder quality, 1-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

/// Option keys read as transform parameters.
const PARAM_KEYS: [&str; 4] = ["width", "height", "quality", "format"];

impl TransformParams {
    /// Read default parameters from service options, ignoring other keys.
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let subset: serde_json::Map<String, serde_json::Value> = options
            .iter()
            .filter(|(key, _)| PARAM_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let params: TransformParams = serde_json::from_value(serde_json::Value::Object(subset))
            .map_err(|e| format!("invalid transform parameters: {}", e))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err("width and height must be positive".to_string());
        }
        if let Some(q) = self.quality {
            if q == 0 || q > 100 {
                return Err(format!("quality must be between 1 and 100, got {}", q));
            }
        }
        Ok(())
    }

    /// Fields set in `overrides` win over fields set in `self`.
    pub fn merged(&self, overrides: &TransformParams) -> TransformParams {
        TransformParams {
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            quality: overrides.quality.or(self.quality),
            format: overrides.format.or(self.format),
        }
    }

    /// Parameters as query pairs, in a fixed order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(w) = self.width {
            query.push(("w", w.to_string()));
        }
        if let Some(h) = self.height {
            query.push(("h", h.to_string()));
        }
        if let Some(q) = self.quality {
            query.push(("q", q.to_string()));
        }
        if let Some(f) = self.format {
            query.push(("f", f.as_str().to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_options_picks_param_keys() {
        let options: Options = [
            ("quality".to_string(), json!(75)),
            ("format".to_string(), json!("jpg")),
            ("endpoint".to_string(), json!("https://img.example")),
        ]
        .into_iter()
        .collect();

        let params = TransformParams::from_options(&options).unwrap();
        assert_eq!(params.quality, Some(75));
        assert_eq!(params.format, Some(ImageFormat::Jpeg));
        assert_eq!(params.width, None);
    }

    #[test]
    fn test_from_options_rejects_bad_quality() {
        let options: Options = [("quality".to_string(), json!(0))].into_iter().collect();
        assert!(TransformParams::from_options(&options).is_err());
    }

    #[test]
    fn test_from_options_rejects_unknown_format() {
        let options: Options = [("format".to_string(), json!("tga"))].into_iter().collect();
        assert!(TransformParams::from_options(&options).is_err());
    }

    #[test]
    fn test_merged() {
        let base = TransformParams { width: Some(800), quality: Some(80), ..Default::default() };
        let overrides = TransformParams { width: Some(320), ..Default::default() };
        let merged = base.merged(&overrides);
        assert_eq!(merged.width, Some(320));
        assert_eq!(merged.quality, Some(80));
    }

    #[test]
    fn test_to_query() {
        let params = TransformParams {
            width: Some(100),
            format: Some(ImageFormat::Png),
            ..Default::default()
        };
        assert_eq!(params.to_query(), vec![("w", "100".to_string()), ("f", "png".to_string())]);
    }
}
