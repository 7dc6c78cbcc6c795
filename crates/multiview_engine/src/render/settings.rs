//! Renderer output settings
//!
//! Reactive renderer configuration. The coordinator records changes and
//! re-applies them before the next frame is drawn.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Output color space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// sRGB transfer function
    #[default]
    Srgb,
    /// Linear sRGB primaries
    LinearSrgb,
    /// Display P3 transfer function
    DisplayP3,
    /// Linear Display P3 primaries
    LinearDisplayP3,
}

/// Tone mapping operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    /// No tone mapping
    None,
    /// Linear scaling
    Linear,
    /// Reinhard operator
    Reinhard,
    /// Cineon film curve
    Cineon,
    /// ACES filmic curve
    AcesFilmic,
    /// AgX operator
    #[default]
    #[serde(rename = "agx")]
    AgX,
    /// Khronos PBR neutral
    Neutral,
}

/// Shadow map filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMapType {
    /// Unfiltered
    Basic,
    /// Percentage-closer filtering
    Pcf,
    /// Soft percentage-closer filtering
    #[default]
    PcfSoft,
    /// Variance shadow maps
    Vsm,
}

impl ShadowMapType {
    const ALL: [Self; 4] = [Self::Basic, Self::Pcf, Self::PcfSoft, Self::Vsm];

    /// Name used in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pcf => "pcf",
            Self::PcfSoft => "pcf_soft",
            Self::Vsm => "vsm",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// Shadow setting as written by users: a switch or an explicit map type
///
/// Stored as a bool or as the map type's name, so every format writes and
/// reads it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowsConfig {
    /// `true` enables soft shadows, `false` disables shadows
    Toggle(bool),
    /// Shadows on with the given map type
    Kind(ShadowMapType),
}

impl ShadowsConfig {
    /// Resolve to the effective shadow map type; `None` means disabled
    pub fn resolve(self) -> Option<ShadowMapType> {
        match self {
            Self::Toggle(false) => None,
            Self::Toggle(true) => Some(ShadowMapType::PcfSoft),
            Self::Kind(kind) => Some(kind),
        }
    }
}

impl Default for ShadowsConfig {
    fn default() -> Self {
        Self::Kind(ShadowMapType::PcfSoft)
    }
}

impl Serialize for ShadowsConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Self::Toggle(enabled) => serializer.serialize_bool(enabled),
            Self::Kind(kind) => serializer.serialize_str(kind.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for ShadowsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ShadowsVisitor)
    }
}

struct ShadowsVisitor;

impl<'de> Visitor<'de> for ShadowsVisitor {
    type Value = ShadowsConfig;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a bool or one of \"basic\", \"pcf\", \"pcf_soft\", \"vsm\"")
    }

    fn visit_bool<E: de::Error>(self, enabled: bool) -> Result<Self::Value, E> {
        Ok(ShadowsConfig::Toggle(enabled))
    }

    fn visit_str<E: de::Error>(self, name: &str) -> Result<Self::Value, E> {
        ShadowMapType::from_name(name)
            .map(ShadowsConfig::Kind)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(name), &self))
    }
}

impl From<bool> for ShadowsConfig {
    fn from(enabled: bool) -> Self {
        Self::Toggle(enabled)
    }
}

impl From<ShadowMapType> for ShadowsConfig {
    fn from(kind: ShadowMapType) -> Self {
        Self::Kind(kind)
    }
}

/// Renderer settings shared by every scene on a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Whether color management is enabled
    pub color_management_enabled: bool,
    /// Output color space
    pub color_space: ColorSpace,
    /// Tone mapping operator
    pub tone_mapping: ToneMapping,
    /// Shadow configuration
    pub shadows: ShadowsConfig,
    /// Pixel ratio override; the platform ratio is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpr: Option<f32>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            color_management_enabled: true,
            color_space: ColorSpace::Srgb,
            tone_mapping: ToneMapping::AgX,
            shadows: ShadowsConfig::default(),
            dpr: None,
        }
    }
}

impl RendererSettings {
    /// Settings a backend applies to its output
    pub fn output_settings(&self, platform_pixel_ratio: f32) -> OutputSettings {
        OutputSettings {
            color_space: self.color_space,
            tone_mapping: self.tone_mapping,
            pixel_ratio: self.dpr.unwrap_or(platform_pixel_ratio),
            shadow_map: self.shadows.resolve(),
        }
    }
}

/// Resolved output settings handed to a backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    /// Output color space
    pub color_space: ColorSpace,
    /// Tone mapping operator
    pub tone_mapping: ToneMapping,
    /// Effective pixel ratio
    pub pixel_ratio: f32,
    /// Shadow map type, `None` when shadows are disabled
    pub shadow_map: Option<ShadowMapType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_resolution() {
        assert_eq!(ShadowsConfig::Toggle(false).resolve(), None);
        assert_eq!(ShadowsConfig::Toggle(true).resolve(), Some(ShadowMapType::PcfSoft));
        assert_eq!(
            ShadowsConfig::Kind(ShadowMapType::Vsm).resolve(),
            Some(ShadowMapType::Vsm)
        );
    }

    #[test]
    fn test_defaults() {
        let settings = RendererSettings::default();
        assert!(settings.color_management_enabled);
        assert_eq!(settings.color_space, ColorSpace::Srgb);
        assert_eq!(settings.tone_mapping, ToneMapping::AgX);
        assert_eq!(settings.shadows.resolve(), Some(ShadowMapType::PcfSoft));
        assert_eq!(settings.dpr, None);
    }

    #[test]
    fn test_pixel_ratio_falls_back_to_platform() {
        let mut settings = RendererSettings::default();
        assert_eq!(settings.output_settings(2.0).pixel_ratio, 2.0);

        settings.dpr = Some(1.5);
        assert_eq!(settings.output_settings(2.0).pixel_ratio, 1.5);
    }

    #[test]
    fn test_shadows_parse_from_bool_or_name() {
        let off: ShadowsConfig = ron::from_str("false").unwrap();
        let kind: ShadowsConfig = ron::from_str("\"pcf\"").unwrap();
        assert_eq!(off, ShadowsConfig::Toggle(false));
        assert_eq!(kind, ShadowsConfig::Kind(ShadowMapType::Pcf));
    }

    #[test]
    fn test_shadow_kind_is_written_as_its_name() {
        let written = ron::to_string(&ShadowsConfig::Kind(ShadowMapType::PcfSoft)).unwrap();
        assert_eq!(written, "\"pcf_soft\"");
        assert_eq!(ron::to_string(&ShadowsConfig::Toggle(true)).unwrap(), "true");
    }

    #[test]
    fn test_unknown_shadow_name_is_rejected() {
        assert!(ron::from_str::<ShadowsConfig>("\"soft\"").is_err());
    }
}
