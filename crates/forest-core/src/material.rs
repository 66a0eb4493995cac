//! Surface descriptions handed to the rasterizer.

use crate::error::ConfigError;

/// Parse a `#rrggbb` color into sRGB components in `[0, 1]`.
pub fn parse_hex_color(value: &str) -> Result<[f32; 3], ConfigError> {
    let malformed = || ConfigError::MalformedColor {
        value: value.to_string(),
    };
    let hex = value.strip_prefix('#').ok_or_else(malformed)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(malformed());
    }
    let mut out = [0.0_f32; 3];
    for (i, c) in out.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| malformed())?;
        *c = byte as f32 / 255.0;
    }
    Ok(out)
}

/// sRGB to linear transfer for one channel.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3], // sRGB
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    /// Emits its own color and ignores scene lights.
    pub unlit: bool,
    pub double_sided: bool,
    /// Blended additively without writing depth.
    pub additive: bool,
}

impl Material {
    pub fn standard(hex: &str, roughness: f32, metalness: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            color: parse_hex_color(hex)?,
            roughness,
            metalness,
            opacity: 1.0,
            unlit: false,
            double_sided: false,
            additive: false,
        })
    }

    pub fn emissive(hex: &str, opacity: f32) -> Result<Self, ConfigError> {
        Ok(Self::emissive_rgb(parse_hex_color(hex)?, opacity))
    }

    pub fn emissive_rgb(color: [f32; 3], opacity: f32) -> Self {
        Self {
            color,
            roughness: 1.0,
            metalness: 0.0,
            opacity,
            unlit: true,
            double_sided: false,
            additive: false,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn additive(mut self) -> Self {
        self.additive = true;
        self
    }

    pub fn linear_color(&self) -> [f32; 3] {
        self.color.map(srgb_to_linear)
    }
}
