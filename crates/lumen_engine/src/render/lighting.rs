//! Light parameters
//!
//! Plain data describing lights. The light components in
//! [`crate::components::lights`] register these with the shared registry, and
//! the rendering engine resolves them into [`ActiveLight`]s (parameters plus
//! world-space position and direction) for each accumulation pass.

use thiserror::Error;

use crate::foundation::math::Vec3;

/// Number of representable intensity steps used to derive a point light's range
pub const COLOR_DEPTH: f32 = 65_536.0;

/// Range given to point lights built from hex colours
pub const DEFAULT_HEX_RANGE: f32 = 1000.0;

/// Light construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LightError {
    /// Hex colour was not `#rgb` or `#rrggbb`
    #[error("Invalid hex color '{0}': expected #rgb or #rrggbb")]
    InvalidHexColor(String),
}

/// Kind of light; selects the shader of its accumulation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Parallel rays
    Directional,
    /// Radiates from a position
    Point,
    /// Cone from a position
    Spot,
}

/// Colour and intensity shared by every light kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseLight {
    /// Linear RGB in `[0, 1]`
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl BaseLight {
    /// Create a base light.
    ///
    /// Channels above 1 are read as 0-255 values and rescaled.
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color: color.map(|c| if c > 1.0 { c / 255.0 } else { c }),
            intensity,
        }
    }

    /// Create a base light from `#rgb` or `#rrggbb`
    pub fn from_hex(hex: &str, intensity: f32) -> Result<Self, LightError> {
        Ok(Self {
            color: parse_hex_color(hex)?,
            intensity,
        })
    }
}

fn parse_hex_color(hex: &str) -> Result<Vec3, LightError> {
    let invalid = || LightError::InvalidHexColor(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|_| invalid())
    };
    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Quadratic falloff `constant + linear * d + exponent * d^2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    /// Constant term
    pub constant: f32,
    /// Linear term
    pub linear: f32,
    /// Quadratic term
    pub exponent: f32,
}

impl Attenuation {
    /// Create an attenuation
    pub fn new(constant: f32, linear: f32, exponent: f32) -> Self {
        Self { constant, linear, exponent }
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Distance beyond which a point light contributes less than one colour step.
///
/// Solves `exponent * d^2 + linear * d + (constant - COLOR_DEPTH * intensity * max_channel) = 0`.
pub fn point_light_range(base: &BaseLight, attenuation: &Attenuation) -> f32 {
    let a = attenuation.exponent;
    let b = attenuation.linear;
    let c = attenuation.constant - COLOR_DEPTH * base.intensity * base.color.max();

    if a.abs() <= f32::EPSILON {
        return if b > f32::EPSILON { -c / b } else { DEFAULT_HEX_RANGE };
    }
    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    ((-b + discriminant.sqrt()) / (2.0 * a)).max(0.0)
}

/// Point light parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointParams {
    /// Colour and intensity
    pub base: BaseLight,
    /// Falloff
    pub attenuation: Attenuation,
    /// Cut-off distance
    pub range: f32,
}

impl PointParams {
    /// Point light whose range is derived from its falloff
    pub fn new(base: BaseLight, attenuation: Attenuation) -> Self {
        Self {
            base,
            attenuation,
            range: point_light_range(&base, &attenuation),
        }
    }
}

/// Parameters of a registered light
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightParams {
    /// Directional light
    Directional {
        /// Colour and intensity
        base: BaseLight,
    },
    /// Point light
    Point(PointParams),
    /// Spot light
    Spot {
        /// Point light part
        point: PointParams,
        /// Cosine of the cone half-angle
        cutoff: f32,
    },
}

impl LightParams {
    /// Light kind
    pub fn kind(&self) -> LightKind {
        match self {
            Self::Directional { .. } => LightKind::Directional,
            Self::Point(_) => LightKind::Point,
            Self::Spot { .. } => LightKind::Spot,
        }
    }

    /// Colour and intensity
    pub fn base(&self) -> &BaseLight {
        match self {
            Self::Directional { base } => base,
            Self::Point(point) | Self::Spot { point, .. } => &point.base,
        }
    }
}

/// Light resolved for one accumulation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveLight {
    /// Parameters
    pub params: LightParams,
    /// World-space position of the light's node
    pub position: Vec3,
    /// World-space forward axis of the light's node
    pub direction: Vec3,
}
