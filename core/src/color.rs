//! sRGB byte colors and linear-light intensities
//!
//! Hex parsing/formatting and the standard sRGB transfer function in both
//! directions.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MixError, Result};

/// Gamma-encoded RGB color, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `#RGB` (leading `#` optional, surrounding whitespace ignored).
    pub fn from_hex(text: &str) -> Result<Self> {
        let invalid = || MixError::InvalidHexFormat(text.to_string());

        let digits = text.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);

        let expanded: String = if digits.chars().count() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };

        if expanded.len() != 6 || !expanded.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16).map_err(|_| invalid())
        };

        Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?))
    }

    /// Canonical `#RRGGBB` form with uppercase digits
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Decode to linear light
    pub fn to_linear(&self) -> LinearRgb {
        LinearRgb::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> String {
        c.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = MixError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

/// Linear-light RGB intensities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl LinearRgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Apply `f` to every channel
    #[inline]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn clamp(self, min: f64, max: f64) -> Self {
        self.map(|c| c.clamp(min, max))
    }

    /// Sum of squared channels
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.r * self.r + self.g * self.g + self.b * self.b
    }

    /// Encode back to sRGB bytes (input clamped to [0, 1] first)
    pub fn to_rgb(&self) -> Rgb {
        Rgb::new(
            linear_to_srgb(self.r),
            linear_to_srgb(self.g),
            linear_to_srgb(self.b),
        )
    }
}

impl Add for LinearRgb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Sub for LinearRgb {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul<f64> for LinearRgb {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        self.map(|c| c * k)
    }
}

impl Mul<LinearRgb> for f64 {
    type Output = LinearRgb;

    fn mul(self, v: LinearRgb) -> LinearRgb {
        v * self
    }
}

/// Convert sRGB byte to linear
#[inline]
pub fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert linear to sRGB byte
#[inline]
pub fn linear_to_srgb(c: f64) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let c = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round().clamp(0.0, 255.0) as u8
}
