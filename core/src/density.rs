//! Optical density mixing model
//!
//! Linear-light RGB stands in for pigment reflectance. Taking `-ln` of the
//! reflectance gives an optical density in which subtractive mixing becomes a
//! weighted sum.

use crate::color::{LinearRgb, Rgb};
use crate::error::Result;

/// Lower bound for reflectance channels; keeps density finite for pure black
pub const REFLECTANCE_FLOOR: f64 = 1e-8;

/// Linear color clamped into `(REFLECTANCE_FLOOR, 1.0]` per channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflectance(LinearRgb);

impl Reflectance {
    pub fn from_linear(linear: LinearRgb) -> Self {
        Self(linear.clamp(REFLECTANCE_FLOOR, 1.0))
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        Ok(Self::from_linear(Rgb::from_hex(hex)?.to_linear()))
    }

    pub fn linear(&self) -> LinearRgb {
        self.0
    }

    /// Optical density `D = -ln(R)`
    pub fn to_density(&self) -> Density {
        Density(self.0.map(|c| -c.max(REFLECTANCE_FLOOR).ln()))
    }
}

/// Optical density of one ink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Density(LinearRgb);

impl Density {
    pub fn from_hex(hex: &str) -> Result<Self> {
        Ok(Reflectance::from_hex(hex)?.to_density())
    }

    pub fn value(&self) -> LinearRgb {
        self.0
    }

    /// Back to reflectance space, `R = exp(-D)`
    pub fn to_linear(&self) -> LinearRgb {
        self.0.map(|d| (-d).exp())
    }
}

/// Mix inks: `D = sum(w_i * D_i)`, then `R = exp(-D)`.
///
/// `densities` and `weights` are index-aligned.
pub fn mix(densities: &[Density], weights: &[f64]) -> LinearRgb {
    debug_assert_eq!(densities.len(), weights.len());

    let total = densities
        .iter()
        .zip(weights)
        .fold(LinearRgb::default(), |acc, (d, &w)| acc + w * d.0);

    Density(total).to_linear()
}

/// Squared error summed over the three channels
#[inline]
pub fn loss(predicted: LinearRgb, target: &Reflectance) -> f64 {
    (predicted - target.0).norm_squared()
}
