//! Built-in ink catalog
//!
//! A small read-only set of stock and brand inks clients can pick from.
//! Entries are kept in memory; editing and persistence live elsewhere.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where an ink comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InkCategory {
    /// Generic primaries
    Standard,
    /// A specific manufacturer's ink
    Company,
}

/// A named ink with its display color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InkEntry {
    pub category: InkCategory,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// `#RRGGBB`
    pub hex: String,
}

impl InkEntry {
    fn standard(name: &str, hex: &str) -> Self {
        Self {
            category: InkCategory::Standard,
            name: name.to_string(),
            brand: None,
            hex: hex.to_string(),
        }
    }

    fn company(brand: &str, name: &str, hex: &str) -> Self {
        Self {
            category: InkCategory::Company,
            name: name.to_string(),
            brand: Some(brand.to_string()),
            hex: hex.to_string(),
        }
    }
}

/// Stock inks
pub fn default_entries() -> Vec<InkEntry> {
    vec![
        InkEntry::standard("Red", "#D81B1B"),
        InkEntry::standard("Green", "#1BBE4B"),
        InkEntry::standard("Blue", "#1B4FD8"),
        InkEntry::standard("Black", "#101010"),
        InkEntry::standard("White", "#FFFFFF"),
        InkEntry::company("World Famous Limitless", "Red 1", "#A40504"),
        InkEntry::company("Platinum by Dynamic", "Red Grape", "#D81E86"),
        InkEntry::company("Kuro Sumi Imperial", "Pine Green", "#0B5834"),
    ]
}

/// In-memory catalog served at `/palette`
pub struct Catalog {
    entries: Vec<InkEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<InkEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[InkEntry] {
        &self.entries
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_entries())
    }
}
