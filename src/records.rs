// 📦 Sales Records - raw extract rows and the derived dataset

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// COLUMN NAMES
// ============================================================================

/// Columns every source extract must carry
pub const RAW_COLUMNS: [&str; 5] = ["date", "region", "product", "price", "quantity"];

/// Columns of the derived artifact, in output order
pub const DERIVED_COLUMNS: [&str; 3] = ["date", "region", "sales"];

// ============================================================================
// RAW SALES RECORD
// ============================================================================

/// RawSalesRecord - one row from a source extract
///
/// Fields stay as text until the clean step. Rows for other products are
/// dropped by the filter, so their values are never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSalesRecord {
    pub date: String,
    pub region: String,
    pub product: String,
    pub price: String,     // "$1.23"
    pub quantity: String,

    // Provenance
    #[serde(skip)]
    pub source_file: String,
    #[serde(skip)]
    pub line_number: usize, // Line in original file (header = 1)
}

impl RawSalesRecord {
    pub fn new(date: &str, region: &str, product: &str, price: &str, quantity: &str) -> Self {
        RawSalesRecord {
            date: date.to_string(),
            region: region.to_string(),
            product: product.to_string(),
            price: price.to_string(),
            quantity: quantity.to_string(),
            source_file: String::new(),
            line_number: 0,
        }
    }

    /// Builder pattern: attach provenance
    pub fn with_provenance(mut self, source_file: &str, line_number: usize) -> Self {
        self.source_file = source_file.to_string();
        self.line_number = line_number;
        self
    }
}

// ============================================================================
// DERIVED SALES RECORD
// ============================================================================

/// DerivedSalesRecord - one row of the consolidated dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedSalesRecord {
    pub date: NaiveDate,
    pub region: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
}

impl DerivedSalesRecord {
    pub fn new(date: NaiveDate, region: &str, sales: Decimal) -> Self {
        DerivedSalesRecord {
            date,
            region: region.to_string(),
            sales,
        }
    }
}

// ============================================================================
// REGION
// ============================================================================

/// Region - the closed set of regions seen in the extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

    /// Canonical lowercase value as stored in the dataset
    pub fn code(&self) -> &'static str {
        match self {
            Region::North => "north",
            Region::South => "south",
            Region::East => "east",
            Region::West => "west",
        }
    }

    /// Capitalized name for display
    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| format!("unknown region '{}'", s))
    }
}
