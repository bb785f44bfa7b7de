pub mod sheets;

use serde::Serialize;
use thiserror::Error;

use crate::config::ColumnMapping;

/// Stock at or below this count is "low stock"
pub const LOW_STOCK_THRESHOLD: u32 = 5;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("HTTP error! status: {status}")]
    Fetch { status: u16 },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No data found in spreadsheet")]
    EmptyData,

    #[error("column '{column}' header mismatch: expected '{expected}', found '{found}'")]
    Schema {
        column: &'static str,
        expected: String,
        found: String,
    },

    #[error("missing {0}")]
    MissingCredentials(&'static str),

    #[error("fetch task ended without a result")]
    Interrupted,
}

impl InventoryError {
    /// Non-success status or transport failure
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, InventoryError::Fetch { .. } | InventoryError::Network(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub url: String,
    pub current_stock: u32,
    pub image: String,
    pub incoming_stock: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Low,
    Medium,
    High,
}

impl StockLevel {
    pub fn from_count(stock: u32) -> Self {
        match stock {
            0 => StockLevel::Low,
            s if s <= LOW_STOCK_THRESHOLD => StockLevel::Medium,
            _ => StockLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Low => "low",
            StockLevel::Medium => "medium",
            StockLevel::High => "high",
        }
    }
}

impl Product {
    pub fn total_available(&self) -> u64 {
        u64::from(self.current_stock) + u64::from(self.incoming_stock)
    }

    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_count(self.current_stock)
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= LOW_STOCK_THRESHOLD
    }

    /// Case-insensitive substring match on sku or name. `needle` must already be lower-cased.
    fn matches(&self, needle: &str) -> bool {
        self.sku.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub low_stock: usize,
}

impl InventoryStats {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        products.into_iter().fold(Self::default(), |mut stats, p| {
            stats.total += 1;
            if p.is_low_stock() {
                stats.low_stock += 1;
            }
            stats
        })
    }
}

/// Trim and lower-case a raw search input
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Indices into `catalog` of every product matching `raw`, in catalog order
pub fn filter_indices(catalog: &[Product], raw: &str) -> Vec<usize> {
    let needle = normalize_term(raw);
    catalog
        .iter()
        .enumerate()
        .filter(|(_, p)| needle.is_empty() || p.matches(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// Lenient integer parse: optional sign, optional `0x` prefix, then leading digits.
/// Anything after the digits is ignored. No digits gives 0, negatives clamp to 0,
/// overflow saturates.
pub fn parse_stock(cell: &str) -> u32 {
    let s = cell.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, rest) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() || negative {
        return 0;
    }

    u32::from_str_radix(digits, radix).unwrap_or(u32::MAX)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Map one data row through the column mapping
pub fn product_from_row(row: &[String], columns: &ColumnMapping) -> Product {
    Product {
        sku: cell(row, columns.sku).to_string(),
        name: cell(row, columns.name).to_string(),
        url: cell(row, columns.url).to_string(),
        current_stock: parse_stock(cell(row, columns.current_stock)),
        image: cell(row, columns.image).to_string(),
        incoming_stock: parse_stock(cell(row, columns.incoming_stock)),
    }
}

/// Compare the header row against expected labels (field order). Empty `expected` skips the check,
/// otherwise it must name every field.
pub fn validate_header(
    header: &[String],
    columns: &ColumnMapping,
    expected: &[String],
) -> Result<(), InventoryError> {
    if expected.is_empty() {
        return Ok(());
    }

    let fields = columns.fields();
    if expected.len() != fields.len() {
        return Err(InventoryError::Schema {
            column: "expected_headers",
            expected: format!("{} labels", fields.len()),
            found: format!("{} labels", expected.len()),
        });
    }

    for (&(field, idx), label) in columns.fields().iter().zip(expected) {
        let found = cell(header, idx).trim();
        if !found.eq_ignore_ascii_case(label.trim()) {
            return Err(InventoryError::Schema {
                column: field,
                expected: label.clone(),
                found: found.to_string(),
            });
        }
    }
    Ok(())
}

/// Build the catalog from raw sheet rows (header first)
pub fn build_catalog(
    rows: &[Vec<String>],
    columns: &ColumnMapping,
    expected_headers: &[String],
) -> Result<Vec<Product>, InventoryError> {
    let (header, data) = match rows.split_first() {
        Some((header, data)) if !data.is_empty() => (header, data),
        _ => return Err(InventoryError::EmptyData),
    };

    validate_header(header, columns, expected_headers)?;

    Ok(data
        .iter()
        .map(|row| product_from_row(row, columns))
        .collect())
}
