//! Billing-code catalog loading.
//!
//! Reads a CSV dataset into [`CatalogEntry`] records through an explicit
//! column mapping. Header names are matched case-insensitively and ignoring
//! punctuation, so `Code`, `code` and `CODE` all resolve to the code column.

use crate::types::CatalogEntry;
use csv::{ReaderBuilder, StringRecord};
use medbill_core::{AppError, AppResult};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

static AMOUNT_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());
static VARIABLE_PRICING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:per|bonus)\b").ok());

const CODE_ALIASES: &[&str] = &["code", "billing_code", "fee_code"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "desc"];
const AMOUNT_ALIASES: &[&str] = &["amount", "amount ($cad)", "amount_cad", "fee"];
const USAGE_ALIASES: &[&str] = &["how to use", "how_to_use", "usage", "usage_note"];

/// Parse a currency string into `(amount, is_variable_pricing)`.
///
/// Currency symbols and thousands separators are stripped and the first
/// decimal number is taken. Text with the word "per" or "bonus" describes
/// variable pricing: the amount is 0 and the flag is set.
pub fn parse_amount(raw: &str) -> (f64, bool) {
    let cleaned = raw.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return (0.0, false);
    }

    let variable = VARIABLE_PRICING
        .as_ref()
        .is_some_and(|re| re.is_match(cleaned));
    if variable {
        return (0.0, true);
    }

    let amount = AMOUNT_NUMBER
        .as_ref()
        .and_then(|re| re.find(cleaned))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0);
    (amount, false)
}

fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find_header(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
    aliases.iter().find_map(|alias| {
        let target = normalize_header(alias);
        normalized.iter().position(|h| *h == target)
    })
}

fn field(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
}

/// Resolved positions of the catalog columns in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: usize,
    pub description: usize,
    pub amount: Option<usize>,
    pub usage: Option<usize>,
}

impl ColumnMap {
    /// Map dataset headers onto the catalog schema.
    ///
    /// Code and description are required; amount and usage are optional.
    pub fn from_headers(headers: &StringRecord) -> AppResult<Self> {
        let code = find_header(headers, CODE_ALIASES).ok_or_else(|| {
            AppError::DataLoad(format!(
                "Dataset has no code column (expected one of: {})",
                CODE_ALIASES.join(", ")
            ))
        })?;
        let description = find_header(headers, DESCRIPTION_ALIASES).ok_or_else(|| {
            AppError::DataLoad(format!(
                "Dataset has no description column (expected one of: {})",
                DESCRIPTION_ALIASES.join(", ")
            ))
        })?;

        let amount = find_header(headers, AMOUNT_ALIASES);
        if amount.is_none() {
            tracing::warn!("Dataset has no amount column; all amounts will be 0");
        }

        Ok(Self {
            code,
            description,
            amount,
            usage: find_header(headers, USAGE_ALIASES),
        })
    }
}

/// Load the catalog from a CSV file.
pub fn load_catalog(path: &Path) -> AppResult<Vec<CatalogEntry>> {
    let file = std::fs::File::open(path).map_err(|e| {
        AppError::DataLoad(format!("Failed to open catalog {}: {}", path.display(), e))
    })?;

    let entries = load_catalog_from_reader(file)?;
    tracing::info!(
        "Loaded {} catalog entries from {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

/// Load the catalog from any CSV source.
pub fn load_catalog_from_reader<R: Read>(reader: R) -> AppResult<Vec<CatalogEntry>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::DataLoad(format!("Failed to read catalog headers: {}", e)))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut entries = Vec::new();
    let mut dropped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::DataLoad(format!("Malformed catalog row {}: {}", line + 2, e))
        })?;

        let code = field(&record, Some(columns.code));
        let description = field(&record, Some(columns.description));
        if code.is_empty() || description.is_empty() {
            dropped += 1;
            continue;
        }

        entries.push(CatalogEntry::new(
            code,
            description,
            field(&record, columns.usage),
            field(&record, columns.amount),
        ));
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} catalog rows missing a code or description", dropped);
    }

    Ok(entries)
}
