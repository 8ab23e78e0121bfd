//! Core types for billing-code retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing category derived from the first character of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Assessment,
    EmergencyDepartment,
    CriticalCare,
    ConsultationForms,
    AnesthesiaPremiums,
    Telemedicine,
    Procedures,
    Fractures,
    Dislocations,
    SpecializedProcedures,
    MajorProcedures,
    Obstetrics,
    Other,
}

impl Category {
    /// All categories, in prefix-table order.
    pub const ALL: [Category; 13] = [
        Category::Assessment,
        Category::EmergencyDepartment,
        Category::CriticalCare,
        Category::ConsultationForms,
        Category::AnesthesiaPremiums,
        Category::Telemedicine,
        Category::Procedures,
        Category::Fractures,
        Category::Dislocations,
        Category::SpecializedProcedures,
        Category::MajorProcedures,
        Category::Obstetrics,
        Category::Other,
    ];

    /// Map a code to its category. Unknown or empty prefixes fall back to `Other`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('A') => Category::Assessment,
            Some('H') => Category::EmergencyDepartment,
            Some('G') => Category::CriticalCare,
            Some('K') => Category::ConsultationForms,
            Some('E') => Category::AnesthesiaPremiums,
            Some('B') => Category::Telemedicine,
            Some('Z') => Category::Procedures,
            Some('F') => Category::Fractures,
            Some('D') => Category::Dislocations,
            Some('R') => Category::SpecializedProcedures,
            Some('M') => Category::MajorProcedures,
            Some('P') => Category::Obstetrics,
            _ => Category::Other,
        }
    }

    /// Display label used in explanations and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Assessment => "Assessment",
            Category::EmergencyDepartment => "Emergency Department",
            Category::CriticalCare => "Critical Care/Procedures",
            Category::ConsultationForms => "Consultation/Forms",
            Category::AnesthesiaPremiums => "Anesthesia/Premiums",
            Category::Telemedicine => "Telemedicine",
            Category::Procedures => "Procedures",
            Category::Fractures => "Fractures",
            Category::Dislocations => "Dislocations",
            Category::SpecializedProcedures => "Specialized Procedures",
            Category::MajorProcedures => "Major Procedures",
            Category::Obstetrics => "Obstetrics",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One billing code row from the catalog. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub description: String,
    pub usage_note: String,

    /// Amount text exactly as it appeared in the dataset
    pub raw_amount: String,

    /// Parsed amount; 0 when unparseable or variable-priced
    pub numeric_amount: f64,

    /// Per-unit or bonus pricing that needs manual interpretation
    pub is_variable_pricing: bool,

    pub category: Category,
}

impl CatalogEntry {
    /// Build an entry, deriving category and numeric amount.
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        usage_note: impl Into<String>,
        raw_amount: impl Into<String>,
    ) -> Self {
        let code = code.into().trim().to_string();
        let raw_amount = raw_amount.into().trim().to_string();
        let (numeric_amount, is_variable_pricing) = crate::catalog::parse_amount(&raw_amount);

        Self {
            category: Category::from_code(&code),
            code,
            description: description.into().trim().to_string(),
            usage_note: usage_note.into().trim().to_string(),
            raw_amount,
            numeric_amount,
            is_variable_pricing,
        }
    }

    /// Text fed to the embedding provider for this entry.
    pub fn searchable_text(&self) -> String {
        [
            self.code.as_str(),
            self.description.as_str(),
            self.usage_note.as_str(),
            self.raw_amount.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Time-of-day pricing band of a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "Regular hours")]
    Regular,
    #[serde(rename = "Evening")]
    Evening,
    #[serde(rename = "Night")]
    Night,
    #[serde(rename = "Weekend/Holiday")]
    WeekendHoliday,
}

impl TimePeriod {
    /// Detect the pricing band from a row description.
    pub fn detect(description: &str) -> Self {
        if description.contains("Weekend") || description.contains("Holiday") {
            TimePeriod::WeekendHoliday
        } else if description.contains("Night") {
            TimePeriod::Night
        } else if description.to_lowercase().contains("evening") || description.contains("1700") {
            TimePeriod::Evening
        } else {
            TimePeriod::Regular
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::Regular => "Regular hours",
            TimePeriod::Evening => "Evening",
            TimePeriod::Night => "Night",
            TimePeriod::WeekendHoliday => "Weekend/Holiday",
        }
    }
}

/// A sibling row sharing a code but priced for a different time band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeVariation {
    pub period: TimePeriod,
    pub description: String,
    pub amount: String,
    pub numeric_amount: f64,
}

/// A catalog code scored against one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub code: String,
    pub description: String,
    pub usage_note: String,
    pub raw_amount: String,

    /// Maximum amount across all time variants of this code
    pub numeric_amount: f64,

    pub category: Category,

    /// Cosine similarity to the combined query
    pub score: f32,

    pub relevance_explanation: String,
    pub time_variations: Vec<TimeVariation>,
    pub has_time_variations: bool,
    pub is_variable_pricing: bool,
}

impl ScoredCandidate {
    /// Candidate for a single row, without time variants or explanation.
    pub fn from_entry(entry: &CatalogEntry, score: f32) -> Self {
        Self {
            code: entry.code.clone(),
            description: entry.description.clone(),
            usage_note: entry.usage_note.clone(),
            raw_amount: entry.raw_amount.clone(),
            numeric_amount: entry.numeric_amount,
            category: entry.category,
            score,
            relevance_explanation: String::new(),
            time_variations: Vec::new(),
            has_time_variations: false,
            is_variable_pricing: entry.is_variable_pricing,
        }
    }
}

/// Classification of the encounter implied by a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterType {
    #[serde(rename = "Critical Care")]
    CriticalCare,
    #[serde(rename = "Emergency Medicine")]
    EmergencyMedicine,
    #[serde(rename = "General")]
    General,
}

impl EncounterType {
    pub fn label(&self) -> &'static str {
        match self {
            EncounterType::CriticalCare => "Critical Care",
            EncounterType::EmergencyMedicine => "Emergency Medicine",
            EncounterType::General => "General",
        }
    }
}

impl fmt::Display for EncounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which categorization policy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    CanadianHierarchy,
    ThresholdBased,
}

impl PolicyKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "canadian_hierarchy" | "canadian" => Some(PolicyKind::CanadianHierarchy),
            "threshold_based" | "threshold" => Some(PolicyKind::ThresholdBased),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::CanadianHierarchy => "canadian_hierarchy",
            PolicyKind::ThresholdBased => "threshold_based",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum, count and mean of amounts over one list of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub sum: f64,
    pub count: usize,
    pub average: f64,
}

/// Revenue split between primary and add-on codes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub primary: RevenueSummary,
    pub add_on: RevenueSummary,
    pub total: f64,
    /// Listed codes whose amount needs manual interpretation
    #[serde(default)]
    pub variable_pricing: usize,
}

/// Categorized, explained and totalled answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub expanded_query: String,
    pub encounter_type: EncounterType,
    pub policy: PolicyKind,
    pub primary_codes: Vec<ScoredCandidate>,
    pub add_on_codes: Vec<ScoredCandidate>,

    /// Number of primary codes
    pub total_primary: usize,

    /// Number of add-on codes
    pub total_add_ons: usize,

    pub revenue: RevenueBreakdown,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,

    pub generated_at: DateTime<Utc>,
}

impl SearchResult {
    /// An empty result (no catalog, empty query or nothing above threshold).
    pub fn empty(query: &str, expanded_query: String, policy: PolicyKind) -> Self {
        Self {
            query: query.to_string(),
            expanded_query,
            encounter_type: EncounterType::General,
            policy,
            primary_codes: Vec::new(),
            add_on_codes: Vec::new(),
            total_primary: 0,
            total_add_ons: 0,
            revenue: RevenueBreakdown::default(),
            narrative: None,
            generated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_codes.is_empty() && self.add_on_codes.is_empty()
    }

    /// Primary codes followed by add-on codes.
    pub fn all_codes(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.primary_codes.iter().chain(self.add_on_codes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_prefix_table() {
        assert_eq!(Category::from_code("H152"), Category::EmergencyDepartment);
        assert_eq!(Category::from_code("g004"), Category::CriticalCare);
        assert_eq!(Category::from_code("Z107"), Category::Procedures);
        assert_eq!(Category::from_code("P018"), Category::Obstetrics);
        assert_eq!(Category::from_code("X999"), Category::Other);
        assert_eq!(Category::from_code(""), Category::Other);
    }

    #[test]
    fn test_entry_derives_fields() {
        let entry = CatalogEntry::new(" G004 ", "Critical care", "", "$1,150.50");
        assert_eq!(entry.code, "G004");
        assert_eq!(entry.category, Category::CriticalCare);
        assert!((entry.numeric_amount - 1150.50).abs() < 1e-9);
        assert!(!entry.is_variable_pricing);
    }

    #[test]
    fn test_searchable_text_skips_empty_fields() {
        let entry = CatalogEntry::new("Z107", "Incision & Drainage", "", "$85.00");
        assert_eq!(entry.searchable_text(), "Z107 Incision & Drainage $85.00");
    }

    #[test]
    fn test_time_period_detection() {
        assert_eq!(TimePeriod::detect("Assessment - Weekend"), TimePeriod::WeekendHoliday);
        assert_eq!(TimePeriod::detect("Assessment - Holiday"), TimePeriod::WeekendHoliday);
        assert_eq!(TimePeriod::detect("Night assessment"), TimePeriod::Night);
        assert_eq!(TimePeriod::detect("EVENING visit"), TimePeriod::Evening);
        assert_eq!(TimePeriod::detect("Visit after 1700"), TimePeriod::Evening);
        assert_eq!(TimePeriod::detect("Minor assessment"), TimePeriod::Regular);
    }

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!(PolicyKind::parse("canadian-hierarchy"), Some(PolicyKind::CanadianHierarchy));
        assert_eq!(PolicyKind::parse("THRESHOLD"), Some(PolicyKind::ThresholdBased));
        assert_eq!(PolicyKind::parse("ranked"), None);
    }

    #[test]
    fn test_encounter_type_serializes_label() {
        let json = serde_json::to_string(&EncounterType::CriticalCare).unwrap();
        assert_eq!(json, "\"Critical Care\"");
    }
}
