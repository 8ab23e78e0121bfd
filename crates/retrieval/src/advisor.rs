//! Revenue advice built on top of search.
//!
//! Covers encounter-context optimization, Canadian billing recommendations,
//! compatible add-on lookups and catalog-wide revenue statistics.

use crate::engine::RetrievalEngine;
use crate::types::{CatalogEntry, Category, EncounterType, ScoredCandidate};
use chrono::{Datelike, Timelike, Weekday};
use medbill_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Candidates requested per procedure when building an optimization plan.
const PROCEDURE_TOP_K: usize = 3;

/// Candidates requested when building a recommendation.
const RECOMMENDATION_TOP_K: usize = 15;

const MAX_COMBINATIONS: usize = 10;
const MAX_TOP_CODES: usize = 10;

const PREMIUM_CODES: &[&str] = &["E412", "E413"];

const OPTIMIZATION_TIPS: &[&str] = &[
    "Always bill the highest appropriate assessment level",
    "Include all applicable add-on procedures",
    "Use time-based premiums when applicable",
    "Consider special visit premiums for after-hours calls",
    "Document thoroughly to support higher-level codes",
];

const CRITICAL_CARE_REVENUE_TIPS: &[&str] = &[
    "G codes can be billed every 15 minutes for reassessments",
    "Consider G004 (first 15 min) + G005 (additional 15 min blocks)",
    "Document continuous monitoring and interventions",
    "Maximum revenue with proper time documentation",
];

const EMERGENCY_REVENUE_TIPS: &[&str] = &[
    "Use H152 for comprehensive assessments (highest value)",
    "Consider time-based premiums (night/weekend rates)",
    "Add procedure codes for any interventions performed",
    "Document complexity to support higher-level codes",
];

const GENERAL_REVENUE_TIPS: &[&str] = &[
    "Add Z codes for all procedures performed",
    "Include A codes for mental health assessments if applicable",
    "Add E codes for any anesthesia provided",
    "Use P codes for forms and consultations",
];

const CRITICAL_CARE_DOCUMENTATION: &[&str] = &[
    "Document vital signs every 15 minutes",
    "Record all interventions and responses",
    "Note exact time spent in critical care",
    "Document decision-making process",
];

const EMERGENCY_DOCUMENTATION: &[&str] = &[
    "Document comprehensive assessment findings",
    "Record time of arrival and assessment",
    "Note chief complaint and history",
    "Document physical examination findings",
];

/// When the encounter happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Regular,
    Evening,
    Night,
    Weekend,
    Holiday,
}

impl TimeOfDay {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "regular" | "day" | "daytime" => Ok(TimeOfDay::Regular),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            "weekend" => Ok(TimeOfDay::Weekend),
            "holiday" => Ok(TimeOfDay::Holiday),
            other => Err(AppError::Config(format!(
                "Unknown time of day '{}'. Expected regular, evening, night, weekend or holiday",
                other
            ))),
        }
    }

    /// Classify a timestamp: weekends first, then 17:00-24:00 evening,
    /// 00:00-08:00 night.
    pub fn from_datetime<T: Datelike + Timelike>(at: &T) -> Self {
        if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
            TimeOfDay::Weekend
        } else if at.hour() >= 17 {
            TimeOfDay::Evening
        } else if at.hour() < 8 {
            TimeOfDay::Night
        } else {
            TimeOfDay::Regular
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Regular => "regular",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
            TimeOfDay::Weekend => "weekend",
            TimeOfDay::Holiday => "holiday",
        }
    }

    pub fn is_after_hours(&self) -> bool {
        !matches!(self, TimeOfDay::Regular)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical complexity of the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Minor,
    #[default]
    Moderate,
    High,
}

impl Complexity {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "minor" | "low" => Ok(Complexity::Minor),
            "moderate" | "medium" => Ok(Complexity::Moderate),
            "high" | "complex" => Ok(Complexity::High),
            other => Err(AppError::Config(format!(
                "Unknown complexity '{}'. Expected minor, moderate or high",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Minor => "minor",
            Complexity::Moderate => "moderate",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encounter description used for revenue optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueContext {
    pub patient_type: String,
    pub time_of_day: TimeOfDay,
    pub complexity: Complexity,
    #[serde(default)]
    pub procedures: Vec<String>,
}

impl Default for RevenueContext {
    fn default() -> Self {
        Self {
            patient_type: "adult".to_string(),
            time_of_day: TimeOfDay::default(),
            complexity: Complexity::default(),
            procedures: Vec::new(),
        }
    }
}

impl RevenueContext {
    /// Query text standing in for this context when searching.
    pub fn composite_query(&self) -> String {
        let mut parts = vec![
            self.patient_type.trim().to_string(),
            self.complexity.to_string(),
            self.time_of_day.to_string(),
        ];
        parts.extend(self.procedures.iter().map(|p| p.trim().to_string()));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Base assessment code for this complexity and time band.
    pub fn base_assessment_code(&self) -> &'static str {
        match (self.time_of_day, self.complexity) {
            (TimeOfDay::Regular, Complexity::Minor) => "H101",
            (TimeOfDay::Regular, Complexity::Moderate) => "H102",
            (TimeOfDay::Regular, Complexity::High) => "H103",
            (TimeOfDay::Evening, Complexity::Minor) => "H131",
            (TimeOfDay::Evening, Complexity::Moderate) => "H132",
            (TimeOfDay::Evening, Complexity::High) => "H133",
            (_, Complexity::Minor) => "H151",
            (_, Complexity::Moderate) => "H152",
            (_, Complexity::High) => "H153",
        }
    }
}

/// A code suggested by the optimizer, with the reason it applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedCode {
    pub code: String,
    pub description: String,
    pub amount: String,
    pub numeric_amount: f64,
    pub reason: String,
}

impl SuggestedCode {
    fn new(code: &str, description: &str, amount: &str, numeric_amount: f64, reason: String) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            numeric_amount,
            reason,
        }
    }

    fn from_entry(entry: &CatalogEntry, reason: String) -> Self {
        Self::new(
            &entry.code,
            &entry.description,
            &entry.raw_amount,
            entry.numeric_amount,
            reason,
        )
    }
}

/// Billing plan for an encounter context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationPlan {
    pub context: RevenueContext,
    pub primary_codes: Vec<SuggestedCode>,
    pub premium_codes: Vec<SuggestedCode>,
    pub add_on_codes: Vec<SuggestedCode>,

    /// Base assessment plus procedure add-ons. Premiums are listed
    /// separately because their eligibility needs confirmation.
    pub total_estimated_revenue: f64,

    pub optimization_tips: Vec<String>,
}

/// Add-on codes from a recommendation, grouped by billing role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddOnGroups {
    pub procedures: Vec<ScoredCandidate>,
    pub assessments: Vec<ScoredCandidate>,
    pub anesthesia: Vec<ScoredCandidate>,
    pub forms: Vec<ScoredCandidate>,
}

/// Canadian billing recommendation for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecommendation {
    pub query: String,
    pub encounter_type: EncounterType,
    pub primary_recommendations: Vec<ScoredCandidate>,
    pub add_on_groups: AddOnGroups,
    pub revenue_tips: Vec<String>,
    pub documentation_tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compatibility {
    High,
    Medium,
}

/// An add-on code that can be billed alongside a base code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCombination {
    pub code: String,
    pub description: String,
    pub amount: String,
    pub numeric_amount: f64,
    pub compatibility: Compatibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: Category,
    pub sum: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCode {
    pub code: String,
    pub description: String,
    pub numeric_amount: f64,
}

/// Catalog-wide revenue statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePatterns {
    /// Per-category totals, in prefix-table order
    pub by_category: Vec<CategoryRevenue>,

    /// Highest-value rows
    pub top_codes: Vec<TopCode>,

    /// Row counts per category, most frequent first
    pub frequency: Vec<(Category, usize)>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Revenue-focused operations over a [`RetrievalEngine`].
#[derive(Debug, Clone)]
pub struct RevenueAdvisor {
    engine: Arc<RetrievalEngine>,
}

impl RevenueAdvisor {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    /// Build a billing plan for an encounter context.
    pub async fn optimize(&self, context: &RevenueContext) -> AppResult<OptimizationPlan> {
        let snapshot = self.engine.store().snapshot();
        let mut total = 0.0;

        let base_code = context.base_assessment_code();
        let mut primary_codes = Vec::new();
        match snapshot.rows_for_code(base_code).first() {
            Some(entry) => {
                total += entry.numeric_amount;
                primary_codes.push(SuggestedCode::from_entry(
                    entry,
                    format!(
                        "Base assessment for {} complexity during {} hours",
                        context.complexity, context.time_of_day
                    ),
                ));
            }
            None => tracing::warn!("Base assessment code {} is not in the catalog", base_code),
        }

        let mut premium_codes = Vec::new();
        if context.time_of_day.is_after_hours() {
            for code in PREMIUM_CODES {
                premium_codes.extend(snapshot.rows_for_code(code).into_iter().map(|entry| {
                    SuggestedCode::from_entry(
                        entry,
                        format!("After hours premium for {}", context.time_of_day),
                    )
                }));
            }
        }

        let mut add_on_codes = Vec::new();
        let mut seen: HashSet<String> = primary_codes.iter().map(|c| c.code.clone()).collect();
        for procedure in context.procedures.iter().filter(|p| !p.trim().is_empty()) {
            let result = self.engine.search_top_k(procedure, PROCEDURE_TOP_K).await?;

            let mut found: Vec<&ScoredCandidate> = result
                .all_codes()
                .filter(|c| c.numeric_amount > 0.0)
                .collect();
            found.sort_by(|a, b| b.score.total_cmp(&a.score));

            for candidate in found.into_iter().take(PROCEDURE_TOP_K) {
                if !seen.insert(candidate.code.clone()) {
                    continue;
                }
                total += candidate.numeric_amount;
                add_on_codes.push(SuggestedCode::new(
                    &candidate.code,
                    &candidate.description,
                    &candidate.raw_amount,
                    candidate.numeric_amount,
                    format!("Procedure: {}", procedure.trim()),
                ));
            }
        }

        tracing::info!(
            "Optimization plan: {} primary, {} premium, {} add-on, ${:.2} estimated",
            primary_codes.len(),
            premium_codes.len(),
            add_on_codes.len(),
            total
        );

        Ok(OptimizationPlan {
            context: context.clone(),
            primary_codes,
            premium_codes,
            add_on_codes,
            total_estimated_revenue: total,
            optimization_tips: to_strings(OPTIMIZATION_TIPS),
        })
    }

    /// Canadian billing recommendation: up to two primary codes, grouped
    /// add-ons and tips for the encounter type.
    pub async fn recommend(&self, query: &str) -> AppResult<BillingRecommendation> {
        let result = self.engine.search_top_k(query, RECOMMENDATION_TOP_K).await?;

        let group = |categories: &[Category], limit: usize| -> Vec<ScoredCandidate> {
            result
                .add_on_codes
                .iter()
                .filter(|c| categories.contains(&c.category))
                .take(limit)
                .cloned()
                .collect()
        };

        let add_on_groups = AddOnGroups {
            procedures: group(&[Category::Procedures], 5),
            assessments: group(&[Category::Assessment], 3),
            anesthesia: group(&[Category::AnesthesiaPremiums], 3),
            forms: group(&[Category::ConsultationForms, Category::Obstetrics], 3),
        };

        Ok(BillingRecommendation {
            query: query.to_string(),
            encounter_type: result.encounter_type,
            primary_recommendations: result.primary_codes.iter().take(2).cloned().collect(),
            add_on_groups,
            revenue_tips: revenue_tips(result.encounter_type),
            documentation_tips: documentation_tips(result.encounter_type),
        })
    }

    /// Add-on codes compatible with `base_code`; empty if the code is unknown.
    pub fn code_combinations(&self, base_code: &str) -> Vec<CodeCombination> {
        let snapshot = self.engine.store().snapshot();
        if snapshot.rows_for_code(base_code.trim()).is_empty() {
            return Vec::new();
        }

        snapshot
            .entries()
            .iter()
            .filter(|e| {
                matches!(e.category, Category::Procedures | Category::CriticalCare)
                    && e.numeric_amount > 0.0
            })
            .take(MAX_COMBINATIONS)
            .map(|e| CodeCombination {
                code: e.code.clone(),
                description: e.description.clone(),
                amount: e.raw_amount.clone(),
                numeric_amount: e.numeric_amount,
                compatibility: if e.category == Category::Procedures {
                    Compatibility::High
                } else {
                    Compatibility::Medium
                },
            })
            .collect()
    }

    /// Revenue statistics over every catalog row.
    pub fn analyze_revenue_patterns(&self) -> RevenuePatterns {
        let snapshot = self.engine.store().snapshot();
        let entries = snapshot.entries();

        let mut totals: HashMap<Category, (f64, usize)> = HashMap::new();
        for entry in entries {
            let slot = totals.entry(entry.category).or_insert((0.0, 0));
            slot.0 += entry.numeric_amount;
            slot.1 += 1;
        }

        let by_category: Vec<CategoryRevenue> = Category::ALL
            .iter()
            .filter_map(|category| {
                totals.get(category).map(|(sum, count)| CategoryRevenue {
                    category: *category,
                    sum: round2(*sum),
                    mean: round2(sum / *count as f64),
                    count: *count,
                })
            })
            .collect();

        let mut ranked: Vec<&CatalogEntry> = entries.iter().collect();
        ranked.sort_by(|a, b| b.numeric_amount.total_cmp(&a.numeric_amount));
        let top_codes = ranked
            .into_iter()
            .take(MAX_TOP_CODES)
            .map(|e| TopCode {
                code: e.code.clone(),
                description: e.description.clone(),
                numeric_amount: e.numeric_amount,
            })
            .collect();

        let mut frequency: Vec<(Category, usize)> = by_category
            .iter()
            .map(|c| (c.category, c.count))
            .collect();
        frequency.sort_by(|a, b| b.1.cmp(&a.1));

        RevenuePatterns {
            by_category,
            top_codes,
            frequency,
        }
    }
}

/// Revenue tips for an encounter type; general tips always follow.
pub fn revenue_tips(encounter_type: EncounterType) -> Vec<String> {
    let specific: &[&str] = match encounter_type {
        EncounterType::CriticalCare => CRITICAL_CARE_REVENUE_TIPS,
        EncounterType::EmergencyMedicine => EMERGENCY_REVENUE_TIPS,
        EncounterType::General => &[],
    };
    specific
        .iter()
        .chain(GENERAL_REVENUE_TIPS)
        .map(|s| s.to_string())
        .collect()
}

/// Documentation requirements for an encounter type.
pub fn documentation_tips(encounter_type: EncounterType) -> Vec<String> {
    match encounter_type {
        EncounterType::CriticalCare => to_strings(CRITICAL_CARE_DOCUMENTATION),
        EncounterType::EmergencyMedicine => to_strings(EMERGENCY_DOCUMENTATION),
        EncounterType::General => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_composite_query() {
        let context = RevenueContext {
            patient_type: "pediatric".to_string(),
            time_of_day: TimeOfDay::Night,
            complexity: Complexity::High,
            procedures: vec!["laceration repair".to_string(), " ".to_string()],
        };
        assert_eq!(context.composite_query(), "pediatric high night laceration repair");
    }

    #[test]
    fn test_base_code_table() {
        let mut context = RevenueContext::default();
        assert_eq!(context.base_assessment_code(), "H102");

        context.time_of_day = TimeOfDay::Evening;
        context.complexity = Complexity::Minor;
        assert_eq!(context.base_assessment_code(), "H131");

        for time in [TimeOfDay::Night, TimeOfDay::Weekend, TimeOfDay::Holiday] {
            context.time_of_day = time;
            context.complexity = Complexity::High;
            assert_eq!(context.base_assessment_code(), "H153");
        }
    }

    #[test]
    fn test_time_of_day_from_datetime() {
        // 2025-03-04 is a Tuesday, 2025-03-08 a Saturday.
        let tuesday = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();

        let at = |d: NaiveDate, h: u32| d.and_hms_opt(h, 30, 0).unwrap();
        assert_eq!(TimeOfDay::from_datetime(&at(tuesday, 10)), TimeOfDay::Regular);
        assert_eq!(TimeOfDay::from_datetime(&at(tuesday, 19)), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_datetime(&at(tuesday, 3)), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_datetime(&at(saturday, 10)), TimeOfDay::Weekend);
    }

    #[test]
    fn test_parse_context_fields() {
        assert_eq!(TimeOfDay::parse("Evening").unwrap(), TimeOfDay::Evening);
        assert!(TimeOfDay::parse("dusk").is_err());
        assert_eq!(Complexity::parse("HIGH").unwrap(), Complexity::High);
        assert!(Complexity::parse("extreme").is_err());
    }

    #[test]
    fn test_tips_by_encounter_type() {
        let critical = revenue_tips(EncounterType::CriticalCare);
        assert_eq!(critical.len(), 8);
        assert!(critical[0].contains("every 15 minutes"));

        let general = revenue_tips(EncounterType::General);
        assert_eq!(general.len(), 4);
        assert!(documentation_tips(EncounterType::General).is_empty());
        assert_eq!(documentation_tips(EncounterType::EmergencyMedicine).len(), 4);
    }
}
