//! Human-readable relevance explanations.
//!
//! An explanation is a fixed-order list of fragments joined by
//! [`SEPARATOR`]: score band, concept matches, category note, revenue note,
//! query-context note. Fragments that do not apply are omitted.

use crate::types::{Category, ScoredCandidate};

pub const SEPARATOR: &str = " | ";

const HIGH_RELEVANCE: f32 = 0.7;
const GOOD_MATCH: f32 = 0.5;
const HIGH_VALUE: f64 = 100.0;
const GOOD_VALUE: f64 = 50.0;

/// Concept buckets: a bucket matches when both the query and the code text
/// mention one of its terms.
const CONCEPTS: &[(&str, &[&str])] = &[
    ("chest", &["chest", "thoracic", "cardiac", "heart", "lung"]),
    ("pain", &["pain", "ache", "discomfort", "sore"]),
    (
        "assessment",
        &["assessment", "evaluation", "examination", "consultation"],
    ),
    ("fracture", &["fracture", "break", "bone", "injury"]),
    ("laceration", &["laceration", "cut", "wound", "repair"]),
    ("emergency", &["emergency", "urgent", "acute", "critical"]),
    ("anesthesia", &["anesthesia", "sedation", "numbing"]),
    (
        "procedure",
        &["procedure", "surgery", "operation", "intervention"],
    ),
];

fn score_band(score: f32) -> &'static str {
    if score > HIGH_RELEVANCE {
        "High Relevance: closely matches the search terms"
    } else if score > GOOD_MATCH {
        "Good Match: relevant to the search"
    } else {
        "Related: somewhat related to the search"
    }
}

fn category_note(category: Category) -> Option<&'static str> {
    match category {
        Category::Assessment => {
            Some("Assessment Code: used for patient evaluations and examinations")
        }
        Category::EmergencyDepartment => Some(
            "ER Code: for emergency department visits; rates vary by time of day",
        ),
        Category::CriticalCare => {
            Some("Critical Care: life-threatening conditions requiring immediate intervention")
        }
        Category::Procedures => Some("Procedure Code: surgical or medical procedures"),
        Category::Fractures => Some("Fracture Management: bone injury treatment"),
        Category::Dislocations => Some("Joint Care: joint dislocation treatment"),
        Category::AnesthesiaPremiums => Some("Anesthesia: sedation and pain management"),
        Category::ConsultationForms => {
            Some("Documentation: consultations and administrative tasks")
        }
        _ => None,
    }
}

fn revenue_note(amount: f64) -> Option<&'static str> {
    if amount > HIGH_VALUE {
        Some("High Value: significant revenue potential")
    } else if amount > GOOD_VALUE {
        Some("Good Value: decent revenue")
    } else {
        None
    }
}

fn context_note(query: &str, candidate: &ScoredCandidate) -> Option<&'static str> {
    if query.contains("emergency") && candidate.category == Category::EmergencyDepartment {
        Some("ER Context: suited to emergency department billing")
    } else if query.contains("procedure") && candidate.category == Category::Procedures {
        Some("Procedure Context: suited to surgical or medical procedures")
    } else if query.contains("assessment") && candidate.category == Category::Assessment {
        Some("Assessment Context: suited to patient assessments")
    } else {
        None
    }
}

/// Concept buckets shared by the query and the candidate text, in bucket order.
pub fn concept_matches(query: &str, candidate_text: &str) -> Vec<&'static str> {
    let query = query.to_lowercase();
    let text = candidate_text.to_lowercase();

    CONCEPTS
        .iter()
        .filter(|(_, terms)| {
            terms.iter().any(|t| query.contains(t)) && terms.iter().any(|t| text.contains(t))
        })
        .map(|(name, _)| *name)
        .collect()
}

/// Explain why `candidate` was returned for `query`.
pub fn explain(query: &str, candidate: &ScoredCandidate) -> String {
    let query_lower = query.to_lowercase();
    let candidate_text = format!("{} {}", candidate.description, candidate.usage_note);

    let mut fragments: Vec<String> = vec![score_band(candidate.score).to_string()];

    let matches = concept_matches(&query_lower, &candidate_text);
    if !matches.is_empty() {
        fragments.push(format!("Key Matches: {}", matches.join(", ")));
    }

    fragments.extend(
        [
            category_note(candidate.category),
            revenue_note(candidate.numeric_amount),
            context_note(&query_lower, candidate),
        ]
        .into_iter()
        .flatten()
        .map(str::to_string),
    );

    fragments.join(SEPARATOR)
}
