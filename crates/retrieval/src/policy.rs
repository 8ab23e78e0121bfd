//! Categorization policies: splitting candidates into primary and add-on codes.

use crate::config::ThresholdConfig;
use crate::types::{Category, EncounterType, PolicyKind, ScoredCandidate};

/// Candidates split by a policy. Both lists are sorted by descending score.
#[derive(Debug, Clone)]
pub struct Categorization {
    pub encounter_type: EncounterType,
    pub primary: Vec<ScoredCandidate>,
    pub add_on: Vec<ScoredCandidate>,
}

/// How candidates are split into primary and add-on codes.
#[derive(Debug, Clone, PartialEq)]
pub enum CategorizationPolicy {
    /// Critical Care (G) codes outrank Emergency (H) codes, which outrank a
    /// plain score cutoff. At most `primary_cap` codes from the winning
    /// prefix group become primary.
    CanadianHierarchy {
        primary_cap: usize,
        fallback_cutoff: f32,
    },

    /// Any code scoring above `cutoff`, or any Assessment or Emergency code,
    /// is primary. No cap.
    ThresholdBased { cutoff: f32 },
}

impl CategorizationPolicy {
    pub fn from_config(kind: PolicyKind, thresholds: &ThresholdConfig) -> Self {
        match kind {
            PolicyKind::CanadianHierarchy => CategorizationPolicy::CanadianHierarchy {
                primary_cap: thresholds.primary_cap,
                fallback_cutoff: thresholds.fallback_cutoff,
            },
            PolicyKind::ThresholdBased => CategorizationPolicy::ThresholdBased {
                cutoff: thresholds.primary_cutoff,
            },
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            CategorizationPolicy::CanadianHierarchy { .. } => PolicyKind::CanadianHierarchy,
            CategorizationPolicy::ThresholdBased { .. } => PolicyKind::ThresholdBased,
        }
    }

    /// Split deduplicated candidates into primary and add-on codes.
    pub fn categorize(&self, mut candidates: Vec<ScoredCandidate>) -> Categorization {
        sort_by_score(&mut candidates);
        let encounter_type = encounter_type_for(&candidates);

        let (mut primary, mut add_on): (Vec<_>, Vec<_>) = match self {
            CategorizationPolicy::CanadianHierarchy {
                primary_cap,
                fallback_cutoff,
            } => {
                let group = match encounter_type {
                    EncounterType::CriticalCare => Some(Category::CriticalCare),
                    EncounterType::EmergencyMedicine => Some(Category::EmergencyDepartment),
                    EncounterType::General => None,
                };

                match group {
                    Some(group) => {
                        let mut taken = 0;
                        candidates.into_iter().partition(|c| {
                            let is_primary = c.category == group && taken < *primary_cap;
                            if is_primary {
                                taken += 1;
                            }
                            is_primary
                        })
                    }
                    None => candidates
                        .into_iter()
                        .partition(|c| c.score > *fallback_cutoff),
                }
            }
            CategorizationPolicy::ThresholdBased { cutoff } => {
                candidates.into_iter().partition(|c| {
                    c.score > *cutoff
                        || matches!(
                            c.category,
                            Category::Assessment | Category::EmergencyDepartment
                        )
                })
            }
        };

        sort_by_score(&mut primary);
        sort_by_score(&mut add_on);

        Categorization {
            encounter_type,
            primary,
            add_on,
        }
    }
}

/// Critical Care if any G code is present, else Emergency Medicine if any H
/// code is present, else General.
pub fn encounter_type_for(candidates: &[ScoredCandidate]) -> EncounterType {
    if candidates
        .iter()
        .any(|c| c.category == Category::CriticalCare)
    {
        EncounterType::CriticalCare
    } else if candidates
        .iter()
        .any(|c| c.category == Category::EmergencyDepartment)
    {
        EncounterType::EmergencyMedicine
    } else {
        EncounterType::General
    }
}

fn sort_by_score(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogEntry;

    fn candidate(code: &str, score: f32) -> ScoredCandidate {
        ScoredCandidate::from_entry(&CatalogEntry::new(code, "desc", "", "$10.00"), score)
    }

    fn codes(list: &[ScoredCandidate]) -> Vec<&str> {
        list.iter().map(|c| c.code.as_str()).collect()
    }

    fn canadian() -> CategorizationPolicy {
        CategorizationPolicy::from_config(PolicyKind::CanadianHierarchy, &ThresholdConfig::default())
    }

    fn threshold() -> CategorizationPolicy {
        CategorizationPolicy::from_config(PolicyKind::ThresholdBased, &ThresholdConfig::default())
    }

    #[test]
    fn test_critical_care_beats_emergency() {
        let result = canadian().categorize(vec![
            candidate("H152", 0.95),
            candidate("G004", 0.40),
            candidate("G005", 0.35),
            candidate("G010", 0.30),
            candidate("Z107", 0.50),
        ]);

        assert_eq!(result.encounter_type, EncounterType::CriticalCare);
        assert_eq!(codes(&result.primary), vec!["G004", "G005"]);
        assert_eq!(codes(&result.add_on), vec!["H152", "Z107", "G010"]);
    }

    #[test]
    fn test_emergency_when_no_critical_care() {
        let result = canadian().categorize(vec![
            candidate("A007", 0.9),
            candidate("H102", 0.3),
            candidate("H152", 0.6),
            candidate("H131", 0.2),
        ]);

        assert_eq!(result.encounter_type, EncounterType::EmergencyMedicine);
        assert_eq!(codes(&result.primary), vec!["H152", "H102"]);
        assert_eq!(codes(&result.add_on), vec!["A007", "H131"]);
    }

    #[test]
    fn test_general_uses_fallback_cutoff() {
        let result = canadian().categorize(vec![
            candidate("Z107", 0.31),
            candidate("A007", 0.30),
            candidate("E412", 0.9),
        ]);

        assert_eq!(result.encounter_type, EncounterType::General);
        assert_eq!(codes(&result.primary), vec!["E412", "Z107"]);
        assert_eq!(codes(&result.add_on), vec!["A007"]);
    }

    #[test]
    fn test_threshold_policy_has_no_cap() {
        let result = threshold().categorize(vec![
            candidate("H101", 0.1),
            candidate("H102", 0.2),
            candidate("H103", 0.3),
            candidate("A007", 0.05),
            candidate("Z107", 0.61),
            candidate("Z108", 0.59),
            candidate("G004", 0.4),
        ]);

        assert_eq!(result.encounter_type, EncounterType::CriticalCare);
        assert_eq!(codes(&result.primary), vec!["Z107", "H103", "H102", "H101", "A007"]);
        assert_eq!(codes(&result.add_on), vec!["Z108", "G004"]);
    }

    #[test]
    fn test_empty_candidates() {
        let result = canadian().categorize(Vec::new());
        assert_eq!(result.encounter_type, EncounterType::General);
        assert!(result.primary.is_empty());
        assert!(result.add_on.is_empty());
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(canadian().kind(), PolicyKind::CanadianHierarchy);
        assert_eq!(threshold().kind(), PolicyKind::ThresholdBased);
    }
}
