//! Rule-based query expansion.
//!
//! Rewrites a free-text clinical query into billing vocabulary using a fixed
//! phrase table. Purely lexical: nothing here embeds or scores.

use std::collections::HashSet;

/// Words already signalling a billable activity; no suffix is added if present.
const ACTIVITY_MARKERS: &[&str] = &[
    "assessment",
    "evaluation",
    "examination",
    "procedure",
    "treatment",
];
const PAIN_MARKERS: &[&str] = &["pain", "ache", "discomfort"];
const INJURY_MARKERS: &[&str] = &["fracture", "break", "cut", "wound", "laceration"];
const PAIN_SUFFIX: &str = "assessment evaluation examination";
const INJURY_SUFFIX: &str = "repair treatment procedure";

/// Shortest word or key considered for partial (substring) matching.
const MIN_PARTIAL_LEN: usize = 3;

const SYMPTOMS: &[&str] = &[
    "chest pain",
    "abdominal pain",
    "headache",
    "back pain",
    "shortness of breath",
    "dizziness",
    "nausea",
    "fever",
];

const EXPANSIONS: &[(&str, &str)] = &[
    // Injuries to procedures
    ("broken bone", "fracture reduction repair"),
    ("cut", "laceration repair suture"),
    ("wound", "laceration repair wound care"),
    ("burn", "burn treatment debridement"),
    ("sprain", "sprain treatment immobilization"),
    ("dislocation", "dislocation reduction manipulation"),
    // Conditions
    ("heart attack", "myocardial infarction cardiac emergency"),
    ("stroke", "cerebrovascular accident stroke management"),
    ("diabetes", "diabetes management glucose monitoring"),
    ("hypertension", "hypertension blood pressure management"),
    ("asthma", "asthma respiratory management"),
    ("pneumonia", "pneumonia respiratory infection"),
    // Procedures
    ("surgery", "surgical procedure operation"),
    ("suture", "suture repair laceration"),
    ("injection", "injection administration medication"),
    ("dressing", "wound dressing bandage"),
    ("splint", "splinting immobilization fracture"),
    ("cast", "casting immobilization fracture"),
    // Emergency terms
    ("emergency", "emergency department urgent critical"),
    ("trauma", "trauma injury critical care"),
    ("accident", "accident injury emergency"),
    ("urgent", "urgent emergency critical"),
    // Time of day
    ("night", "night shift after hours"),
    ("weekend", "weekend holiday premium"),
    ("holiday", "holiday weekend premium"),
    // Abbreviations
    ("mi", "myocardial infarction heart attack cardiac"),
    ("cva", "cerebrovascular accident stroke"),
    ("copd", "chronic obstructive pulmonary disease"),
    ("chf", "congestive heart failure"),
    ("uti", "urinary tract infection"),
    ("er", "emergency room department"),
    ("ed", "emergency department"),
    ("icu", "intensive care unit"),
    ("or", "operating room surgery"),
    ("pt", "physical therapy"),
    ("ot", "occupational therapy"),
];

/// Deterministic, stateless query expander.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    /// (key, expansion) in declaration order
    table: Vec<(String, String)>,

    /// Indices into `table` of multi-word keys, longest first
    phrases: Vec<usize>,
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExpander {
    /// Expander with the built-in billing vocabulary.
    pub fn new() -> Self {
        let table = SYMPTOMS
            .iter()
            .map(|s| (s.to_string(), format!("{} {}", s, PAIN_SUFFIX)))
            .chain(
                EXPANSIONS
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            )
            .collect();
        Self::with_table(table)
    }

    /// Expander with a custom table. Keys are matched lowercase.
    pub fn with_table(table: Vec<(String, String)>) -> Self {
        let table: Vec<(String, String)> = table
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        let mut phrases: Vec<usize> = table
            .iter()
            .enumerate()
            .filter(|(_, (k, _))| k.contains(' '))
            .map(|(i, _)| i)
            .collect();
        // Stable sort keeps declaration order among equal lengths.
        phrases.sort_by(|a, b| table[*b].0.len().cmp(&table[*a].0.len()));

        Self { table, phrases }
    }

    /// Expand a query into billing vocabulary.
    ///
    /// Empty or whitespace-only input yields an empty string; otherwise the
    /// output is non-empty and contains no duplicate words.
    pub fn expand(&self, query: &str) -> String {
        let normalized = query
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            return String::new();
        }

        let mut fragments: Vec<&str> = Vec::new();

        // Multi-word phrases first, on word boundaries, consuming the span.
        let mut remaining = format!(" {} ", normalized);
        for &idx in &self.phrases {
            let (phrase, expansion) = &self.table[idx];
            let pattern = format!(" {} ", phrase);
            if remaining.contains(&pattern) {
                fragments.push(expansion);
                remaining = remaining.replace(&pattern, " ");
            }
        }

        for word in remaining.split_whitespace() {
            fragments.push(self.expand_word(word));
        }

        let mut expanded = dedup_words(fragments.iter().flat_map(|f| f.split_whitespace()));

        if !ACTIVITY_MARKERS.iter().any(|m| expanded.contains(m)) {
            let suffix = if PAIN_MARKERS.iter().any(|m| expanded.contains(m)) {
                Some(PAIN_SUFFIX)
            } else if INJURY_MARKERS.iter().any(|m| expanded.contains(m)) {
                Some(INJURY_SUFFIX)
            } else {
                None
            };

            if let Some(suffix) = suffix {
                expanded = dedup_words(expanded.split_whitespace().chain(suffix.split_whitespace()));
            }
        }

        expanded
    }

    fn expand_word<'a>(&'a self, word: &'a str) -> &'a str {
        if let Some((_, expansion)) = self.table.iter().find(|(k, _)| k == word) {
            return expansion;
        }

        if word.len() >= MIN_PARTIAL_LEN {
            let partial = self.table.iter().find(|(k, _)| {
                k.len() >= MIN_PARTIAL_LEN && (word.contains(k.as_str()) || k.contains(word))
            });
            if let Some((_, expansion)) = partial {
                return expansion;
            }
        }

        word
    }
}

fn dedup_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    words
        .filter(|w| seen.insert(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand with the built-in vocabulary.
pub fn expand_query(query: &str) -> String {
    QueryExpander::new().expand(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(expand_query(""), "");
        assert_eq!(expand_query("   \t "), "");
    }

    #[test]
    fn test_broken_bone_phrase() {
        let expanded = expand_query("Broken bone");
        for token in ["fracture", "reduction", "repair"] {
            assert!(words(&expanded).contains(&token), "missing {token} in {expanded}");
        }
        // Injury suffix adds treatment/procedure.
        assert!(expanded.ends_with("treatment procedure"));
    }

    #[test]
    fn test_chest_pain_keeps_remaining_words() {
        let expanded = expand_query("critical care chest pain");
        assert_eq!(
            expanded,
            "chest pain assessment evaluation examination critical care"
        );
    }

    #[test]
    fn test_longest_phrase_wins() {
        let expander = QueryExpander::with_table(vec![
            ("back".to_string(), "posterior".to_string()),
            ("back pain".to_string(), "lumbar".to_string()),
        ]);
        let expanded = expander.expand("back pain");
        assert_eq!(expanded, "lumbar");
    }

    #[test]
    fn test_phrase_requires_word_boundary() {
        // Phrases only match whole words.
        let expander = QueryExpander::with_table(vec![(
            "heart attack".to_string(),
            "myocardial infarction".to_string(),
        )]);
        assert_eq!(expander.expand("sweetheart attacked"), "sweetheart attacked");
    }

    #[test]
    fn test_abbreviation_exact_match() {
        let expanded = expand_query("copd");
        assert_eq!(expanded, "chronic obstructive pulmonary disease");
    }

    #[test]
    fn test_substring_fallback() {
        // "sutures" has no exact key but contains "suture".
        let expanded = expand_query("sutures");
        assert_eq!(expanded, "suture repair laceration treatment procedure");
    }

    #[test]
    fn test_unknown_words_kept() {
        assert_eq!(expand_query("xylophone"), "xylophone");
    }

    #[test]
    fn test_no_duplicate_words() {
        let expanded = expand_query("wound cut laceration suture");
        let mut seen = HashSet::new();
        for w in expanded.split_whitespace() {
            assert!(seen.insert(w), "duplicate word {w} in {expanded}");
        }
    }

    #[test]
    fn test_pain_suffix_when_no_activity_words() {
        let expanded = expand_query("knee ache");
        assert!(expanded.ends_with("assessment evaluation examination"));
    }

    #[test]
    fn test_expansion_idempotent_on_duplicates() {
        for query in ["broken bone", "chest pain at night", "er trauma", "diabetes"] {
            let once = expand_query(query);
            let twice = expand_query(&once);
            let mut seen = HashSet::new();
            for w in twice.split_whitespace() {
                assert!(seen.insert(w), "duplicate {w} after re-expanding {query}");
            }
        }
    }
}
