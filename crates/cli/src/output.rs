//! Terminal rendering for command results.

use medbill_retrieval::advisor::{CodeCombination, SuggestedCode};
use medbill_retrieval::types::TimePeriod;
use medbill_retrieval::{ScoredCandidate, SearchResult};
use serde::Serialize;

/// Print any result as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_candidates(title: &str, candidates: &[ScoredCandidate]) {
    println!("{} ({})", title, candidates.len());
    if candidates.is_empty() {
        println!("  none");
    }
    for c in candidates {
        println!(
            "  {:<6} {:<50} {:>10}  score {:.2}",
            c.code,
            truncate(&c.description, 50),
            c.raw_amount,
            c.score
        );
        println!("         {}", c.relevance_explanation);
        if c.has_time_variations {
            let variants: Vec<String> = c
                .time_variations
                .iter()
                .map(|v| match &v.period {
                    TimePeriod::Regular => v.amount.clone(),
                    period => format!("{} {}", period.label(), v.amount),
                })
                .collect();
            println!("         Time variants: {}", variants.join(", "));
        }
    }
}

pub fn print_search_result(result: &SearchResult) {
    println!("Query:     {}", result.query);
    println!("Expanded:  {}", result.expanded_query);
    println!("Encounter: {} ({})", result.encounter_type, result.policy);
    println!();

    if result.is_empty() {
        println!("No billing codes matched.");
        return;
    }

    print_candidates("PRIMARY CODES", &result.primary_codes);
    println!();
    print_candidates("ADD-ON CODES", &result.add_on_codes);
    println!();

    let revenue = &result.revenue;
    println!("REVENUE");
    println!(
        "  Primary: ${:.2} across {} codes (avg ${:.2})",
        revenue.primary.sum, revenue.primary.count, revenue.primary.average
    );
    println!(
        "  Add-on:  ${:.2} across {} codes (avg ${:.2})",
        revenue.add_on.sum, revenue.add_on.count, revenue.add_on.average
    );
    println!("  Total:   ${:.2}", revenue.total);
    if revenue.variable_pricing > 0 {
        println!(
            "  Plus {} variable-priced code(s) not included in the total",
            revenue.variable_pricing
        );
    }

    if let Some(ref narrative) = result.narrative {
        println!();
        println!("{}", narrative);
    }
}

pub fn print_suggested(title: &str, codes: &[SuggestedCode]) {
    if codes.is_empty() {
        return;
    }
    println!("{}", title);
    for c in codes {
        println!(
            "  {:<6} {:<45} {:>10}  {}",
            c.code,
            truncate(&c.description, 45),
            c.amount,
            c.reason
        );
    }
    println!();
}

pub fn print_combinations(base: &str, combos: &[CodeCombination]) {
    if combos.is_empty() {
        println!("No add-on combinations found for {}", base);
        return;
    }
    println!("Codes billable with {}:", base);
    for c in combos {
        println!(
            "  {:<6} {:<50} {:>10}  {:?}",
            c.code,
            truncate(&c.description, 50),
            c.amount,
            c.compatibility
        );
    }
}

pub fn print_tips(title: &str, tips: &[String]) {
    if tips.is_empty() {
        return;
    }
    println!("{}", title);
    for tip in tips {
        println!("  - {}", tip);
    }
    println!();
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Minor assessment", 50), "Minor assessment");
        assert_eq!(truncate("Comprehensive assessment", 10), "Compreh...");
    }
}
