//! Revenue advisor against a live engine.

use super::support::{engine_with, er_catalog, KeywordProvider};
use crate::advisor::{Complexity, Compatibility, RevenueAdvisor, RevenueContext, TimeOfDay};
use crate::types::{Category, EncounterType};
use std::sync::Arc;

async fn advisor() -> RevenueAdvisor {
    let engine = engine_with(er_catalog(), Arc::new(KeywordProvider::new())).await;
    RevenueAdvisor::new(Arc::new(engine))
}

fn night_context() -> RevenueContext {
    RevenueContext {
        patient_type: "adult".to_string(),
        time_of_day: TimeOfDay::Night,
        complexity: Complexity::Moderate,
        procedures: vec!["chest tube".to_string()],
    }
}

#[tokio::test]
async fn test_optimize_night_encounter() {
    let plan = advisor().await.optimize(&night_context()).await.unwrap();

    assert_eq!(plan.primary_codes.len(), 1);
    assert_eq!(plan.primary_codes[0].code, "H152");
    assert_eq!(
        plan.primary_codes[0].reason,
        "Base assessment for moderate complexity during night hours"
    );

    let premiums: Vec<&str> = plan.premium_codes.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(premiums, vec!["E412", "E413"]);
    assert!(plan.premium_codes[0].reason.ends_with("night"));

    // H152 also matches the procedure search but is already billed.
    let add_ons: Vec<&str> = plan.add_on_codes.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(add_ons, vec!["Z107"]);
    assert_eq!(plan.add_on_codes[0].reason, "Procedure: chest tube");

    assert_eq!(plan.total_estimated_revenue, 160.0);
    assert_eq!(plan.optimization_tips.len(), 5);
}

#[tokio::test]
async fn test_optimize_regular_hours_has_no_premiums() {
    let context = RevenueContext {
        time_of_day: TimeOfDay::Regular,
        procedures: Vec::new(),
        ..night_context()
    };
    let plan = advisor().await.optimize(&context).await.unwrap();

    // H102 is not in this catalog.
    assert!(plan.primary_codes.is_empty());
    assert!(plan.premium_codes.is_empty());
    assert!(plan.add_on_codes.is_empty());
    assert_eq!(plan.total_estimated_revenue, 0.0);
}

#[tokio::test]
async fn test_search_with_context_uses_composite_query() {
    let advisor = advisor().await;
    let context = night_context();
    let result = advisor
        .engine()
        .search_with_context(&context)
        .await
        .unwrap();

    assert_eq!(result.query, "adult moderate night chest tube");
    assert!(result.expanded_query.contains("after hours"));
}

#[tokio::test]
async fn test_recommend_critical_care() {
    let recommendation = advisor()
        .await
        .recommend("critical care chest pain")
        .await
        .unwrap();

    assert_eq!(recommendation.encounter_type, EncounterType::CriticalCare);
    assert_eq!(recommendation.primary_recommendations.len(), 1);
    assert_eq!(recommendation.primary_recommendations[0].code, "G004");

    let procedures: Vec<&str> = recommendation
        .add_on_groups
        .procedures
        .iter()
        .map(|c| c.code.as_str())
        .collect();
    assert_eq!(procedures, vec!["Z107"]);
    assert!(recommendation.add_on_groups.anesthesia.is_empty());

    assert_eq!(recommendation.revenue_tips.len(), 8);
    assert!(recommendation.revenue_tips[1].contains("G005"));
    assert_eq!(recommendation.documentation_tips.len(), 4);
}

#[tokio::test]
async fn test_code_combinations() {
    let advisor = advisor().await;

    let combos = advisor.code_combinations("H152");
    let found: Vec<(&str, Compatibility)> = combos
        .iter()
        .map(|c| (c.code.as_str(), c.compatibility))
        .collect();
    assert_eq!(
        found,
        vec![("G004", Compatibility::Medium), ("Z107", Compatibility::High)]
    );

    assert!(advisor.code_combinations("X999").is_empty());
}

#[tokio::test]
async fn test_revenue_patterns() {
    let patterns = advisor().await.analyze_revenue_patterns();

    let anesthesia = patterns
        .by_category
        .iter()
        .find(|c| c.category == Category::AnesthesiaPremiums)
        .expect("premium codes counted");
    assert_eq!(anesthesia.count, 2);
    assert_eq!(anesthesia.sum, 50.0);
    assert_eq!(anesthesia.mean, 25.0);

    let top: Vec<&str> = patterns.top_codes.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(top, vec!["G004", "F005", "Z107", "H152", "E413", "E412"]);

    assert_eq!(patterns.frequency[0], (Category::AnesthesiaPremiums, 2));
    let total: usize = patterns.frequency.iter().map(|(_, n)| n).sum();
    assert_eq!(total, er_catalog().len());
}
