//! Built-in sample catalog for when no dataset is available.

use medbill_retrieval::CatalogEntry;

const SAMPLE: &[(&str, &str, &str)] = &[
    ("H152", "Comprehensive Assessment", "$75.00"),
    ("G004", "Critical Care", "$150.00"),
    ("Z107", "Incision & Drainage", "$85.00"),
    ("F013", "Fracture Reduction", "$120.00"),
    ("H153", "Emergency Assessment", "$65.00"),
    ("G005", "Critical Care Extended", "$200.00"),
    ("Z108", "Surgical Procedure", "$95.00"),
    ("F014", "Orthopedic Treatment", "$140.00"),
];

pub fn sample_catalog() -> Vec<CatalogEntry> {
    SAMPLE
        .iter()
        .map(|(code, description, amount)| CatalogEntry::new(*code, *description, "", *amount))
        .collect()
}
