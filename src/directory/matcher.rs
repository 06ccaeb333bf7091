use crate::crawler::models::DocumentCategory;

const PRICING_KEYWORDS: [&str; 3] = ["price", "pricing", "award"];

/// First word of a supplier name or listing title. Words split on whitespace
/// and then on hyphens, so "Acme-Corp Services" keys as "Acme".
pub fn supplier_key(text: &str) -> Option<&str> {
    text.split_whitespace().flat_map(|word| word.split('-')).next()
}

/// Whether a listing title names the given supplier. Only the first word of
/// each side is compared, case-sensitively.
pub fn same_supplier(supplier: &str, title: &str) -> bool {
    match (supplier_key(supplier), supplier_key(title)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn classify(title: &str) -> DocumentCategory {
    let title = title.to_lowercase();
    if PRICING_KEYWORDS.iter().any(|k| title.contains(k)) {
        DocumentCategory::PricingFiles
    } else {
        DocumentCategory::OtherDocsFiles
    }
}
