use std::collections::HashMap;

use crate::core::types::TermDescriptor;

/// Keyword descriptors for the dictionary, sorted so the order is stable
/// across restarts (Redis sets are unordered).
pub fn dictionary_terms(mut words: Vec<String>) -> Vec<TermDescriptor> {
    words.sort();
    words.dedup();
    words
        .into_iter()
        .filter(|word| !word.trim().is_empty())
        .map(TermDescriptor::keyword)
        .collect()
}

/// Geographic descriptors for a `location key -> geocode` mapping.
///
/// Keys look like `"Municipality,Province,Region"`; the first field becomes
/// the query text and the whole key the provenance term.
pub fn location_terms(geocodes: &HashMap<String, String>, radius: &str) -> Vec<TermDescriptor> {
    let mut keys: Vec<&String> = geocodes.keys().collect();
    keys.sort();

    keys.into_iter()
        .filter_map(|key| {
            let geocode = geocodes.get(key)?.trim();
            if geocode.is_empty() {
                return None;
            }
            let name = key.split(',').next().unwrap_or_default().trim();
            Some(TermDescriptor::geo(name, key.as_str(), geocode, radius))
        })
        .collect()
}
