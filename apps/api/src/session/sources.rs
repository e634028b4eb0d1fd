use std::collections::HashSet;

use crate::models::job::SearchSource;

/// Appends `incoming` sources whose uri is not already present, keeping first
/// occurrence order. Duplicates inside `incoming` are collapsed as well.
/// Returns the number of sources added.
pub fn merge_sources(existing: &mut Vec<SearchSource>, incoming: Vec<SearchSource>) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|s| s.uri.clone()).collect();
    let before = existing.len();

    for source in incoming {
        if seen.insert(source.uri.clone()) {
            existing.push(source);
        }
    }

    existing.len() - before
}
