//! Fuzzy subsequence filtering for the panel lists.

/// True when every character of `query` occurs in `item`, in order,
/// ignoring case. Characters of `item` are consumed left to right and never
/// reused.
pub fn fuzzy_match(item: &str, query: &str) -> bool {
    let mut hay = item.chars().flat_map(char::to_lowercase);
    'query: for qc in query.chars().flat_map(char::to_lowercase) {
        for hc in hay.by_ref() {
            if hc == qc {
                continue 'query;
            }
        }
        return false;
    }
    true
}

/// Indices of the matching items, in original order. An empty query
/// matches everything.
pub fn filter<S: AsRef<str>>(items: &[S], query: &str) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| fuzzy_match(item.as_ref(), query))
        .map(|(i, _)| i)
        .collect()
}

/// Like [`filter`], but an item matches when any of its fields does.
pub fn filter_any<S: AsRef<str>>(rows: &[Vec<S>], query: &str) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, fields)| fields.iter().any(|f| fuzzy_match(f.as_ref(), query)))
        .map(|(i, _)| i)
        .collect()
}
