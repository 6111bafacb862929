use std::collections::HashSet;

use crate::models::CandidateItem;

/// Merge source collections into one, unique by non-empty id.
///
/// Sources are concatenated in the order given and the first occurrence of an
/// id wins. Items without an id cannot be compared, so each one is kept.
pub fn dedupe_by_id(sources: Vec<Vec<CandidateItem>>) -> Vec<CandidateItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for item in sources.into_iter().flatten() {
        if item.id.is_empty() || seen.insert(item.id.clone()) {
            merged.push(item);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, text: &str) -> CandidateItem {
        CandidateItem::new(id, text, "Author", "author")
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let feed = vec![item("1", "feed copy"), item("2", "two")];
        let notifications = vec![item("1", "notification copy"), item("3", "three")];

        let merged = dedupe_by_id(vec![feed, notifications]);

        let ids: Vec<&str> = merged.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(merged[0].text, "feed copy");
    }

    #[test]
    fn test_dedupe_keeps_every_empty_id() {
        let merged = dedupe_by_id(vec![
            vec![item("", "first"), item("", "second")],
            vec![item("", "first")],
        ]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_dedupe_within_single_source() {
        let merged = dedupe_by_id(vec![vec![item("9", "a"), item("9", "b"), item("8", "c")]]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "a");
    }

    #[test]
    fn test_dedupe_no_sources() {
        assert!(dedupe_by_id(Vec::new()).is_empty());
    }
}
