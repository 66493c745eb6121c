//! Min-max score normalization.
//!
//! Rescales one source's raw scores into [0,1] so that heterogeneously-ranged
//! sources (BM25 in the tens, similarities in [0,1]) can be summed. Min-max
//! is monotonic, so the descending-order invariant of the input survives.
//!
//! # Degenerate-case policy
//!
//! When a source cannot discriminate (all raw scores equal, a single entry,
//! or an empty list), every normalized score is defined as `1.0`. A source
//! that ranks everything the same should not be pulled toward 0 and silently
//! lose its influence in the blend. The complementary policy lives in
//! [`super::fusion`]: a document *missing* from a source scores 0 there
//! (absence is "no evidence", never imputed).

use super::types::RankedList;

/// Rescales every score in `list` into [0,1] via min-max scaling.
///
/// `score' = (score - min) / (max - min)`; when `max == min` (including
/// empty and single-element lists) every score normalizes to 1.0.
pub fn min_max_normalize(list: &RankedList) -> RankedList {
    let scores = list.entries().iter().map(|e| e.score);
    let min = scores.clone().fold(f32::INFINITY, f32::min);
    let max = scores.fold(f32::NEG_INFINITY, f32::max);

    if list.is_empty() || max == min {
        return list.map_scores(|_| 1.0);
    }

    let range = max - min;
    list.map_scores(move |s| (s - min) / range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::LEXICAL_SOURCE;

    fn list(hits: &[(&str, f32)]) -> RankedList {
        RankedList::new(
            LEXICAL_SOURCE,
            hits.iter().map(|(id, s)| (id.to_string(), *s)),
        )
        .unwrap()
    }

    #[test]
    fn test_output_in_unit_range() {
        let normalized = min_max_normalize(&list(&[("a", 12.5), ("b", 3.0), ("c", -1.0)]));
        for entry in normalized.entries() {
            assert!((0.0..=1.0).contains(&entry.score), "score out of range");
        }
    }

    #[test]
    fn test_max_maps_to_one_min_to_zero() {
        let normalized = min_max_normalize(&list(&[("a", 10.0), ("b", 5.0), ("c", 0.0)]));
        assert_eq!(normalized.entries()[0].score, 1.0);
        assert_eq!(normalized.entries()[2].score, 0.0);
        assert_eq!(normalized.entries()[1].score, 0.5);
    }

    #[test]
    fn test_uniform_scores_normalize_to_one() {
        let normalized = min_max_normalize(&list(&[("a", 7.0), ("b", 7.0), ("c", 7.0)]));
        assert!(normalized.entries().iter().all(|e| e.score == 1.0));
    }

    #[test]
    fn test_single_element_normalizes_to_one() {
        let normalized = min_max_normalize(&list(&[("only", 42.0)]));
        assert_eq!(normalized.entries()[0].score, 1.0);
    }

    #[test]
    fn test_empty_list_stays_empty() {
        let normalized = min_max_normalize(&RankedList::empty(LEXICAL_SOURCE));
        assert!(normalized.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let input = list(&[("a", 9.0), ("b", 4.0), ("c", 1.0)]);
        let normalized = min_max_normalize(&input);
        let ids: Vec<&str> = normalized
            .entries()
            .iter()
            .map(|e| e.doc_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
