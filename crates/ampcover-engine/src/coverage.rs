//! Uncovered-region bookkeeping.
//!
//! Coverage is always recomputed from every kept primer against the original
//! target set; nothing is carried over from the previous uncovered set.

use crate::error::{EngineError, ErrorCode};
use ampcover_protocol::{PrimerCandidate, Region, RegionSet};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct CoverageTracker {
    pad: u64,
}

impl CoverageTracker {
    pub fn new(pad: u64) -> Self {
        Self { pad }
    }

    pub fn pad(&self) -> u64 {
        self.pad
    }

    /// Bases an amplicon `[a, b)` counts as covering: `[a + pad, b - pad)`.
    fn effective_span(&self, primer: &PrimerCandidate) -> Option<(u64, u64)> {
        let start = primer.start.saturating_add(self.pad);
        let end = primer.end.saturating_sub(self.pad);
        (start < end).then_some((start, end))
    }

    /// Parts of `original` not covered by any of `primers`.
    pub fn uncovered(
        &self,
        original: &RegionSet,
        primers: &[PrimerCandidate],
    ) -> Result<RegionSet, EngineError> {
        let mut spans: HashMap<&str, Vec<(u64, u64)>> = HashMap::new();
        for primer in primers {
            if let Some(span) = self.effective_span(primer) {
                spans.entry(primer.chrom.as_str()).or_default().push(span);
            }
        }
        subtract(original, spans)
    }
}

/// Parts of `original` that are not in `uncovered`.
pub fn covered(original: &RegionSet, uncovered: &RegionSet) -> Result<RegionSet, EngineError> {
    let mut spans: HashMap<&str, Vec<(u64, u64)>> = HashMap::new();
    for region in uncovered {
        spans
            .entry(region.chrom.as_str())
            .or_default()
            .push((region.start, region.end));
    }
    subtract(original, spans)
}

fn merge_spans(mut spans: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    spans.sort_unstable();
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn subtract(
    original: &RegionSet,
    spans: HashMap<&str, Vec<(u64, u64)>>,
) -> Result<RegionSet, EngineError> {
    let spans: HashMap<&str, Vec<(u64, u64)>> = spans
        .into_iter()
        .map(|(chrom, s)| (chrom, merge_spans(s)))
        .collect();

    let mut remaining: Vec<Region> = vec![];
    for region in original {
        let Some(chrom_spans) = spans.get(region.chrom.as_str()) else {
            remaining.push(region.clone());
            continue;
        };
        let mut cursor = region.start;
        for &(start, end) in chrom_spans {
            if end <= cursor {
                continue;
            }
            if start >= region.end {
                break;
            }
            if start > cursor {
                remaining.push(Region {
                    start: cursor,
                    end: start,
                    ..region.clone()
                });
            }
            cursor = end;
            if cursor >= region.end {
                break;
            }
        }
        if cursor < region.end {
            remaining.push(Region {
                start: cursor,
                ..region.clone()
            });
        }
    }
    RegionSet::from_regions(remaining).map_err(|e| EngineError::new(ErrorCode::Internal, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candidate;
    use pretty_assertions::assert_eq;

    fn targets(regions: Vec<Region>) -> RegionSet {
        RegionSet::from_regions(regions).unwrap()
    }

    #[test]
    fn test_region_spanned_with_pad_is_covered() {
        let original = targets(vec![Region::new("chr1", 1_000, 1_100).with_label("ex1")]);
        let tracker = CoverageTracker::new(10);
        let primers = vec![candidate("p", "chr1", 990, 1_110)];
        let uncovered = tracker.uncovered(&original, &primers).unwrap();
        assert!(uncovered.is_empty());
    }

    #[test]
    fn test_pad_shortfall_leaves_edge_uncovered() {
        let original = targets(vec![Region::new("chr1", 1_000, 1_100).with_label("ex1")]);
        let tracker = CoverageTracker::new(10);
        let primers = vec![candidate("p", "chr1", 995, 1_110)];
        let uncovered = tracker.uncovered(&original, &primers).unwrap();
        assert_eq!(
            uncovered.regions(),
            &[Region::new("chr1", 1_000, 1_005).with_label("ex1")]
        );
    }

    #[test]
    fn test_partial_coverage_splits_region() {
        let original = targets(vec![
            Region::new("chr1", 0, 1_000).with_label("big"),
            Region::new("chr2", 0, 100).with_label("other"),
        ]);
        let tracker = CoverageTracker::new(0);
        let primers = vec![
            candidate("a", "chr1", 100, 300),
            candidate("b", "chr1", 250, 400),
            candidate("c", "chr1", 900, 1_200),
        ];
        let uncovered = tracker.uncovered(&original, &primers).unwrap();
        assert_eq!(
            uncovered.regions(),
            &[
                Region::new("chr1", 0, 100).with_label("big"),
                Region::new("chr1", 400, 900).with_label("big"),
                Region::new("chr2", 0, 100).with_label("other"),
            ]
        );
        assert!(uncovered.is_subset_of(&original));
    }

    #[test]
    fn test_amplicon_shorter_than_twice_pad_covers_nothing() {
        let original = targets(vec![Region::new("chr1", 0, 100)]);
        let tracker = CoverageTracker::new(60);
        let primers = vec![candidate("p", "chr1", 0, 100)];
        assert_eq!(tracker.uncovered(&original, &primers).unwrap(), original);
    }

    #[test]
    fn test_recompute_is_total_not_incremental() {
        let original = targets(vec![
            Region::new("chr1", 0, 100),
            Region::new("chr1", 500, 600),
        ]);
        let tracker = CoverageTracker::new(0);
        let first = vec![candidate("a", "chr1", 0, 100)];
        let after_first = tracker.uncovered(&original, &first).unwrap();
        assert_eq!(after_first.regions(), &[Region::new("chr1", 500, 600)]);

        let mut all = first.clone();
        all.push(candidate("b", "chr1", 500, 600));
        assert!(tracker.uncovered(&original, &all).unwrap().is_empty());
    }

    #[test]
    fn test_covered_is_complement_of_uncovered() {
        let original = targets(vec![Region::new("chr1", 0, 1_000)]);
        let uncovered = targets(vec![
            Region::new("chr1", 0, 100),
            Region::new("chr1", 400, 900),
        ]);
        let covered = covered(&original, &uncovered).unwrap();
        assert_eq!(
            covered.regions(),
            &[Region::new("chr1", 100, 400), Region::new("chr1", 900, 1_000)]
        );
        assert_eq!(covered.total_bases() + uncovered.total_bases(), 1_000);
    }
}
