use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open genomic interval `[start, end)` on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Region {
    pub fn new(chrom: &str, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        let label = label.trim();
        self.label = (!label.is_empty()).then(|| label.to_string());
        self
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Label if present, else `chrom:start-end`.
    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.to_string())
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// Regions sorted by `(chrom, start)`, pairwise disjoint and not book-ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Region>", into = "Vec<Region>")]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalises arbitrary regions: sorts them and merges overlapping or
    /// adjacent intervals on the same chromosome. Merged labels are joined
    /// with `,` in first-seen order.
    pub fn from_regions(mut regions: Vec<Region>) -> Result<Self, String> {
        if let Some(bad) = regions.iter().find(|r| r.is_empty()) {
            return Err(format!("Region {bad} is empty (start must be below end)"));
        }
        if let Some(bad) = regions.iter().find(|r| r.chrom.trim().is_empty()) {
            return Err(format!(
                "Region at {}-{} has no chromosome name",
                bad.start, bad.end
            ));
        }
        regions.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });

        let mut merged: Vec<Region> = Vec::with_capacity(regions.len());
        for region in regions {
            match merged.last_mut() {
                Some(last) if last.chrom == region.chrom && region.start <= last.end => {
                    last.end = last.end.max(region.end);
                    last.label = merge_labels(last.label.take(), region.label);
                }
                _ => merged.push(region),
            }
        }
        Ok(Self { regions: merged })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn total_bases(&self) -> u64 {
        self.regions.iter().map(Region::len).sum()
    }

    /// True when every base of `self` lies inside some region of `other`.
    pub fn is_subset_of(&self, other: &RegionSet) -> bool {
        self.regions.iter().all(|r| {
            other
                .regions
                .iter()
                .any(|o| o.chrom == r.chrom && o.start <= r.start && r.end <= o.end)
        })
    }
}

impl TryFrom<Vec<Region>> for RegionSet {
    type Error = String;

    fn try_from(regions: Vec<Region>) -> Result<Self, Self::Error> {
        Self::from_regions(regions)
    }
}

impl From<RegionSet> for Vec<Region> {
    fn from(set: RegionSet) -> Self {
        set.regions
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

fn merge_labels(left: Option<String>, right: Option<String>) -> Option<String> {
    match (left, right) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(l), Some(r)) => {
            if l.split(',').any(|part| part == r) {
                Some(l)
            } else {
                Some(format!("{l},{r}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_regions_sorts_and_merges() {
        let set = RegionSet::from_regions(vec![
            Region::new("chr2", 10, 20).with_label("b"),
            Region::new("chr1", 50, 60).with_label("c"),
            Region::new("chr1", 0, 30).with_label("a"),
            Region::new("chr1", 30, 40).with_label("a2"),
        ])
        .unwrap();
        assert_eq!(
            set.regions(),
            &[
                Region::new("chr1", 0, 40).with_label("a,a2"),
                Region::new("chr1", 50, 60).with_label("c"),
                Region::new("chr2", 10, 20).with_label("b"),
            ]
        );
        assert_eq!(set.total_bases(), 60);
    }

    #[test]
    fn test_from_regions_rejects_empty_interval() {
        let err = RegionSet::from_regions(vec![Region::new("chr1", 5, 5)]).unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn test_merged_label_is_not_repeated() {
        let set = RegionSet::from_regions(vec![
            Region::new("chr1", 0, 10).with_label("exon1"),
            Region::new("chr1", 5, 15).with_label("exon1"),
        ])
        .unwrap();
        assert_eq!(set.regions()[0].label.as_deref(), Some("exon1"));
    }

    #[test]
    fn test_subset_check() {
        let outer = RegionSet::from_regions(vec![Region::new("chr1", 0, 100)]).unwrap();
        let inner = RegionSet::from_regions(vec![
            Region::new("chr1", 10, 20),
            Region::new("chr1", 90, 100),
        ])
        .unwrap();
        assert!(inner.is_subset_of(&outer));
        assert!(!outer.is_subset_of(&inner));
        assert!(RegionSet::empty().is_subset_of(&outer));
    }

    #[test]
    fn test_serde_normalises_on_load() {
        let json = r#"[{"chrom":"chr1","start":20,"end":30},{"chrom":"chr1","start":0,"end":25}]"#;
        let set: RegionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.regions(), &[Region::new("chr1", 0, 30)]);
    }
}
