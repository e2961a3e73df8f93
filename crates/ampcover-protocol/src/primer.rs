use serde::{Deserialize, Serialize};

pub type PoolId = u32;

/// One designed primer pair and the amplicon it produces.
///
/// `pool` is a batch-local identifier while the candidate travels from the
/// design engine to acceptance; once committed to the ledger it holds the
/// run-wide pool id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerCandidate {
    pub name: String,
    pub pool: PoolId,
    pub chrom: String,
    /// Amplicon start, forward primer included.
    pub start: u64,
    /// Amplicon end (exclusive), reverse primer included.
    pub end: u64,
    pub forward: String,
    pub reverse: String,
    pub forward_tm: f64,
    pub reverse_tm: f64,
    pub forward_gc: f64,
    pub reverse_gc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl PrimerCandidate {
    pub fn amplicon_len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn with_pool(mut self, pool: PoolId) -> Self {
        self.pool = pool;
        self
    }

    /// Identity used for exact-duplicate detection.
    pub fn pair_key(&self) -> (&str, u64, u64, &str, &str) {
        (
            self.chrom.as_str(),
            self.start,
            self.end,
            self.forward.as_str(),
            self.reverse.as_str(),
        )
    }
}

/// Candidates sharing one batch-local pool id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub local_id: PoolId,
    pub members: Vec<PrimerCandidate>,
}

impl Pool {
    pub fn new(local_id: PoolId, members: Vec<PrimerCandidate>) -> Self {
        Self { local_id, members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn candidate(name: &str, chrom: &str, start: u64, end: u64) -> PrimerCandidate {
    PrimerCandidate {
        name: name.to_string(),
        pool: 0,
        chrom: chrom.to_string(),
        start,
        end,
        forward: "ACGTACGTACGTACGTAC".to_string(),
        reverse: "TGCATGCATGCATGCATG".to_string(),
        forward_tm: 60.0,
        reverse_tm: 60.5,
        forward_gc: 50.0,
        reverse_gc: 50.0,
        target: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplicon_len_and_pool_relabel() {
        let c = candidate("p1", "chr1", 100, 350).with_pool(7);
        assert_eq!(c.amplicon_len(), 250);
        assert_eq!(c.pool, 7);
    }

    #[test]
    fn test_pair_key_ignores_pool_and_name() {
        let a = candidate("p1", "chr1", 100, 350).with_pool(1);
        let mut b = candidate("p9", "chr1", 100, 350).with_pool(4);
        assert_eq!(a.pair_key(), b.pair_key());
        b.reverse = "AAAAAAAAAAAAAAAAAA".to_string();
        assert_ne!(a.pair_key(), b.pair_key());
    }
}
