use ampcover_protocol::{Pool, PoolId, PrimerCandidate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Globally numbered primers accepted over the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeptPrimerLedger {
    primers: Vec<PrimerCandidate>,
    next_pool_id: PoolId,
}

/// What one commit added to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub pool_ids: Vec<PoolId>,
    pub primers: usize,
}

impl KeptPrimerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from previously committed primers. The pool-id
    /// counter continues after the highest id present.
    pub fn from_primers(primers: Vec<PrimerCandidate>) -> Self {
        let next_pool_id = primers.iter().map(|p| p.pool + 1).max().unwrap_or(0);
        Self {
            primers,
            next_pool_id,
        }
    }

    /// Moves `accepted` into the ledger, giving each pool the next run-wide id.
    /// Returns `None` when there was nothing to commit.
    pub fn commit(&mut self, accepted: Vec<Pool>) -> Option<Commit> {
        if accepted.is_empty() {
            return None;
        }
        let mut commit = Commit {
            pool_ids: Vec::with_capacity(accepted.len()),
            primers: 0,
        };
        for pool in accepted {
            let id = self.next_pool_id;
            self.next_pool_id += 1;
            commit.pool_ids.push(id);
            commit.primers += pool.members.len();
            self.primers
                .extend(pool.members.into_iter().map(|c| c.with_pool(id)));
        }
        Some(commit)
    }

    pub fn primers(&self) -> &[PrimerCandidate] {
        &self.primers
    }

    pub fn next_pool_id(&self) -> PoolId {
        self.next_pool_id
    }

    pub fn primer_count(&self) -> usize {
        self.primers.len()
    }

    pub fn pool_count(&self) -> usize {
        self.by_pool().len()
    }

    pub fn is_empty(&self) -> bool {
        self.primers.is_empty()
    }

    pub fn by_pool(&self) -> BTreeMap<PoolId, Vec<&PrimerCandidate>> {
        let mut ret: BTreeMap<PoolId, Vec<&PrimerCandidate>> = BTreeMap::new();
        for primer in &self.primers {
            ret.entry(primer.pool).or_default().push(primer);
        }
        ret
    }
}
