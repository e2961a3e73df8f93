use ampcover_protocol::Pool;

/// Pools split by the acceptance threshold.
#[derive(Debug, Default)]
pub struct Acceptance {
    pub accepted: Vec<Pool>,
    pub rejected: usize,
}

impl Acceptance {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Keeps a pool iff it has at least `threshold` members. Rejected pools are
/// dropped whole.
pub fn accept_pools(pools: Vec<Pool>, threshold: usize) -> Acceptance {
    let mut ret = Acceptance::default();
    for pool in pools {
        if pool.len() >= threshold {
            ret.accepted.push(pool);
        } else {
            ret.rejected += 1;
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pool_of;

    #[test]
    fn test_threshold_is_inclusive() {
        let pools = vec![pool_of(0, 3, "chr1", 0), pool_of(1, 2, "chr1", 10_000)];
        let result = accept_pools(pools, 3);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].local_id, 0);
        assert_eq!(result.rejected, 1);
    }

    #[test]
    fn test_threshold_one_accepts_any_non_empty_pool() {
        let pools = vec![pool_of(0, 1, "chr1", 0), pool_of(1, 5, "chr2", 0)];
        let result = accept_pools(pools, 1);
        assert_eq!(result.accepted.len(), 2);
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_nothing_accepted() {
        let result = accept_pools(vec![pool_of(4, 1, "chr1", 0)], 2);
        assert!(result.is_empty());
        assert_eq!(result.rejected, 1);
        assert!(accept_pools(vec![], 2).is_empty());
    }
}
