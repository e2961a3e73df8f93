use ampcover_protocol::{Pool, PoolId, PrimerCandidate};

pub fn candidate(name: &str, chrom: &str, start: u64, end: u64) -> PrimerCandidate {
    PrimerCandidate {
        name: name.to_string(),
        pool: 0,
        chrom: chrom.to_string(),
        start,
        end,
        forward: "ACGTTGCAAGGCTTACCGTA".to_string(),
        reverse: "TTGACCGGTAACGTTCAGGA".to_string(),
        forward_tm: 60.2,
        reverse_tm: 59.8,
        forward_gc: 50.0,
        reverse_gc: 50.0,
        target: None,
    }
}

/// `size` candidates with 250 bp amplicons spaced 300 bp apart from `offset`.
pub fn pool_of(local_id: PoolId, size: usize, chrom: &str, offset: u64) -> Pool {
    let members = (0..size as u64)
        .map(|i| {
            let start = offset + i * 300;
            candidate(&format!("{chrom}_{local_id}_{i}"), chrom, start, start + 250)
                .with_pool(local_id)
        })
        .collect();
    Pool::new(local_id, members)
}
