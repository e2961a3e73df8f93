use ampcover_protocol::PrimerCandidate;
use std::collections::HashSet;

/// Drops exact duplicate pairs (same amplicon and same primer sequences).
/// The first occurrence wins and keeps its pool id.
pub fn remove_duplicate_pairs(primers: &[PrimerCandidate]) -> Vec<PrimerCandidate> {
    let mut seen = HashSet::new();
    let kept: Vec<PrimerCandidate> = primers
        .iter()
        .filter(|&p| seen.insert(p.pair_key()))
        .cloned()
        .collect();
    if kept.len() < primers.len() {
        tracing::info!(
            removed = primers.len() - kept.len(),
            "Removed duplicate primer pairs"
        );
    }
    kept
}
