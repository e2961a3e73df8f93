//! In-silico PCR validation of designed primer pairs.
//!
//! Every candidate is sent to the validator as `name forward reverse`; the
//! validator answers with one BED record per predicted product, named after
//! the query. A pair passes when it produces exactly one product and that
//! product overlaps the designed amplicon.

use crate::bed::parse_bed_records;
use crate::design_engine::stderr_tail;
use ampcover_engine::EngineError;
use ampcover_protocol::{PrimerCandidate, Region};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

pub fn query_listing<'a>(candidates: impl IntoIterator<Item = &'a PrimerCandidate>) -> String {
    let mut text = String::new();
    for c in candidates {
        let _ = writeln!(text, "{}\t{}\t{}", c.name, c.forward, c.reverse);
    }
    text
}

pub fn run_validator(
    executable: &str,
    reference_index: &Path,
    query: &Path,
    output: &Path,
    max_size: usize,
) -> Result<String, EngineError> {
    let result = Command::new(executable)
        .arg(reference_index)
        .arg(query)
        .arg(output)
        .arg("-out=bed")
        .arg(format!("-maxSize={max_size}"))
        .output()
        .map_err(|e| EngineError::io(format!("Could not run validator '{executable}': {e}")))?;
    if !result.status.success() {
        return Err(EngineError::io(format!(
            "Validator '{executable}' failed ({}): {}",
            result.status,
            stderr_tail(&result.stderr)
        )));
    }
    std::fs::read_to_string(output).map_err(|e| {
        EngineError::malformed(format!(
            "Validator produced no readable output '{}': {e}",
            output.display()
        ))
    })
}

/// Products per query name.
pub fn parse_hits(text: &str) -> Result<HashMap<String, Vec<Region>>, EngineError> {
    let records = parse_bed_records(text, "validator output")
        .map_err(|e| EngineError::malformed(e.message))?;
    let mut hits: HashMap<String, Vec<Region>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let Some(name) = record.name() else {
            return Err(EngineError::malformed(format!(
                "validator output record {} has no query name",
                idx + 1
            )));
        };
        hits.entry(name.to_string())
            .or_default()
            .push(Region::new(record.chrom(), record.start(), record.end()));
    }
    Ok(hits)
}

pub fn passes(candidate: &PrimerCandidate, hits: &HashMap<String, Vec<Region>>) -> bool {
    let Some(products) = hits.get(&candidate.name) else {
        return false;
    };
    let [product] = products.as_slice() else {
        return false;
    };
    product.overlaps(&Region::new(&candidate.chrom, candidate.start, candidate.end))
}

/// Keeps the candidates that amplify only their intended target.
pub fn retain_specific(
    candidates: Vec<PrimerCandidate>,
    hits: &HashMap<String, Vec<Region>>,
) -> Vec<PrimerCandidate> {
    let before = candidates.len();
    let kept: Vec<PrimerCandidate> = candidates
        .into_iter()
        .filter(|c| passes(c, hits))
        .collect();
    tracing::debug!(
        checked = before,
        specific = kept.len(),
        "In-silico PCR validation"
    );
    kept
}
