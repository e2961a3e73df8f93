//! Invocation of the external primer-design engine and parsing of its
//! candidate table.
//!
//! The engine is called as
//!
//! ```text
//! <bin> --targets T.bed --reference R [--variants V] --primer-size a-b
//!       --product-size a-b --gc a-b --tm a-b --tm-step s --pool-size a-b
//!       --pad p --output out.tsv
//! ```
//!
//! and writes a tab-separated table with the header
//! `pool name chrom start end forward reverse forward_tm reverse_tm
//! forward_gc reverse_gc target`.

use ampcover_engine::EngineError;
use ampcover_protocol::{DesignParameters, PoolId, PrimerCandidate};
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

static PRIMER_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ACGTacgt]+$").expect("valid primer regex"));

const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Deserialize)]
struct CandidateRow {
    pool: PoolId,
    name: String,
    chrom: String,
    start: u64,
    end: u64,
    forward: String,
    reverse: String,
    forward_tm: f64,
    reverse_tm: f64,
    forward_gc: f64,
    reverse_gc: f64,
    #[serde(default)]
    target: Option<String>,
}

impl CandidateRow {
    fn into_candidate(self, row: usize) -> Result<PrimerCandidate, EngineError> {
        if self.start >= self.end {
            return Err(EngineError::malformed(format!(
                "row {row} ({}): amplicon start {} is not below end {}",
                self.name, self.start, self.end
            )));
        }
        for (which, seq) in [("forward", &self.forward), ("reverse", &self.reverse)] {
            if !PRIMER_SEQUENCE.is_match(seq) {
                return Err(EngineError::malformed(format!(
                    "row {row} ({}): {which} primer '{seq}' is not a DNA sequence",
                    self.name
                )));
            }
        }
        Ok(PrimerCandidate {
            name: self.name,
            pool: self.pool,
            chrom: self.chrom,
            start: self.start,
            end: self.end,
            forward: self.forward.to_ascii_uppercase(),
            reverse: self.reverse.to_ascii_uppercase(),
            forward_tm: self.forward_tm,
            reverse_tm: self.reverse_tm,
            forward_gc: self.forward_gc,
            reverse_gc: self.reverse_gc,
            target: self.target.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// Paths of one engine invocation.
#[derive(Debug, Clone)]
pub struct DesignRequest<'a> {
    pub targets_bed: &'a Path,
    pub reference: &'a Path,
    pub variants: Option<&'a Path>,
    pub output: &'a Path,
}

pub fn design_args(request: &DesignRequest<'_>, params: &DesignParameters) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--targets".into(),
        request.targets_bed.into(),
        "--reference".into(),
        request.reference.into(),
    ];
    if let Some(variants) = request.variants {
        args.push("--variants".into());
        args.push(variants.into());
    }
    let ranged = [
        ("--primer-size", params.primer_len.to_string()),
        ("--product-size", params.amplicon_size.to_string()),
        ("--gc", params.gc.to_string()),
        ("--tm", params.tm.to_string()),
        ("--tm-step", params.tm_step.to_string()),
        ("--pool-size", params.pool_size.to_string()),
        ("--pad", params.pad.to_string()),
    ];
    for (flag, value) in ranged {
        args.push(flag.into());
        args.push(value.into());
    }
    args.push("--output".into());
    args.push(request.output.into());
    args
}

/// How an engine run ended, when it could be started at all.
#[derive(Debug, Clone)]
pub enum EngineRun {
    /// Exit status 0; the table path may still be missing or empty.
    Finished(PathBuf),
    Failed { status: String, stderr_tail: String },
}

pub fn run_design_engine(
    executable: &str,
    request: &DesignRequest<'_>,
    params: &DesignParameters,
) -> Result<EngineRun, EngineError> {
    let args = design_args(request, params);
    tracing::debug!(executable, ?args, "Running primer design engine");
    let output = Command::new(executable)
        .args(&args)
        .output()
        .map_err(|e| EngineError::io(format!("Could not run design engine '{executable}': {e}")))?;
    if output.status.success() {
        return Ok(EngineRun::Finished(request.output.to_path_buf()));
    }
    Ok(EngineRun::Failed {
        status: output.status.to_string(),
        stderr_tail: stderr_tail(&output.stderr),
    })
}

pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ")
}

/// Reads the engine table. A missing or header-only table means no
/// candidates; anything unparsable is malformed output.
pub fn read_candidate_table(path: &Path) -> Result<Vec<PrimerCandidate>, EngineError> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let text = std::fs::read_to_string(path).map_err(|e| {
        EngineError::io(format!(
            "Could not read design output '{}': {e}",
            path.display()
        ))
    })?;
    parse_candidate_table(&text)
}

pub fn parse_candidate_table(text: &str) -> Result<Vec<PrimerCandidate>, EngineError> {
    if text.trim().is_empty() {
        return Ok(vec![]);
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut candidates = vec![];
    for (idx, row) in reader.deserialize::<CandidateRow>().enumerate() {
        let row_no = idx + 1;
        let row = row.map_err(|e| {
            EngineError::malformed(format!("design output row {row_no}: {e}"))
        })?;
        candidates.push(row.into_candidate(row_no)?);
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampcover_engine::ErrorCode;

    const HEADER: &str = "pool\tname\tchrom\tstart\tend\tforward\treverse\tforward_tm\treverse_tm\tforward_gc\treverse_gc\ttarget\n";

    #[test]
    fn test_parse_candidate_table() {
        let text = format!(
            "{HEADER}0\tp0_1\tchr1\t900\t1150\tacgttgcaaggcttaccgta\tTTGACCGGTAACGTTCAGGA\t60.1\t59.9\t50\t50\tex1\n\
             1\tp1_1\tchr2\t10\t200\tACGTTGCAAGGCTTACCGTA\tTTGACCGGTAACGTTCAGGA\t60.1\t59.9\t50\t50\t\n"
        );
        let candidates = parse_candidate_table(&text).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].forward, "ACGTTGCAAGGCTTACCGTA");
        assert_eq!(candidates[0].target.as_deref(), Some("ex1"));
        assert_eq!(candidates[1].pool, 1);
        assert_eq!(candidates[1].target, None);
    }

    #[test]
    fn test_header_only_table_is_empty() {
        assert!(parse_candidate_table(HEADER).unwrap().is_empty());
        assert!(parse_candidate_table("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let text = "pool\tname\tchrom\n0\tp\tchr1\n";
        let err = parse_candidate_table(text).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedOutput);
    }

    #[test]
    fn test_non_dna_primer_is_malformed() {
        let text = format!(
            "{HEADER}0\tp0_1\tchr1\t900\t1150\tACGU-X\tTTGACC\t60\t60\t50\t50\tex1\n"
        );
        let err = parse_candidate_table(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedOutput);
        assert!(err.message.contains("forward primer"));
    }

    #[test]
    fn test_ambiguous_base_is_malformed() {
        let text = format!(
            "{HEADER}0\tp0_1\tchr1\t900\t1150\tACGTTGCAAGGCTTACCGTA\tTTGACCNGTAACGTTCAGGA\t60\t60\t50\t50\tex1\n"
        );
        let err = parse_candidate_table(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedOutput);
        assert!(err.message.contains("reverse primer"));
    }

    #[test]
    fn test_inverted_amplicon_is_malformed() {
        let text = format!(
            "{HEADER}0\tp0_1\tchr1\t1150\t900\tACGT\tTTGA\t60\t60\t50\t50\tex1\n"
        );
        let err = parse_candidate_table(&text).unwrap_err();
        assert!(err.message.contains("not below end"));
    }

    #[test]
    fn test_design_args_carry_every_parameter() {
        let request = DesignRequest {
            targets_bed: Path::new("/tmp/t.bed"),
            reference: Path::new("/ref/hg38.fa"),
            variants: Some(Path::new("/ref/snp.idx")),
            output: Path::new("/tmp/out.tsv"),
        };
        let args: Vec<String> = design_args(&request, &DesignParameters::default())
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("--variants /ref/snp.idx"));
        assert!(joined.contains("--product-size 160-240"));
        assert!(joined.contains("--tm 58-62"));
        assert!(joined.contains("--tm-step 0.5"));
        assert!(joined.contains("--pool-size 2-40"));
        assert!(joined.ends_with("--output /tmp/out.tsv"));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let tail = stderr_tail(b"a\nb\nc\nd\ne\nf\ng\n");
        assert_eq!(tail, "c | d | e | f | g");
    }
}
