//! Run output files.
//!
//! Final results land in the output directory as `<prefix>.order.csv`,
//! `<prefix>.covered.bed`, `<prefix>.uncovered.bed`, `<prefix>.primers.txt`,
//! `<prefix>.ispcr.txt` and `<prefix>.summary.json`. Intermediate snapshots go
//! to `snapshots/iter_<n>.json` with a matching `.uncovered.bed`.

use crate::bed::write_region_set;
use crate::config::OutputSettings;
use crate::dedup::remove_duplicate_pairs;
use crate::ispcr::query_listing;
use ampcover_engine::{EngineError, ErrorCode, OutputWriter, RunSnapshot};
use ampcover_protocol::{DesignParameters, PoolId, PrimerCandidate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    pool: PoolId,
    name: &'a str,
    direction: &'static str,
    sequence: &'a str,
    length: usize,
    tm: f64,
    gc: f64,
    target: &'a str,
}

fn order_rows(primer: &PrimerCandidate) -> [OrderRow<'_>; 2] {
    let target = primer.target.as_deref().unwrap_or("");
    [
        OrderRow {
            pool: primer.pool,
            name: &primer.name,
            direction: "forward",
            sequence: &primer.forward,
            length: primer.forward.len(),
            tm: primer.forward_tm,
            gc: primer.forward_gc,
            target,
        },
        OrderRow {
            pool: primer.pool,
            name: &primer.name,
            direction: "reverse",
            sequence: &primer.reverse,
            length: primer.reverse.len(),
            tm: primer.reverse_tm,
            gc: primer.reverse_gc,
            target,
        },
    ]
}

/// Contents of `<prefix>.summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    pub iteration: usize,
    pub pool_count: usize,
    pub primer_count: usize,
    pub duplicates_removed: usize,
    pub target_regions: usize,
    pub target_bases: u64,
    pub uncovered_regions: usize,
    pub uncovered_bases: u64,
    pub parameters: DesignParameters,
}

pub struct FileOutputWriter {
    directory: PathBuf,
    prefix: String,
    write_snapshots: bool,
    snapshots_written: usize,
}

impl FileOutputWriter {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            write_snapshots: true,
            snapshots_written: 0,
        }
    }

    pub fn from_settings(settings: &OutputSettings) -> Self {
        let mut writer = Self::new(settings.directory(), settings.prefix.clone());
        writer.write_snapshots = settings.write_snapshots;
        writer
    }

    pub fn without_snapshots(mut self) -> Self {
        self.write_snapshots = false;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn snapshots_written(&self) -> usize {
        self.snapshots_written
    }

    pub fn final_path(&self, suffix: &str) -> PathBuf {
        self.directory.join(format!("{}.{suffix}", self.prefix))
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.directory.join("snapshots")
    }

    fn ensure_dir(path: &Path) -> Result<(), EngineError> {
        std::fs::create_dir_all(path).map_err(|e| {
            EngineError::io(format!("Could not create directory '{}': {e}", path.display()))
        })
    }

    fn write_text(path: &Path, text: &str) -> Result<(), EngineError> {
        std::fs::write(path, text)
            .map_err(|e| EngineError::io(format!("Could not write '{}': {e}", path.display())))
    }

    fn write_order(&self, primers: &[PrimerCandidate]) -> Result<(), EngineError> {
        let path = self.final_path("order.csv");
        let csv_error = |e: csv::Error| {
            EngineError::io(format!("Could not write order sheet '{}': {e}", path.display()))
        };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        for primer in primers {
            for row in order_rows(primer) {
                writer.serialize(row).map_err(csv_error)?;
            }
        }
        writer
            .flush()
            .map_err(|e| EngineError::io(format!("Could not flush '{}': {e}", path.display())))
    }

    fn write_snapshot_files(&self, snapshot: &RunSnapshot) -> Result<(), EngineError> {
        let dir = self.snapshot_dir();
        Self::ensure_dir(&dir)?;
        let json = dir.join(format!("iter_{}.json", snapshot.iteration));
        snapshot.save_to_path(&json.to_string_lossy())?;
        write_region_set(
            &dir.join(format!("iter_{}.uncovered.bed", snapshot.iteration)),
            &snapshot.uncovered,
        )
    }
}

/// Plain-text primer listing, one block per pool.
pub fn primer_listing(primers: &[PrimerCandidate]) -> String {
    let mut text = String::new();
    let by_pool = primers.iter().into_group_map_by(|p| p.pool);
    for (pool, members) in by_pool.into_iter().sorted_by_key(|(pool, _)| *pool) {
        let _ = writeln!(text, "## pool {pool} ({} pairs)", members.len());
        for p in members {
            let _ = writeln!(
                text,
                "{}\t{}:{}-{}\t{}\t{}\t{}",
                p.name,
                p.chrom,
                p.start,
                p.end,
                p.forward,
                p.reverse,
                p.target.as_deref().unwrap_or("-")
            );
        }
        text.push('\n');
    }
    text
}

impl OutputWriter for FileOutputWriter {
    fn write_snapshot(&mut self, snapshot: &RunSnapshot) -> Result<(), EngineError> {
        if !self.write_snapshots {
            return Ok(());
        }
        self.write_snapshot_files(snapshot)?;
        self.snapshots_written += 1;
        Ok(())
    }

    fn write_final(&mut self, snapshot: &RunSnapshot) -> Result<(), EngineError> {
        Self::ensure_dir(&self.directory)?;
        let primers = remove_duplicate_pairs(&snapshot.primers);
        let covered = ampcover_engine::coverage::covered(&snapshot.original, &snapshot.uncovered)?;

        self.write_order(&primers)?;
        write_region_set(&self.final_path("covered.bed"), &covered)?;
        write_region_set(&self.final_path("uncovered.bed"), &snapshot.uncovered)?;
        Self::write_text(&self.final_path("primers.txt"), &primer_listing(&primers))?;
        Self::write_text(&self.final_path("ispcr.txt"), &query_listing(&primers))?;

        let summary = FinalSummary {
            iteration: snapshot.iteration,
            pool_count: primers.iter().map(|p| p.pool).unique().count(),
            primer_count: primers.len(),
            duplicates_removed: snapshot.primers.len() - primers.len(),
            target_regions: snapshot.original.len(),
            target_bases: snapshot.original.total_bases(),
            uncovered_regions: snapshot.uncovered.len(),
            uncovered_bases: snapshot.uncovered.total_bases(),
            parameters: snapshot.parameters.clone(),
        };
        let json = serde_json::to_string_pretty(&summary).map_err(|e| {
            EngineError::new(ErrorCode::Internal, format!("Could not serialize summary: {e}"))
        })?;
        Self::write_text(&self.final_path("summary.json"), &json)?;
        tracing::info!(
            directory = %self.directory.display(),
            pools = summary.pool_count,
            primers = summary.primer_count,
            "Wrote final outputs"
        );
        Ok(())
    }
}
