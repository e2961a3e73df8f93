//! BED input and output for region sets.

use ampcover_engine::EngineError;
use ampcover_protocol::{Region, RegionSet};
use bio::io::bed;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
}

/// Parses BED text into raw records, skipping track/browser/comment lines.
pub fn parse_bed_records(text: &str, source: &str) -> Result<Vec<bed::Record>, EngineError> {
    let body = text
        .lines()
        .filter(|line| !is_header_line(line))
        .collect::<Vec<_>>()
        .join("\n");
    let mut reader = bed::Reader::new(body.as_bytes());
    reader
        .records()
        .enumerate()
        .map(|(idx, record)| {
            record.map_err(|e| {
                EngineError::invalid_input(format!("{source}: bad BED record {}: {e}", idx + 1))
            })
        })
        .collect()
}

pub fn region_from_record(record: &bed::Record) -> Region {
    let region = Region::new(record.chrom(), record.start(), record.end());
    match record.name() {
        Some(name) => region.with_label(name),
        None => region,
    }
}

pub fn read_region_set(path: &Path) -> Result<RegionSet, EngineError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        EngineError::io(format!("Could not read BED file '{}': {e}", path.display()))
    })?;
    let source = path.display().to_string();
    let regions = parse_bed_records(&text, &source)?
        .iter()
        .map(region_from_record)
        .collect::<Vec<_>>();
    RegionSet::from_regions(regions)
        .map_err(|e| EngineError::invalid_input(format!("{source}: {e}")))
}

pub fn write_regions<'a, W: Write>(
    mut out: W,
    regions: impl IntoIterator<Item = &'a Region>,
) -> Result<(), EngineError> {
    // bed::Writer can neither flush nor hand back its sink, so records are
    // staged in memory and the sink is written and flushed here.
    let mut buffer = Vec::new();
    {
        let mut writer = bed::Writer::new(&mut buffer);
        for region in regions {
            let mut record = bed::Record::new();
            record.set_chrom(&region.chrom);
            record.set_start(region.start);
            record.set_end(region.end);
            // fixed column count; unlabelled regions are named by coordinates
            record.set_name(&region.display_name());
            writer.write(&record).map_err(|e| {
                EngineError::io(format!("Could not write BED record {region}: {e}"))
            })?;
        }
    }
    out.write_all(&buffer)
        .and_then(|()| out.flush())
        .map_err(|e| EngineError::io(format!("Could not write BED output: {e}")))
}

pub fn write_region_set(path: &Path, set: &RegionSet) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| {
        EngineError::io(format!("Could not create BED file '{}': {e}", path.display()))
    })?;
    write_regions(BufWriter::new(file), set)
        .map_err(|e| e.context(path.display().to_string()))
}
