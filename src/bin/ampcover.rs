use ampcover::about;
use ampcover::bed::read_region_set;
use ampcover::config::RunConfig;
use ampcover::engine::coverage::{CoverageTracker, covered};
use ampcover::engine::{
    CoverageOptimizer, CycleOutcome, DesignOutcome, EngineError, PrimerDesigner, RunSnapshot,
    RunState, RunSummary,
};
use ampcover::protocol::{DesignParameters, RegionSet};
use ampcover::{ExternalDesigner, FileOutputWriter};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ampcover",
    about = "Adaptive multiplex PCR primer-pool coverage optimizer",
    disable_version_flag = true
)]
struct Cli {
    /// Print version and build information.
    #[arg(long, short = 'V')]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Design primer pools until the targets are covered or the schedule ends.
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, required_unless_present = "resume")]
        targets: Option<PathBuf>,
        /// Output directory (overrides the configuration).
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        iter_max: Option<usize>,
        /// Lower bound of the pool size range. A resumed run keeps the
        /// snapshot's parameters, so this cannot be combined with `--resume`.
        #[arg(long, conflicts_with = "resume")]
        pool_min: Option<usize>,
        /// Walk the schedule without invoking the design engine.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, short, default_value_t = false)]
        verbose: bool,
        /// Continue from a snapshot written by an earlier run.
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Write the default configuration as JSON.
    DefaultConfig { path: PathBuf },
    /// Report coverage of a snapshot's primers against a target BED.
    Coverage {
        #[arg(long)]
        targets: PathBuf,
        #[arg(long)]
        snapshot: PathBuf,
    },
}

struct RunArgs {
    config: PathBuf,
    targets: Option<PathBuf>,
    out: Option<PathBuf>,
    prefix: Option<String>,
    iter_max: Option<usize>,
    pool_min: Option<usize>,
    dry_run: bool,
    verbose: bool,
    resume: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(out) = &args.out {
        config.output.directory = out.to_string_lossy().to_string();
    }
    if let Some(prefix) = &args.prefix {
        config.output.prefix = prefix.clone();
    }
    if let Some(iter_max) = args.iter_max {
        config.schedule.iter_max = iter_max;
    }
    if let Some(pool_min) = args.pool_min {
        config.parameters.pool_size.min = pool_min;
    }
    if args.dry_run {
        config.schedule.enabled = false;
    }
    if args.verbose {
        config.schedule.verbose = true;
    }
}

/// Stands in for the external designer on dry runs; never called because
/// invocation is disabled.
struct DisabledDesigner;

impl PrimerDesigner for DisabledDesigner {
    fn name(&self) -> &str {
        "disabled"
    }

    fn design(
        &mut self,
        _targets: &RegionSet,
        _params: &DesignParameters,
    ) -> Result<DesignOutcome, EngineError> {
        Ok(DesignOutcome::NoResult)
    }
}

fn initial_state(config: &RunConfig, args: &RunArgs) -> Result<RunState> {
    match &args.resume {
        Some(path) => {
            let snapshot = RunSnapshot::load_from_path(&path.to_string_lossy())
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            if let Some(targets_path) = &args.targets {
                let targets = read_region_set(targets_path)?;
                if targets != snapshot.original {
                    bail!(
                        "Targets {} differ from the snapshot's target set",
                        targets_path.display()
                    );
                }
            }
            tracing::info!(
                snapshot = %path.display(),
                primers = snapshot.primers.len(),
                "Resuming from snapshot"
            );
            Ok(RunState::resume(snapshot)?)
        }
        None => {
            let path = args
                .targets
                .as_ref()
                .context("--targets is required without --resume")?;
            let targets = read_region_set(path)
                .with_context(|| format!("reading targets {}", path.display()))?;
            Ok(RunState::new(targets, config.parameters.clone())?)
        }
    }
}

/// The designer's prefilter derives from the configured parameters; keep them
/// identical to the ones the run actually starts from.
fn adopt_run_parameters(config: &mut RunConfig, state: &RunState) {
    if config.parameters != state.params {
        tracing::info!("Using the snapshot's design parameters");
        config.parameters = state.params.clone();
    }
}

fn print_summary(summary: &RunSummary) {
    let no_result = summary
        .cycles
        .iter()
        .filter(|c| matches!(c.outcome, CycleOutcome::NoResult))
        .count();
    println!("cycles:           {}", summary.cycles_executed());
    println!("accepted cycles:  {}", summary.accepted_cycles());
    println!("no-result cycles: {no_result}");
    println!("pools:            {}", summary.pool_count);
    println!("primer pairs:     {}", summary.primer_count);
    println!(
        "uncovered:        {} regions, {} bp",
        summary.uncovered.len(),
        summary.uncovered.total_bases()
    );
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::load_from_path(&args.config.to_string_lossy())
        .with_context(|| format!("loading config {}", args.config.display()))?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let mut state = initial_state(&config, &args)?;
    adopt_run_parameters(&mut config, &state);
    let writer = FileOutputWriter::from_settings(&config.output);
    let summary = if config.schedule.enabled {
        let designer = ExternalDesigner::from_config(&config)?;
        CoverageOptimizer::new(designer, writer, config.schedule.clone()).run(&mut state)?
    } else {
        CoverageOptimizer::new(DisabledDesigner, writer, config.schedule.clone())
            .run(&mut state)?
    };
    print_summary(&summary);
    Ok(())
}

fn coverage_report(targets: &Path, snapshot: &Path) -> Result<()> {
    let original = read_region_set(targets)
        .with_context(|| format!("reading targets {}", targets.display()))?;
    let snapshot = RunSnapshot::load_from_path(&snapshot.to_string_lossy())
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    let tracker = CoverageTracker::new(snapshot.parameters.pad);
    let uncovered = tracker.uncovered(&original, &snapshot.primers)?;
    let covered = covered(&original, &uncovered)?;
    println!(
        "targets:   {} regions, {} bp",
        original.len(),
        original.total_bases()
    );
    println!(
        "covered:   {} regions, {} bp",
        covered.len(),
        covered.total_bases()
    );
    println!(
        "uncovered: {} regions, {} bp",
        uncovered.len(),
        uncovered.total_bases()
    );
    for region in &uncovered {
        println!("  {region}\t{}", region.display_name());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    let Some(command) = cli.command else {
        bail!("No command given; see `ampcover --help`");
    };
    match command {
        Command::Run {
            config,
            targets,
            out,
            prefix,
            iter_max,
            pool_min,
            dry_run,
            verbose,
            resume,
        } => {
            init_tracing(verbose);
            run(RunArgs {
                config,
                targets,
                out,
                prefix,
                iter_max,
                pool_min,
                dry_run,
                verbose,
                resume,
            })
        }
        Command::DefaultConfig { path } => {
            init_tracing(false);
            RunConfig::default().save_to_path(&path.to_string_lossy())?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Command::Coverage { targets, snapshot } => {
            init_tracing(false);
            coverage_report(&targets, &snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampcover::protocol::Region;

    #[test]
    fn test_pool_min_conflicts_with_resume() {
        let parsed = Cli::try_parse_from([
            "ampcover",
            "run",
            "--config",
            "c.json",
            "--resume",
            "snapshots/iter_0.json",
            "--pool-min",
            "3",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "ampcover",
            "run",
            "--config",
            "c.json",
            "--targets",
            "t.bed",
            "--pool-min",
            "3",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_resumed_parameters_drive_prefilter() {
        let mut snapshot_params = DesignParameters::default();
        snapshot_params.pool_size.min = 5;
        let targets = RegionSet::from_regions(vec![Region::new("chr1", 0, 500)]).unwrap();
        let state = RunState::new(targets, snapshot_params.clone()).unwrap();

        let mut config = RunConfig::default();
        assert_eq!(config.prefilter_pool_min(), 2);
        adopt_run_parameters(&mut config, &state);
        assert_eq!(config.parameters, snapshot_params);
        assert_eq!(config.prefilter_pool_min(), 5);
    }
}
