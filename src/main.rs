use account_match_lib::io::export::write_outputs;
use account_match_lib::io::table::read_table;
use account_match_lib::matching::manager::{
    run_account_matching_pipeline, PipelineConfig, PipelineInputs,
};
use account_match_lib::matching::StageContext;
use account_match_lib::utils::cancellation::CancellationToken;
use account_match_lib::utils::env::load_env;
use account_match_lib::utils::get_memory_usage;
use account_match_lib::utils::progress_bars::progress_config::ProgressConfig;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct MatchArgs {
    /// Top list (customer names), CSV/TSV or spreadsheet
    #[arg(long)]
    top: PathBuf,

    /// SFDC account export
    #[arg(long)]
    sfdc: PathBuf,

    /// SAP customer export; required unless --stage1-only
    #[arg(long, required_unless_present = "stage1_only")]
    sap: Option<PathBuf>,

    /// Directory for the result tables and run summary
    #[arg(long, env = "MATCH_OUTPUT_DIR", default_value = "match_output")]
    out: PathBuf,

    /// JSON file with thresholds and column mappings
    #[arg(long, env = "MATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Top→SFDC similarity threshold
    #[arg(long)]
    top_threshold: Option<f64>,

    /// SFDC→SAP similarity threshold
    #[arg(long)]
    sap_threshold: Option<f64>,

    /// Rows above the header row in the Top file
    #[arg(long)]
    header_row: Option<usize>,

    /// Name column of the Top file
    #[arg(long)]
    top_column: Option<String>,

    /// Worker threads (0 = one per CPU)
    #[arg(long)]
    workers: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Stop after Top→SFDC matching
    #[arg(long)]
    stage1_only: bool,
}

impl MatchArgs {
    /// Defaults, then the JSON file, then the environment, then these flags.
    fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        config.apply_env();

        if let Some(v) = self.top_threshold {
            config.top_sfdc_threshold = v;
        }
        if let Some(v) = self.sap_threshold {
            config.sfdc_sap_threshold = v;
        }
        if let Some(v) = self.header_row {
            config.top_header_row = v;
        }
        if let Some(v) = &self.top_column {
            config.top_column = v.clone();
        }
        if let Some(v) = self.workers {
            config.worker_threads = v;
        }
        if let Some(v) = self.timeout_secs {
            config.timeout_secs = Some(v);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging and environment
    env_logger::init();
    info!("Starting Top → SFDC → SAP account matching");
    load_env();

    let args = MatchArgs::parse();
    let config = args.resolve_config()?;

    let workers = if config.worker_threads == 0 {
        num_cpus::get()
    } else {
        config.worker_threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("Failed to build worker pool")?;

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();

    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new(3));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb
    });
    let set_phase = |phase: &str| {
        if let Some(pb) = &main_pb {
            if progress_config.should_show_memory() {
                pb.set_message(format!("{} (Memory: {} MB)", phase, get_memory_usage()));
            } else {
                pb.set_message(phase.to_string());
            }
        }
    };

    let start = Instant::now();

    // Phase 1: inputs
    set_phase("Loading input tables");
    let inputs = PipelineInputs {
        top: read_table(&args.top, config.top_header_row)
            .with_context(|| format!("Failed to read Top file {}", args.top.display()))?,
        sfdc: read_table(&args.sfdc, 0)
            .with_context(|| format!("Failed to read SFDC file {}", args.sfdc.display()))?,
        sap: match (&args.sap, args.stage1_only) {
            (Some(path), false) => Some(
                read_table(path, 0)
                    .with_context(|| format!("Failed to read SAP file {}", path.display()))?,
            ),
            _ => None,
        },
    };
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 2: matching
    set_phase("Matching accounts");
    let token = config
        .timeout()
        .map(CancellationToken::with_timeout)
        .unwrap_or_default();
    let stage_progress = if progress_config.should_show_detailed() {
        multi_progress.clone()
    } else {
        None
    };
    let ctx = StageContext::new(token, stage_progress);
    let output = run_account_matching_pipeline(&inputs, &config, &ctx)
        .context("Account matching failed")?;
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 3: outputs
    set_phase("Writing results");
    let written = write_outputs(&args.out, &output)?;
    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.finish_with_message("Matching complete");
    }

    info!(
        "✅ Done in {:.2?}: {} SFDC matches, {} auto-matched, {} for manual review, {} files in {}",
        start.elapsed(),
        output.summary.stage1_rows,
        output.summary.auto_matches,
        output.summary.manual_review,
        written.len(),
        args.out.display()
    );
    Ok(())
}
