/*!
 * Command-line interface for HashWatch
 */

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hashwatch::config::{Cli, Command, Config};
use hashwatch::error::{HashWatchError, Result};
use hashwatch::report::{BaselineReport, ReportFormat, Reporter};
use hashwatch::utils::count_files;
use hashwatch::{classify, BaselineStore, Monitor, Scanner};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(format!("hashwatch={}", cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("hashwatch=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(HashWatchError::BaselineNotFound(path)) => {
            println!("No baseline found at {}", path.display());
            println!(
                "Create one first with: hashwatch create {}",
                cli.command.directory().display()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_cli(cli);
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        warn!("Failed to set thread pool size: {}", e);
    }

    match &cli.command {
        Command::Create { .. } => create(&config),
        Command::Check { .. } => check(&config),
        Command::Monitor { .. } => monitor(config),
    }
}

fn progress_bar(config: &Config) -> ProgressBar {
    if !config.show_progress {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(count_files(&config.target_dir));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {wide_msg:.dim.white} {pos}/{len} ({percent}%) Elapsed: {elapsed_precise}")
    {
        progress.set_style(style);
    }
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress
}

fn create(config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let progress = progress_bar(config);
    let scanner = Scanner::new(config.clone(), Arc::new(progress.clone()));
    let outcome = scanner.scan()?;
    progress.finish_and_clear();

    let store = BaselineStore::new(&config.baseline_file);
    store.save(&outcome.snapshot)?;

    let report = BaselineReport {
        baseline_file: store.path().to_path_buf(),
        files_recorded: outcome.snapshot.len(),
        total_size: outcome.snapshot.total_size(),
        files_unreadable: outcome.statistics.files_unreadable,
        bytes_hashed: outcome.statistics.bytes_hashed,
        scan_duration: outcome.statistics.duration,
        duration: start_time.elapsed(),
    };
    println!(
        "{}",
        Reporter::new(ReportFormat::Console).render_baseline_summary(&report)
    );

    Ok(())
}

fn check(config: &Config) -> Result<()> {
    let baseline = BaselineStore::new(&config.baseline_file).load()?;

    let progress = progress_bar(config);
    let scanner = Scanner::new(config.clone(), Arc::new(progress.clone()));
    let outcome = scanner.scan()?;
    progress.finish_and_clear();

    let classification = classify(&baseline, &outcome.snapshot);
    Reporter::new(config.report_format).print_classification(&classification);

    Ok(())
}

fn monitor(config: Config) -> Result<()> {
    let reporter = Reporter::new(config.report_format);

    println!("Monitoring {}", config.target_dir.display());
    println!("Press Ctrl+C to stop...");

    let monitor = Monitor::new(config);
    let stop = monitor.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.stop()) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    monitor.run(|tick| {
        if let Ok(classification) = &tick.result {
            if !classification.is_empty() {
                println!("{}", reporter.render_tick(classification, tick.at));
            }
        }
    })?;

    println!("\nMonitoring stopped");
    Ok(())
}
