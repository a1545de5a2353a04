use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use animedl_core::batch::{clear_series_list, read_series_list, BatchCoordinator, BatchReport};
use animedl_core::config::{build_client, DownloadConfig};
use animedl_core::discovery::{AnimeWorldSource, EpisodeRange};
use animedl_core::downloader::HttpFetchUnit;
use animedl_core::progress::notifier::DEFAULT_CHANNEL_CAPACITY;
use animedl_core::progress::{format_bytes, NoopSink, ProgressNotifier, ProgressSink};
use animedl_core::types::ConfigError;

mod cli;
mod terminal_observer;
use cli::Args;
use terminal_observer::TerminalProgressObserver;

/// Exit status for a run that could not start.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args).await {
        Ok(report) => {
            print_report(&report);
            if args.strict && report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

async fn run(args: &Args) -> Result<BatchReport, ConfigError> {
    let range = EpisodeRange::new(args.start, args.end)?;

    let mut builder = DownloadConfig::from_env()?.into_builder();
    if let Some(n) = args.concurrency {
        builder = builder.with_concurrency(n);
    }
    if let Some(dir) = &args.output_dir {
        builder = builder.with_download_dir(dir.clone());
    }
    let config = builder.build()?;

    let series = match (&args.url, &args.batch) {
        (Some(url), _) => vec![url.clone()],
        (None, Some(path)) => read_series_list(path).await?,
        (None, None) => Vec::new(),
    };

    let client = build_client(&config)?;
    let source = Arc::new(AnimeWorldSource::new(client.clone()));
    let fetcher = Arc::new(HttpFetchUnit::from_config(client, &config));

    let (sink, notifier_handle) = if args.quiet {
        let sink: Arc<dyn ProgressSink> = Arc::new(NoopSink);
        (sink, None)
    } else {
        let mut notifier = ProgressNotifier::new();
        notifier.add_observer(Box::new(TerminalProgressObserver::new()));
        let (channel_sink, handle) = notifier.spawn(DEFAULT_CHANNEL_CAPACITY);
        let sink: Arc<dyn ProgressSink> = Arc::new(channel_sink);
        (sink, Some(handle))
    };

    log::info!(
        "[cli] {} series -> {:?} ({} at a time)",
        series.len(),
        config.download_dir,
        config.concurrency
    );
    let start = Instant::now();
    let coordinator = BatchCoordinator::new(source, fetcher, sink, &config);
    let report = coordinator.run_batch(&series, range).await;

    // Dropping the last sink closes the channel so the bars can finish.
    drop(coordinator);
    if let Some(handle) = notifier_handle {
        let _ = handle.await;
    }
    println!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    if let Some(path) = &args.report {
        if let Err(e) = report.write_json(path).await {
            eprintln!("could not write report to {:?}: {}", path, e);
        }
    }

    if args.clear_batch {
        if let Some(path) = &args.batch {
            if let Err(e) = clear_series_list(path).await {
                eprintln!("could not clear {:?}: {}", path, e);
            }
        }
    }

    Ok(report)
}

fn print_report(report: &BatchReport) {
    println!(
        "{} of {} episodes downloaded ({})",
        report.succeeded,
        report.attempted,
        format_bytes(report.bytes_written)
    );
    for failure in &report.series_errors {
        println!("  series {}: {}", failure.series, failure.reason);
    }
    for failure in &report.failures {
        println!("  {}: {}", failure.task_id, failure.reason);
    }
}
