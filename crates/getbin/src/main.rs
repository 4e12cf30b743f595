use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use getbin::{Getbin, Manifest, Settings};
use getbin_cache::CacheIndex;
use getbin_platform::Current;
use tracing_subscriber::EnvFilter;

use crate::bars::BarReporter;
use crate::cli::{App, CacheArg, CacheCommands, Commands, FetchArg, FingerprintArg};

mod bars;
mod cli;

const LOG_ENV: &str = "GETBIN_LOG";

fn main() -> ExitCode {
    let app = App::parse();
    init_logging(app.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(app)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Returns whether every request succeeded.
async fn run(app: App) -> Result<bool> {
    match app.cmd {
        Commands::Fetch(arg) => fetch(arg).await,
        Commands::Cache(arg) => cache(arg).await.map(|()| true),
        Commands::Fingerprint(arg) => fingerprint(arg).await.map(|()| true),
        Commands::Platform => {
            println!("{}", Current::detect());
            Ok(true)
        }
    }
}

async fn fetch(arg: FetchArg) -> Result<bool> {
    let manifest = Manifest::from_path(&arg.manifest)?;
    let mut settings = Settings::load(Some(&arg.manifest)).context("failed to load settings")?;
    if arg.no_progress || arg.json {
        settings.progress = false;
    }

    let show_progress = settings.progress;
    let mut getbin = Getbin::from_settings(settings)?;
    if show_progress {
        getbin = getbin.with_progress(BarReporter::new());
    }

    let report = getbin.get_all(&manifest.binaries, arg.force).await?;
    if arg.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (name, binary) in &report.binaries {
            println!("{name}\t{}\t{}", binary.source, binary.path.display());
        }
        for failure in &report.errors {
            eprintln!("failed: {failure}");
        }
    }
    Ok(report.is_success())
}

async fn cache(arg: CacheArg) -> Result<()> {
    let settings = Settings::load(arg.manifest.as_deref()).context("failed to load settings")?;
    let index = CacheIndex::new(settings.index_path());
    match arg.cmd {
        CacheCommands::List => {
            for (url, entry) in index.entries().await? {
                println!(
                    "{url}\t{}\t{} bytes\t{}",
                    entry.binary_path.display(),
                    entry.total_size,
                    entry.content_hash
                );
            }
        }
        CacheCommands::Prune => {
            for url in index.prune().await? {
                println!("pruned {url}");
            }
        }
        CacheCommands::Remove { url } => match index.remove(&url).await? {
            Some(entry) => println!("removed {url} ({})", entry.binary_path.display()),
            None => anyhow::bail!("no cache entry for {url}"),
        },
        CacheCommands::Clear => {
            let count = index.clear().await?;
            println!("cleared {count} entries");
        }
    }
    Ok(())
}

async fn fingerprint(arg: FingerprintArg) -> Result<()> {
    let fp = getbin_cache::fingerprint(arg.dir.clone())
        .await
        .with_context(|| format!("failed to fingerprint {}", arg.dir.display()))?;
    println!("{}\t{}", fp.content_hash, fp.total_size);
    Ok(())
}
