use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "getbin", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "f", name = "fetch", about = "Fetch every binary listed in a manifest")]
    Fetch(FetchArg),
    #[command(alias = "c", name = "cache", about = "Inspect or edit the download cache")]
    Cache(CacheArg),
    #[command(alias = "fp", name = "fingerprint", about = "Print the fingerprint of a directory")]
    Fingerprint(FingerprintArg),
    #[command(alias = "p", name = "platform", about = "Print the detected platform")]
    Platform,
}

#[derive(Clone, Debug, Args)]
pub struct FetchArg {
    /// Manifest listing the binaries, TOML or JSON.
    pub manifest: PathBuf,
    /// Ignore cached downloads and fetch again.
    #[arg(short, long)]
    pub force: bool,
    #[arg(long)]
    pub no_progress: bool,
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Args)]
pub struct CacheArg {
    /// Manifest whose settings locate the cache.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: CacheCommands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum CacheCommands {
    #[command(alias = "ls", name = "list")]
    List,
    #[command(name = "prune", about = "Drop entries whose files are gone")]
    Prune,
    #[command(alias = "rm", name = "remove")]
    Remove { url: String },
    #[command(name = "clear")]
    Clear,
}

#[derive(Clone, Debug, Args)]
pub struct FingerprintArg {
    pub dir: PathBuf,
}
