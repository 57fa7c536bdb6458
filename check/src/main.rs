//! wxdict-check: verify a configuration and optionally list its contents.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use wxdict_registry::{ConfigStore, LoaderOptions};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "wxdict-check")]
#[command(about = "Load a wxdict configuration and report its problems")]
struct Args {
    /// Root configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// List every definition after checking
    #[arg(short, long)]
    list: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Extra directories searched for included files
    #[arg(short = 'I', long = "search-dir", value_name = "DIR")]
    search_dirs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(io::stderr)
        .init();

    let Some(root) = args.config.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        error!(config = %args.config.display(), "not a configuration file");
        return ExitCode::FAILURE;
    };
    let mut options = LoaderOptions::new(root);
    if let Some(dir) = args.config.parent().filter(|d| !d.as_os_str().is_empty()) {
        options = options.with_search_dir(dir);
    }
    for dir in args.search_dirs {
        options = options.with_search_dir(dir);
    }

    let mut store = ConfigStore::new(options);
    let summary = wxdict_check::verify(&mut store);

    for (kind, count) in &summary.counts {
        println!("{:<10} {count}", kind.block_name());
    }
    for name in &summary.failed_detail {
        println!("invalid    {name}");
    }
    println!("{} problem(s) reported", summary.diagnostics);

    if args.list {
        if let Err(err) = wxdict_check::list(&mut store, &mut io::stdout().lock()) {
            error!(%err, "cannot write listing");
            return ExitCode::FAILURE;
        }
    }

    if summary.readable {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
