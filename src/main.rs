use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use manifest_images::commands::{config_cmd::ConfigOptions, list::ListOptions};
use manifest_images::commands::{execute_config, execute_list};
use manifest_images::error::AppError;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::List(args) => {
            let options = ListOptions { path: args.path, output: args.output };
            execute_list(options)?;
        }
        Commands::Config(args) => {
            let options = ConfigOptions { show_path: args.path, add_exclude: args.add_exclude };
            execute_config(options)?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "manifest-images",
    version,
    about = "List the container images referenced by Kubernetes manifests."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output.
    #[arg(short, long, action = ArgAction::SetTrue, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let mut builder = env_logger::Builder::from_default_env();
        if let Some(level) = log_level(self.verbose, std::env::var_os("RUST_LOG").is_some()) {
            builder.filter_level(level);
        }
        builder.init();
    }
}

/// An explicit `-v` wins over `RUST_LOG`; without either the level is Warn.
fn log_level(verbose: u8, rust_log_set: bool) -> Option<log::LevelFilter> {
    match verbose {
        0 if rust_log_set => None,
        0 => Some(log::LevelFilter::Warn),
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the images found in the manifests under a directory.
    #[command(visible_alias = "ls")]
    List(ListArgs),
    /// Manage manifest-images configuration (exclusions, etc.).
    #[command(visible_alias = "cfg")]
    Config(ConfigArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Directory to scan, relative to the current directory.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Write the image list to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ConfigArgs {
    /// Show the configuration file path.
    #[arg(long = "path", action = ArgAction::SetTrue)]
    path: bool,

    /// Add a glob pattern for paths the scan should skip.
    #[arg(long = "add-exclude", value_name = "GLOB")]
    add_exclude: Option<String>,
}
