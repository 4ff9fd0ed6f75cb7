use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod check;
mod display;

use check::CheckArgs;

/// Product news and release notes for a Deskpro installation.
#[derive(Parser)]
#[command(name = "whatsnew", version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. `info`, `whatsnew_store=debug`).
    #[arg(long, global = true, env = "WHATSNEW_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one activation: aggregate feeds, filter release notes, raise notifications.
    Check(Box<CheckArgs>),
    /// Print the version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("whatsnew v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Check(args) => {
            let report = check::run_check(&args).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_report(&report, args.pages)?;
            }
        }
        Command::Version => println!("whatsnew {}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}
