use std::io::Write;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use keypress_core::{DEFAULT_PREFIX, Forwarder, ForwarderConfig, PathStyle, ReloadPolicy};

use crate::error::{CliError, Result};
use crate::http::{HttpTransport, LoggedReload};
use crate::replay::{ReplaySummary, preview, replay};

#[derive(Debug, Parser)]
#[command(
    name = "keypress",
    about = "Preview and replay browser keypress forwarding",
    version
)]
pub struct Cli {
    /// Print a JSON summary instead of one line per key.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the request target each key would produce.
    Preview(PreviewArgs),

    /// Send each key to a running server as the page would.
    Send(SendArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ForwardArgs {
    /// `query_echo` (`/keypress/A?key-A=`) or `plain` (`/keypress/a`).
    #[arg(long, default_value = "query_echo")]
    pub style: PathStyle,

    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Key identifiers as `KeyboardEvent.key` reports them.
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub keys: Vec<String>,
}

impl ForwardArgs {
    fn config(&self) -> ForwarderConfig {
        ForwarderConfig::default()
            .with_style(self.style)
            .with_prefix(self.prefix.clone())
    }
}

#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub forward: ForwardArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    #[arg(long, default_value = "http://127.0.0.1:5001")]
    pub base_url: String,

    /// `immediate` or `after_settle`; only affects when "reload requested" is logged.
    #[arg(long, default_value = "immediate")]
    pub reload: ReloadPolicy,

    #[arg(long = "timeout", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_seconds: u64,

    /// Exit non-zero when any request failed.
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub forward: ForwardArgs,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Preview(args) => {
            let config = args.forward.config().validated()?;
            let summary = preview(&config, &args.forward.keys);
            emit(&summary, cli.json, out)
        }
        Commands::Send(args) => run_send(args, cli.json, out),
    }
}

fn run_send(args: SendArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let transport = HttpTransport::new(&args.base_url, Duration::from_secs(args.timeout_seconds))?;
    let config = args.forward.config().with_reload(args.reload);
    let forwarder = Forwarder::new(config, transport, LoggedReload)?;
    let summary = replay(&forwarder, &args.forward.keys);
    emit(&summary, json, out)?;

    let stats = forwarder.stats();
    if args.strict && stats.requests_failed > 0 {
        return Err(CliError::RequestsFailed {
            failed: stats.requests_failed,
            issued: stats.requests_issued,
        });
    }
    Ok(())
}

fn emit(summary: &ReplaySummary, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary)?;
        writeln!(out)?;
        return Ok(());
    }
    for report in &summary.keys {
        writeln!(out, "{}", report.line())?;
    }
    if let Some(stats) = summary.stats {
        writeln!(
            out,
            "issued={} failed={} rejected={} reloads={}",
            stats.requests_issued, stats.requests_failed, stats.keys_rejected, stats.reloads
        )?;
    }
    Ok(())
}
