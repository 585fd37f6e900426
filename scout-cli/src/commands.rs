use clap::{Args, Parser, Subcommand};
use scout_core::EntityKind;
use scout_scanner::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scout")]
#[command(version, about = "Passive OSINT reconnaissance for domains, IPs, emails and usernames.")]
pub struct CommandLine {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every applicable module against a target
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// List the available modules
    #[command(alias = "m")]
    Modules,
    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args)]
pub struct ScanArgs {
    /// Domain, IP address, email address or username
    pub target: String,

    /// Target kind (domain, ip, email, username); detected when omitted
    #[arg(long, short)]
    pub kind: Option<EntityKind>,

    /// Report format (markdown, json, csv)
    #[arg(long, short, default_value_t = ExportFormat::Markdown)]
    pub format: ExportFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep artifacts flagged sensitive in the report
    #[arg(long)]
    pub include_sensitive: bool,

    /// Also run modules backed by paid sources
    #[arg(long)]
    pub allow_paid: bool,

    /// Neither read nor write the response cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Delete every cached response
    Clear,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
