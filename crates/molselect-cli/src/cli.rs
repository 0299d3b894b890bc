use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "molselect")]
#[command(version, about = "Pick the candidate molecule whose atom and bond counts best match a target", long_about = None)]
pub struct Cli {
    /// Target number of heavy atoms [default: 3]
    #[arg(long, value_name = "N")]
    pub atoms: Option<u32>,

    /// Target number of bonds [default: 3]
    #[arg(long, value_name = "N")]
    pub bonds: Option<u32>,

    /// TOML catalog of `[[candidate]]` entries (defaults to the built-in list)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Solver backend
    #[arg(long, value_enum)]
    pub solver: Option<Backend>,

    /// Base URL of the remote solving service
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Time budget for the solver call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a file in addition to stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// In-process branch-and-bound
    #[default]
    Local,
    /// Hosted solving service over HTTP
    Remote,
}
