mod cli;
mod config;
mod error;
mod logging;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use molselect_core::{Catalog, Selection, SmilesAnalyzer, load_catalog, select_best};
use molselect_solver::remote::{RemoteConfig, RemoteSolver};
use molselect_solver::{BranchAndBound, Solver};
use tracing::{debug, info};

use crate::cli::{Backend, Cli};
use crate::config::{RunConfig, SolverSettings};
use crate::error::{CliError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone()) {
        eprintln!("Error: {e}");
        return ExitCode::from(e.exit_code());
    }

    let outcome = run(&cli).and_then(|selection| report(&selection, &mut std::io::stdout().lock()));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<Selection> {
    debug!("Full CLI arguments parsed: {:?}", cli);
    let config = RunConfig::resolve(cli, |key| std::env::var(key).ok())?;

    let catalog = match &config.catalog {
        Some(path) => Catalog::from_file(path, &SmilesAnalyzer)?,
        None => load_catalog()?,
    };
    info!(
        candidates = catalog.len(),
        atoms = config.target.atoms,
        bonds = config.target.bonds,
        "selecting candidate"
    );

    let solver = build_solver(&config.solver)?;
    Ok(select_best(&catalog, &config.target, solver.as_ref())?)
}

/// Write the result line; a closed stdout surfaces as `CliError::Io`.
fn report(selection: &Selection, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{selection}")?;
    out.flush()?;
    Ok(())
}

fn build_solver(settings: &SolverSettings) -> Result<Box<dyn Solver>> {
    match settings.backend {
        Backend::Local => Ok(Box::new(
            BranchAndBound::new()
                .with_max_nodes(settings.max_nodes)
                .with_time_limit(Some(settings.timeout)),
        )),
        Backend::Remote => {
            let (Some(endpoint), Some(token)) = (&settings.endpoint, &settings.token) else {
                return Err(CliError::Config("remote solver is missing its endpoint or token".to_string()));
            };
            let remote = RemoteSolver::new(RemoteConfig {
                endpoint: endpoint.clone(),
                token: token.clone(),
                timeout: settings.timeout,
                label: settings.label.clone(),
            })?;
            Ok(Box::new(remote))
        }
    }
}
