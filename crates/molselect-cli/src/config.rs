use crate::cli::{Backend, Cli};
use crate::error::{CliError, Result};
use molselect_core::Target;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TOKEN_ENV: &str = "MOLSELECT_SOLVER_TOKEN";
const DEFAULT_TIMEOUT_SECS: f64 = 60.0;
const DEFAULT_MAX_NODES: usize = 100_000;
const DEFAULT_LABEL: &str = "Molecular Selection For Drug Discovery";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialConfig {
    target: Option<PartialTarget>,
    catalog: Option<PathBuf>,
    solver: Option<PartialSolverConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTarget {
    atoms: Option<i64>,
    bonds: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolverConfig {
    backend: Option<Backend>,
    endpoint: Option<String>,
    token_env: Option<String>,
    timeout_secs: Option<f64>,
    max_nodes: Option<usize>,
    label: Option<String>,
}

/// Solver settings after layering; the token is read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub backend: Backend,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
    pub max_nodes: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub target: Target,
    pub catalog: Option<PathBuf>,
    pub solver: SolverSettings,
}

impl RunConfig {
    /// Layer defaults < config file < environment < command line.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Self::load_file(path)?,
            None => PartialConfig::default(),
        };
        let file_target = file.target.unwrap_or_default();
        let file_solver = file.solver.unwrap_or_default();

        let defaults = Target::default();
        let atoms = cli.atoms.map(i64::from).or(file_target.atoms).or(Some(defaults.atoms.into()));
        let bonds = cli.bonds.map(i64::from).or(file_target.bonds).or(Some(defaults.bonds.into()));
        let target = Target::try_from_options(atoms, bonds)?;

        // Relative catalog paths in a config file are relative to that file
        let catalog = cli.catalog.clone().or_else(|| {
            file.catalog.map(|p| match cli.config.as_deref().and_then(Path::parent) {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p,
            })
        });

        let timeout_secs = cli
            .timeout
            .or(file_solver.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| CliError::Config(format!("timeout must be a positive number of seconds, got {timeout_secs}")))?;

        let token_env = file_solver.token_env.unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
        let solver = SolverSettings {
            backend: cli.solver.or(file_solver.backend).unwrap_or_default(),
            endpoint: cli.endpoint.clone().or(file_solver.endpoint),
            token: env(&token_env).filter(|t| !t.trim().is_empty()),
            timeout,
            max_nodes: file_solver.max_nodes.unwrap_or(DEFAULT_MAX_NODES),
            label: file_solver.label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
        };

        if solver.backend == Backend::Remote {
            if solver.endpoint.is_none() {
                return Err(CliError::Config(
                    "the remote solver needs an endpoint (--endpoint or [solver] endpoint)".to_string(),
                ));
            }
            if solver.token.is_none() {
                return Err(CliError::Config(format!(
                    "the remote solver needs a token in the {token_env} environment variable"
                )));
            }
        }

        let config = Self {
            target,
            catalog,
            solver,
        };
        debug!(target = ?config.target, catalog = ?config.catalog, backend = ?config.solver.backend, "resolved configuration");
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<PartialConfig> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&source).map_err(|e| CliError::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("molselect").chain(args.iter().copied())).unwrap()
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_apply_without_flags_or_file() {
        let config = RunConfig::resolve(&parse(&[]), no_env).unwrap();
        assert_eq!(config.target, Target::new(3, 3));
        assert_eq!(config.catalog, None);
        assert_eq!(config.solver.backend, Backend::Local);
        assert_eq!(config.solver.timeout, Duration::from_secs(60));
        assert_eq!(config.solver.max_nodes, DEFAULT_MAX_NODES);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = config_file(
            r#"
            [target]
            atoms = 5
            bonds = 4

            [solver]
            timeout-secs = 10
            max-nodes = 50
            "#,
        );
        let path = file.path().to_str().unwrap();

        let config = RunConfig::resolve(&parse(&["--config", path, "--atoms", "2"]), no_env).unwrap();

        assert_eq!(config.target, Target::new(2, 4));
        assert_eq!(config.solver.timeout, Duration::from_secs(10));
        assert_eq!(config.solver.max_nodes, 50);
    }

    #[test]
    fn test_negative_target_in_file_is_a_model_error() {
        let file = config_file("[target]\natoms = -1\n");
        let path = file.path().to_str().unwrap();

        let err = RunConfig::resolve(&parse(&["--config", path]), no_env).unwrap_err();

        assert!(matches!(err, CliError::Core(molselect_core::Error::ModelBuild(_))));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let file = config_file("[solver]\ntoken = \"inline\"\n");
        let path = file.path().to_str().unwrap();

        let err = RunConfig::resolve(&parse(&["--config", path]), no_env).unwrap_err();

        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_catalog_path_is_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molselect.toml");
        std::fs::write(&path, "catalog = \"molecules.toml\"\n").unwrap();

        let config = RunConfig::resolve(&parse(&["--config", path.to_str().unwrap()]), no_env).unwrap();

        assert_eq!(config.catalog, Some(dir.path().join("molecules.toml")));
    }

    #[test]
    fn test_remote_backend_reads_token_from_named_variable() {
        let file = config_file(
            r#"
            [solver]
            backend = "remote"
            endpoint = "https://solver.example.com"
            token-env = "CUSTOM_TOKEN"
            "#,
        );
        let path = file.path().to_str().unwrap();
        let env = |key: &str| (key == "CUSTOM_TOKEN").then(|| "abc".to_string());

        let config = RunConfig::resolve(&parse(&["--config", path]), env).unwrap();

        assert_eq!(config.solver.backend, Backend::Remote);
        assert_eq!(config.solver.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_remote_backend_without_token_or_endpoint_fails() {
        let err = RunConfig::resolve(&parse(&["--solver", "remote"]), no_env).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("endpoint")));

        let err = RunConfig::resolve(
            &parse(&["--solver", "remote", "--endpoint", "https://solver.example.com"]),
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains(DEFAULT_TOKEN_ENV)));
    }

    #[test]
    fn test_non_positive_timeout_is_rejected() {
        let err = RunConfig::resolve(&parse(&["--timeout", "0"]), no_env).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
