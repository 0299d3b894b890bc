use molselect_core::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] molselect_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<molselect_solver::SolveError> for CliError {
    fn from(e: molselect_solver::SolveError) -> Self {
        CliError::Core(e.into())
    }
}

impl CliError {
    /// Process exit status, one per error kind (sysexits-style values)
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 64,
            CliError::Io(_) => 74,
            CliError::Core(e) => match e.kind() {
                ErrorKind::InvalidStructure | ErrorKind::CatalogLoad => 65,
                ErrorKind::ModelBuild => 66,
                ErrorKind::SolverUnavailable => 69,
                ErrorKind::InfeasibleModel => 70,
                ErrorKind::InvariantViolation | ErrorKind::SolverFailure => 71,
                ErrorKind::Timeout => 75,
            },
        }
    }
}
