use std::time::Duration;

use molselect_solver::SolveError;
use thiserror::Error;

use crate::analyzer::StructureError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid structure for candidate '{name}' ({structure}): {source}")]
    InvalidStructure {
        name: String,
        structure: String,
        #[source]
        source: StructureError,
    },
    #[error("Failed to load catalog from {origin}: {reason}")]
    CatalogLoad { origin: String, reason: String },
    #[error("Cannot build model: {0}")]
    ModelBuild(String),
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),
    #[error("Model is infeasible: the solver found no assignment satisfying all constraints")]
    InfeasibleModel,
    #[error("Solver exceeded its time budget of {0:?}")]
    Timeout(Duration),
    #[error("Solution violates the selection invariant: {0}")]
    InvariantViolation(String),
    #[error("Solver failed: {0}")]
    SolverFailure(String),
}

/// Stable classification of [`Error`], used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidStructure,
    CatalogLoad,
    ModelBuild,
    SolverUnavailable,
    InfeasibleModel,
    Timeout,
    InvariantViolation,
    SolverFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidStructure { .. } => ErrorKind::InvalidStructure,
            Error::CatalogLoad { .. } => ErrorKind::CatalogLoad,
            Error::ModelBuild(_) => ErrorKind::ModelBuild,
            Error::SolverUnavailable(_) => ErrorKind::SolverUnavailable,
            Error::InfeasibleModel => ErrorKind::InfeasibleModel,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Error::SolverFailure(_) => ErrorKind::SolverFailure,
        }
    }
}

impl From<SolveError> for Error {
    fn from(e: SolveError) -> Self {
        match e {
            SolveError::Infeasible => Error::InfeasibleModel,
            SolveError::Timeout(limit) => Error::Timeout(limit),
            SolveError::Unavailable(reason) => Error::SolverUnavailable(reason),
            other => Error::SolverFailure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
