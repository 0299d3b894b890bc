use thiserror::Error;

/// Errors a solver backend can report.
#[derive(Error, Debug)]
pub enum SolveError {
    /// The model is malformed (dimensions, bounds, non-finite data)
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The model has no feasible assignment
    #[error("Model is infeasible")]
    Infeasible,

    /// The objective can decrease without bound
    #[error("Model is unbounded")]
    Unbounded,

    /// The configured time budget ran out
    #[error("Solver exceeded its time budget of {0:?}")]
    Timeout(std::time::Duration),

    /// Node limit reached without proving optimality
    #[error("Node limit of {0} reached")]
    NodeLimit(usize),

    /// A relaxation exhausted its simplex pivot budget
    #[error("Simplex iteration limit of {0} reached")]
    IterationLimit(usize),

    /// The solving service could not be reached or rejected the credentials
    #[error("Solver unavailable: {0}")]
    Unavailable(String),

    /// The solving service answered with something unusable
    #[error("Malformed solver response: {0}")]
    Protocol(String),
}

pub type SolveResult<T> = Result<T, SolveError>;
