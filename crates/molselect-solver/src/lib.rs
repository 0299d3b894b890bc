mod branch;
mod error;
mod problem;
mod simplex;
mod solution;

#[cfg(feature = "remote")]
pub mod remote;

pub use branch::BranchAndBound;
pub use error::{SolveError, SolveResult};
pub use problem::{Constraint, ConstraintOp, ConstraintViolation, Model, Objective, VarKind, Variable};
pub use simplex::Simplex;
pub use solution::{Solution, SolutionStatus};

/// A backend able to minimize a mixed-integer linear [`Model`].
///
/// Implementations must return a solution whose `values` are in the model's
/// column order. An infeasible model is reported as [`SolveError::Infeasible`].
pub trait Solver {
    fn minimize(&self, model: &Model) -> SolveResult<Solution>;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn minimize(&self, model: &Model) -> SolveResult<Solution> {
        (**self).minimize(model)
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn minimize(&self, model: &Model) -> SolveResult<Solution> {
        (**self).minimize(model)
    }
}
