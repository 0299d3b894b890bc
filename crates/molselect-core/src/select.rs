use std::fmt;

use molselect_solver::{Solution, SolutionStatus, Solver};
use tracing::{debug, info};

use crate::builder::{SelectionModel, Target, build_model};
use crate::catalog::{Candidate, Catalog};
use crate::error::{Error, Result};

/// How far a solver value may sit from 0 or 1 and still count as that value
const SELECTION_TOLERANCE: f64 = 1e-6;

/// The candidate picked by the solver and the score it achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub candidate: Candidate,
    pub achieved_score: u64,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selected molecule: {}, English name: {}",
            self.candidate.structure, self.candidate.name
        )
    }
}

/// Submit `selection` to `solver` and read back the single chosen candidate.
///
/// When several candidates share the minimum score, which one comes back is
/// up to the solver.
pub fn solve<S>(selection: &SelectionModel, solver: &S) -> Result<Selection>
where
    S: Solver + ?Sized,
{
    let solution = solver.minimize(&selection.model)?;
    debug!(
        status = ?solution.status,
        objective = solution.objective_value,
        nodes = solution.nodes_explored,
        "solver returned"
    );
    extract_selection(selection, &solution)
}

/// Build the model for `catalog`/`target` and solve it.
pub fn select_best<S>(catalog: &Catalog, target: &Target, solver: &S) -> Result<Selection>
where
    S: Solver + ?Sized,
{
    let selection = build_model(catalog, target)?;
    solve(&selection, solver)
}

fn extract_selection(selection: &SelectionModel, solution: &Solution) -> Result<Selection> {
    match solution.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Infeasible => return Err(Error::InfeasibleModel),
        SolutionStatus::Unbounded => return Err(Error::SolverFailure("solver reported an unbounded model".to_string())),
        SolutionStatus::IterationLimit => {
            return Err(Error::SolverFailure("solver stopped at its iteration limit".to_string()));
        }
    }

    if solution.values.len() != selection.model.num_variables() {
        return Err(Error::InvariantViolation(format!(
            "solution has {} values for {} variables",
            solution.values.len(),
            selection.model.num_variables()
        )));
    }

    let mut chosen = Vec::new();
    for (id, &var) in selection.selection_vars.iter().enumerate() {
        let value = solution.values[var];
        if (value - 1.0).abs() <= SELECTION_TOLERANCE {
            chosen.push(id);
        } else if value.abs() > SELECTION_TOLERANCE {
            return Err(Error::InvariantViolation(format!(
                "{} has non-binary value {}",
                selection.model.variables[var].name, value
            )));
        }
    }

    let id = match chosen.as_slice() {
        [id] => *id,
        [] => return Err(Error::InvariantViolation("no candidate selected".to_string())),
        many => {
            return Err(Error::InvariantViolation(format!(
                "{} candidates selected ({:?})",
                many.len(),
                many
            )));
        }
    };

    let candidate = selection
        .candidates
        .get(id)
        .cloned()
        .ok_or_else(|| Error::InvariantViolation(format!("selected index {id} is not in the catalog")))?;
    let score = selection.scores[id];

    let objective = solution.values[selection.objective_var];
    if (objective - score as f64).abs() > SELECTION_TOLERANCE {
        return Err(Error::InvariantViolation(format!(
            "objective variable is {objective} but {} scores {score}",
            candidate.name
        )));
    }

    info!(id, name = %candidate.name, structure = %candidate.structure, score, "selected candidate");
    Ok(Selection {
        candidate,
        achieved_score: score,
    })
}
