use molselect_solver::{ConstraintOp, Model, VarKind};
use tracing::debug;

use crate::analyzer::Counts;
use crate::catalog::{Candidate, Catalog};
use crate::error::{Error, Result};

/// Label of the exactly-one constraint
pub const SELECTION_CONSTRAINT: &str = "selection_constraint";
/// Name of the integer variable carrying the achieved score
pub const OBJECTIVE_VARIABLE: &str = "objective";

/// Atom and bond counts the selected molecule should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub atoms: u32,
    pub bonds: u32,
}

impl Default for Target {
    fn default() -> Self {
        Self { atoms: 3, bonds: 3 }
    }
}

impl Target {
    pub fn new(atoms: u32, bonds: u32) -> Self {
        Self { atoms, bonds }
    }

    /// Build a target from values that may be absent or signed, as they
    /// come out of configuration layers.
    pub fn try_from_options(atoms: Option<i64>, bonds: Option<i64>) -> Result<Self> {
        let field = |value: Option<i64>, name: &str| -> Result<u32> {
            let value = value.ok_or_else(|| Error::ModelBuild(format!("target {name} is missing")))?;
            u32::try_from(value)
                .map_err(|_| Error::ModelBuild(format!("target {name} must be a non-negative integer, got {value}")))
        };
        Ok(Self {
            atoms: field(atoms, "atoms")?,
            bonds: field(bonds, "bonds")?,
        })
    }
}

/// |target.atoms - atoms| + |target.bonds - bonds|, widened so that any
/// pair of `u32` targets fits.
pub fn deviation_score(counts: Counts, target: &Target) -> u64 {
    u64::from(target.atoms.abs_diff(counts.atoms)) + u64::from(target.bonds.abs_diff(counts.bonds))
}

/// A solver-ready model together with the bookkeeping needed to read the
/// chosen candidate back out of a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionModel {
    pub model: Model,
    pub candidates: Vec<Candidate>,
    /// Column of each candidate's selection variable, by candidate id
    pub selection_vars: Vec<usize>,
    pub objective_var: usize,
    /// Deviation score of each candidate, by candidate id
    pub scores: Vec<u64>,
    /// Upper bound of the objective variable (largest score)
    pub score_bound: u64,
}

impl SelectionModel {
    pub fn min_score(&self) -> Option<u64> {
        self.scores.iter().copied().min()
    }
}

/// Build the selection model for `catalog` against `target`.
///
/// Columns: `molecule_{i}` (binary) per candidate, then `objective`
/// (integer in `[0, M]`, M = largest score). Rows: the exactly-one
/// constraint, then per candidate
///
/// ```text
/// link_{i}_lower:  s_i·x_i − obj ≤ 0
/// link_{i}_upper:  (M − s_i)·x_i + obj ≤ M      i.e. obj − s_i·x_i ≤ M·(1 − x_i)
/// ```
///
/// so `obj == s_i` when `x_i = 1` and both rows are slack when `x_i = 0`.
/// The objective minimizes `obj`.
pub fn build_model(catalog: &Catalog, target: &Target) -> Result<SelectionModel> {
    if catalog.is_empty() {
        return Err(Error::ModelBuild("catalog is empty".to_string()));
    }

    let scores: Vec<u64> = catalog.iter().map(|c| deviation_score(c.counts(), target)).collect();
    let score_bound = scores.iter().copied().max().unwrap_or(0);
    let big_m = score_bound as f64;

    let mut model = Model::new();
    let selection_vars: Vec<usize> = catalog
        .iter()
        .map(|c| model.add_variable(format!("molecule_{}", c.id), VarKind::Binary))
        .collect();
    let objective_var = model.add_variable(
        OBJECTIVE_VARIABLE,
        VarKind::Integer {
            lower: 0.0,
            upper: big_m,
        },
    );
    let n = model.num_variables();

    // Exactly one candidate
    let mut coefficients = vec![0.0; n];
    for &var in &selection_vars {
        coefficients[var] = 1.0;
    }
    model.add_constraint(SELECTION_CONSTRAINT, coefficients, ConstraintOp::Eq, 1.0);

    for (i, (&var, &score)) in selection_vars.iter().zip(&scores).enumerate() {
        let score = score as f64;

        let mut lower = vec![0.0; n];
        lower[var] = score;
        lower[objective_var] = -1.0;
        model.add_constraint(format!("link_{i}_lower"), lower, ConstraintOp::Le, 0.0);

        let mut upper = vec![0.0; n];
        upper[var] = big_m - score;
        upper[objective_var] = 1.0;
        model.add_constraint(format!("link_{i}_upper"), upper, ConstraintOp::Le, big_m);
    }

    let mut objective = vec![0.0; n];
    objective[objective_var] = 1.0;
    model.set_objective(objective);

    debug!(
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        score_bound,
        "built selection model"
    );

    Ok(SelectionModel {
        model,
        candidates: catalog.candidates().to_vec(),
        selection_vars,
        objective_var,
        scores,
        score_bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SmilesAnalyzer;
    use crate::catalog::CatalogEntry;

    fn fixture_catalog() -> Catalog {
        let counts = [(3, 2), (3, 2), (3, 2), (4, 3), (3, 3), (4, 4), (3, 2), (3, 2), (3, 2)];
        let entries = Catalog::builtin_entries()
            .into_iter()
            .zip(counts)
            .map(|(entry, (atoms, bonds))| entry.with_counts(atoms, bonds));
        Catalog::from_entries(entries, &SmilesAnalyzer).unwrap()
    }

    /// Assignment selecting `chosen` with the objective variable set to `objective`
    fn assignment(built: &SelectionModel, chosen: usize, objective: f64) -> Vec<f64> {
        let mut values = vec![0.0; built.model.num_variables()];
        values[built.selection_vars[chosen]] = 1.0;
        values[built.objective_var] = objective;
        values
    }

    #[test]
    fn test_deviation_score() {
        let target = Target::new(3, 3);
        assert_eq!(deviation_score(Counts::new(3, 3), &target), 0);
        assert_eq!(deviation_score(Counts::new(3, 2), &target), 1);
        assert_eq!(deviation_score(Counts::new(4, 4), &target), 2);
        assert_eq!(deviation_score(Counts::new(0, 7), &target), 7);
    }

    #[test]
    fn test_extreme_target_does_not_overflow() {
        let target = Target::new(u32::MAX, u32::MAX);
        assert_eq!(deviation_score(Counts::new(0, 0), &target), 2 * u64::from(u32::MAX));

        let built = build_model(&fixture_catalog(), &target).unwrap();
        let expected = 2 * u64::from(u32::MAX) - 5;
        assert_eq!(built.score_bound, expected);
        assert_eq!(built.min_score(), Some(2 * u64::from(u32::MAX) - 8));
        assert_eq!(
            built.model.variables[built.objective_var].kind,
            VarKind::Integer { lower: 0.0, upper: expected as f64 }
        );

        let exact = assignment(&built, 5, built.scores[5] as f64);
        assert!(built.model.violations(&exact, 1e-9).is_empty());
    }

    #[test]
    fn test_model_dimensions() {
        for catalog in [fixture_catalog(), Catalog::builtin().unwrap()] {
            let built = build_model(&catalog, &Target::default()).unwrap();
            assert_eq!(built.model.num_variables(), catalog.len() + 1);
            assert_eq!(built.model.num_constraints(), 1 + 2 * catalog.len());
            assert_eq!(built.model.constraints[0].name, SELECTION_CONSTRAINT);
            assert_eq!(built.model.variable_index(OBJECTIVE_VARIABLE), Some(built.objective_var));
        }

        let single = Catalog::from_entries(vec![CatalogEntry::new("Methane", "C")], &SmilesAnalyzer).unwrap();
        let built = build_model(&single, &Target::default()).unwrap();
        assert_eq!(built.model.num_variables(), 2);
        assert_eq!(built.model.num_constraints(), 3);
    }

    #[test]
    fn test_scores_and_bound() {
        let built = build_model(&fixture_catalog(), &Target::new(3, 3)).unwrap();
        assert_eq!(built.scores, vec![1, 1, 1, 1, 0, 2, 1, 1, 1]);
        assert_eq!(built.score_bound, 2);
        assert_eq!(built.min_score(), Some(0));
        assert_eq!(
            built.model.variables[built.objective_var].kind,
            VarKind::Integer { lower: 0.0, upper: 2.0 }
        );
    }

    #[test]
    fn test_selected_candidate_pins_objective_to_its_score() {
        let built = build_model(&fixture_catalog(), &Target::new(3, 3)).unwrap();

        for (i, &score) in built.scores.iter().enumerate() {
            let score = score as f64;
            let exact = assignment(&built, i, score);
            assert!(built.model.violations(&exact, 1e-9).is_empty(), "candidate {i} with its score must be feasible");

            for wrong in [score - 1.0, score + 1.0] {
                if (0.0..=built.score_bound as f64).contains(&wrong) {
                    let values = assignment(&built, i, wrong);
                    assert!(
                        !built.model.violations(&values, 1e-9).is_empty(),
                        "candidate {i} with objective {wrong} must be infeasible"
                    );
                }
            }
        }
    }

    #[test]
    fn test_exactly_one_is_enforced() {
        let built = build_model(&fixture_catalog(), &Target::new(3, 3)).unwrap();

        let none = vec![0.0; built.model.num_variables()];
        let violations = built.model.violations(&none, 1e-9);
        assert!(violations.iter().any(|v| v.constraint == SELECTION_CONSTRAINT));

        let mut two = assignment(&built, 0, 1.0);
        two[built.selection_vars[1]] = 1.0;
        let violations = built.model.violations(&two, 1e-9);
        assert!(violations.iter().any(|v| v.constraint == SELECTION_CONSTRAINT));
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = fixture_catalog();
        let target = Target::new(3, 3);
        let first = build_model(&catalog, &target).unwrap();
        let second = build_model(&catalog, &target).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let empty = Catalog::from_entries(Vec::new(), &SmilesAnalyzer).unwrap();
        let err = build_model(&empty, &Target::default()).unwrap_err();
        assert!(matches!(err, Error::ModelBuild(_)));
    }

    #[test]
    fn test_target_from_options() {
        assert_eq!(Target::try_from_options(Some(3), Some(4)).unwrap(), Target::new(3, 4));
        assert!(matches!(Target::try_from_options(None, Some(3)), Err(Error::ModelBuild(_))));
        assert!(matches!(Target::try_from_options(Some(3), Some(-1)), Err(Error::ModelBuild(_))));
    }
}
