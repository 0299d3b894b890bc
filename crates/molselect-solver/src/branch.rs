use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::Solver;
use crate::error::{SolveError, SolveResult};
use crate::problem::Model;
use crate::simplex::Simplex;
use crate::solution::{Solution, SolutionStatus};

/// In-process mixed-integer solver: depth-first branch-and-bound over
/// simplex relaxations, branching on the most fractional integral variable.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    simplex: Simplex,
    /// Maximum nodes before giving up
    max_nodes: usize,
    /// Wall-clock budget for one `minimize` call
    time_limit: Option<Duration>,
    /// Distance from an integer below which a value counts as integral
    integrality_tolerance: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            simplex: Simplex::default(),
            max_nodes: 100_000,
            time_limit: None,
            integrality_tolerance: 1e-6,
        }
    }
}

struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    depth: usize,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplex(mut self, simplex: Simplex) -> Self {
        self.simplex = simplex;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    /// Integral variable whose relaxed value is furthest from an integer
    fn most_fractional(&self, model: &Model, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (j, v) in model.variables.iter().enumerate() {
            if !v.kind.is_integral() {
                continue;
            }
            let value = values[j];
            let frac = (value - value.floor()).min(value.ceil() - value);
            if frac <= self.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, _, best_frac)| frac > best_frac + self.integrality_tolerance) {
                best = Some((j, value, frac));
            }
        }
        best.map(|(j, value, _)| (j, value))
    }

    fn root(&self, model: &Model) -> Node {
        let (lower, upper) = model
            .variables
            .iter()
            .map(|v| {
                let (lower, upper) = v.kind.bounds();
                if v.kind.is_integral() {
                    (lower.ceil(), upper.floor())
                } else {
                    (lower, upper)
                }
            })
            .unzip();
        Node { lower, upper, depth: 0 }
    }
}

impl Solver for BranchAndBound {
    fn minimize(&self, model: &Model) -> SolveResult<Solution> {
        model.validate()?;

        let start = Instant::now();
        let mut stack = vec![self.root(model)];
        let mut incumbent: Option<Solution> = None;
        let mut nodes = 0usize;

        while let Some(node) = stack.pop() {
            if let Some(limit) = self.time_limit {
                if start.elapsed() >= limit {
                    warn!(nodes, ?limit, "branch-and-bound time limit reached");
                    return Err(SolveError::Timeout(limit));
                }
            }
            if nodes >= self.max_nodes {
                warn!(nodes, "branch-and-bound node limit reached");
                return Err(SolveError::NodeLimit(self.max_nodes));
            }
            nodes += 1;

            let relaxed = self.simplex.solve_bounded(model, &node.lower, &node.upper);
            match relaxed.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    trace!(depth = node.depth, "node infeasible");
                    continue;
                }
                SolutionStatus::Unbounded => return Err(SolveError::Unbounded),
                SolutionStatus::IterationLimit => {
                    return Err(SolveError::IterationLimit(self.simplex.max_iterations()));
                }
            }

            if let Some(best) = &incumbent {
                if relaxed.objective_value >= best.objective_value - self.integrality_tolerance {
                    trace!(depth = node.depth, bound = relaxed.objective_value, "node pruned");
                    continue;
                }
            }

            match self.most_fractional(model, &relaxed.values) {
                None => {
                    let values: Vec<f64> = relaxed
                        .values
                        .iter()
                        .zip(&model.variables)
                        .map(|(&x, v)| if v.kind.is_integral() { x.round() } else { x })
                        .collect();
                    let objective_value = model.evaluate_objective(&values);
                    debug!(depth = node.depth, objective_value, "new incumbent");
                    incumbent = Some(Solution::optimal(values, objective_value));
                }
                Some((var, value)) => {
                    let mut down = Node {
                        lower: node.lower.clone(),
                        upper: node.upper.clone(),
                        depth: node.depth + 1,
                    };
                    down.upper[var] = value.floor();
                    let mut up = Node {
                        lower: node.lower,
                        upper: node.upper,
                        depth: node.depth + 1,
                    };
                    up.lower[var] = value.ceil();

                    // Explore the side the relaxation leans toward first
                    if value - value.floor() < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                }
            }
        }

        debug!(nodes, elapsed = ?start.elapsed(), "branch-and-bound finished");
        incumbent.map(|s| s.with_nodes(nodes)).ok_or(SolveError::Infeasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, VarKind};

    #[test]
    fn test_pure_binary_selection() {
        // Pick exactly one of three items, minimizing cost 5, 2, 7
        let mut model = Model::new();
        for name in ["a", "b", "c"] {
            model.add_variable(name, VarKind::Binary);
        }
        model.set_objective(vec![5.0, 2.0, 7.0]);
        model.add_constraint("one", vec![1.0, 1.0, 1.0], ConstraintOp::Eq, 1.0);

        let solution = BranchAndBound::new().minimize(&model).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![0.0, 1.0, 0.0]);
        assert_eq!(solution.objective_value, 2.0);
        assert!(solution.nodes_explored >= 1);
    }

    #[test]
    fn test_integer_rounding_needs_branching() {
        // Maximize x + y  <=>  minimize -x - y
        //   2x + 2y <= 3, x, y integer in [0, 10]
        // Relaxation gives 1.5; integer optimum is 1
        let mut model = Model::new();
        model.add_variable("x", VarKind::Integer { lower: 0.0, upper: 10.0 });
        model.add_variable("y", VarKind::Integer { lower: 0.0, upper: 10.0 });
        model.set_objective(vec![-1.0, -1.0]);
        model.add_constraint("cap", vec![2.0, 2.0], ConstraintOp::Le, 3.0);

        let solution = BranchAndBound::new().minimize(&model).unwrap();

        assert_eq!(solution.objective_value, -1.0);
        assert_eq!(solution.values.iter().sum::<f64>(), 1.0);
        assert!(model.violations(&solution.values, 1e-9).is_empty());
    }

    #[test]
    fn test_infeasible_integer_model() {
        // 2x = 1 has no integer solution
        let mut model = Model::new();
        model.add_variable("x", VarKind::Integer { lower: 0.0, upper: 4.0 });
        model.set_objective(vec![1.0]);
        model.add_constraint("half", vec![2.0], ConstraintOp::Eq, 1.0);

        let result = BranchAndBound::new().minimize(&model);

        assert!(matches!(result, Err(SolveError::Infeasible)));
    }

    #[test]
    fn test_zero_time_limit_times_out() {
        let mut model = Model::new();
        model.add_variable("x", VarKind::Binary);
        model.set_objective(vec![1.0]);

        let result = BranchAndBound::new()
            .with_time_limit(Some(Duration::ZERO))
            .minimize(&model);

        assert!(matches!(result, Err(SolveError::Timeout(_))));
    }

    #[test]
    fn test_node_limit() {
        let mut model = Model::new();
        model.add_variable("x", VarKind::Integer { lower: 0.0, upper: 4.0 });
        model.set_objective(vec![1.0]);
        model.add_constraint("half", vec![2.0], ConstraintOp::Eq, 1.0);

        let result = BranchAndBound::new().with_max_nodes(1).minimize(&model);

        assert!(matches!(result, Err(SolveError::NodeLimit(1))));
    }

    #[test]
    fn test_simplex_iteration_limit_is_an_error() {
        let mut model = Model::new();
        model.add_variable("x", VarKind::Integer { lower: 0.0, upper: 3.0 });
        model.add_variable("y", VarKind::Integer { lower: 0.0, upper: 3.0 });
        model.set_objective(vec![-1.0, -1.0]);

        let result = BranchAndBound::new()
            .with_simplex(Simplex::new().with_max_iterations(1))
            .minimize(&model);

        assert!(matches!(result, Err(SolveError::IterationLimit(1))));
    }

    #[test]
    fn test_integrality_tolerance_accepts_near_integers() {
        // 10x >= 9.99 relaxes to x = 0.999
        let mut model = Model::new();
        model.add_variable("x", VarKind::Integer { lower: 0.0, upper: 10.0 });
        model.set_objective(vec![1.0]);
        model.add_constraint("floor", vec![10.0], ConstraintOp::Ge, 9.99);

        let strict = BranchAndBound::new().minimize(&model).unwrap();
        assert_eq!(strict.values, vec![1.0]);
        assert!(strict.nodes_explored > 1);

        let loose = BranchAndBound::new()
            .with_integrality_tolerance(1e-2)
            .minimize(&model)
            .unwrap();
        assert_eq!(loose.values, vec![1.0]);
        assert_eq!(loose.nodes_explored, 1);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let result = BranchAndBound::new().minimize(&Model::new());
        assert!(matches!(result, Err(SolveError::InvalidModel(_))));
    }
}
