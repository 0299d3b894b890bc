/// The result of solving a model
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Assigned value for each variable, in column order
    pub values: Vec<f64>,
    /// Objective value at `values`
    pub objective_value: f64,
    /// Branch-and-bound nodes explored (0 for backends that do not report it)
    pub nodes_explored: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before optimality was proven
    IterationLimit,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            nodes_explored: 0,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::INFINITY,
            nodes_explored: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NEG_INFINITY,
            nodes_explored: 0,
        }
    }

    pub fn iteration_limit() -> Self {
        Self {
            status: SolutionStatus::IterationLimit,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes_explored: 0,
        }
    }

    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes_explored = nodes;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn value_of(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}
