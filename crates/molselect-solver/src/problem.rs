use crate::error::SolveError;

/// Domain of a decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    /// Restricted to {0, 1}
    Binary,
    /// Integer within [lower, upper]
    Integer { lower: f64, upper: f64 },
    /// Real within [lower, upper]
    Continuous { lower: f64, upper: f64 },
}

impl VarKind {
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            VarKind::Binary => (0.0, 1.0),
            VarKind::Integer { lower, upper } | VarKind::Continuous { lower, upper } => (lower, upper),
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, VarKind::Binary | VarKind::Integer { .. })
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

/// A mixed-integer linear model. The objective is always minimized.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub variables: Vec<Variable>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Information about a violated constraint
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
}

impl Constraint {
    /// Left-hand side evaluated at `values`
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            objective: Objective { coefficients: Vec::new() },
            constraints: Vec::new(),
        }
    }

    /// Add a variable and return its column index
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VarKind) -> usize {
        self.variables.push(Variable { name: name.into(), kind });
        self.objective.coefficients.push(0.0);
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = Objective { coefficients };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Check that every row and the objective match the variable count and
    /// that all coefficients and bounds are usable.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(SolveError::InvalidModel("model has no variables".to_string()));
        }
        if self.objective.coefficients.len() != n {
            return Err(SolveError::InvalidModel(format!(
                "objective has {} coefficients for {} variables",
                self.objective.coefficients.len(),
                n
            )));
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::InvalidModel("objective has a non-finite coefficient".to_string()));
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolveError::InvalidModel(format!(
                    "constraint '{}' has {} coefficients for {} variables",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(SolveError::InvalidModel(format!(
                    "constraint '{}' has a non-finite coefficient",
                    c.name
                )));
            }
        }

        for v in &self.variables {
            let (lower, upper) = v.kind.bounds();
            if !lower.is_finite() || lower < 0.0 || upper < lower {
                return Err(SolveError::InvalidModel(format!(
                    "variable '{}' has invalid bounds [{}, {}]",
                    v.name, lower, upper
                )));
            }
        }

        Ok(())
    }

    /// Find which constraints and variable domains are violated by `values`.
    /// Sorted worst first.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &self.constraints {
            let lhs = c.lhs(values);
            let amount = match c.op {
                ConstraintOp::Le => lhs - c.rhs,
                ConstraintOp::Ge => c.rhs - lhs,
                ConstraintOp::Eq => (lhs - c.rhs).abs(),
            };
            if amount > tolerance {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount: amount,
                });
            }
        }

        for (v, &value) in self.variables.iter().zip(values) {
            let (lower, upper) = v.kind.bounds();
            let out_of_bounds = (lower - value).max(value - upper).max(0.0);
            let fractional = if v.kind.is_integral() {
                (value - value.round()).abs()
            } else {
                0.0
            };
            let amount = out_of_bounds.max(fractional);
            if amount > tolerance {
                violations.push(ConstraintViolation {
                    constraint: format!("{} domain", v.name),
                    required: value.round().clamp(lower, upper),
                    actual: value,
                    violation_amount: amount,
                });
            }
        }

        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
