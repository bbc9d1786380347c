use thiserror::Error;

/// A linear program over non-negative variables, some of which may be
/// restricted to integer values.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct IntegerProgram {
    /// Variable names
    pub variables: Vec<String>,
    /// Integrality flag per variable
    pub integer: Vec<bool>,
    /// Objective function
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
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
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Objective has {found} coefficients, expected {expected}")]
    ObjectiveWidth { expected: usize, found: usize },
    #[error("Constraint {name} has {found} coefficients, expected {expected}")]
    ConstraintWidth {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

impl IntegerProgram {
    /// Create a program with continuous variables and a zero objective.
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            integer: vec![false; n],
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Create a program where every variable is integer.
    pub fn all_integer(variables: Vec<String>) -> Self {
        let mut program = Self::new(variables);
        program.integer.iter_mut().for_each(|flag| *flag = true);
        program
    }

    pub fn set_integer(&mut self, index: usize, integer: bool) {
        self.integer[index] = integer;
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective {
            coefficients,
            minimize,
        };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
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

    /// Evaluate the objective at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Check that `values` satisfies every constraint and bound within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.iter().any(|&v| v < -tolerance) {
            return false;
        }
        self.constraints.iter().all(|c| {
            let lhs: f64 = c.coefficients.iter().zip(values).map(|(a, v)| a * v).sum();
            match c.op {
                ConstraintOp::Le => lhs <= c.rhs + tolerance,
                ConstraintOp::Ge => lhs >= c.rhs - tolerance,
                ConstraintOp::Eq => (lhs - c.rhs).abs() <= tolerance,
            }
        })
    }

    /// Check dimensions and finiteness before handing the program to a solver.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(ProblemError::ObjectiveWidth {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintWidth {
                    name: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(ProblemError::NonFinite(c.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_constraint() {
        let mut program = IntegerProgram::new(vec!["x".to_string(), "y".to_string()]);
        program.add_constraint("short", vec![1.0], ConstraintOp::Ge, 1.0);

        assert_eq!(
            program.validate(),
            Err(ProblemError::ConstraintWidth {
                name: "short".to_string(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_is_feasible() {
        let mut program = IntegerProgram::all_integer(vec!["x".to_string(), "y".to_string()]);
        program.add_constraint("cover", vec![2.0, 1.0], ConstraintOp::Ge, 3.0);

        assert!(program.is_feasible(&[1.0, 1.0], 1e-9));
        assert!(!program.is_feasible(&[1.0, 0.0], 1e-9));
        assert!(!program.is_feasible(&[-1.0, 5.0], 1e-9));
    }
}
