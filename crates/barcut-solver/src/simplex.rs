use tracing::trace;

use crate::problem::{ConstraintOp, IntegerProgram};
use crate::solution::Solution;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_STREAK_LIMIT: usize = 32;

/// Two-phase simplex solver for the LP relaxation of an [`IntegerProgram`].
///
/// Integrality flags are ignored.
#[derive(Debug, Clone)]
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Tolerance on the phase 1 objective when deciding feasibility
    feasibility_tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
        }
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP relaxation of `problem`.
    pub fn solve(&self, problem: &IntegerProgram) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }

        let mut tableau = Tableau::build(problem);

        // Phase 1: find an initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                PhaseResult::Optimal => {}
                PhaseResult::Infeasible => return Solution::infeasible(),
                PhaseResult::Unbounded => {
                    return Solution::error("phase 1 objective reported unbounded");
                }
                PhaseResult::IterationLimit => {
                    return Solution::error(format!(
                        "simplex phase 1 exceeded {} iterations",
                        self.max_iterations
                    ));
                }
            }
        }

        // Phase 2: optimize the real objective
        match self.phase2(&mut tableau) {
            PhaseResult::Optimal => {}
            PhaseResult::Unbounded => return Solution::unbounded(),
            PhaseResult::Infeasible => return Solution::infeasible(),
            PhaseResult::IterationLimit => {
                return Solution::error(format!(
                    "simplex phase 2 exceeded {} iterations",
                    self.max_iterations
                ));
            }
        }

        let values = tableau.values();
        let objective_value = problem.objective_value(&values);
        Solution::optimal(values, objective_value)
    }

    fn phase1(&self, tableau: &mut Tableau) -> PhaseResult {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let art_start = tableau.art_start();
        let n_cols = tableau.n_cols;

        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            PhaseResult::Optimal => {}
            other => return other,
        }

        let rhs_col = tableau.rhs_col();
        let infeasible = (0..obj_row).any(|i| {
            tableau.basic_vars[i] >= art_start
                && tableau.data[i][rhs_col] > self.feasibility_tolerance
        });
        if infeasible {
            return PhaseResult::Infeasible;
        }

        // Pivot zero-level artificials out of the basis so phase 2 cannot
        // move them off zero. Rows with no candidate column are redundant.
        for i in 0..obj_row {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let candidate = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            if let Some(j) = candidate {
                tableau.pivot(i, j);
            }
        }

        PhaseResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> PhaseResult {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols;

        tableau.data[obj_row] = tableau.objective.clone();
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from)
    }

    fn iterate(&self, tableau: &mut Tableau, enter_limit: usize) -> PhaseResult {
        let mut degenerate_streak = 0;

        for iteration in 0..self.max_iterations {
            let bland = degenerate_streak >= DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, enter_limit, bland) else {
                trace!(iteration, "simplex phase converged");
                return PhaseResult::Optimal;
            };
            let Some((pivot_row, ratio)) = self.find_pivot_row(tableau, pivot_col) else {
                return PhaseResult::Unbounded;
            };

            if ratio <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }

            tableau.pivot(pivot_row, pivot_col);
        }

        PhaseResult::IterationLimit
    }

    /// Entering column: largest reduced profit, or the lowest index with a
    /// positive reduced profit under Bland's rule.
    fn find_pivot_column(&self, tableau: &Tableau, limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()];

        if bland {
            return (0..limit).find(|&j| obj[j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &val) in obj.iter().enumerate().take(limit) {
            if val > max_val {
                max_val = val;
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Leaving row by minimum ratio; ties go to the lowest basic variable index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<(usize, f64)> {
        let rhs_col = tableau.rhs_col();

        let mut best: Option<(usize, f64)> = None;
        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = (tableau.data[i][rhs_col] / val).max(0.0);
            best = match best {
                None => Some((i, ratio)),
                Some((row, best_ratio)) => {
                    if ratio < best_ratio - self.tolerance
                        || ((ratio - best_ratio).abs() <= self.tolerance
                            && tableau.basic_vars[i] < tableau.basic_vars[row])
                    {
                        Some((i, ratio))
                    } else {
                        Some((row, best_ratio))
                    }
                }
            };
        }
        best
    }
}

/// Dense simplex tableau. The last row holds reduced profits of the
/// maximization form; the last column holds the right-hand side.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Phase 2 objective row before pricing out the basis
    objective: Vec<f64>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    n_cols: usize,
}

impl Tableau {
    fn build(problem: &IntegerProgram) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Normalize every row to a non-negative right-hand side. A `>=` row
        // with a non-positive rhs becomes a `<=` row and needs no artificial.
        let rows: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                let negate = match c.op {
                    ConstraintOp::Ge => c.rhs <= 0.0,
                    ConstraintOp::Le | ConstraintOp::Eq => c.rhs < 0.0,
                };
                if negate {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (c.coefficients.iter().map(|a| -a).collect(), op, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.op, c.rhs)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let n_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut data = vec![vec![0.0; n_cols]; n_constraints + 1];
        let mut basic_vars = vec![0; n_constraints];

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs)) in rows.into_iter().enumerate() {
            data[i][..n_vars].copy_from_slice(&coefficients);
            data[i][n_cols - 1] = rhs;

            match op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0;
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // The tableau maximizes, so a minimization objective is negated
        let mut objective = vec![0.0; n_cols];
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            objective[j] = if problem.objective.minimize { -coef } else { coef };
        }
        data[n_constraints].copy_from_slice(&objective);

        Self {
            data,
            basic_vars,
            objective,
            n_vars,
            n_slack,
            n_artificial,
            n_cols,
        }
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.n_cols - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for v in self.data[row].iter_mut() {
            *v /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in current.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        let rhs_col = self.rhs_col();
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs_col].max(0.0);
            }
        }
        values
    }
}

enum PhaseResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionStatus;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{}", i)).collect()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = IntegerProgram::new(names(2));
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = IntegerProgram::new(names(2));
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.values[1] - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_equality_constraint() {
        // Minimize x - y subject to x + y = 5, y <= 2
        let mut problem = IntegerProgram::new(names(2));
        problem.set_objective(vec![1.0, -1.0], true);
        problem.add_constraint("total", vec![1.0, 1.0], ConstraintOp::Eq, 5.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 2.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.values[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = IntegerProgram::new(names(1));
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_all_zero_covering_row_is_infeasible() {
        let mut problem = IntegerProgram::new(names(2));
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("a", vec![1.0, 2.0], ConstraintOp::Ge, 3.0);
        problem.add_constraint("b", vec![0.0, 0.0], ConstraintOp::Ge, 1.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = IntegerProgram::new(names(1));
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 1.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_no_variables_with_trivial_rows() {
        let mut problem = IntegerProgram::new(Vec::new());
        problem.set_objective(Vec::new(), true);
        problem.add_constraint("zero_demand", Vec::new(), ConstraintOp::Ge, 0.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.values.is_empty());
        assert_eq!(solution.objective_value, 0.0);
    }

    #[test]
    fn test_degenerate_covering_problem() {
        // Three patterns covering two items with redundant zero-demand rows
        let mut problem = IntegerProgram::new(names(3));
        problem.set_objective(vec![1.0, 1.0, 1.0], true);
        problem.add_constraint("a", vec![2.0, 0.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("b", vec![0.0, 2.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("c", vec![0.0, 0.0, 0.0], ConstraintOp::Ge, 0.0);
        problem.add_constraint("d", vec![1.0, 1.0, 0.0], ConstraintOp::Ge, 0.0);

        let solution = Simplex::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(problem.is_feasible(&solution.values, 1e-6));
        assert!((solution.objective_value - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_iteration_limit_is_error() {
        let mut problem = IntegerProgram::new(names(2));
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("a", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);

        let solution = Simplex::new().with_max_iterations(0).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Error);
        assert!(solution.detail.is_some());
    }
}
