use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::problem::{ConstraintOp, IntegerProgram};
use crate::simplex::Simplex;
use crate::solution::{Solution, SolutionStatus};

/// Depth-first branch-and-bound over simplex relaxations.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    simplex: Simplex,
    /// Maximum number of relaxations solved before stopping with the incumbent
    max_nodes: u64,
    /// Wall-clock limit for the whole search
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

/// Bounds added to a subproblem by branching.
#[derive(Debug, Clone, Default)]
struct Node {
    /// variable index -> (lower, upper)
    bounds: BTreeMap<usize, (f64, Option<f64>)>,
    depth: usize,
}

impl Node {
    fn child(&self, var: usize, lower: Option<f64>, upper: Option<f64>) -> Node {
        let mut bounds = self.bounds.clone();
        let entry = bounds.entry(var).or_insert((0.0, None));
        if let Some(lower) = lower {
            entry.0 = entry.0.max(lower);
        }
        if let Some(upper) = upper {
            entry.1 = Some(entry.1.map_or(upper, |u: f64| u.min(upper)));
        }
        Node {
            bounds,
            depth: self.depth + 1,
        }
    }

    fn apply(&self, problem: &IntegerProgram) -> IntegerProgram {
        let mut relaxed = problem.clone();
        let n = problem.num_variables();
        for (&var, &(lower, upper)) in &self.bounds {
            if lower > 0.0 {
                let mut coeffs = vec![0.0; n];
                coeffs[var] = 1.0;
                relaxed.add_constraint(format!("{}_lb", problem.variables[var]), coeffs, ConstraintOp::Ge, lower);
            }
            if let Some(upper) = upper {
                let mut coeffs = vec![0.0; n];
                coeffs[var] = 1.0;
                relaxed.add_constraint(format!("{}_ub", problem.variables[var]), coeffs, ConstraintOp::Le, upper);
            }
        }
        relaxed
    }
}

struct Incumbent {
    values: Vec<f64>,
    /// Objective in minimization sense
    cost: f64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplex(mut self, simplex: Simplex) -> Self {
        self.simplex = simplex;
        self
    }

    pub fn with_max_nodes(mut self, max: u64) -> Self {
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

    /// Solve `problem` honoring its integrality flags.
    pub fn solve(&self, problem: &IntegerProgram) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }

        // Only read the clock when a limit needs it; wasm32 has no std clock
        let started = self.time_limit.map(|limit| (Instant::now(), limit));
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let integral_objective = problem.integer.iter().all(|&flag| flag)
            && problem
                .objective
                .coefficients
                .iter()
                .all(|c| (c - c.round()).abs() < self.integrality_tolerance);

        let mut stack = vec![Node::default()];
        let mut incumbent: Option<Incumbent> = None;
        let mut nodes: u64 = 0;
        let mut stopped: Option<String> = None;
        let mut unresolved: Option<String> = None;

        while let Some(node) = stack.pop() {
            if nodes >= self.max_nodes {
                stopped = Some(format!("node limit of {} reached", self.max_nodes));
                break;
            }
            if let Some((start, limit)) = started {
                if start.elapsed() >= limit {
                    stopped = Some(format!("time limit of {:?} reached", limit));
                    break;
                }
            }
            nodes += 1;

            let relaxed = node.apply(problem);
            let lp = self.simplex.solve(&relaxed);
            match lp.status {
                SolutionStatus::Optimal | SolutionStatus::Feasible => {}
                SolutionStatus::Infeasible => continue,
                SolutionStatus::Unbounded => {
                    // Bounds only shrink the region, so an unbounded child
                    // means the root relaxation is unbounded as well.
                    return Solution::unbounded().with_nodes(nodes);
                }
                SolutionStatus::Error => {
                    debug!(depth = node.depth, detail = ?lp.detail, "relaxation failed; node skipped");
                    unresolved = lp.detail;
                    continue;
                }
            }

            let mut bound = sense * lp.objective_value;
            if integral_objective {
                bound = (bound - self.integrality_tolerance).ceil();
            }
            if incumbent
                .as_ref()
                .is_some_and(|best| bound >= best.cost - self.integrality_tolerance)
            {
                continue;
            }

            match self.most_fractional(problem, &lp.values) {
                None => {
                    let values = self.snap(problem, lp.values);
                    let cost = sense * problem.objective_value(&values);
                    if incumbent.as_ref().is_none_or(|best| cost < best.cost) {
                        debug!(nodes, depth = node.depth, cost, "new incumbent");
                        incumbent = Some(Incumbent { values, cost });
                    }
                }
                Some((var, value)) => {
                    if node.depth == 0 {
                        self.round_up(problem, &lp.values, sense, &mut incumbent);
                    }
                    stack.push(node.child(var, None, Some(value.floor())));
                    stack.push(node.child(var, Some(value.ceil()), None));
                }
            }
        }

        info!(nodes, found = incumbent.is_some(), "branch-and-bound finished");

        let limited = stopped.or(unresolved);
        match (incumbent, limited) {
            (Some(best), None) => {
                let objective_value = problem.objective_value(&best.values);
                Solution::optimal(best.values, objective_value).with_nodes(nodes)
            }
            (Some(best), Some(reason)) => {
                debug!(%reason, "returning best known solution");
                let objective_value = problem.objective_value(&best.values);
                let mut solution = Solution::optimal(best.values, objective_value).with_nodes(nodes);
                solution.status = SolutionStatus::Feasible;
                solution
            }
            (None, None) => Solution::infeasible().with_nodes(nodes),
            (None, Some(reason)) => {
                Solution::error(format!("{} without a feasible solution", reason)).with_nodes(nodes)
            }
        }
    }

    /// Integer variable whose value is furthest from an integer.
    fn most_fractional(&self, problem: &IntegerProgram, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (j, &value) in values.iter().enumerate() {
            if !problem.integer[j] {
                continue;
            }
            let distance = (value - value.round()).abs();
            if distance <= self.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, _, d)| distance > d) {
                best = Some((j, value, distance));
            }
        }
        best.map(|(j, value, _)| (j, value))
    }

    fn snap(&self, problem: &IntegerProgram, mut values: Vec<f64>) -> Vec<f64> {
        for (value, &integer) in values.iter_mut().zip(&problem.integer) {
            if integer {
                *value = value.round().max(0.0);
            }
        }
        values
    }

    /// Rounding every integer variable up stays feasible for covering rows
    /// with non-negative coefficients; keep it when it is.
    fn round_up(&self, problem: &IntegerProgram, values: &[f64], sense: f64, incumbent: &mut Option<Incumbent>) {
        let rounded: Vec<f64> = values
            .iter()
            .zip(&problem.integer)
            .map(|(&v, &integer)| {
                if integer {
                    (v - self.integrality_tolerance).ceil().max(0.0)
                } else {
                    v
                }
            })
            .collect();

        if !problem.is_feasible(&rounded, 1e-6) {
            return;
        }
        let cost = sense * problem.objective_value(&rounded);
        if incumbent.as_ref().is_none_or(|best| cost < best.cost) {
            debug!(cost, "rounded root relaxation accepted as incumbent");
            *incumbent = Some(Incumbent {
                values: rounded,
                cost,
            });
        }
    }
}
