//! Integer program formulation over the pattern universe, and conversion of
//! the solver's answer into a [`CuttingPlan`].

use barcut_solver::{BranchAndBound, ConstraintOp, IntegerProgram, Solution, SolutionStatus};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, DemandItem};
use crate::config::{Objective, OptimizerConfig};
use crate::error::OptimizeError;
use crate::pattern::{Pattern, generate_patterns_bounded};
use crate::plan::{CuttingPlan, Optimality, PlanEntry};

/// Solver values above this count as a used pattern.
pub const USAGE_THRESHOLD: f64 = 0.5;

/// Integer programming capability used by [`PlanOptimizer`].
pub trait IpSolver {
    fn solve(&self, program: &IntegerProgram) -> Solution;
}

impl IpSolver for BranchAndBound {
    fn solve(&self, program: &IntegerProgram) -> Solution {
        BranchAndBound::solve(self, program)
    }
}

/// A pattern together with the stock length it is cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseEntry {
    /// Index into [`Catalog::stock_lengths`]
    pub stock_index: usize,
    pub pattern: Pattern,
}

/// Patterns for every stock length, in stock order.
pub fn build_universe(catalog: &Catalog, max_patterns: usize) -> Result<Vec<UniverseEntry>, OptimizeError> {
    let lengths = catalog.demand_lengths();
    let mut universe = Vec::new();

    for (stock_index, &stock_length) in catalog.stock_lengths().iter().enumerate() {
        let patterns = generate_patterns_bounded(stock_length, &lengths, max_patterns)?;
        debug!(stock_length, patterns = patterns.len(), "patterns generated");
        universe.extend(
            patterns
                .into_iter()
                .map(|pattern| UniverseEntry { stock_index, pattern }),
        );
    }

    Ok(universe)
}

/// One integer variable per universe entry and one covering row per demand line.
pub fn formulate(catalog: &Catalog, universe: &[UniverseEntry], objective: Objective) -> IntegerProgram {
    let names = universe
        .iter()
        .enumerate()
        .map(|(p, entry)| {
            let stock_length = catalog.stock_lengths()[entry.stock_index];
            format!("use_pattern_{}_{}", stock_length, p)
        })
        .collect();
    let mut program = IntegerProgram::all_integer(names);

    let coefficients = universe
        .iter()
        .map(|entry| match objective {
            Objective::MinimizeWaste => entry.pattern.waste as f64,
            Objective::MinimizeBars => 1.0,
        })
        .collect();
    program.set_objective(coefficients, true);

    for (i, demand) in catalog.demand().iter().enumerate() {
        let row = universe
            .iter()
            .map(|entry| entry.pattern.counts[i] as f64)
            .collect();
        program.add_constraint(demand.label(), row, ConstraintOp::Ge, demand.qty as f64);
    }

    program
}

/// Snap a solver value to a bar count; `None` when the pattern is unused.
/// Values too large to count in bars are a solver fault.
fn snap_count(value: f64) -> Result<Option<u64>, OptimizeError> {
    if value <= USAGE_THRESHOLD {
        return Ok(None);
    }
    let rounded = value.round();
    if rounded >= u64::MAX as f64 {
        return Err(OptimizeError::Solver(format!("solver returned out-of-range value {}", value)));
    }
    Ok(Some(rounded as u64))
}

/// `per_bar * count`, failing instead of wrapping.
fn times(per_bar: u64, count: u64) -> Result<u64, OptimizeError> {
    per_bar
        .checked_mul(count)
        .ok_or_else(|| OptimizeError::Solver(format!("bar count {} overflows plan totals", count)))
}

fn accumulate(total: &mut u64, amount: u64) -> Result<(), OptimizeError> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| OptimizeError::Solver("plan totals overflow".to_string()))?;
    Ok(())
}

/// Turn per-pattern solver values into plan entries and per-stock totals.
pub fn extract(
    catalog: &Catalog,
    universe: &[UniverseEntry],
    values: &[f64],
    optimality: Optimality,
) -> Result<CuttingPlan, OptimizeError> {
    if values.len() != universe.len() {
        return Err(OptimizeError::Solver(format!(
            "solver returned {} values for {} patterns",
            values.len(),
            universe.len()
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(OptimizeError::Solver(format!("solver returned non-finite value {}", bad)));
    }

    let demand = catalog.demand();
    let mut plan = CuttingPlan::empty(catalog);
    plan.optimality = optimality;
    let mut produced = vec![0u64; demand.len()];

    for (entry, &value) in universe.iter().zip(values) {
        let Some(count) = snap_count(value)? else {
            continue;
        };
        let stock_length = catalog.stock_lengths()[entry.stock_index];
        let pattern = &entry.pattern;

        let cuts = demand
            .iter()
            .zip(&pattern.counts)
            .filter(|(_, pieces)| **pieces > 0)
            .map(|(d, &pieces)| (d.label(), pieces))
            .collect();
        for (total, &pieces) in produced.iter_mut().zip(&pattern.counts) {
            accumulate(total, times(pieces, count)?)?;
        }

        let waste = times(pattern.waste, count)?;
        let summary = &mut plan.summaries[entry.stock_index];
        accumulate(&mut summary.used_count, count)?;
        accumulate(&mut summary.waste, waste)?;
        accumulate(&mut plan.total_bars, count)?;
        accumulate(&mut plan.total_waste, waste)?;

        plan.entries.push(PlanEntry {
            stock_length,
            pattern: cuts,
            count,
            waste: pattern.waste,
        });
    }

    for (d, &made) in demand.iter().zip(&produced) {
        if made < d.qty {
            return Err(OptimizeError::Solver(format!(
                "solution cuts {} of {} pieces of {}",
                made,
                d.qty,
                d.label()
            )));
        }
    }

    Ok(plan)
}

/// Explain infeasibility in catalog terms where possible.
fn describe_infeasibility(catalog: &Catalog) -> String {
    let longest = catalog.stock_lengths().iter().copied().max().unwrap_or(0);
    let unreachable: Vec<String> = catalog
        .demand()
        .iter()
        .filter(|d| d.qty > 0 && d.length > longest)
        .map(|d| d.label())
        .collect();

    if unreachable.is_empty() {
        "solver found no assignment covering every demand".to_string()
    } else {
        format!(
            "{} cannot be cut from any stock length (longest is {})",
            unreachable.join(", "),
            longest
        )
    }
}

/// Computes cutting plans for catalog snapshots.
pub struct PlanOptimizer<S = BranchAndBound> {
    config: OptimizerConfig,
    solver: S,
}

impl PlanOptimizer<BranchAndBound> {
    /// Optimizer backed by the built-in branch-and-bound solver.
    pub fn new(config: OptimizerConfig) -> Self {
        let solver = BranchAndBound::new()
            .with_max_nodes(config.max_nodes)
            .with_time_limit(config.time_limit);
        Self { config, solver }
    }
}

impl Default for PlanOptimizer<BranchAndBound> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<S: IpSolver> PlanOptimizer<S> {
    pub fn with_solver(config: OptimizerConfig, solver: S) -> Self {
        Self { config, solver }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(&self, catalog: &Catalog) -> Result<CuttingPlan, OptimizeError> {
        if catalog.is_empty() {
            info!(version = catalog.version(), "empty catalog; nothing to cut");
            return Ok(CuttingPlan::empty(catalog));
        }

        let universe = build_universe(catalog, self.config.max_patterns)?;
        let program = formulate(catalog, &universe, self.config.objective);
        info!(
            version = catalog.version(),
            variables = program.num_variables(),
            constraints = program.num_constraints(),
            objective = ?self.config.objective,
            "solving cutting model"
        );

        let solution = self.solver.solve(&program);
        info!(status = %solution.status, nodes = solution.nodes_explored, "solver returned");

        let optimality = match solution.status {
            SolutionStatus::Optimal => Optimality::Proven,
            SolutionStatus::Feasible => {
                warn!("solver stopped at a limit; plan is the best found, not proven optimal");
                Optimality::BestKnown
            }
            SolutionStatus::Infeasible => {
                return Err(OptimizeError::Infeasible(describe_infeasibility(catalog)));
            }
            SolutionStatus::Unbounded => {
                return Err(OptimizeError::Solver("solver reported an unbounded model".to_string()));
            }
            SolutionStatus::Error => {
                return Err(OptimizeError::Solver(
                    solution
                        .detail
                        .unwrap_or_else(|| "unknown solver error".to_string()),
                ));
            }
        };

        extract(catalog, &universe, &solution.values, optimality)
    }
}

/// Validate raw records and optimize them with the default configuration.
pub fn optimize(stock_lengths: &[i64], demand: &[DemandItem]) -> Result<CuttingPlan, OptimizeError> {
    let catalog = Catalog::new(stock_lengths, demand)?;
    PlanOptimizer::default().optimize(&catalog)
}
