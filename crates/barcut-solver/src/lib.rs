mod branch;
mod problem;
mod simplex;
mod solution;

pub use branch::BranchAndBound;
pub use problem::{Constraint, ConstraintOp, IntegerProgram, Objective, ProblemError};
pub use simplex::Simplex;
pub use solution::{Solution, SolutionStatus};
