pub mod catalog;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod pattern;
pub mod plan;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use catalog::{Catalog, CatalogInput, Demand, DemandItem, parse_stock_lengths};
pub use config::{Objective, OptimizerConfig};
pub use error::OptimizeError;
pub use optimizer::{IpSolver, PlanOptimizer, USAGE_THRESHOLD, UniverseEntry, build_universe, extract, formulate, optimize};
pub use pattern::{Pattern, generate_patterns, generate_patterns_bounded};
pub use plan::{CuttingPlan, Optimality, PlanEntry, StockSummary};
