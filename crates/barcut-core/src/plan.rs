use std::collections::BTreeMap;

use crate::catalog::Catalog;

/// One line of a cutting plan: `count` bars of `stock_length` cut the same way.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub stock_length: u64,
    /// Demand label (`code-length`) -> pieces per bar; zero counts omitted
    pub pattern: BTreeMap<String, u64>,
    /// Bars cut with this pattern
    pub count: u64,
    /// Offcut per bar
    pub waste: u64,
}

impl PlanEntry {
    /// Offcut over all bars of this entry.
    pub fn total_waste(&self) -> u64 {
        self.waste * self.count
    }
}

/// Usage of one stock length across the plan.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSummary {
    pub stock_length: u64,
    pub used_count: u64,
    pub waste: u64,
}

/// Whether the plan is proven optimal or the best found within solver limits.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimality {
    Proven,
    BestKnown,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuttingPlan {
    /// Version of the catalog snapshot this plan was computed from
    pub catalog_version: u64,
    pub entries: Vec<PlanEntry>,
    /// One per stock length, unused ones included
    pub summaries: Vec<StockSummary>,
    pub total_waste: u64,
    pub total_bars: u64,
    pub optimality: Optimality,
}

impl CuttingPlan {
    /// Plan that cuts nothing; every stock length reports zero usage.
    pub fn empty(catalog: &Catalog) -> Self {
        Self {
            catalog_version: catalog.version(),
            entries: Vec::new(),
            summaries: catalog
                .stock_lengths()
                .iter()
                .map(|&stock_length| StockSummary {
                    stock_length,
                    used_count: 0,
                    waste: 0,
                })
                .collect(),
            total_waste: 0,
            total_bars: 0,
            optimality: Optimality::Proven,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pieces produced per demand label over the whole plan.
    pub fn produced(&self) -> BTreeMap<String, u64> {
        let mut produced = BTreeMap::new();
        for entry in &self.entries {
            for (label, pieces) in &entry.pattern {
                *produced.entry(label.clone()).or_insert(0) += pieces * entry.count;
            }
        }
        produced
    }

    pub fn summary_for(&self, stock_length: u64) -> Option<&StockSummary> {
        self.summaries.iter().find(|s| s.stock_length == stock_length)
    }
}
