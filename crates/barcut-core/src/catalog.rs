//! Stock and demand catalogs.
//!
//! Collaborators hand over raw records; [`Catalog::new`] validates them into an
//! immutable snapshot that one optimization run reads from start to finish.

use std::collections::HashSet;

use tracing::debug;

use crate::error::OptimizeError;

/// A required cut as supplied by ingestion. Values are signed so malformed
/// records can be reported instead of wrapping.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandItem {
    pub code: String,
    pub length: i64,
    pub qty: i64,
}

impl DemandItem {
    pub fn new(code: impl Into<String>, length: i64, qty: i64) -> Self {
        Self {
            code: code.into(),
            length,
            qty,
        }
    }
}

/// Raw catalog records, the shape of a catalog file.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogInput {
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: u64,
    pub stock_lengths: Vec<i64>,
    pub demand: Vec<DemandItem>,
}

/// A validated demand line.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    pub code: String,
    pub length: u64,
    pub qty: u64,
}

impl Demand {
    /// Label used in cutting plans, e.g. `A-1000`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.code, self.length)
    }
}

/// Immutable, validated snapshot of the stock and demand catalogs.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: u64,
    stock_lengths: Vec<u64>,
    demand: Vec<Demand>,
}

impl Catalog {
    /// Validate raw records. Repeated stock lengths are collapsed, keeping
    /// the first occurrence.
    pub fn new(stock_lengths: &[i64], demand: &[DemandItem]) -> Result<Self, OptimizeError> {
        let mut seen = HashSet::new();
        let mut stock = Vec::with_capacity(stock_lengths.len());
        for &length in stock_lengths {
            if length <= 0 {
                return Err(OptimizeError::invalid(format!(
                    "stock length must be positive, got {}",
                    length
                )));
            }
            if seen.insert(length) {
                stock.push(length as u64);
            }
        }

        let mut labels = HashSet::new();
        let mut lines = Vec::with_capacity(demand.len());
        for item in demand {
            let code = item.code.trim();
            if code.is_empty() {
                return Err(OptimizeError::invalid(format!(
                    "demand of length {} has an empty code",
                    item.length
                )));
            }
            if item.length <= 0 {
                return Err(OptimizeError::invalid(format!(
                    "demand {} has non-positive length {}",
                    code, item.length
                )));
            }
            if item.qty < 0 {
                return Err(OptimizeError::invalid(format!(
                    "demand {} has negative quantity {}",
                    code, item.qty
                )));
            }
            let line = Demand {
                code: code.to_string(),
                length: item.length as u64,
                qty: item.qty as u64,
            };
            if !labels.insert(line.label()) {
                return Err(OptimizeError::invalid(format!(
                    "demand {} is listed more than once",
                    line.label()
                )));
            }
            lines.push(line);
        }

        debug!(stock = stock.len(), demand = lines.len(), "catalog validated");

        Ok(Self {
            version: 0,
            stock_lengths: stock,
            demand: lines,
        })
    }

    pub fn from_input(input: &CatalogInput) -> Result<Self, OptimizeError> {
        Ok(Self::new(&input.stock_lengths, &input.demand)?.with_version(input.version))
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// New snapshot with the stock list replaced wholesale and the version bumped.
    pub fn replace_stock(&self, stock_lengths: &[i64]) -> Result<Self, OptimizeError> {
        let demand: Vec<DemandItem> = self
            .demand
            .iter()
            .map(|d| DemandItem::new(d.code.clone(), d.length as i64, d.qty as i64))
            .collect();
        Ok(Self::new(stock_lengths, &demand)?.with_version(self.version + 1))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stock_lengths(&self) -> &[u64] {
        &self.stock_lengths
    }

    pub fn demand(&self) -> &[Demand] {
        &self.demand
    }

    pub fn demand_lengths(&self) -> Vec<u64> {
        self.demand.iter().map(|d| d.length).collect()
    }

    pub fn quantities(&self) -> Vec<u64> {
        self.demand.iter().map(|d| d.qty).collect()
    }

    /// True when there is nothing to cut or nothing to cut from.
    pub fn is_empty(&self) -> bool {
        self.stock_lengths.is_empty() || self.demand.is_empty()
    }
}

/// Parse a comma-separated stock list such as `"6000, 12000"`.
pub fn parse_stock_lengths(input: &str) -> Result<Vec<i64>, OptimizeError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| OptimizeError::invalid(format!("invalid stock length '{}'", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_catalog() {
        let catalog = Catalog::new(
            &[6000, 12000, 6000],
            &[DemandItem::new("A", 1000, 5), DemandItem::new(" B ", 1500, 0)],
        )
        .unwrap();

        assert_eq!(catalog.stock_lengths(), &[6000, 12000]);
        assert_eq!(catalog.demand_lengths(), vec![1000, 1500]);
        assert_eq!(catalog.quantities(), vec![5, 0]);
        assert_eq!(catalog.demand()[1].code, "B");
        assert_eq!(catalog.demand()[0].label(), "A-1000");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_rejects_non_positive_lengths() {
        let stock = Catalog::new(&[0], &[]);
        assert!(matches!(stock, Err(OptimizeError::InvalidInput(_))));

        let demand = Catalog::new(&[6000], &[DemandItem::new("A", -5, 1)]);
        assert!(matches!(demand, Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let result = Catalog::new(&[6000], &[DemandItem::new("A", 1000, -1)]);
        assert!(matches!(result, Err(OptimizeError::InvalidInput(msg)) if msg.contains("negative quantity")));
    }

    #[test]
    fn test_rejects_empty_code() {
        let result = Catalog::new(&[6000], &[DemandItem::new("  ", 1000, 1)]);
        assert!(matches!(result, Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_labels() {
        // Same code with different lengths gets distinct labels
        let ok = Catalog::new(&[6000], &[DemandItem::new("A", 1000, 1), DemandItem::new("A", 1200, 1)]);
        assert!(ok.is_ok());

        let dup = Catalog::new(&[6000], &[DemandItem::new("A", 1000, 1), DemandItem::new("A", 1000, 2)]);
        assert!(matches!(dup, Err(OptimizeError::InvalidInput(msg)) if msg.contains("A-1000")));
    }

    #[test]
    fn test_replace_stock_bumps_version() {
        let catalog = Catalog::new(&[6000], &[DemandItem::new("A", 1000, 5)])
            .unwrap()
            .with_version(3);
        let replaced = catalog.replace_stock(&[12000]).unwrap();

        assert_eq!(replaced.version(), 4);
        assert_eq!(replaced.stock_lengths(), &[12000]);
        assert_eq!(replaced.demand(), catalog.demand());
        assert_eq!(catalog.stock_lengths(), &[6000]);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(Catalog::new(&[], &[DemandItem::new("A", 1000, 5)]).unwrap().is_empty());
        assert!(Catalog::new(&[6000], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_stock_lengths() {
        assert_eq!(parse_stock_lengths("6000, 12000,").unwrap(), vec![6000, 12000]);
        assert_eq!(parse_stock_lengths("").unwrap(), Vec::<i64>::new());
        assert!(parse_stock_lengths("6000, abc").is_err());
    }
}
