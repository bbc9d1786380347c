use barcut_core::{CuttingPlan, Optimality};

/// Plain-text cutting plan: one table of patterns, one summary per stock length.
pub fn render_plan(plan: &CuttingPlan) -> String {
    let mut out = String::new();

    out.push_str(&format!("Optimized Cutting Plan (catalog v{})\n", plan.catalog_version));
    out.push_str(match plan.optimality {
        Optimality::Proven => "Status: OPTIMAL\n",
        Optimality::BestKnown => "Status: BEST KNOWN (solver limit reached, optimality not proven)\n",
    });
    out.push('\n');

    if plan.entries.is_empty() {
        out.push_str("Nothing to cut.\n");
    } else {
        out.push_str(&format!(
            "{:>7}  {:>12}  {:<40}  {:>9}  {:>8}\n",
            "Sr. No.", "Stock Length", "Cut Pattern -> Code-Length: (Cuts)", "Bar Count", "Wastage"
        ));
        for (i, entry) in plan.entries.iter().enumerate() {
            let cuts = entry
                .pattern
                .iter()
                .map(|(label, count)| format!("{}: ({})", label, count))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "{:>7}  {:>12}  {:<40}  {:>9}  {:>8}\n",
                i + 1,
                entry.stock_length,
                cuts,
                entry.count,
                entry.waste
            ));
        }
    }
    out.push('\n');

    out.push_str("Summary:\n");
    out.push_str(&format!(
        "{:>7}  {:>12}  {:>13}  {:>11}\n",
        "Sr. No.", "Stock Length", "Bars Required", "Total Waste"
    ));
    for (i, summary) in plan.summaries.iter().enumerate() {
        out.push_str(&format!(
            "{:>7}  {:>12}  {:>13}  {:>11}\n",
            i + 1,
            summary.stock_length,
            summary.used_count,
            summary.waste
        ));
    }
    out.push('\n');

    out.push_str(&format!("Total bars: {}\n", plan.total_bars));
    out.push_str(&format!("Total wastage: {}\n", plan.total_waste));
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use barcut_core::{Catalog, DemandItem, PlanEntry};

    use super::*;

    #[test]
    fn test_render_plan() {
        let catalog = Catalog::new(&[6000, 12000], &[DemandItem::new("A", 1000, 6)]).unwrap();
        let mut plan = CuttingPlan::empty(&catalog);
        plan.entries.push(PlanEntry {
            stock_length: 6000,
            pattern: BTreeMap::from([("A-1000".to_string(), 5)]),
            count: 2,
            waste: 1000,
        });
        plan.summaries[0].used_count = 2;
        plan.summaries[0].waste = 2000;
        plan.total_bars = 2;
        plan.total_waste = 2000;

        let text = render_plan(&plan);

        assert!(text.contains("Status: OPTIMAL"));
        assert!(text.contains("A-1000: (5)"));
        assert!(text.contains("Total bars: 2"));
        assert!(text.contains("Total wastage: 2000"));
        assert_eq!(text.lines().filter(|l| l.contains("12000")).count(), 1);
    }

    #[test]
    fn test_render_empty_plan() {
        let catalog = Catalog::new(&[6000], &[]).unwrap();
        let mut plan = CuttingPlan::empty(&catalog);
        plan.optimality = Optimality::BestKnown;

        let text = render_plan(&plan);

        assert!(text.contains("Nothing to cut."));
        assert!(text.contains("BEST KNOWN"));
        assert!(text.contains("Total wastage: 0"));
    }
}
