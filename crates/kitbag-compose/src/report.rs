//! Human- and machine-readable summaries of a solved knapsack.

use std::fmt;

use serde::Serialize;

use crate::compose::{COUNT_TOLERANCE, Domain, Goal, SolvedKnapsack};
use crate::instance::Dimension;

/// Units of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub item: String,
    pub count: f64,
}

/// Contents and load of one bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BagReport {
    pub bag: String,
    pub items: Vec<ReportLine>,
    pub volume: f64,
    pub weight: f64,
    pub volume_capacity: f64,
    pub weight_capacity: f64,
}

/// Sums over all chosen items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub volume: f64,
    pub weight: f64,
    pub value: f64,
}

/// Outcome of one composed solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub groups: Vec<String>,
    pub goal: Goal,
    pub domain: Domain,
    pub solver: String,
    pub status: String,
    pub objective: f64,
    /// Items with a positive count, in input order.
    pub items: Vec<ReportLine>,
    /// Per-bag contents; empty unless the `bags` group was attached.
    pub bags: Vec<BagReport>,
    pub totals: Totals,
    pub solve_time_seconds: f64,
}

impl SolvedKnapsack {
    /// Summarize the solution.
    pub fn report(&self) -> Report {
        let composed = self.composed();
        let counts = self.item_counts();

        let mut totals = Totals {
            volume: 0.0,
            weight: 0.0,
            value: 0.0,
        };
        let mut items = Vec::new();
        for (item, count) in &counts {
            totals.volume += item.attribute(Dimension::Volume) * count;
            totals.weight += item.attribute(Dimension::Weight) * count;
            totals.value += item.attribute(Dimension::Value) * count;
            if *count > COUNT_TOLERANCE {
                items.push(ReportLine {
                    item: item.name.clone(),
                    count: *count,
                });
            }
        }

        let bags = composed
            .bag_assignments()
            .iter()
            .map(|assignment| {
                let mut report = BagReport {
                    bag: assignment.bag.name.clone(),
                    items: Vec::new(),
                    volume: 0.0,
                    weight: 0.0,
                    volume_capacity: assignment.bag.volume,
                    weight_capacity: assignment.bag.weight,
                };
                for (item, var) in composed.items().iter().zip(&assignment.counts) {
                    let count = self.count_of(*var);
                    if count <= COUNT_TOLERANCE {
                        continue;
                    }
                    report.volume += item.volume * count;
                    report.weight += item.weight * count;
                    report.items.push(ReportLine {
                        item: item.name.clone(),
                        count,
                    });
                }
                report
            })
            .collect();

        Report {
            groups: composed
                .group_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            goal: composed.options().goal,
            domain: composed.options().domain,
            solver: self.solver_name().to_string(),
            status: self.status().as_str().to_string(),
            objective: self.objective_value(),
            items,
            bags,
            totals,
            solve_time_seconds: self.solution().solve_time_seconds,
        }
    }
}

impl Report {
    fn format_count(&self, count: f64) -> String {
        match self.domain {
            Domain::Integral => format!("{count:.0}"),
            Domain::Relaxed => format!("{count:.3}"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "groups:    {}", self.groups.join("+"))?;
        writeln!(f, "goal:      maximize {}", self.goal.as_str())?;
        writeln!(f, "status:    {} ({})", self.status, self.solver)?;
        writeln!(f, "objective: {:.3}", self.objective)?;

        if !self.bags.is_empty() {
            writeln!(f)?;
            writeln!(f, "=== Items brought ===")?;
            for bag in &self.bags {
                writeln!(
                    f,
                    "--- {} (volume {:.2}/{}, weight {:.2}/{}) ---",
                    bag.bag, bag.volume, bag.volume_capacity, bag.weight, bag.weight_capacity
                )?;
                for line in &bag.items {
                    writeln!(f, "{}: {}", line.item, self.format_count(line.count))?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "=== Total items ===")?;
        if self.items.is_empty() {
            writeln!(f, "(nothing)")?;
        }
        for line in &self.items {
            writeln!(f, "{}: {}", line.item, self.format_count(line.count))?;
        }

        writeln!(f)?;
        writeln!(f, "=== Totals ===")?;
        writeln!(f, "volume: {:.3}", self.totals.volume)?;
        writeln!(f, "weight: {:.3}", self.totals.weight)?;
        write!(f, "value:  {:.3}", self.totals.value)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use kitbag_core::SolverConfig;

    use crate::compose::{ComposeOptions, compose};
    use crate::instance::{Bag, Capacities, Instance, Item};
    use crate::selection::Selection;
    use crate::testing::RecordingSolver;

    fn instance() -> Instance {
        Instance::new(
            vec![
                Item::new("first", 2.0, 3.0, 10.0),
                Item::new("second", 4.0, 1.0, 6.0).with_available(Some(3)),
            ],
            Capacities::uniform(5.0),
        )
        .with_bags(vec![Bag::new("left", 4.0, 9.0), Bag::new("right", 8.0, 9.0)])
    }

    fn report(selector: &str, values: Vec<f64>) -> super::Report {
        let composed = compose(
            &instance(),
            &Selection::parse(selector).unwrap(),
            &ComposeOptions::default(),
        )
        .unwrap();
        composed
            .solve(&mut RecordingSolver::returning(values), &SolverConfig::default())
            .unwrap()
            .report()
    }

    #[test]
    fn report_lists_chosen_items_and_totals() {
        let report = report("volume", vec![1.0, 0.0]);
        assert_eq!(report.groups, vec!["volume".to_string()]);
        assert_eq!(report.status, "optimal");
        assert_eq!(report.solver, "recording");
        assert_eq!(report.objective, 10.0);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].item, "first");
        assert_eq!(report.totals.volume, 2.0);
        assert_eq!(report.totals.weight, 3.0);
        assert_eq!(report.totals.value, 10.0);
        assert!(report.bags.is_empty());

        let text = report.to_string();
        assert!(text.contains("=== Total items ==="));
        assert!(text.contains("first: 1"));
        assert!(!text.contains("second"));
        assert!(!text.contains("=== Items brought ==="));
    }

    #[test]
    fn report_splits_items_over_bags() {
        // counts: first=1, second=2; left holds first, right holds both seconds
        let report = report("bags", vec![1.0, 2.0, 1.0, 0.0, 0.0, 2.0]);
        assert_eq!(report.bags.len(), 2);
        assert_eq!(report.bags[0].bag, "left");
        assert_eq!(report.bags[0].items.len(), 1);
        assert_eq!(report.bags[0].volume, 2.0);
        assert_eq!(report.bags[1].items[0].item, "second");
        assert_eq!(report.bags[1].items[0].count, 2.0);
        assert_eq!(report.bags[1].weight, 2.0);

        let text = report.to_string();
        assert!(text.contains("=== Items brought ==="));
        assert!(text.contains("--- right"));
        assert!(text.contains("second: 2"));
    }

    #[test]
    fn empty_solution_reports_nothing() {
        let report = report("weight", Vec::new());
        assert!(report.items.is_empty());
        assert!(report.to_string().contains("(nothing)"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = report("volume+weight", vec![1.0, 0.0]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["goal"], "value");
        assert_eq!(json["domain"], "integral");
        assert_eq!(json["groups"], serde_json::json!(["volume", "weight"]));
        assert_eq!(json["items"][0]["item"], "first");
        assert_eq!(json["totals"]["value"], 10.0);
    }
}
