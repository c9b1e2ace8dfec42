//! Model composition, solving and the end-to-end [`run`] entry point.

use std::time::Instant;

use kitbag_core::{Model, Solution, Solver, SolverConfig, SolverError, SolverStatus};
use kitbag_expr::{Expr, VariableId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ComposeError, ConfigError};
use crate::groups::{self, BagAssignment};
use crate::instance::{Capacities, Dimension, Instance, Item};
use crate::report::Report;
use crate::selection::{GroupKind, Selection};

/// Quantity the model maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Value,
    Volume,
    Weight,
}

impl Goal {
    pub fn dimension(self) -> Dimension {
        match self {
            Goal::Value => Dimension::Value,
            Goal::Volume => Dimension::Volume,
            Goal::Weight => Dimension::Weight,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.dimension().as_str()
    }
}

/// Whether item counts are whole numbers or the LP relaxation is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Integral,
    Relaxed,
}

/// Per-dimension capacity replacements.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapacityOverrides {
    pub volume: Option<f64>,
    pub weight: Option<f64>,
    pub value: Option<f64>,
}

impl CapacityOverrides {
    pub fn apply(&self, base: Capacities) -> Capacities {
        Capacities {
            volume: self.volume.unwrap_or(base.volume),
            weight: self.weight.unwrap_or(base.weight),
            value: self.value.unwrap_or(base.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComposeOptions {
    pub goal: Goal,
    pub domain: Domain,
    pub capacities: CapacityOverrides,
}

/// A model with its item variables and selected groups attached.
#[derive(Debug, Clone)]
pub struct ComposedModel {
    model: Model,
    items: Vec<Item>,
    counts: Vec<VariableId>,
    bags: Vec<BagAssignment>,
    selection: Selection,
    options: ComposeOptions,
    capacities: Capacities,
}

/// Build the model for `instance` with exactly the groups in `selection`.
///
/// # Errors
///
/// Configuration errors for invalid item data, capacities, or a `bags`
/// selection without bags; model errors if a group cannot be built.
pub fn compose(
    instance: &Instance,
    selection: &Selection,
    options: &ComposeOptions,
) -> Result<ComposedModel, ComposeError> {
    let started = Instant::now();
    instance.validate()?;
    let capacities = options.capacities.apply(instance.capacities);
    capacities.validate()?;
    if selection.contains(GroupKind::Bags) && instance.bags.is_empty() {
        return Err(ConfigError::NoBags.into());
    }

    let mut model = Model::new();
    let mut counts = Vec::with_capacity(instance.items.len());
    for item in &instance.items {
        counts.push(model.add_named_variable(
            format!("count[{}]", item.name),
            groups::count_variable(item, options.domain),
        )?);
    }

    let items = instance.items.as_slice();
    let mut bags = Vec::new();
    for kind in selection.iter() {
        match kind {
            GroupKind::Volume => {
                groups::attach_capacity(
                    &mut model,
                    Dimension::Volume,
                    items,
                    &counts,
                    capacities.volume,
                )?;
            }
            GroupKind::Weight => {
                groups::attach_capacity(
                    &mut model,
                    Dimension::Weight,
                    items,
                    &counts,
                    capacities.weight,
                )?;
            }
            GroupKind::Value => {
                groups::attach_capacity(
                    &mut model,
                    Dimension::Value,
                    items,
                    &counts,
                    capacities.value,
                )?;
            }
            GroupKind::Bags => {
                let (assignments, _) = groups::attach_bags(
                    &mut model,
                    items,
                    &counts,
                    &instance.bags,
                    options.domain,
                )?;
                bags = assignments;
            }
            GroupKind::Requirements => {
                groups::attach_requirements(&mut model, items, &counts)?;
            }
        }
    }

    let goal = options.goal.dimension();
    model.maximize(Expr::weighted(
        counts
            .iter()
            .zip(items)
            .map(|(var, item)| (*var, item.attribute(goal))),
    ))?;
    model.set_objective_name(Some(format!("total_{}", goal.as_str())));

    debug!(
        component = "compose",
        operation = "compose",
        status = "success",
        groups = %selection,
        goal = options.goal.as_str(),
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Composed knapsack model"
    );

    Ok(ComposedModel {
        model,
        items: instance.items.clone(),
        counts,
        bags,
        selection: selection.clone(),
        options: options.clone(),
        capacities,
    })
}

impl ComposedModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Capacities after overrides.
    pub fn capacities(&self) -> Capacities {
        self.capacities
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Count variable of each item, in item order.
    pub fn count_variables(&self) -> &[VariableId] {
        &self.counts
    }

    /// Per-bag count variables; empty unless the `bags` group is attached.
    pub fn bag_assignments(&self) -> &[BagAssignment] {
        &self.bags
    }

    /// Names of the attached groups, in attachment order.
    pub fn group_names(&self) -> Vec<&str> {
        self.model.group_names()
    }

    /// Optimize the model once with `solver`.
    ///
    /// Infeasible and unbounded outcomes come back as
    /// [`SolverError::SolveFailure`]; they are never retried.
    pub fn solve<S: Solver>(
        self,
        solver: &mut S,
        config: &SolverConfig,
    ) -> Result<SolvedKnapsack, ComposeError> {
        debug!(
            component = "compose",
            operation = "solve",
            status = "start",
            solver = solver.name(),
            groups = %self.selection,
            "Handing model to solver"
        );

        let solution = match solver.solve(&self.model, config) {
            Ok(solution) => solution,
            Err(err) => {
                warn!(
                    component = "compose",
                    operation = "solve",
                    status = "error",
                    solver = solver.name(),
                    error_code = err.code(),
                    "Solve failed"
                );
                return Err(err.into());
            }
        };

        if !solution.status.is_feasible() {
            warn!(
                component = "compose",
                operation = "solve",
                status = "error",
                solver = solver.name(),
                solver_status = solution.status.as_str(),
                "Solver returned a solution without a feasible status"
            );
            return Err(SolverError::SolveFailure {
                status: solution.status,
            }
            .into());
        }
        if solution.primal_values.len() < self.model.num_variables() {
            return Err(SolverError::SolverSpecific(format!(
                "expected {} primal values, got {}",
                self.model.num_variables(),
                solution.primal_values.len()
            ))
            .into());
        }

        debug!(
            component = "compose",
            operation = "solve",
            status = "success",
            solver = solver.name(),
            solver_status = solution.status.as_str(),
            objective_value = solution.objective_value,
            "Solved knapsack model"
        );

        Ok(SolvedKnapsack {
            composed: self,
            solution,
            solver: solver.name(),
        })
    }
}

/// A composed model together with the solver's answer.
#[derive(Debug, Clone)]
pub struct SolvedKnapsack {
    composed: ComposedModel,
    solution: Solution,
    solver: &'static str,
}

impl SolvedKnapsack {
    pub fn composed(&self) -> &ComposedModel {
        &self.composed
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn status(&self) -> SolverStatus {
        self.solution.status
    }

    pub fn objective_value(&self) -> f64 {
        self.solution.objective_value
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver
    }

    /// Value of `var`, rounded to a whole number in the integral domain.
    pub fn count_of(&self, var: VariableId) -> f64 {
        let raw = self
            .solution
            .primal_values
            .get(var.index())
            .copied()
            .unwrap_or(0.0);
        let settled = match self.composed.options.domain {
            Domain::Integral => raw.round(),
            Domain::Relaxed if raw.abs() < COUNT_TOLERANCE => 0.0,
            Domain::Relaxed => raw,
        };
        // normalizes -0.0
        settled + 0.0
    }

    /// Number of units taken of each item, in item order.
    pub fn item_counts(&self) -> Vec<(&Item, f64)> {
        self.composed
            .items
            .iter()
            .zip(&self.composed.counts)
            .map(|(item, var)| (item, self.count_of(*var)))
            .collect()
    }
}

/// Counts below this are treated as zero.
pub(crate) const COUNT_TOLERANCE: f64 = 1e-6;

/// Parse `selector`, compose, solve and report.
///
/// The selector and solver options are checked first, so a configuration
/// error never reaches the solver.
pub fn run<S: Solver>(
    selector: &str,
    instance: &Instance,
    options: &ComposeOptions,
    solver: &mut S,
    config: &SolverConfig,
) -> Result<Report, ComposeError> {
    let selection = Selection::parse(selector)?;
    config.validate().map_err(|err| match err {
        SolverError::InvalidOption(message) => ConfigError::SolverOption(message),
        other => ConfigError::SolverOption(other.to_string()),
    })?;

    let solved = compose(instance, &selection, options)?.solve(solver, config)?;
    Ok(solved.report())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::instance::Bag;
    use crate::testing::RecordingSolver;
    use kitbag_core::{InspectOptions, Sense};

    /// Two items given as (volume, weight, value), capacity 5 everywhere.
    fn scenario() -> Instance {
        Instance::new(
            vec![
                Item::new("first", 2.0, 3.0, 10.0),
                Item::new("second", 4.0, 1.0, 6.0),
            ],
            Capacities::uniform(5.0),
        )
    }

    fn composed(selector: &str) -> ComposedModel {
        let selection = Selection::parse(selector).unwrap();
        compose(&scenario(), &selection, &ComposeOptions::default()).unwrap()
    }

    #[test]
    fn single_groups_attach_only_themselves() {
        for selector in ["volume", "weight", "value"] {
            let composed = composed(selector);
            assert_eq!(composed.group_names(), vec![selector]);
            assert_eq!(composed.model().num_constraints(), 1);
            assert_eq!(composed.model().num_variables(), 2);
            let snapshot = composed.model().inspect(InspectOptions::default());
            assert_eq!(snapshot.constraints_in_group(selector).count(), 1);
        }
    }

    #[test]
    fn volume_row_matches_item_volumes() {
        let composed = composed("volume");
        let model = composed.model();
        let row = model.get_constraint_by_name("volume_capacity").unwrap();
        let counts = composed.count_variables();
        assert_eq!(model.rows()[row.index()], vec![(counts[0], 2.0), (counts[1], 4.0)]);
        assert_eq!(model.get_constraint(row).unwrap().bounds.upper, 5.0);
        assert_eq!(model.objective().sense, Some(Sense::Maximize));
        assert_eq!(model.objective().terms, vec![(counts[0], 10.0), (counts[1], 6.0)]);
        assert_eq!(model.get_objective_name(), Some("total_value"));
    }

    #[test]
    fn combined_selector_attaches_each_group_once() {
        let composed = composed("weight+volume+weight");
        assert_eq!(composed.group_names(), vec!["volume", "weight"]);
        assert_eq!(composed.model().num_constraints(), 2);
    }

    #[test]
    fn scenario_solves_to_first_item() {
        let mut solver = RecordingSolver::returning(vec![1.0, 0.0]);
        let solved = composed("volume")
            .solve(&mut solver, &SolverConfig::default())
            .unwrap();

        assert_eq!(solver.calls, 1);
        assert_eq!(solver.seen_groups, vec![vec!["volume".to_string()]]);
        assert_eq!(solver.seen_constraints, vec![1]);
        assert_eq!(solved.objective_value(), 10.0);
        let counts: Vec<f64> = solved.item_counts().iter().map(|(_, count)| *count).collect();
        assert_eq!(counts, vec![1.0, 0.0]);
    }

    #[test]
    fn configuration_errors_never_reach_the_solver() {
        let mut solver = RecordingSolver::returning(Vec::new());
        let config = SolverConfig::default();
        let options = ComposeOptions::default();

        let err = run("", &scenario(), &options, &mut solver, &config).unwrap_err();
        assert_eq!(err, ComposeError::Config(ConfigError::EmptySelector));

        let err = run("volume+height", &scenario(), &options, &mut solver, &config).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.code(), "CONFIG_UNKNOWN_GROUP");

        let err = run("bags", &scenario(), &options, &mut solver, &config).unwrap_err();
        assert_eq!(err, ComposeError::Config(ConfigError::NoBags));

        let bad_config = SolverConfig::new().with_time_limit(-1.0);
        let err = run("volume", &scenario(), &options, &mut solver, &bad_config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_SOLVER_OPTION");

        let negative = ComposeOptions {
            capacities: CapacityOverrides {
                volume: Some(-3.0),
                ..CapacityOverrides::default()
            },
            ..ComposeOptions::default()
        };
        let err = run("volume", &scenario(), &negative, &mut solver, &config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID_CAPACITY");

        assert_eq!(solver.calls, 0);
    }

    #[test]
    fn capacity_overrides_replace_instance_values() {
        let options = ComposeOptions {
            capacities: CapacityOverrides {
                weight: Some(2.5),
                ..CapacityOverrides::default()
            },
            ..ComposeOptions::default()
        };
        let composed = compose(
            &scenario(),
            &Selection::parse("weight").unwrap(),
            &options,
        )
        .unwrap();
        let model = composed.model();
        let row = model.get_constraint_by_name("weight_capacity").unwrap();
        assert_eq!(model.get_constraint(row).unwrap().bounds.upper, 2.5);
        assert_eq!(composed.capacities().volume, 5.0);
    }

    #[test]
    fn goal_and_domain_shape_the_model() {
        let options = ComposeOptions {
            goal: Goal::Volume,
            domain: Domain::Relaxed,
            ..ComposeOptions::default()
        };
        let composed = compose(&scenario(), &Selection::parse("value").unwrap(), &options).unwrap();
        let model = composed.model();
        let counts = composed.count_variables();
        assert_eq!(model.objective().terms, vec![(counts[0], 2.0), (counts[1], 4.0)]);
        assert!(model.variables().all(|(_, var)| !var.is_integer));
    }

    #[test]
    fn bags_and_requirements_use_instance_data() {
        let mut instance = scenario().with_bags(vec![Bag::new("pack", 3.0, 10.0)]);
        instance.items[1].required = 1;

        let composed = compose(
            &instance,
            &Selection::parse("bags+requirements").unwrap(),
            &ComposeOptions::default(),
        )
        .unwrap();
        assert_eq!(composed.group_names(), vec!["bags", "requirements"]);
        assert_eq!(composed.bag_assignments().len(), 1);
        // 2 bag rows + 2 links + 1 requirement
        assert_eq!(composed.model().num_constraints(), 5);
        assert_eq!(composed.model().num_variables(), 4);
    }

    #[test]
    fn solver_failures_surface_without_retry() {
        let mut solver = RecordingSolver::failing(SolverStatus::Infeasible);
        let err = composed("volume")
            .solve(&mut solver, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::Solver(SolverError::SolveFailure {
                status: SolverStatus::Infeasible
            })
        );
        assert_eq!(solver.calls, 1);
    }

    #[test]
    fn infeasible_status_in_solution_is_rejected() {
        let mut solver =
            RecordingSolver::returning(vec![1.0, 1.0]).with_status(SolverStatus::Unbounded);
        let err = composed("volume")
            .solve(&mut solver, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(err.code(), "SOLVER_SOLVE_FAILURE");
    }

    #[test]
    fn limit_status_is_accepted() {
        let mut solver =
            RecordingSolver::returning(vec![0.0, 1.0]).with_status(SolverStatus::TimeLimit);
        let solved = composed("volume")
            .solve(&mut solver, &SolverConfig::default())
            .unwrap();
        assert_eq!(solved.status(), SolverStatus::TimeLimit);
        assert_eq!(solved.objective_value(), 6.0);
    }

    #[test]
    fn integral_counts_are_rounded() {
        let mut solver = RecordingSolver::returning(vec![0.999_999_9, -0.000_000_1]);
        let solved = composed("volume")
            .solve(&mut solver, &SolverConfig::default())
            .unwrap();
        let counts: Vec<f64> = solved.item_counts().iter().map(|(_, count)| *count).collect();
        assert_eq!(counts, vec![1.0, 0.0]);
        assert!(counts[1].is_sign_positive());
    }
}
