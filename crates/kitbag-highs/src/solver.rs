//! [`Solver`] implementation backed by HiGHS.

use std::collections::BTreeMap;
use std::time::Instant;

use kitbag_core::{Bounds, Model, Sense, Solution, Solver, SolverConfig, SolverError};
use kitbag_expr::ids::{ConstraintId, VariableId};
use tracing::{debug, trace, warn};

use crate::model::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense};
use crate::status::{highs_has_solution, highs_status_string, highs_to_core_status};

/// Row entries keyed by constraint: (column indices, coefficients).
type ConstraintEntries = BTreeMap<ConstraintId, (Vec<usize>, Vec<f64>)>;

/// Primal feasibility tolerance used when the config leaves it unset.
const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-6;

fn highs_model_error_to_solver_error(err: HighsModelError) -> SolverError {
    SolverError::SolverSpecific(err.to_string())
}

/// HiGHS backend.
///
/// Each call to [`Solver::solve`] builds a fresh HiGHS problem from the
/// model, so one `HighsSolver` can be reused across models.
#[derive(Debug, Default)]
pub struct HighsSolver {
    solves: u64,
}

impl HighsSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of solves started through this instance.
    pub fn solves(&self) -> u64 {
        self.solves
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&mut self, model: &Model, config: &SolverConfig) -> Result<Solution, SolverError> {
        self.solves += 1;
        solve_model(model, config)
    }
}

fn validate_model(model: &Model) -> Result<(), SolverError> {
    if model.num_variables() == 0 {
        return Err(SolverError::EmptyModel);
    }
    Ok(())
}

fn collect_objective_coefficients(
    model: &Model,
) -> Result<(Sense, BTreeMap<VariableId, f64>), SolverError> {
    let objective = model.objective();
    let Some(sense) = objective.sense else {
        return Err(SolverError::NoObjective);
    };

    let mut coefficients: BTreeMap<VariableId, f64> = BTreeMap::new();
    for (var_id, coeff) in &objective.terms {
        model
            .get_variable(*var_id)
            .map_err(|_| SolverError::InvalidVariableId(var_id.inner()))?;
        *coefficients.entry(*var_id).or_insert(0.0) += *coeff;
    }

    Ok((sense, coefficients))
}

fn apply_solver_config(highs_model: &mut HighsModel, config: &SolverConfig) {
    highs_model.set_log_to_console(config.log_to_console.unwrap_or(false));

    if let Some(limit) = config.time_limit {
        highs_model.set_option("time_limit", HighsOption::Float(limit));
    }
    if let Some(gap) = config.mip_gap {
        highs_model.set_option("mip_rel_gap", HighsOption::Float(gap));
    }
    if let Some(level) = config.verbosity {
        highs_model.set_option("output_flag", HighsOption::Bool(level > 0));
    }
    if let Some(presolve) = config.presolve {
        let presolve = if presolve { "on" } else { "off" };
        highs_model.set_option("presolve", HighsOption::Str(presolve.to_string()));
    }
    if let Some(threads) = config.threads {
        highs_model.set_option(
            "threads",
            HighsOption::Int(i32::try_from(threads).unwrap_or(i32::MAX)),
        );
    }
    if let Some(tolerance) = config.tolerance {
        highs_model.set_option(
            "primal_feasibility_tolerance",
            HighsOption::Float(tolerance),
        );
        highs_model.set_option("dual_feasibility_tolerance", HighsOption::Float(tolerance));
    }
}

/// Add one column per model variable; the column index equals the id.
fn add_variables_to_highs(
    model: &Model,
    highs_model: &mut HighsModel,
    objective_coeffs: &BTreeMap<VariableId, f64>,
) {
    for (var_id, var) in model.variables() {
        let obj_coeff = objective_coeffs.get(&var_id).copied().unwrap_or(0.0);
        let col_idx = if var.is_integer {
            highs_model.add_integer_col(var.bounds.lower, var.bounds.upper, obj_coeff)
        } else {
            highs_model.add_col(var.bounds.lower, var.bounds.upper, obj_coeff)
        };
        debug_assert_eq!(col_idx, var_id.index());
    }

    debug!(
        component = "solver",
        operation = "add_variables",
        status = "success",
        num_vars = model.num_variables(),
        "Added all variables to HiGHS"
    );
}

fn build_constraint_entries(model: &Model) -> ConstraintEntries {
    let started = Instant::now();
    let mut entries: ConstraintEntries = BTreeMap::new();

    for (var_id, column) in model.columns() {
        for (constraint_id, coeff) in column {
            let entry = entries
                .entry(*constraint_id)
                .or_insert_with(|| (Vec::new(), Vec::new()));
            entry.0.push(var_id.index());
            entry.1.push(*coeff);
        }
    }

    trace!(
        component = "solver",
        operation = "build_rows",
        status = "success",
        num_constraints = entries.len(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Built constraint rows from columns"
    );
    entries
}

fn add_constraints_to_highs(
    model: &Model,
    highs_model: &mut HighsModel,
    mut entries: ConstraintEntries,
) -> Result<(), SolverError> {
    for (constraint_id, constraint) in model.constraints() {
        let (col_indices, coefficients) = entries.remove(&constraint_id).unwrap_or_default();
        highs_model
            .add_row(
                constraint.bounds.lower,
                constraint.bounds.upper,
                &col_indices,
                &coefficients,
            )
            .map_err(highs_model_error_to_solver_error)?;
    }

    debug!(
        component = "solver",
        operation = "add_constraints",
        status = "success",
        num_constraints = model.num_constraints(),
        "Added all constraints to HiGHS"
    );
    Ok(())
}

/// Objective value at the given primal point.
fn evaluate_objective(objective_coeffs: &BTreeMap<VariableId, f64>, primal_values: &[f64]) -> f64 {
    objective_coeffs
        .iter()
        .map(|(var_id, coeff)| coeff * primal_values.get(var_id.index()).copied().unwrap_or(0.0))
        .sum()
}

/// Whether a point returned with a limit status satisfies the variable
/// bounds, integrality and row bounds of `model` within `tolerance`.
///
/// HiGHS can stop on a limit before it has found any feasible point, in
/// which case the columns it reports are not a solution.
fn limit_point_is_feasible(
    model: &Model,
    col_values: &[f64],
    row_values: &[f64],
    tolerance: f64,
) -> bool {
    if col_values.len() != model.num_variables() || row_values.len() != model.num_constraints() {
        return false;
    }
    let within = |value: f64, bounds: &Bounds| {
        value.is_finite() && value >= bounds.lower - tolerance && value <= bounds.upper + tolerance
    };
    let integral = |value: f64| (value - value.round()).abs() <= tolerance;

    let columns_ok = model.variables().zip(col_values).all(|((_, var), &value)| {
        within(value, &var.bounds) && (!var.is_integer || integral(value))
    });
    columns_ok
        && model
            .constraints()
            .zip(row_values)
            .all(|((_, con), &value)| within(value, &con.bounds))
}

fn solve_model(model: &Model, config: &SolverConfig) -> Result<Solution, SolverError> {
    validate_model(model)?;
    config.validate()?;
    let (sense, objective_coeffs) = collect_objective_coefficients(model)?;

    let solve_started = Instant::now();
    debug!(
        component = "solver",
        operation = "solve",
        status = "start",
        solver = "highs",
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        nnz = model.num_coefficients(),
        sense = sense.as_str(),
        "Starting solve process"
    );

    let mut highs_model = HighsModel::new();
    apply_solver_config(&mut highs_model, config);
    highs_model.set_objective_sense(match sense {
        Sense::Minimize => ObjectiveSense::Minimize,
        Sense::Maximize => ObjectiveSense::Maximize,
    });
    add_variables_to_highs(model, &mut highs_model, &objective_coeffs);
    add_constraints_to_highs(model, &mut highs_model, build_constraint_entries(model))?;

    let status = highs_model.solve();
    let duration_ms = solve_started.elapsed().as_secs_f64() * 1000.0;
    let mip_gap = highs_model.mip_gap();

    if !highs_has_solution(status) {
        warn!(
            component = "solver",
            operation = "solve",
            status = "warn",
            solver = "highs",
            solver_status = highs_status_string(status),
            duration_ms,
            "Solver did not find a usable solution"
        );
        return Err(SolverError::SolveFailure {
            status: highs_to_core_status(status),
        });
    }

    let snapshot = highs_model
        .solution_snapshot()
        .map_err(highs_model_error_to_solver_error)?;
    let primal_values = snapshot.col_values().to_vec();
    let row_values = snapshot.row_values().to_vec();
    let objective_value = evaluate_objective(&objective_coeffs, &primal_values);

    if status != HighsStatus::Optimal {
        let tolerance = config.tolerance.unwrap_or(DEFAULT_FEASIBILITY_TOLERANCE);
        if !limit_point_is_feasible(model, &primal_values, &row_values, tolerance) {
            warn!(
                component = "solver",
                operation = "solve",
                status = "warn",
                solver = "highs",
                solver_status = highs_status_string(status),
                tolerance,
                duration_ms,
                "Solver hit limit before finding a feasible point"
            );
            return Err(SolverError::SolveFailure {
                status: highs_to_core_status(status),
            });
        }
        warn!(
            component = "solver",
            operation = "solve",
            status = "warn",
            solver = "highs",
            solver_status = highs_status_string(status),
            objective_value,
            optimality_gap = mip_gap,
            duration_ms,
            "Solver hit limit but returning best solution found"
        );
    }

    debug!(
        component = "solver",
        operation = "solve",
        status = "success",
        solver = "highs",
        solver_status = highs_status_string(status),
        objective_value,
        optimality_gap = mip_gap,
        num_primal_values = primal_values.len(),
        duration_ms,
        "HiGHS solve completed"
    );

    let mut metadata = BTreeMap::new();
    if mip_gap.is_finite() {
        metadata.insert("mip_gap".to_string(), mip_gap);
    }

    Ok(Solution {
        primal_values,
        row_values,
        objective_value,
        status: highs_to_core_status(status),
        solve_time_seconds: solve_started.elapsed().as_secs_f64(),
        metadata,
    })
}
