//! Owned wrapper around a HiGHS problem for a single solve.
//!
//! The `highs` crate owns the native handle; it is released when the
//! [`HighsModel`] (or the solved model inside it) is dropped, on every exit
//! path.

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense, SolvedModel};
use std::fmt;
use tracing::{debug, trace, warn};

/// Objective sense for optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Model status reported by HiGHS after a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighsStatus {
    Optimal,
    Infeasible,
    Unbounded,
    UnboundedOrInfeasible,
    /// Solver reached time limit (may have feasible solution)
    ReachedTimeLimit,
    /// Solver reached iteration limit (may have feasible solution)
    ReachedIterationLimit,
    Unknown,
}

/// Errors returned by the HiGHS model wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsModelError {
    ColumnCoefficientLengthMismatch {
        columns: usize,
        coefficients: usize,
    },
    ColumnIndexOutOfBounds {
        column_index: usize,
        num_columns: usize,
    },
    SolveRequired {
        operation: &'static str,
    },
}

impl fmt::Display for HighsModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighsModelError::ColumnCoefficientLengthMismatch {
                columns,
                coefficients,
            } => write!(
                f,
                "columns length ({}) must match coefficients length ({})",
                columns, coefficients
            ),
            HighsModelError::ColumnIndexOutOfBounds {
                column_index,
                num_columns,
            } => write!(
                f,
                "column index {} out of bounds (num_columns = {})",
                column_index, num_columns
            ),
            HighsModelError::SolveRequired { operation } => {
                write!(f, "solve must be called before {}", operation)
            }
        }
    }
}

impl std::error::Error for HighsModelError {}

/// Primal column and row values copied out of a solved model.
#[derive(Debug, Clone)]
pub struct SolutionSnapshot {
    col_values: Vec<f64>,
    row_values: Vec<f64>,
}

impl SolutionSnapshot {
    pub fn col_values(&self) -> &[f64] {
        &self.col_values
    }

    /// Row activities.
    pub fn row_values(&self) -> &[f64] {
        &self.row_values
    }
}

/// Option value types accepted by [`HighsModel::set_option`].
#[derive(Debug, Clone, PartialEq)]
pub enum HighsOption {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
}

/// Safe wrapper around a HiGHS row problem.
pub struct HighsModel {
    problem: RowProblem,
    objective_sense: ObjectiveSense,
    solved: Option<SolvedModel>,
    columns: Vec<Col>,
    num_rows: usize,
    log_to_console: bool,
    options: Vec<(String, HighsOption)>,
}

impl HighsModel {
    pub fn new() -> Self {
        trace!(
            component = "solver",
            operation = "init_highs",
            status = "success",
            "Creating new HiGHS model"
        );
        HighsModel {
            problem: RowProblem::default(),
            objective_sense: ObjectiveSense::Minimize,
            solved: None,
            columns: Vec::new(),
            num_rows: 0,
            log_to_console: false,
            options: Vec::new(),
        }
    }

    /// Add a continuous column and return its index.
    pub fn add_col(&mut self, lower: f64, upper: f64, objective_coefficient: f64) -> usize {
        self.push_col(lower, upper, objective_coefficient, false)
    }

    /// Add an integer column and return its index.
    pub fn add_integer_col(&mut self, lower: f64, upper: f64, objective_coefficient: f64) -> usize {
        self.push_col(lower, upper, objective_coefficient, true)
    }

    fn push_col(
        &mut self,
        lower: f64,
        upper: f64,
        objective_coefficient: f64,
        is_integer: bool,
    ) -> usize {
        self.solved = None;
        let col = if is_integer {
            self.problem
                .add_integer_column(objective_coefficient, lower..=upper)
        } else {
            self.problem.add_column(objective_coefficient, lower..=upper)
        };
        self.columns.push(col);
        trace!(
            component = "solver",
            operation = "add_column",
            status = "success",
            col_idx = self.columns.len() - 1,
            lower,
            upper,
            objective_coefficient,
            is_integer,
            "Added column"
        );
        self.columns.len() - 1
    }

    /// Add a row `lower <= sum(coefficients[k] * x[columns[k]]) <= upper`.
    ///
    /// # Errors
    ///
    /// Returns an error if `columns` and `coefficients` differ in length or
    /// a column index has not been added.
    pub fn add_row(
        &mut self,
        lower: f64,
        upper: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, HighsModelError> {
        if columns.len() != coefficients.len() {
            warn!(
                component = "solver",
                operation = "add_row",
                status = "error",
                columns = columns.len(),
                coefficients = coefficients.len(),
                "Column/coefficients length mismatch"
            );
            return Err(HighsModelError::ColumnCoefficientLengthMismatch {
                columns: columns.len(),
                coefficients: coefficients.len(),
            });
        }

        let num_columns = self.columns.len();
        let mut factors = Vec::with_capacity(columns.len());
        for (&column_index, &coefficient) in columns.iter().zip(coefficients) {
            let col = *self.columns.get(column_index).ok_or(
                HighsModelError::ColumnIndexOutOfBounds {
                    column_index,
                    num_columns,
                },
            )?;
            factors.push((col, coefficient));
        }

        self.solved = None;
        self.problem.add_row(lower..=upper, factors);
        self.num_rows += 1;
        trace!(
            component = "solver",
            operation = "add_row",
            status = "success",
            row_idx = self.num_rows - 1,
            lower,
            upper,
            nnz = columns.len(),
            "Added row"
        );
        Ok(self.num_rows - 1)
    }

    pub fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective_sense = sense;
    }

    /// Forward the native HiGHS log to the console on the next solve.
    pub fn set_log_to_console(&mut self, enabled: bool) {
        self.log_to_console = enabled;
    }

    /// Set a HiGHS option for the next solve.
    pub fn set_option(&mut self, option: impl Into<String>, value: HighsOption) {
        self.options.push((option.into(), value));
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.num_rows
    }

    /// Solve the problem built so far.
    ///
    /// The problem is consumed by HiGHS; the wrapper keeps only the solved
    /// model, so rebuilding is required before another solve.
    pub fn solve(&mut self) -> HighsStatus {
        debug!(
            component = "solver",
            operation = "solve",
            status = "start",
            num_cols = self.columns.len(),
            num_rows = self.num_rows,
            sense = ?self.objective_sense,
            "Solving HiGHS model"
        );

        let sense = match self.objective_sense {
            ObjectiveSense::Minimize => HighsSense::Minimise,
            ObjectiveSense::Maximize => HighsSense::Maximise,
        };

        let problem = std::mem::take(&mut self.problem);
        let mut model = problem.optimise(sense);
        if self.log_to_console {
            model.set_option("output_flag", true);
            model.set_option("log_to_console", true);
        } else {
            model.make_quiet();
        }
        for (option, value) in self.options.drain(..) {
            match value {
                HighsOption::Bool(val) => model.set_option(option.as_str(), val),
                HighsOption::Int(val) => model.set_option(option.as_str(), val),
                HighsOption::Float(val) => model.set_option(option.as_str(), val),
                HighsOption::Str(val) => model.set_option(option.as_str(), val.as_str()),
            }
        }

        let solved = model.solve();
        let status = map_status(solved.status());
        trace!(
            component = "solver",
            operation = "solve",
            status = "success",
            highs_status = ?status,
            "Solution status received"
        );

        self.solved = Some(solved);
        self.columns.clear();
        self.num_rows = 0;
        status
    }

    /// Relative MIP gap of the last solve, `NaN` before solving.
    pub fn mip_gap(&self) -> f64 {
        self.solved
            .as_ref()
            .map_or(f64::NAN, |solved| solved.mip_gap())
    }

    /// Copy the primal column and row values of the last solve.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been solved yet.
    pub fn solution_snapshot(&self) -> Result<SolutionSnapshot, HighsModelError> {
        let solved = self.solved.as_ref().ok_or(HighsModelError::SolveRequired {
            operation: "solution_snapshot",
        })?;
        let solution = solved.get_solution();

        Ok(SolutionSnapshot {
            col_values: solution.columns().to_vec(),
            row_values: solution.rows().to_vec(),
        })
    }
}

impl Default for HighsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HighsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighsModel")
            .field("num_columns", &self.columns.len())
            .field("num_rows", &self.num_rows)
            .field("objective_sense", &self.objective_sense)
            .field("solved", &self.solved.is_some())
            .finish_non_exhaustive()
    }
}

fn map_status(status: HighsModelStatus) -> HighsStatus {
    match status {
        HighsModelStatus::Optimal => HighsStatus::Optimal,
        HighsModelStatus::Infeasible => HighsStatus::Infeasible,
        HighsModelStatus::Unbounded => HighsStatus::Unbounded,
        HighsModelStatus::UnboundedOrInfeasible => HighsStatus::UnboundedOrInfeasible,
        HighsModelStatus::ReachedTimeLimit => HighsStatus::ReachedTimeLimit,
        HighsModelStatus::ReachedIterationLimit => HighsStatus::ReachedIterationLimit,
        _ => HighsStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_is_empty() {
        let model = HighsModel::new();
        assert_eq!(model.columns(), 0);
        assert_eq!(model.rows(), 0);
        assert_eq!(model.objective_sense, ObjectiveSense::Minimize);
    }

    #[test]
    fn add_row_rejects_mismatched_lengths() {
        let mut model = HighsModel::new();
        model.add_col(0.0, 1.0, 1.0);
        let err = model.add_row(0.0, 1.0, &[0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            HighsModelError::ColumnCoefficientLengthMismatch {
                columns: 1,
                coefficients: 2,
            }
        );
        assert_eq!(model.rows(), 0);
    }

    #[test]
    fn add_row_rejects_unknown_column() {
        let mut model = HighsModel::new();
        model.add_col(0.0, 1.0, 1.0);
        let err = model.add_row(0.0, 1.0, &[3], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            HighsModelError::ColumnIndexOutOfBounds {
                column_index: 3,
                num_columns: 1,
            }
        );
    }

    #[test]
    fn snapshot_requires_solve() {
        let model = HighsModel::new();
        assert!(matches!(
            model.solution_snapshot(),
            Err(HighsModelError::SolveRequired { .. })
        ));
        assert!(model.mip_gap().is_nan());
    }
}
