//! Solver trait and backend-independent result types.
//!
//! A backend receives a finished [`Model`] and returns a [`Solution`] whose
//! vectors are indexed by variable and constraint position.

mod config;

use std::collections::BTreeMap;

use kitbag_expr::ids::{ConstraintId, VariableId};

use crate::Model;

pub use config::SolverConfig;

/// Terminal status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Time limit reached; the incumbent may still be usable.
    TimeLimit,
    /// Iteration limit reached; the incumbent may still be usable.
    IterationLimit,
    Unknown,
}

impl SolverStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Optimal or stopped at a limit with an incumbent.
    pub fn is_feasible(self) -> bool {
        matches!(
            self,
            SolverStatus::Optimal | SolverStatus::TimeLimit | SolverStatus::IterationLimit
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::TimeLimit => "time_limit",
            SolverStatus::IterationLimit => "iteration_limit",
            SolverStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for solver operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Model has no variables.
    EmptyModel,
    /// No objective function set.
    NoObjective,
    /// A solution vector was too short for the requested variable.
    InvalidVariableId(u32),
    /// A configuration value the backend cannot accept.
    InvalidOption(String),
    /// Solver finished without a usable solution.
    SolveFailure { status: SolverStatus },
    /// Backend-specific error not covered by other variants.
    SolverSpecific(String),
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::EmptyModel => "SOLVER_EMPTY_MODEL",
            SolverError::NoObjective => "SOLVER_NO_OBJECTIVE",
            SolverError::InvalidVariableId(_) => "SOLVER_INVALID_VARIABLE_ID",
            SolverError::InvalidOption(_) => "SOLVER_INVALID_OPTION",
            SolverError::SolveFailure { .. } => "SOLVER_SOLVE_FAILURE",
            SolverError::SolverSpecific(_) => "SOLVER_SPECIFIC",
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::EmptyModel => write!(f, "[{}] Model has no variables", self.code()),
            SolverError::NoObjective => write!(f, "[{}] Model has no objective", self.code()),
            SolverError::InvalidVariableId(id) => {
                write!(f, "[{}] Variable ID {} has no value", self.code(), id)
            }
            SolverError::InvalidOption(msg) => {
                write!(f, "[{}] Invalid solver option: {}", self.code(), msg)
            }
            SolverError::SolveFailure { status } => {
                write!(f, "[{}] Solve failed with status: {}", self.code(), status)
            }
            SolverError::SolverSpecific(msg) => {
                write!(f, "[{}] Solver error: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Solution returned by a backend.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Primal values indexed by variable position.
    pub primal_values: Vec<f64>,
    /// Row activities indexed by constraint position.
    pub row_values: Vec<f64>,
    pub objective_value: f64,
    pub status: SolverStatus,
    pub solve_time_seconds: f64,
    /// Backend counters such as iteration counts or the final MIP gap.
    pub metadata: BTreeMap<String, f64>,
}

impl Solution {
    /// Value of a variable in this solution.
    pub fn value(&self, id: VariableId) -> Result<f64, SolverError> {
        self.primal_values
            .get(id.index())
            .copied()
            .ok_or(SolverError::InvalidVariableId(id.inner()))
    }

    /// Activity of a constraint row in this solution.
    pub fn row_value(&self, id: ConstraintId) -> Option<f64> {
        self.row_values.get(id.index()).copied()
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }
}

/// A backend able to optimize a [`Model`].
pub trait Solver {
    /// Short backend name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Solve the model once with the given options.
    ///
    /// Statuses that leave no usable solution are returned as
    /// [`SolverError::SolveFailure`].
    fn solve(&mut self, model: &Model, config: &SolverConfig) -> Result<Solution, SolverError>;
}
