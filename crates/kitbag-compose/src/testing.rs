//! Test doubles for the solver boundary.

use std::collections::BTreeMap;

use kitbag_core::{Model, Solution, Solver, SolverConfig, SolverError, SolverStatus};

/// Solver that records what it was asked to solve and answers from a script.
#[derive(Debug)]
pub(crate) struct RecordingSolver {
    pub calls: usize,
    pub seen_groups: Vec<Vec<String>>,
    pub seen_constraints: Vec<usize>,
    values: Vec<f64>,
    status: SolverStatus,
    fail_with: Option<SolverStatus>,
}

impl RecordingSolver {
    /// Answer with these primal values, padded with zeros.
    pub fn returning(values: Vec<f64>) -> Self {
        Self {
            calls: 0,
            seen_groups: Vec::new(),
            seen_constraints: Vec::new(),
            values,
            status: SolverStatus::Optimal,
            fail_with: None,
        }
    }

    /// Answer with `values` but report `status`.
    pub fn with_status(mut self, status: SolverStatus) -> Self {
        self.status = status;
        self
    }

    /// Fail every solve with [`SolverError::SolveFailure`].
    pub fn failing(status: SolverStatus) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::returning(Vec::new())
        }
    }
}

impl Solver for RecordingSolver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn solve(&mut self, model: &Model, _config: &SolverConfig) -> Result<Solution, SolverError> {
        self.calls += 1;
        self.seen_groups.push(
            model
                .group_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        );
        self.seen_constraints.push(model.num_constraints());
        if let Some(status) = self.fail_with {
            return Err(SolverError::SolveFailure { status });
        }

        let mut primal_values = self.values.clone();
        primal_values.resize(model.num_variables(), 0.0);
        let objective_value = model
            .objective()
            .terms
            .iter()
            .map(|(var, coeff)| coeff * primal_values[var.index()])
            .sum();
        Ok(Solution {
            primal_values,
            row_values: Vec::new(),
            objective_value,
            status: self.status,
            solve_time_seconds: 0.0,
            metadata: BTreeMap::new(),
        })
    }
}
