//! Model module for building knapsack models.
//!
//! This module provides the core [`Model`] type: variables, constraints, a
//! single objective, and the named constraint groups attached through
//! [`GroupScope`].
//!
//! # Module Organization
//!
//! - [`error`]: Model error types
//! - [`builder`]: Methods for adding variables, constraints, and objectives
//! - [`storage`]: Column-first sparse storage access
//! - [`metadata`]: Variable and constraint naming and metadata
//! - [`group`]: Scoped, all-or-nothing constraint groups
//! - [`inspect`]: Model inspection and snapshots

mod builder;
mod error;
mod group;
mod inspect;
mod metadata;
mod storage;

use crate::types::{Constraint, Objective, Variable};
use kitbag_expr::ids::{ConstraintId, VariableId};
use std::collections::BTreeMap;
use std::time::Instant;

pub use error::ModelError;
pub use group::{ConstraintGroup, GroupScope};
pub use inspect::{
    CoefficientView, ConstraintView, GroupView, InspectOptions, ModelSnapshot, ObjectiveView,
    SnapshotMetadata, VariableView,
};

/// A model builder for linear and mixed-integer programs.
///
/// Variable and constraint ids are dense: the n-th variable added has id n,
/// which is also its column position at the solver boundary.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) variables: Vec<Variable>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Objective,
    pub(crate) objective_name: Option<String>,
    // Column-first sparse storage: variable_id -> vec of (constraint_id, coefficient)
    pub(crate) columns: BTreeMap<VariableId, Vec<(ConstraintId, f64)>>,
    pub(crate) groups: Vec<ConstraintGroup>,
    // Lazy-allocated metadata storage
    pub(crate) variable_names: Option<BTreeMap<VariableId, String>>,
    pub(crate) constraint_names: Option<BTreeMap<ConstraintId, String>>,
    pub(crate) constraint_metadata: Option<BTreeMap<ConstraintId, serde_json::Value>>,
}

impl Model {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::new(),
            objective_name: None,
            columns: BTreeMap::new(),
            groups: Vec::new(),
            variable_names: None,
            constraint_names: None,
            constraint_metadata: None,
        }
    }

    /// Get the objective
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub(crate) fn ensure_variable_exists(&self, id: VariableId) -> Result<(), ModelError> {
        if id.index() < self.variables.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidVariableId(id))
        }
    }

    pub(crate) fn ensure_constraint_exists(&self, id: ConstraintId) -> Result<(), ModelError> {
        if id.index() < self.constraints.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidConstraintId(id))
        }
    }

    /// Merge duplicate variables and drop zero coefficients.
    pub(crate) fn normalize_terms(&self, terms: Vec<(VariableId, f64)>) -> Vec<(VariableId, f64)> {
        let started = Instant::now();
        let terms_in = terms.len();

        let mut merged: BTreeMap<VariableId, f64> = BTreeMap::new();
        for (var_id, coeff) in terms {
            if coeff == 0.0 {
                continue;
            }
            *merged.entry(var_id).or_insert(0.0) += coeff;
        }

        let normalized: Vec<(VariableId, f64)> = merged
            .into_iter()
            .filter(|(_, coeff)| *coeff != 0.0)
            .collect();

        tracing::trace!(
            component = "model",
            operation = "lower_expr",
            status = "success",
            expr_terms_in = terms_in,
            expr_terms_out = normalized.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Lowered linear expression"
        );

        normalized
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
