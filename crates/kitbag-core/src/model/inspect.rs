//! Model inspection and snapshot methods.

use std::collections::BTreeMap;

use crate::types::{Bounds, Sense};
use kitbag_expr::ids::{ConstraintId, VariableId};

use crate::model::Model;

/// View of a variable in a model snapshot.
#[derive(Debug, Clone)]
pub struct VariableView {
    pub id: VariableId,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub is_integer: bool,
    pub group: Option<String>,
}

/// View of a constraint in a model snapshot.
#[derive(Debug, Clone)]
pub struct ConstraintView {
    pub id: ConstraintId,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub nnz: usize,
    pub group: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// View of a coefficient in a model snapshot.
#[derive(Debug, Clone)]
pub struct CoefficientView {
    pub variable_id: VariableId,
    pub constraint_id: ConstraintId,
    pub value: f64,
}

/// View of the objective in a model snapshot.
#[derive(Debug, Clone)]
pub struct ObjectiveView {
    pub sense: Sense,
    pub terms: Vec<(VariableId, f64)>,
    pub name: Option<String>,
}

/// View of an attached constraint group.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub name: String,
    pub variables: usize,
    pub constraints: usize,
}

/// Counts describing a model snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotMetadata {
    pub variables: usize,
    pub constraints: usize,
    pub coefficients: usize,
    pub groups: usize,
}

/// A complete snapshot of a model.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub variables: Vec<VariableView>,
    pub constraints: Vec<ConstraintView>,
    pub coefficients: Option<Vec<CoefficientView>>,
    pub objective: Option<ObjectiveView>,
    pub groups: Vec<GroupView>,
    pub metadata: SnapshotMetadata,
}

impl ModelSnapshot {
    /// Constraints belonging to the named group.
    pub fn constraints_in_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a ConstraintView> + 'a {
        self.constraints
            .iter()
            .filter(move |view| view.group.as_deref() == Some(group))
    }
}

/// Options for inspecting a model.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub include_coefficients: bool,
    /// Restrict constraints, variables and coefficients to these groups.
    pub group_filter: Option<Vec<String>>,
}

impl Model {
    /// Inspect the model structure and return a structured snapshot.
    pub fn inspect(&self, options: InspectOptions) -> ModelSnapshot {
        let InspectOptions {
            include_coefficients,
            group_filter,
        } = options;

        let mut constraint_group: BTreeMap<ConstraintId, &str> = BTreeMap::new();
        let mut variable_group: BTreeMap<VariableId, &str> = BTreeMap::new();
        for group in &self.groups {
            for id in group.constraints() {
                constraint_group.insert(*id, group.name());
            }
            for id in group.variables() {
                variable_group.insert(*id, group.name());
            }
        }

        let keep_group = |group: Option<&str>| match group_filter.as_ref() {
            None => true,
            Some(filter) => group.is_some_and(|name| filter.iter().any(|f| f == name)),
        };

        let mut nnz: BTreeMap<ConstraintId, usize> = BTreeMap::new();
        let mut coefficients = Vec::new();
        for (var_id, column) in &self.columns {
            for (constraint_id, value) in column {
                if !keep_group(constraint_group.get(constraint_id).copied()) {
                    continue;
                }
                *nnz.entry(*constraint_id).or_insert(0) += 1;
                if include_coefficients {
                    coefficients.push(CoefficientView {
                        variable_id: *var_id,
                        constraint_id: *constraint_id,
                        value: *value,
                    });
                }
            }
        }

        let variables: Vec<VariableView> = self
            .variables()
            .filter(|(id, _)| {
                // Item-level variables live outside any group and are always shown.
                group_filter.is_none()
                    || variable_group
                        .get(id)
                        .is_none_or(|name| keep_group(Some(*name)))
            })
            .map(|(id, var)| VariableView {
                id,
                name: self.get_variable_name(id).map(str::to_string),
                bounds: var.bounds,
                is_integer: var.is_integer,
                group: variable_group.get(&id).map(|name| name.to_string()),
            })
            .collect();

        let constraints: Vec<ConstraintView> = self
            .constraints()
            .filter(|(id, _)| keep_group(constraint_group.get(id).copied()))
            .map(|(id, con)| ConstraintView {
                id,
                name: self.get_constraint_name(id).map(str::to_string),
                bounds: con.bounds,
                nnz: nnz.get(&id).copied().unwrap_or(0),
                group: constraint_group.get(&id).map(|name| name.to_string()),
                metadata: self.get_constraint_metadata(id).cloned(),
            })
            .collect();

        let objective = self.objective.sense.map(|sense| ObjectiveView {
            sense,
            terms: self.objective.terms.clone(),
            name: self.objective_name.clone(),
        });

        let groups: Vec<GroupView> = self
            .groups
            .iter()
            .filter(|group| keep_group(Some(group.name())))
            .map(|group| GroupView {
                name: group.name().to_string(),
                variables: group.variables().len(),
                constraints: group.constraints().len(),
            })
            .collect();

        let metadata = SnapshotMetadata {
            variables: variables.len(),
            constraints: constraints.len(),
            coefficients: nnz.values().sum(),
            groups: groups.len(),
        };

        tracing::debug!(
            component = "model",
            operation = "inspect",
            status = "success",
            variables = metadata.variables,
            constraints = metadata.constraints,
            coefficients = metadata.coefficients,
            groups = metadata.groups,
            "Built model snapshot"
        );

        ModelSnapshot {
            variables,
            constraints,
            coefficients: include_coefficients.then_some(coefficients),
            objective,
            groups,
            metadata,
        }
    }
}
