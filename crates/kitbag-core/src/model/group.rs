//! Scoped, all-or-nothing constraint groups.
//!
//! A group is opened with [`Model::begin_group`], populated through the
//! returned [`GroupScope`], and attached with [`GroupScope::commit`]. A scope
//! that is dropped without committing (an early `?` return, a panic, or
//! simply falling out of scope) rolls the model back to the state it had
//! when the scope was opened.
//!
//! A scope can only append variables and constraints; it hands out shared
//! access to the model and nothing else, so rows, names and the objective
//! that existed before the scope opened cannot change inside it. The
//! mutable borrow it holds also rules out a second open scope.
//!
//! ```compile_fail
//! use kitbag_core::{Model, Variable};
//!
//! let mut model = Model::new();
//! let x = model.add_variable(Variable::binary()).unwrap();
//! let mut scope = model.begin_group("volume").unwrap();
//! scope.set_variable_name(x, "renamed".to_string()).unwrap();
//! ```

use std::ops::Deref;

use kitbag_expr::expr::ConstraintExpr;
use kitbag_expr::ids::{ConstraintId, VariableId};

use crate::model::Model;
use crate::model::error::ModelError;
use crate::types::Variable;

/// A named set of constraints (and the auxiliary variables they introduced)
/// attached to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintGroup {
    name: String,
    variables: Vec<VariableId>,
    constraints: Vec<ConstraintId>,
}

impl ConstraintGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variables created while the group was open.
    pub fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    /// Constraints created while the group was open.
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }

    pub fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains(&id)
    }
}

/// Model state captured when a group scope opens.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    variables: usize,
    constraints: usize,
}

/// Guard for a constraint group under construction.
///
/// Dereferences to the [`Model`] for reads only.
#[derive(Debug)]
pub struct GroupScope<'m> {
    model: &'m mut Model,
    name: String,
    checkpoint: Checkpoint,
    committed: bool,
}

impl GroupScope<'_> {
    /// Name of the group being built.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of constraints added since the scope opened.
    pub fn pending_constraints(&self) -> usize {
        self.model.constraints.len() - self.checkpoint.constraints
    }

    /// Number of variables added since the scope opened.
    pub fn pending_variables(&self) -> usize {
        self.model.variables.len() - self.checkpoint.variables
    }

    /// Add a variable owned by the group.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId, ModelError> {
        self.model.add_variable(variable)
    }

    pub fn add_named_variable(
        &mut self,
        name: impl Into<String>,
        variable: Variable,
    ) -> Result<VariableId, ModelError> {
        self.model.add_named_variable(name, variable)
    }

    /// Add a row to the group. The row may reference any variable in the
    /// model; its coefficients live only in the new row.
    pub fn add_constraint_expr(
        &mut self,
        constraint: ConstraintExpr,
    ) -> Result<ConstraintId, ModelError> {
        self.model.add_constraint_expr(constraint)
    }

    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        constraint: ConstraintExpr,
    ) -> Result<ConstraintId, ModelError> {
        self.model.add_named_constraint(name, constraint)
    }

    /// Attach everything added through this scope as one group.
    pub fn commit(mut self) -> ConstraintGroup {
        let variables: Vec<VariableId> = (self.checkpoint.variables..self.model.variables.len())
            .map(|index| VariableId::new(index as u32))
            .collect();
        let constraints: Vec<ConstraintId> = (self.checkpoint.constraints
            ..self.model.constraints.len())
            .map(|index| ConstraintId::new(index as u32))
            .collect();

        let metadata = self
            .model
            .constraint_metadata
            .get_or_insert_with(Default::default);
        for id in &constraints {
            metadata.insert(*id, serde_json::json!({ "group": self.name }));
        }

        let group = ConstraintGroup {
            name: self.name.clone(),
            variables,
            constraints,
        };
        self.model.groups.push(group.clone());
        self.committed = true;

        tracing::debug!(
            component = "model",
            operation = "commit_group",
            status = "success",
            group = %group.name,
            variables = group.variables.len(),
            constraints = group.constraints.len(),
            "Attached constraint group"
        );
        group
    }
}

impl Deref for GroupScope<'_> {
    type Target = Model;

    fn deref(&self) -> &Model {
        &*self.model
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        let discarded_variables = self.pending_variables();
        let discarded_constraints = self.pending_constraints();
        self.model.rollback(self.checkpoint);

        tracing::warn!(
            component = "model",
            operation = "discard_group",
            status = "rollback",
            group = %self.name,
            discarded_variables,
            discarded_constraints,
            "Discarded constraint group"
        );
    }
}

impl Model {
    /// Open a scope for building the constraint group `name`.
    ///
    /// Group names are unique within a model.
    pub fn begin_group(&mut self, name: impl Into<String>) -> Result<GroupScope<'_>, ModelError> {
        let name = name.into();
        if self.group(&name).is_some() {
            return Err(ModelError::DuplicateGroup(name));
        }

        let checkpoint = Checkpoint {
            variables: self.variables.len(),
            constraints: self.constraints.len(),
        };

        tracing::trace!(
            component = "model",
            operation = "begin_group",
            status = "success",
            group = %name,
            "Opened constraint group scope"
        );

        Ok(GroupScope {
            model: self,
            name,
            checkpoint,
            committed: false,
        })
    }

    /// Build a constraint group with `build`, committing it on `Ok` and
    /// rolling the model back on `Err`.
    pub fn with_group<T, E, F>(
        &mut self,
        name: impl Into<String>,
        build: F,
    ) -> Result<(T, ConstraintGroup), E>
    where
        E: From<ModelError>,
        F: FnOnce(&mut GroupScope<'_>) -> Result<T, E>,
    {
        let mut scope = self.begin_group(name)?;
        let output = build(&mut scope)?;
        Ok((output, scope.commit()))
    }

    /// Constraint groups attached so far, in attachment order.
    pub fn groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    /// Look up an attached group by name.
    pub fn group(&self, name: &str) -> Option<&ConstraintGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Names of the attached groups, in attachment order.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name.as_str()).collect()
    }

    /// Group owning the given constraint, if any.
    pub fn group_of_constraint(&self, id: ConstraintId) -> Option<&ConstraintGroup> {
        self.groups.iter().find(|group| group.contains_constraint(id))
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        let first_variable = VariableId::new(checkpoint.variables as u32);
        let first_constraint = ConstraintId::new(checkpoint.constraints as u32);

        self.variables.truncate(checkpoint.variables);
        self.constraints.truncate(checkpoint.constraints);

        self.columns.retain(|id, _| *id < first_variable);
        for column in self.columns.values_mut() {
            column.retain(|(constraint_id, _)| *constraint_id < first_constraint);
        }
        self.columns.retain(|_, column| !column.is_empty());

        if let Some(names) = self.variable_names.as_mut() {
            names.retain(|id, _| *id < first_variable);
        }
        if let Some(names) = self.constraint_names.as_mut() {
            names.retain(|id, _| *id < first_constraint);
        }
        if let Some(metadata) = self.constraint_metadata.as_mut() {
            metadata.retain(|id, _| *id < first_constraint);
        }
    }
}
