//! Solver-agnostic model for kitbag with scoped constraint groups.

pub mod model;
pub mod solver;
pub mod types;

pub use model::{
    CoefficientView, ConstraintGroup, ConstraintView, GroupScope, GroupView, InspectOptions,
    Model, ModelError, ModelSnapshot, ObjectiveView, SnapshotMetadata, VariableView,
};

pub use solver::{Solution, Solver, SolverConfig, SolverError, SolverStatus};
pub use types::{Bounds, Constraint, Objective, Sense, Variable};
