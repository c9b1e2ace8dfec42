//! HiGHS backend for kitbag models.
//!
//! [`HighsSolver`] implements [`kitbag_core::Solver`] by copying the model's
//! column-first storage into a HiGHS row problem for each solve.

pub mod model;
pub mod solver;
mod status;

pub use model::{
    HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense, SolutionSnapshot,
};
pub use solver::HighsSolver;
