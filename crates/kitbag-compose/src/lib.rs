//! Knapsack model composer.
//!
//! Items become count variables; named constraint groups (`volume`,
//! `weight`, `value`, `bags`, `requirements`) are attached on demand, each
//! through a scoped group so it is either fully present or absent. The
//! composed model is handed to any [`kitbag_core::Solver`] and the answer is
//! summarized in a [`Report`].
//!
//! ```no_run
//! use kitbag_compose::{ComposeOptions, Instance, run};
//! # fn demo(solver: &mut impl kitbag_core::Solver) -> Result<(), kitbag_compose::ComposeError> {
//! let report = run(
//!     "volume+weight",
//!     &Instance::camping(),
//!     &ComposeOptions::default(),
//!     solver,
//!     &kitbag_core::SolverConfig::default(),
//! )?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod error;
pub mod groups;
pub mod instance;
pub mod report;
pub mod selection;

#[cfg(test)]
mod testing;

pub use compose::{
    CapacityOverrides, ComposeOptions, ComposedModel, Domain, Goal, SolvedKnapsack, compose, run,
};
pub use error::{ComposeError, ConfigError};
pub use groups::BagAssignment;
pub use instance::{Bag, Capacities, Dimension, Instance, Item};
pub use report::{BagReport, Report, ReportLine, Totals};
pub use selection::{GroupKind, Selection};
