//! Error types for the composer.

use kitbag_core::{ModelError, SolverError};

/// Invalid user input, detected before any model is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The selector named no groups at all.
    EmptySelector,
    /// The selector named a group that does not exist.
    UnknownGroup { name: String },
    /// A capacity is negative or not a number.
    InvalidCapacity { group: &'static str, value: f64 },
    /// An item carries a negative or non-finite attribute, or requires
    /// more units than are available.
    InvalidItem { item: String, reason: String },
    /// Two items share a name.
    DuplicateItem(String),
    /// The `bags` group was selected for an instance without bags.
    NoBags,
    /// A solver option is out of range.
    SolverOption(String),
}

impl ConfigError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::EmptySelector => "CONFIG_EMPTY_SELECTOR",
            ConfigError::UnknownGroup { .. } => "CONFIG_UNKNOWN_GROUP",
            ConfigError::InvalidCapacity { .. } => "CONFIG_INVALID_CAPACITY",
            ConfigError::InvalidItem { .. } => "CONFIG_INVALID_ITEM",
            ConfigError::DuplicateItem(_) => "CONFIG_DUPLICATE_ITEM",
            ConfigError::NoBags => "CONFIG_NO_BAGS",
            ConfigError::SolverOption(_) => "CONFIG_SOLVER_OPTION",
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptySelector => write!(
                f,
                "[{}] No constraint group selected; expected one or more of {}",
                self.code(),
                crate::selection::GroupKind::known_names()
            ),
            ConfigError::UnknownGroup { name } => write!(
                f,
                "[{}] Unknown constraint group '{}'; expected one of {}",
                self.code(),
                name,
                crate::selection::GroupKind::known_names()
            ),
            ConfigError::InvalidCapacity { group, value } => write!(
                f,
                "[{}] Capacity for '{}' must be a non-negative number (got {})",
                self.code(),
                group,
                value
            ),
            ConfigError::InvalidItem { item, reason } => {
                write!(f, "[{}] Item '{}' is invalid: {}", self.code(), item, reason)
            }
            ConfigError::DuplicateItem(name) => {
                write!(f, "[{}] Item '{}' is listed twice", self.code(), name)
            }
            ConfigError::NoBags => write!(
                f,
                "[{}] The 'bags' group needs at least one bag",
                self.code()
            ),
            ConfigError::SolverOption(message) => {
                write!(f, "[{}] {}", self.code(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Any failure while composing, solving, or reporting a knapsack model.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeError {
    Config(ConfigError),
    Model(ModelError),
    Solver(SolverError),
}

impl ComposeError {
    /// Code of the underlying error.
    pub fn code(&self) -> &'static str {
        match self {
            ComposeError::Config(err) => err.code(),
            ComposeError::Model(err) => err.code(),
            ComposeError::Solver(err) => err.code(),
        }
    }

    /// True when the error stems from user input rather than the model or solver.
    pub fn is_config(&self) -> bool {
        matches!(self, ComposeError::Config(_))
    }
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposeError::Config(err) => write!(f, "{err}"),
            ComposeError::Model(err) => write!(f, "{err}"),
            ComposeError::Solver(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComposeError::Config(err) => Some(err),
            ComposeError::Model(err) => Some(err),
            ComposeError::Solver(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ComposeError {
    fn from(err: ConfigError) -> Self {
        ComposeError::Config(err)
    }
}

impl From<ModelError> for ComposeError {
    fn from(err: ModelError) -> Self {
        ComposeError::Model(err)
    }
}

impl From<SolverError> for ComposeError {
    fn from(err: SolverError) -> Self {
        ComposeError::Solver(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitbag_core::SolverStatus;

    #[test]
    fn unknown_group_lists_known_names() {
        let err = ConfigError::UnknownGroup {
            name: "height".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("[CONFIG_UNKNOWN_GROUP]"));
        assert!(rendered.contains("height"));
        assert!(rendered.contains("volume"));
    }

    #[test]
    fn compose_error_keeps_inner_code() {
        let err = ComposeError::from(SolverError::SolveFailure {
            status: SolverStatus::Infeasible,
        });
        assert_eq!(err.code(), "SOLVER_SOLVE_FAILURE");
        assert!(!err.is_config());
        assert!(err.to_string().contains("infeasible"));
        assert!(std::error::Error::source(&err).is_some());

        let err = ComposeError::from(ConfigError::EmptySelector);
        assert!(err.is_config());
        assert_eq!(err.code(), "CONFIG_EMPTY_SELECTOR");
    }
}
