//! Solver configuration.

use super::SolverError;

/// Options passed to a solver backend for one solve.
///
/// Every field is optional; `None` leaves the backend default in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Time limit in seconds.
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which branch and bound stops.
    pub mip_gap: Option<f64>,
    /// Backend log verbosity.
    pub verbosity: Option<u32>,
    pub presolve: Option<bool>,
    pub threads: Option<u32>,
    /// Primal feasibility tolerance.
    pub tolerance: Option<f64>,
    /// Echo the backend's own log to the console.
    pub log_to_console: Option<bool>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    pub fn with_verbosity(mut self, level: u32) -> Self {
        self.verbosity = Some(level);
        self
    }

    pub fn with_presolve(mut self, enabled: bool) -> Self {
        self.presolve = Some(enabled);
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.threads = Some(count);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }

    pub fn with_log_to_console(mut self, enabled: bool) -> Self {
        self.log_to_console = Some(enabled);
        self
    }

    /// True when no option overrides a backend default.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject values no backend could honour.
    pub fn validate(&self) -> Result<(), SolverError> {
        if let Some(limit) = self.time_limit.filter(|limit| !(limit.is_finite() && *limit > 0.0)) {
            return Err(SolverError::InvalidOption(format!(
                "time limit must be a positive number of seconds (got {limit})"
            )));
        }
        if let Some(gap) = self.mip_gap.filter(|gap| !(0.0..=1.0).contains(gap)) {
            return Err(SolverError::InvalidOption(format!(
                "MIP gap must lie in [0, 1] (got {gap})"
            )));
        }
        if let Some(tol) = self.tolerance.filter(|tol| !(tol.is_finite() && *tol > 0.0)) {
            return Err(SolverError::InvalidOption(format!(
                "tolerance must be positive (got {tol})"
            )));
        }
        if self.threads == Some(0) {
            return Err(SolverError::InvalidOption(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_empty() {
        let config = SolverConfig::new();
        assert!(config.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_every_field() {
        let config = SolverConfig::new()
            .with_time_limit(60.0)
            .with_mip_gap(0.01)
            .with_verbosity(1)
            .with_presolve(true)
            .with_threads(4)
            .with_tolerance(1e-6)
            .with_log_to_console(false);

        assert!(!config.is_empty());
        assert_eq!(config.time_limit, Some(60.0));
        assert_eq!(config.mip_gap, Some(0.01));
        assert_eq!(config.verbosity, Some(1));
        assert_eq!(config.presolve, Some(true));
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.tolerance, Some(1e-6));
        assert_eq!(config.log_to_console, Some(false));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        for config in [
            SolverConfig::new().with_time_limit(0.0),
            SolverConfig::new().with_time_limit(f64::NAN),
            SolverConfig::new().with_mip_gap(1.5),
            SolverConfig::new().with_tolerance(-1.0),
            SolverConfig::new().with_threads(0),
        ] {
            let err = config.validate().unwrap_err();
            assert_eq!(err.code(), "SOLVER_INVALID_OPTION");
        }
    }
}
