//! Core expression type: linear terms + constant.
//!
//! Terms are kept in insertion order and may repeat a variable; the model
//! merges duplicates when the expression is lowered into a row or the
//! objective.

use crate::expr::constraint::{ComparisonSense, ConstraintExpr};
use crate::ids::VariableId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expr {
    constant: f64,
    linear: Vec<(VariableId, f64)>,
}

impl Expr {
    // ── Constructors ────────────────────────────────────────

    /// Expression from linear terms and constant.
    pub fn new(linear: Vec<(VariableId, f64)>, constant: f64) -> Self {
        Self { constant, linear }
    }

    /// Single linear term: coeff * var.
    pub fn term(var_id: VariableId, coeff: f64) -> Self {
        if coeff == 0.0 {
            return Self::default();
        }
        Self {
            linear: vec![(var_id, coeff)],
            ..Default::default()
        }
    }

    /// Single variable with coefficient 1.0.
    pub fn var(var_id: VariableId) -> Self {
        Self::term(var_id, 1.0)
    }

    /// Weighted sum over `(variable, coefficient)` pairs, zero weights dropped.
    pub fn weighted<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = (VariableId, f64)>,
    {
        Self {
            linear: terms.into_iter().filter(|(_, c)| *c != 0.0).collect(),
            ..Default::default()
        }
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn linear_terms(&self) -> &[(VariableId, f64)] {
        &self.linear
    }

    /// Consume and return linear terms.
    pub fn into_linear_terms(self) -> Vec<(VariableId, f64)> {
        self.linear
    }

    /// Consume and return (linear_terms, constant).
    pub fn into_parts(self) -> (Vec<(VariableId, f64)>, f64) {
        (self.linear, self.constant)
    }

    // ── Comparisons (produce ConstraintExpr) ────────────────

    /// Compare against a scalar, moving the constant to the right-hand side.
    pub fn compare_scalar(self, rhs: f64, sense: ComparisonSense) -> ConstraintExpr {
        let (linear, constant) = self.into_parts();
        ConstraintExpr::new(Expr::new(linear, 0.0), sense, rhs - constant)
    }

    pub fn le_scalar(self, rhs: f64) -> ConstraintExpr {
        self.compare_scalar(rhs, ComparisonSense::LessEqual)
    }

    pub fn ge_scalar(self, rhs: f64) -> ConstraintExpr {
        self.compare_scalar(rhs, ComparisonSense::GreaterEqual)
    }

    pub fn eq_scalar(self, rhs: f64) -> ConstraintExpr {
        self.compare_scalar(rhs, ComparisonSense::Equal)
    }
}

// ── Operator overloads ──────────────────────────────────────

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(mut self, rhs: Expr) -> Self::Output {
        self.constant += rhs.constant;
        self.linear.extend(rhs.linear);
        self
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(mut self, rhs: Expr) -> Self::Output {
        self.constant -= rhs.constant;
        self.linear
            .extend(rhs.linear.into_iter().map(|(var, coeff)| (var, -coeff)));
        self
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Self {
        iter.fold(Expr::default(), |acc, expr| acc + expr)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use crate::VariableId;
    use crate::expr::{ComparisonSense, ConstraintExpr, Expr};

    fn x() -> VariableId {
        VariableId::new(0)
    }

    fn y() -> VariableId {
        VariableId::new(1)
    }

    #[test]
    fn zero_term_is_empty() {
        assert_eq!(Expr::term(x(), 0.0), Expr::default());
        assert_eq!(Expr::var(y()).linear_terms(), &[(y(), 1.0)]);
    }

    #[test]
    fn weighted_drops_zero_coefficients() {
        let e = Expr::weighted([(x(), 0.0), (y(), 2.5)]);
        assert_eq!(e.linear_terms(), &[(y(), 2.5)]);
    }

    #[test]
    fn le_scalar_moves_constant_to_rhs() {
        let e = Expr::new(vec![(x(), 1.0)], 3.0);
        let c = e.le_scalar(10.0);
        assert_eq!(c.sense(), ComparisonSense::LessEqual);
        assert_eq!(c.rhs(), 7.0);
        assert_eq!(c.expr().constant(), 0.0);
    }

    #[test]
    fn sub_negates_right_hand_terms() {
        let link = Expr::var(x()) + Expr::var(y()) - Expr::new(vec![(y(), 2.0)], 1.0);
        assert_eq!(link.linear_terms(), &[(x(), 1.0), (y(), 1.0), (y(), -2.0)]);
        assert_eq!(link.constant(), -1.0);

        let c = link.eq_scalar(0.0);
        assert_eq!(c.sense(), ComparisonSense::Equal);
        assert_eq!(c.rhs(), 1.0);
    }

    #[test]
    fn sum_concatenates_terms() {
        let summed: Expr = vec![Expr::term(x(), 1.0), Expr::term(y(), 2.0)]
            .into_iter()
            .sum();
        assert_eq!(summed.linear_terms(), &[(x(), 1.0), (y(), 2.0)]);
        let empty: Expr = std::iter::empty().sum();
        assert_eq!(empty, Expr::default());
    }

    #[test]
    fn constraint_expr_exposes_parts() {
        let constraint = ConstraintExpr::new(Expr::var(x()), ComparisonSense::GreaterEqual, 1.0);
        let (inner, sense, rhs) = constraint.into_parts();
        assert_eq!(sense, ComparisonSense::GreaterEqual);
        assert_eq!(rhs, 1.0);
        assert_eq!(inner.linear_terms().len(), 1);
    }
}
