//! Builders for the individual constraint groups.
//!
//! Every builder runs inside [`Model::with_group`], so a builder that fails
//! halfway leaves no trace in the model.

use kitbag_core::{Bounds, ConstraintGroup, Model, ModelError, Variable};
use kitbag_expr::{Expr, VariableId};

use crate::compose::Domain;
use crate::instance::{Bag, Dimension, Item};
use crate::selection::GroupKind;

/// Count variables created for one bag by the `bags` group.
#[derive(Debug, Clone, PartialEq)]
pub struct BagAssignment {
    pub bag: Bag,
    /// One variable per item, in item order.
    pub counts: Vec<VariableId>,
}

/// Variable holding how many units of `item` are taken.
pub(crate) fn count_variable(item: &Item, domain: Domain) -> Variable {
    let bounds = Bounds::new(0.0, item.upper_bound());
    match domain {
        Domain::Relaxed => Variable::continuous(bounds),
        Domain::Integral if item.available == Some(1) => Variable::binary(),
        Domain::Integral => Variable::integer(bounds),
    }
}

fn weighted_total(items: &[Item], counts: &[VariableId], dimension: Dimension) -> Expr {
    Expr::weighted(
        counts
            .iter()
            .zip(items)
            .map(|(var, item)| (*var, item.attribute(dimension))),
    )
}

/// `sum(attribute_i * x_i) <= capacity` for one dimension.
pub(crate) fn attach_capacity(
    model: &mut Model,
    dimension: Dimension,
    items: &[Item],
    counts: &[VariableId],
    capacity: f64,
) -> Result<ConstraintGroup, ModelError> {
    let total = weighted_total(items, counts, dimension);
    let (_, group) = model.with_group(dimension.group().as_str(), |scope| {
        scope.add_named_constraint(
            format!("{}_capacity", dimension.as_str()),
            total.le_scalar(capacity),
        )
    })?;
    Ok(group)
}

/// Split every item's count over the bags and limit each bag's contents.
pub(crate) fn attach_bags(
    model: &mut Model,
    items: &[Item],
    counts: &[VariableId],
    bags: &[Bag],
    domain: Domain,
) -> Result<(Vec<BagAssignment>, ConstraintGroup), ModelError> {
    model.with_group(GroupKind::Bags.as_str(), |scope| {
        let mut assignments = Vec::with_capacity(bags.len());
        for bag in bags {
            let mut bag_counts = Vec::with_capacity(items.len());
            for item in items {
                let var = scope.add_named_variable(
                    format!("count[{}][{}]", bag.name, item.name),
                    count_variable(item, domain),
                )?;
                bag_counts.push(var);
            }

            scope.add_named_constraint(
                format!("{}.weight", bag.name),
                weighted_total(items, &bag_counts, Dimension::Weight).le_scalar(bag.weight),
            )?;
            scope.add_named_constraint(
                format!("{}.volume", bag.name),
                weighted_total(items, &bag_counts, Dimension::Volume).le_scalar(bag.volume),
            )?;
            assignments.push(BagAssignment {
                bag: bag.clone(),
                counts: bag_counts,
            });
        }

        for (index, (item, total)) in items.iter().zip(counts).enumerate() {
            let packed: Expr = assignments
                .iter()
                .map(|assignment| Expr::var(assignment.counts[index]))
                .sum();
            scope.add_named_constraint(
                format!("packed[{}]", item.name),
                (packed - Expr::var(*total)).eq_scalar(0.0),
            )?;
        }

        tracing::trace!(
            component = "compose",
            operation = "build_group",
            status = "success",
            group = "bags",
            bags = bags.len(),
            variables = scope.pending_variables(),
            constraints = scope.pending_constraints(),
            "Built bag assignment rows"
        );
        Ok(assignments)
    })
}

/// `x_i >= required_i` for every item with a positive requirement.
pub(crate) fn attach_requirements(
    model: &mut Model,
    items: &[Item],
    counts: &[VariableId],
) -> Result<ConstraintGroup, ModelError> {
    let (_, group) = model.with_group(GroupKind::Requirements.as_str(), |scope| {
        for (item, var) in items.iter().zip(counts) {
            if item.required == 0 {
                continue;
            }
            scope.add_named_constraint(
                format!("required[{}]", item.name),
                Expr::var(*var).ge_scalar(f64::from(item.required)),
            )?;
        }
        Ok::<_, ModelError>(())
    })?;
    Ok(group)
}
