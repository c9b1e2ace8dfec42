//! Static knapsack input: items, bags and capacities.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ConfigError;
use crate::selection::GroupKind;

/// Something that can be packed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub name: String,
    pub volume: f64,
    pub weight: f64,
    pub value: f64,
    /// Maximum number of units; `None` means unlimited.
    pub available: Option<u32>,
    /// Minimum number of units enforced by the `requirements` group.
    pub required: u32,
}

impl Item {
    /// A single-unit item.
    pub fn new(name: impl Into<String>, volume: f64, weight: f64, value: f64) -> Self {
        Self {
            name: name.into(),
            volume,
            weight,
            value,
            available: Some(1),
            required: 0,
        }
    }

    pub fn with_available(mut self, available: Option<u32>) -> Self {
        self.available = available;
        self
    }

    pub fn with_required(mut self, required: u32) -> Self {
        self.required = required;
        self
    }

    /// Upper bound for the item's count variables.
    pub fn upper_bound(&self) -> f64 {
        self.available.map_or(f64::INFINITY, f64::from)
    }

    /// Attribute measured by a single-dimension group or goal.
    pub fn attribute(&self, kind: Dimension) -> f64 {
        match kind {
            Dimension::Volume => self.volume,
            Dimension::Weight => self.weight,
            Dimension::Value => self.value,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidItem {
            item: self.name.clone(),
            reason,
        };
        for dimension in Dimension::ALL {
            let amount = self.attribute(dimension);
            if !amount.is_finite() || amount < 0.0 {
                return Err(invalid(format!(
                    "{} must be a non-negative number (got {amount})",
                    dimension.as_str()
                )));
            }
        }
        if let Some(available) = self.available.filter(|available| self.required > *available) {
            return Err(invalid(format!(
                "requires {} units but only {available} are available",
                self.required
            )));
        }
        Ok(())
    }
}

/// One of the three per-item quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Volume,
    Weight,
    Value,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Volume, Dimension::Weight, Dimension::Value];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Volume => "volume",
            Dimension::Weight => "weight",
            Dimension::Value => "value",
        }
    }

    /// Single-dimension group measuring this quantity.
    pub fn group(self) -> GroupKind {
        match self {
            Dimension::Volume => GroupKind::Volume,
            Dimension::Weight => GroupKind::Weight,
            Dimension::Value => GroupKind::Value,
        }
    }
}

/// A container with its own volume and weight limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bag {
    pub name: String,
    pub volume: f64,
    pub weight: f64,
}

impl Bag {
    pub fn new(name: impl Into<String>, volume: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            volume,
            weight,
        }
    }
}

/// Right-hand sides of the single-dimension groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Capacities {
    pub volume: f64,
    pub weight: f64,
    pub value: f64,
}

impl Capacities {
    /// The same limit for every dimension.
    pub fn uniform(capacity: f64) -> Self {
        Self {
            volume: capacity,
            weight: capacity,
            value: capacity,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Volume => self.volume,
            Dimension::Weight => self.weight,
            Dimension::Value => self.value,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for dimension in Dimension::ALL {
            let value = self.get(dimension);
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::InvalidCapacity {
                    group: dimension.as_str(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Everything the composer needs besides the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub items: Vec<Item>,
    pub capacities: Capacities,
    pub bags: Vec<Bag>,
}

impl Instance {
    pub fn new(items: Vec<Item>, capacities: Capacities) -> Self {
        Self {
            items,
            capacities,
            bags: Vec::new(),
        }
    }

    pub fn with_bags(mut self, bags: Vec<Bag>) -> Self {
        self.bags = bags;
        self
    }

    /// Check item data, bag data and capacities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for item in &self.items {
            item.validate()?;
            if !names.insert(item.name.as_str()) {
                return Err(ConfigError::DuplicateItem(item.name.clone()));
            }
        }
        for bag in &self.bags {
            for (group, value) in [("bag volume", bag.volume), ("bag weight", bag.weight)] {
                if value.is_nan() || value < 0.0 {
                    return Err(ConfigError::InvalidCapacity { group, value });
                }
            }
        }
        self.capacities.validate()
    }

    /// Camping trip for one carrier with two backpacks.
    ///
    /// The volume capacity is the combined volume of both bags, the weight
    /// capacity is what the carrier can lift.
    pub fn camping() -> Self {
        let items = vec![
            Item::new("Gascan 650ml", 0.7, 0.6, 240.0).with_available(Some(4)),
            Item::new("Tent 2man", 13.0, 3.5, 2000.0).with_required(1),
            Item::new("Tent 3man", 16.0, 4.5, 2500.0),
            Item::new("Tent 4man", 18.0, 5.5, 3000.0),
            Item::new("Axe", 2.0, 4.0, 1000.0),
            Item::new("Knife", 0.3, 0.25, 400.0),
            Item::new("FoodPortion", 0.3, 0.4, 80.0).with_available(None),
            Item::new("Water", 1.0, 1.0, 5.0).with_available(None),
            Item::new("Portable Kitchen", 2.0, 1.0, 800.0).with_required(1),
            Item::new("Sleeping Bag", 4.0, 0.9, 1400.0)
                .with_available(Some(4))
                .with_required(1),
        ];
        let bags = vec![
            Bag::new("Osprey 32L", 32.0, 15.0),
            Bag::new("Osprey 60L", 60.0, 25.0),
        ];
        Self::new(
            items,
            Capacities {
                volume: 92.0,
                weight: 200.0,
                value: 12000.0,
            },
        )
        .with_bags(bags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camping_instance_is_valid() {
        let instance = Instance::camping();
        assert_eq!(instance.items.len(), 10);
        assert_eq!(instance.bags.len(), 2);
        assert!(instance.validate().is_ok());
        let required: u32 = instance.items.iter().map(|item| item.required).sum();
        assert_eq!(required, 3);
    }

    #[test]
    fn unlimited_items_have_infinite_bound() {
        let item = Item::new("Water", 1.0, 1.0, 5.0).with_available(None);
        assert!(item.upper_bound().is_infinite());
        assert_eq!(Item::new("Axe", 2.0, 4.0, 1000.0).upper_bound(), 1.0);
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let capacities = Capacities {
            weight: -1.0,
            ..Capacities::uniform(5.0)
        };
        assert_eq!(
            capacities.validate(),
            Err(ConfigError::InvalidCapacity {
                group: "weight",
                value: -1.0
            })
        );
        assert!(matches!(
            Capacities::uniform(f64::NAN).validate(),
            Err(ConfigError::InvalidCapacity { group: "volume", .. })
        ));
    }

    #[test]
    fn bad_items_are_rejected() {
        let negative = Instance::new(
            vec![Item::new("Rock", 1.0, -2.0, 0.0)],
            Capacities::uniform(5.0),
        );
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidItem { ref item, .. }) if item == "Rock"
        ));

        let over_required = Instance::new(
            vec![Item::new("Tent", 1.0, 1.0, 1.0).with_required(2)],
            Capacities::uniform(5.0),
        );
        assert!(matches!(
            over_required.validate(),
            Err(ConfigError::InvalidItem { .. })
        ));

        let duplicate = Instance::new(
            vec![Item::new("Axe", 1.0, 1.0, 1.0), Item::new("Axe", 2.0, 2.0, 2.0)],
            Capacities::uniform(5.0),
        );
        assert_eq!(
            duplicate.validate(),
            Err(ConfigError::DuplicateItem("Axe".to_string()))
        );
    }
}
