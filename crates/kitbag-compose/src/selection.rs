//! Runtime selection of constraint groups.
//!
//! A selector names one or more groups joined by `+` or `,`, for example
//! `volume`, `volume+weight` or `bags, requirements`. Names are trimmed and
//! matched case-insensitively; repeating a name has no effect.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A constraint group the composer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKind {
    /// Total volume of the chosen items.
    Volume,
    /// Total weight of the chosen items.
    Weight,
    /// Total value of the chosen items.
    Value,
    /// Per-bag volume and weight limits with item-to-bag assignment.
    Bags,
    /// Minimum counts for required items.
    Requirements,
}

impl GroupKind {
    pub const ALL: [GroupKind; 5] = [
        GroupKind::Volume,
        GroupKind::Weight,
        GroupKind::Value,
        GroupKind::Bags,
        GroupKind::Requirements,
    ];

    /// Name used in selectors and as the group name inside the model.
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Volume => "volume",
            GroupKind::Weight => "weight",
            GroupKind::Value => "value",
            GroupKind::Bags => "bags",
            GroupKind::Requirements => "requirements",
        }
    }

    pub(crate) fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownGroup {
                name: trimmed.to_string(),
            })
    }
}

/// A non-empty set of groups to attach, iterated in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    groups: BTreeSet<GroupKind>,
}

impl Selection {
    /// Parse a selector such as `"volume+weight"`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptySelector`] when no name is given and
    /// [`ConfigError::UnknownGroup`] for the first unrecognised name.
    pub fn parse(selector: &str) -> Result<Self, ConfigError> {
        let mut groups = BTreeSet::new();
        for part in selector.split(['+', ',']) {
            if part.trim().is_empty() {
                continue;
            }
            groups.insert(part.parse::<GroupKind>()?);
        }
        if groups.is_empty() {
            return Err(ConfigError::EmptySelector);
        }

        tracing::debug!(
            component = "compose",
            operation = "parse_selector",
            status = "success",
            selector,
            groups = groups.len(),
            "Parsed group selector"
        );
        Ok(Self { groups })
    }

    /// Build a selection from explicit kinds.
    pub fn from_kinds(kinds: impl IntoIterator<Item = GroupKind>) -> Result<Self, ConfigError> {
        let groups: BTreeSet<GroupKind> = kinds.into_iter().collect();
        if groups.is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        Ok(Self { groups })
    }

    pub fn contains(&self, kind: GroupKind) -> bool {
        self.groups.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = GroupKind> + '_ {
        self.groups.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false for a parsed selection.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl FromStr for Selection {
    type Err = ConfigError;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        Self::parse(selector)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(GroupKind::as_str).collect();
        f.write_str(&names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_group() {
        let selection = Selection::parse("volume").unwrap();
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(GroupKind::Volume));
        assert!(!selection.contains(GroupKind::Weight));
    }

    #[test]
    fn combined_groups_are_a_set_union() {
        let plus = Selection::parse("weight+volume").unwrap();
        let comma = Selection::parse(" Volume , WEIGHT ,volume").unwrap();
        assert_eq!(plus, comma);
        assert_eq!(plus.len(), 2);
        assert_eq!(plus.to_string(), "volume+weight");
    }

    #[test]
    fn iteration_order_is_fixed() {
        let selection = Selection::parse("requirements+bags+value+weight+volume").unwrap();
        assert_eq!(selection.iter().collect::<Vec<_>>(), GroupKind::ALL.to_vec());
    }

    #[test]
    fn empty_selector_is_rejected() {
        for selector in ["", "   ", "+", " , + "] {
            assert_eq!(Selection::parse(selector), Err(ConfigError::EmptySelector));
        }
        assert_eq!(
            Selection::from_kinds(Vec::new()),
            Err(ConfigError::EmptySelector)
        );
    }

    #[test]
    fn unknown_group_is_rejected() {
        assert_eq!(
            Selection::parse("volume+height"),
            Err(ConfigError::UnknownGroup {
                name: "height".to_string()
            })
        );
    }

    #[test]
    fn kind_round_trips_through_name() {
        for kind in GroupKind::ALL {
            assert_eq!(kind.as_str().parse::<GroupKind>(), Ok(kind));
        }
    }
}
