//! Encounter tiers and creature group compositions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Rarity class of an encounter. Controls ring distance and group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Closest ring, smallest groups.
    Rare,
    /// Middle ring.
    Legendary,
    /// Farthest ring, largest groups.
    Mythic,
}

impl Tier {
    /// All tiers, in ascending rarity.
    pub const ALL: [Tier; 3] = [Tier::Rare, Tier::Legendary, Tier::Mythic];

    /// Lowercase name used in tags, config keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Rare => "rare",
            Tier::Legendary => "legendary",
            Tier::Mythic => "mythic",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rare" => Ok(Tier::Rare),
            "legendary" => Ok(Tier::Legendary),
            "mythic" => Ok(Tier::Mythic),
            other => Err(DomainError::Validation(format!("unknown tier: {other}"))),
        }
    }
}

fn counted_by_default() -> bool {
    true
}

/// One group of identical units within a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroup {
    /// Host unit type identifier (e.g. `skeleton`).
    pub unit_type: String,
    /// Number of units in the group.
    pub count: u32,
    /// Display name applied to each unit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_override: Option<String>,
    /// Whether kills of this group count toward progress. Auxiliary units
    /// that despawn on their own are not counted.
    #[serde(default = "counted_by_default")]
    pub counted: bool,
}

impl UnitGroup {
    /// A counted group without a name override.
    #[must_use]
    pub fn new(unit_type: impl Into<String>, count: u32) -> Self {
        Self {
            unit_type: unit_type.into(),
            count,
            name_override: None,
            counted: true,
        }
    }

    /// Sets the display name applied to each unit.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Marks the group as auxiliary (excluded from the unit count).
    #[must_use]
    pub fn auxiliary(mut self) -> Self {
        self.counted = false;
        self
    }
}

/// Ordered list of unit groups making up an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Composition(pub Vec<UnitGroup>);

impl Composition {
    /// Sum of the counts of every counted group.
    #[must_use]
    pub fn counted_total(&self) -> u32 {
        self.0.iter().filter(|g| g.counted).map(|g| g.count).sum()
    }

    /// Iterates the groups in order.
    pub fn groups(&self) -> impl Iterator<Item = &UnitGroup> {
        self.0.iter()
    }

    /// Whether a unit of this type counts toward progress. Unknown types
    /// count, since they can only have been created for this encounter.
    #[must_use]
    pub fn is_counted(&self, unit_type: &str) -> bool {
        self.0
            .iter()
            .find(|g| g.unit_type == unit_type)
            .is_none_or(|g| g.counted)
    }

    /// Builds the composition for restoring `remaining` counted units:
    /// counted groups are filled in order and auxiliary groups are dropped.
    #[must_use]
    pub fn remainder(&self, remaining: u32) -> Composition {
        let mut left = remaining;
        let mut groups = Vec::new();
        for group in self.0.iter().filter(|g| g.counted) {
            if left == 0 {
                break;
            }
            let take = group.count.min(left);
            left -= take;
            groups.push(UnitGroup {
                count: take,
                ..group.clone()
            });
        }
        Composition(groups)
    }

    /// Validates that the composition can be spawned.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if it is empty, a group has a blank
    /// unit type, no unit is counted, or one unit type is both counted and
    /// auxiliary. Deaths are attributed by unit type, so a mixed type could
    /// not be told apart.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::Validation(
                "composition must not be empty".into(),
            ));
        }
        if self.0.iter().any(|g| g.unit_type.trim().is_empty()) {
            return Err(DomainError::Validation(
                "unit type must not be empty".into(),
            ));
        }
        if self.counted_total() == 0 {
            return Err(DomainError::Validation(
                "composition must contain at least one counted unit".into(),
            ));
        }
        let mixed = self.0.iter().find(|g| {
            self.0
                .iter()
                .any(|other| other.unit_type == g.unit_type && other.counted != g.counted)
        });
        if let Some(mixed) = mixed {
            return Err(DomainError::Validation(format!(
                "unit type {} is both counted and auxiliary",
                mixed.unit_type
            )));
        }
        Ok(())
    }
}
