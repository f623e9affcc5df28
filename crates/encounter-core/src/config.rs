//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working configuration. Scalar fields can be overridden from
//! `ENCOUNTER_*` environment variables.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encounter::{Composition, Tier, UnitGroup};
use crate::geometry::Position;
use crate::ids::DimensionId;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for this schema.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// The environment variable.
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Ring geometry and backup location for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRing {
    /// Minimum horizontal distance from the anchor.
    pub inner_radius: f64,
    /// Maximum horizontal distance from the anchor.
    pub outer_radius: f64,
    /// Pre-vetted point used when sampling keeps failing.
    pub fallback: Position,
}

/// Per-tier ring table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    /// Rare ring.
    pub rare: TierRing,
    /// Legendary ring.
    pub legendary: TierRing,
    /// Mythic ring.
    pub mythic: TierRing,
}

impl TierTable {
    /// Ring for `tier`.
    #[must_use]
    pub fn get(&self, tier: Tier) -> &TierRing {
        match tier {
            Tier::Rare => &self.rare,
            Tier::Legendary => &self.legendary,
            Tier::Mythic => &self.mythic,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            rare: TierRing {
                inner_radius: 60.0,
                outer_radius: 120.0,
                fallback: Position::new(162.0, 64.0, -278.0),
            },
            legendary: TierRing {
                inner_radius: 120.0,
                outer_radius: 200.0,
                fallback: Position::new(72.0, 64.0, -118.0),
            },
            mythic: TierRing {
                inner_radius: 200.0,
                outer_radius: 300.0,
                fallback: Position::new(-178.0, 64.0, -278.0),
            },
        }
    }
}

/// A named contract from the content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    /// Tier of the contract.
    pub tier: Tier,
    /// The group to spawn.
    pub composition: Composition,
}

fn default_contracts() -> BTreeMap<String, ContractTemplate> {
    let mut contracts = BTreeMap::new();
    contracts.insert(
        "rotting_horde".to_owned(),
        ContractTemplate {
            tier: Tier::Rare,
            composition: Composition(vec![
                UnitGroup::new("zombie", 6),
                UnitGroup::new("husk", 2).named("Desert Revenant"),
            ]),
        },
    );
    contracts.insert(
        "spider_nest".to_owned(),
        ContractTemplate {
            tier: Tier::Rare,
            composition: Composition(vec![
                UnitGroup::new("spider", 5),
                UnitGroup::new("cave_spider", 3),
            ]),
        },
    );
    contracts.insert(
        "bone_legion".to_owned(),
        ContractTemplate {
            tier: Tier::Legendary,
            composition: Composition(vec![
                UnitGroup::new("skeleton", 8),
                UnitGroup::new("stray", 3).named("Frost Archer"),
            ]),
        },
    );
    contracts.insert(
        "illager_warband".to_owned(),
        ContractTemplate {
            tier: Tier::Mythic,
            composition: Composition(vec![
                UnitGroup::new("vindicator", 6),
                UnitGroup::new("pillager", 6),
                UnitGroup::new("evoker", 2).named("Grand Conjurer"),
                UnitGroup::new("vex", 4).auxiliary(),
            ]),
        },
    );
    contracts
}

fn default_burn_immune_types() -> Vec<String> {
    ["zombie", "skeleton", "stray", "husk", "drowned", "phantom"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Tunables for the encounter runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Period of the proximity scan.
    pub scan_interval_ms: u64,
    /// Planar distance to the zone centre that triggers spawning.
    pub trigger_radius: f64,
    /// Pause between the nearing alert and the spawn.
    pub nearing_delay_ms: u64,
    /// Ring samples tried before falling back.
    pub zone_attempts: u32,
    /// Distance band, from the player, for the spawn point.
    pub near_band: [f64; 2],
    /// Maximum planar jitter applied to each spawned unit.
    pub spawn_jitter: f64,
    /// Air blocks required above a surface for a body to fit.
    pub body_clearance: i32,
    /// Horizontal distance within which the beacon is shown.
    pub beacon_radius: f64,
    /// Full period of the beacon pulse.
    pub beacon_period_ms: u64,
    /// Delay after startup before the orphan sweep runs.
    pub reaper_delay_ms: u64,
    /// Unit types that burn in daylight and get standing fire immunity.
    pub burn_immune_types: Vec<String>,
    /// Dimension used when a request does not name one.
    pub default_dimension: DimensionId,
    /// Anchor the zone rings are centred on (the quest board).
    pub anchor: Position,
    /// Ring table.
    pub tiers: TierTable,
    /// Content table of named contracts.
    pub contracts: BTreeMap<String, ContractTemplate>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 250,
            trigger_radius: 50.0,
            nearing_delay_ms: 500,
            zone_attempts: 20,
            near_band: [18.0, 22.0],
            spawn_jitter: 3.0,
            body_clearance: 3,
            beacon_radius: 150.0,
            beacon_period_ms: 2000,
            reaper_delay_ms: 5000,
            burn_immune_types: default_burn_immune_types(),
            default_dimension: DimensionId::new("overworld"),
            anchor: Position::new(72.0, 75.0, -278.0),
            tiers: TierTable::default(),
            contracts: default_contracts(),
        }
    }
}

fn millis(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl EncounterConfig {
    /// Loads the configuration from an optional YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or if the
    /// result fails [`EncounterConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed documents.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overrides scalar fields from `ENCOUNTER_*` variables resolved through
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable does not parse, or
    /// `ConfigError::Invalid` if the result fails validation.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("ENCOUNTER_SCAN_INTERVAL_MS") {
            self.scan_interval_ms = parse_env("ENCOUNTER_SCAN_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_TRIGGER_RADIUS") {
            self.trigger_radius = parse_env("ENCOUNTER_TRIGGER_RADIUS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_NEARING_DELAY_MS") {
            self.nearing_delay_ms = parse_env("ENCOUNTER_NEARING_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_ZONE_ATTEMPTS") {
            self.zone_attempts = parse_env("ENCOUNTER_ZONE_ATTEMPTS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_BEACON_RADIUS") {
            self.beacon_radius = parse_env("ENCOUNTER_BEACON_RADIUS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_BEACON_PERIOD_MS") {
            self.beacon_period_ms = parse_env("ENCOUNTER_BEACON_PERIOD_MS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_REAPER_DELAY_MS") {
            self.reaper_delay_ms = parse_env("ENCOUNTER_REAPER_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("ENCOUNTER_DIMENSION") {
            if v.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "ENCOUNTER_DIMENSION",
                    value: v,
                });
            }
            self.default_dimension = DimensionId::new(v.trim());
        }
        self.validate()
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_ms must be positive".into(),
            ));
        }
        if self.zone_attempts == 0 {
            return Err(ConfigError::Invalid(
                "zone_attempts must be positive".into(),
            ));
        }
        if !(self.trigger_radius > 0.0) {
            return Err(ConfigError::Invalid(
                "trigger_radius must be positive".into(),
            ));
        }
        let [near_min, near_max] = self.near_band;
        if !(near_min >= 0.0 && near_min <= near_max) {
            return Err(ConfigError::Invalid(
                "near_band must be an ascending pair".into(),
            ));
        }
        for tier in Tier::ALL {
            let ring = self.tiers.get(tier);
            if !(ring.inner_radius >= 0.0 && ring.inner_radius <= ring.outer_radius) {
                return Err(ConfigError::Invalid(format!(
                    "{tier} ring must satisfy 0 <= inner_radius <= outer_radius"
                )));
            }
        }
        for (name, contract) in &self.contracts {
            contract
                .composition
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("contract {name}: {e}")))?;
        }
        Ok(())
    }

    /// Period of the proximity scan.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    /// Delay before the startup sweep.
    #[must_use]
    pub fn reaper_delay(&self) -> Duration {
        Duration::from_millis(self.reaper_delay_ms)
    }

    /// Pause between the nearing alert and the spawn.
    #[must_use]
    pub fn nearing_delay(&self) -> TimeDelta {
        millis(self.nearing_delay_ms)
    }

    /// Full beacon pulse period.
    #[must_use]
    pub fn beacon_period(&self) -> TimeDelta {
        millis(self.beacon_period_ms)
    }

    /// Whether `unit_type` receives standing fire immunity.
    #[must_use]
    pub fn is_burn_immune(&self, unit_type: &str) -> bool {
        self.burn_immune_types.iter().any(|t| t == unit_type)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EncounterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiers.get(Tier::Rare).inner_radius, 60.0);
        assert_eq!(config.tiers.get(Tier::Rare).outer_radius, 120.0);
    }

    #[test]
    fn test_default_contracts_have_consistent_totals() {
        let config = EncounterConfig::default();
        let legion = &config.contracts["bone_legion"];
        assert_eq!(legion.tier, Tier::Legendary);
        assert_eq!(legion.composition.counted_total(), 11);

        let warband = &config.contracts["illager_warband"];
        assert_eq!(warband.composition.counted_total(), 14);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "trigger_radius: 32.5\nzone_attempts: 5\n";
        let config = EncounterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.trigger_radius, 32.5);
        assert_eq!(config.zone_attempts, 5);
        assert_eq!(config.scan_interval_ms, 250);
        assert!(config.contracts.contains_key("bone_legion"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            EncounterConfig::from_yaml("  \n").unwrap(),
            EncounterConfig::default()
        );
    }

    #[test]
    fn test_apply_env_overrides_scalars() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ENCOUNTER_TRIGGER_RADIUS", "40"),
            ("ENCOUNTER_NEARING_DELAY_MS", "750"),
            ("ENCOUNTER_DIMENSION", "nether"),
        ]);
        let mut config = EncounterConfig::default();

        config
            .apply_env(|key| vars.get(key).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.trigger_radius, 40.0);
        assert_eq!(config.nearing_delay(), TimeDelta::milliseconds(750));
        assert_eq!(config.default_dimension, DimensionId::new("nether"));
    }

    #[test]
    fn test_apply_env_rejects_garbage() {
        let mut config = EncounterConfig::default();

        let result = config.apply_env(|key| {
            (key == "ENCOUNTER_ZONE_ATTEMPTS").then(|| "many".to_owned())
        });

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "ENCOUNTER_ZONE_ATTEMPTS");
                assert_eq!(value, "many");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_inverted_ring() {
        let mut config = EncounterConfig::default();
        config.tiers.mythic.inner_radius = 400.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_contract() {
        let mut config = EncounterConfig::default();
        config.contracts.insert(
            "hollow".to_owned(),
            ContractTemplate {
                tier: Tier::Rare,
                composition: Composition::default(),
            },
        );
        assert!(config.validate().is_err());
    }
}
