//! Zone selection.
//!
//! Candidates are drawn from a ring around an anchor with an area-uniform
//! radius, then validated against the terrain of their column. Selection
//! never fails: after the attempt budget is spent a pre-vetted point is used.

use std::f64::consts::TAU;

use encounter_core::config::{EncounterConfig, TierTable};
use encounter_core::encounter::Tier;
use encounter_core::geometry::{BlockPos, Position};
use encounter_core::ids::DimensionId;
use encounter_core::rng::DeterministicRng;
use encounter_core::world::{BlockKind, WorldSurface};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The area an encounter is assigned to at accept time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Centre of the zone; the proximity trigger measures against it.
    pub center: Position,
    /// Inner radius of the ring the centre was drawn from.
    pub inner_radius: f64,
    /// Outer radius of the ring the centre was drawn from.
    pub outer_radius: f64,
}

/// Result of a zone selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSelection {
    /// The selected point, standing height included.
    pub point: Position,
    /// Whether the point is the tier's pre-vetted backup location.
    pub used_fallback: bool,
}

/// Draws a planar offset whose length lies in `[inner, outer]`, uniformly
/// distributed over the ring's area.
pub fn sample_ring_offset(rng: &mut dyn DeterministicRng, inner: f64, outer: f64) -> (f64, f64) {
    let angle = rng.next_f64() * TAU;
    let u = rng.next_f64();
    let inner_sq = inner * inner;
    let radius = (u * (outer * outer - inner_sq) + inner_sq).sqrt();
    (radius * angle.cos(), radius * angle.sin())
}

/// Samples and validates encounter locations.
#[derive(Debug, Clone)]
pub struct ZoneSelector {
    attempts: u32,
    clearance: i32,
    near_band: [f64; 2],
    tiers: TierTable,
}

impl ZoneSelector {
    /// Builds a selector from the runtime configuration.
    #[must_use]
    pub fn from_config(config: &EncounterConfig) -> Self {
        Self {
            attempts: config.zone_attempts.max(1),
            clearance: config.body_clearance.max(1),
            near_band: config.near_band,
            tiers: config.tiers.clone(),
        }
    }

    /// Picks a zone centre in the tier's ring around `anchor`.
    pub fn select_zone(
        &self,
        world: &dyn WorldSurface,
        rng: &mut dyn DeterministicRng,
        dimension: &DimensionId,
        anchor: Position,
        tier: Tier,
    ) -> ZoneSelection {
        let ring = self.tiers.get(tier);
        if let Some(point) = self.sample_valid(
            world,
            rng,
            dimension,
            anchor,
            ring.inner_radius,
            ring.outer_radius,
        ) {
            return ZoneSelection {
                point,
                used_fallback: false,
            };
        }

        warn!(%tier, attempts = self.attempts, "no valid zone found, using backup location");
        ZoneSelection {
            point: ring.fallback,
            used_fallback: true,
        }
    }

    /// The zone record for a selection made for `tier`.
    #[must_use]
    pub fn zone_for(&self, selection: &ZoneSelection, tier: Tier) -> Zone {
        let ring = self.tiers.get(tier);
        Zone {
            center: selection.point,
            inner_radius: ring.inner_radius,
            outer_radius: ring.outer_radius,
        }
    }

    /// Picks a spawn point in the near band around a player, or `None` if no
    /// candidate passes the terrain check.
    pub fn find_near_point(
        &self,
        world: &dyn WorldSurface,
        rng: &mut dyn DeterministicRng,
        dimension: &DimensionId,
        player_position: Position,
    ) -> Option<Position> {
        let [inner, outer] = self.near_band;
        self.sample_valid(world, rng, dimension, player_position, inner, outer)
    }

    fn sample_valid(
        &self,
        world: &dyn WorldSurface,
        rng: &mut dyn DeterministicRng,
        dimension: &DimensionId,
        origin: Position,
        inner: f64,
        outer: f64,
    ) -> Option<Position> {
        for attempt in 1..=self.attempts {
            let (dx, dz) = sample_ring_offset(rng, inner, outer);
            let candidate = origin.offset(dx, dz);
            if let Some(point) = self.validate_column(world, dimension, candidate) {
                debug!(attempt, x = point.x, z = point.z, "zone candidate accepted");
                return Some(point);
            }
        }
        None
    }

    /// Checks the column under `candidate`: the surface must be solid ground
    /// (no liquid, canopy or hazard) with enough air above it for a body.
    /// Returns the candidate lifted to standing height.
    #[must_use]
    pub fn validate_column(
        &self,
        world: &dyn WorldSurface,
        dimension: &DimensionId,
        candidate: Position,
    ) -> Option<Position> {
        let block = candidate.block();
        let surface_y = world.surface_height(dimension, block.x, block.z)?;
        let ground = BlockPos::new(block.x, surface_y, block.z);

        if world.block_at(dimension, ground)? != BlockKind::Solid {
            return None;
        }
        let clear = (1..=self.clearance)
            .all(|dy| world.block_at(dimension, ground.above(dy)) == Some(BlockKind::Air));
        if !clear {
            return None;
        }

        Some(Position::new(
            candidate.x,
            f64::from(surface_y) + 1.0,
            candidate.z,
        ))
    }
}

#[cfg(test)]
mod tests {
    use encounter_core::rng::SeededRng;
    use encounter_test_support::SequenceRng;

    use super::*;
    use crate::infrastructure::grid_world::GridWorld;

    fn overworld() -> DimensionId {
        DimensionId::new("overworld")
    }

    fn anchor() -> Position {
        Position::new(72.0, 75.0, -278.0)
    }

    fn selector() -> ZoneSelector {
        ZoneSelector::from_config(&EncounterConfig::default())
    }

    #[test]
    fn test_ring_offset_bounds_for_extreme_draws() {
        // u = 0 lands on the inner edge, u -> 1 approaches the outer edge.
        let mut rng = SequenceRng::with_floats(vec![0.25, 0.0, 0.75, 0.999_999]);

        let (dx, dz) = sample_ring_offset(&mut rng, 60.0, 120.0);
        assert!((dx.hypot(dz) - 60.0).abs() < 1e-9);

        let (dx, dz) = sample_ring_offset(&mut rng, 60.0, 120.0);
        let radius = dx.hypot(dz);
        assert!(radius <= 120.0 && radius > 119.9);
    }

    #[test]
    fn test_ring_offset_is_area_uniform() {
        // Half of the ring's area lies beyond sqrt((inner² + outer²) / 2).
        let mut rng = SeededRng::from_seed(11);
        let median = ((60.0_f64.powi(2) + 120.0_f64.powi(2)) / 2.0).sqrt();

        let beyond = (0..4000)
            .map(|_| {
                let (dx, dz) = sample_ring_offset(&mut rng, 60.0, 120.0);
                dx.hypot(dz)
            })
            .filter(|r| *r > median)
            .count();

        assert!((1800..=2200).contains(&beyond), "beyond = {beyond}");
    }

    #[test]
    fn test_rare_selections_stay_in_ring() {
        // Arrange
        let world = GridWorld::flat(63);
        let mut rng = SeededRng::from_seed(2024);
        let dim = overworld();
        let selector = selector();

        // Act / Assert
        for _ in 0..50 {
            let selection = selector.select_zone(&world, &mut rng, &dim, anchor(), Tier::Rare);
            let distance = anchor().horizontal_distance(&selection.point);
            assert!(
                selection.used_fallback || (60.0 - 1e-6..=120.0 + 1e-6).contains(&distance),
                "distance {distance} outside ring"
            );
        }
    }

    #[test]
    fn test_selection_sits_on_top_of_surface() {
        let world = GridWorld::flat(63);
        let mut rng = SeededRng::from_seed(5);
        let dim = overworld();

        let selection = selector().select_zone(&world, &mut rng, &dim, anchor(), Tier::Legendary);

        assert!(!selection.used_fallback);
        assert!((selection.point.y - 64.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_water_falls_back_to_backup_location() {
        // Arrange
        let world = GridWorld::flat(63);
        let dim = overworld();
        world.fill_area(&dim, (-60, -410), (200, -140), 62, BlockKind::Liquid);
        let mut rng = SeededRng::from_seed(3);
        let config = EncounterConfig::default();

        // Act
        let selection = selector().select_zone(&world, &mut rng, &dim, anchor(), Tier::Rare);

        // Assert
        assert!(selection.used_fallback);
        assert_eq!(selection.point, config.tiers.rare.fallback);
    }

    #[test]
    fn test_validate_column_rejects_unsuitable_terrain() {
        let world = GridWorld::flat(63);
        let dim = overworld();
        world.set_column(&dim, 0, 0, 63, BlockKind::Liquid);
        world.set_column(&dim, 1, 0, 70, BlockKind::Foliage);
        world.set_column(&dim, 2, 0, 63, BlockKind::Hazard);
        world.set_block(&dim, BlockPos::new(3, 66, 0), BlockKind::Solid);
        let selector = selector();

        for x in 0..4 {
            let candidate = Position::new(f64::from(x) + 0.5, 0.0, 0.5);
            assert!(
                selector.validate_column(&world, &dim, candidate).is_none(),
                "x = {x}"
            );
        }
        let ok = selector
            .validate_column(&world, &dim, Position::new(4.5, 0.0, 0.5))
            .unwrap();
        assert!((ok.y - 64.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_find_near_point_stays_in_band() {
        let world = GridWorld::flat(63);
        let mut rng = SeededRng::from_seed(77);
        let player = Position::new(-15.0, 64.0, 300.0);
        let selector = selector();

        for _ in 0..30 {
            let point = selector
                .find_near_point(&world, &mut rng, &overworld(), player)
                .unwrap();
            let distance = player.horizontal_distance(&point);
            assert!(
                (18.0 - 1e-6..=22.0 + 1e-6).contains(&distance),
                "distance {distance}"
            );
        }
    }

    #[test]
    fn test_find_near_point_returns_none_when_surrounded_by_lava() {
        let world = GridWorld::flat(63);
        let dim = overworld();
        world.fill_area(&dim, (-30, -30), (30, 30), 63, BlockKind::Liquid);
        let mut rng = SeededRng::from_seed(8);
        let player = Position::new(0.0, 64.0, 0.0);

        let point = selector().find_near_point(&world, &mut rng, &dim, player);

        assert!(point.is_none());
    }

    #[test]
    fn test_zone_for_uses_tier_radii() {
        let selection = ZoneSelection {
            point: Position::new(1.0, 64.0, 2.0),
            used_fallback: false,
        };

        let zone = selector().zone_for(&selection, Tier::Mythic);

        assert_eq!(zone.center, selection.point);
        assert!((zone.inner_radius - 200.0).abs() < f64::EPSILON);
        assert!((zone.outer_radius - 300.0).abs() < f64::EPSILON);
    }
}
