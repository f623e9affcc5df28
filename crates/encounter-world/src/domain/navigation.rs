//! Navigation cues toward the current encounter target.
//!
//! Everything here is derived from the player's pose and the target each
//! cycle; nothing is persisted.

use chrono::{DateTime, TimeDelta, Utc};
use encounter_core::geometry::Position;
use encounter_core::world::PlayerPose;
use serde::{Deserialize, Serialize};

/// Width of one bearing sector in degrees.
pub const SECTOR_DEGREES: f64 = 22.5;

/// Direction of the target relative to where the player is facing, in 16
/// sectors. `N` is straight ahead and the sectors run clockwise, so `E` is
/// to the player's right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum RelativeBearing {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl RelativeBearing {
    const ALL: [RelativeBearing; 16] = [
        RelativeBearing::N,
        RelativeBearing::NNE,
        RelativeBearing::NE,
        RelativeBearing::ENE,
        RelativeBearing::E,
        RelativeBearing::ESE,
        RelativeBearing::SE,
        RelativeBearing::SSE,
        RelativeBearing::S,
        RelativeBearing::SSW,
        RelativeBearing::SW,
        RelativeBearing::WSW,
        RelativeBearing::W,
        RelativeBearing::WNW,
        RelativeBearing::NW,
        RelativeBearing::NNW,
    ];

    /// Sector index, 0 (ahead) to 15, clockwise.
    #[must_use]
    pub fn sector(self) -> u8 {
        // Discriminants are 0..16.
        self as u8
    }

    /// The bearing for a sector index, wrapping past 15.
    #[must_use]
    pub fn from_sector(sector: usize) -> Self {
        Self::ALL[sector % Self::ALL.len()]
    }

    /// The closest of the eight arrow glyphs. In-between sectors lean toward
    /// the nearer cardinal direction.
    #[must_use]
    pub fn arrow(self) -> char {
        match self {
            RelativeBearing::NNW | RelativeBearing::N | RelativeBearing::NNE => '↑',
            RelativeBearing::NE => '↗',
            RelativeBearing::ENE | RelativeBearing::E | RelativeBearing::ESE => '→',
            RelativeBearing::SE => '↘',
            RelativeBearing::SSE | RelativeBearing::S | RelativeBearing::SSW => '↓',
            RelativeBearing::SW => '↙',
            RelativeBearing::WSW | RelativeBearing::W | RelativeBearing::WNW => '←',
            RelativeBearing::NW => '↖',
        }
    }
}

/// Normalises an angle in degrees to `(-180, 180]`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Yaw that would face from `from` toward `to`, in the host convention
/// (0 looks toward +z, 90 toward -x).
#[must_use]
pub fn yaw_toward(from: &Position, to: &Position) -> f64 {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    (-dx).atan2(dz).to_degrees()
}

/// Relative bearing of `target` for a player at `position` facing `yaw`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bearing(position: &Position, yaw: f64, target: &Position) -> RelativeBearing {
    let relative = normalize_degrees(yaw_toward(position, target) - yaw);
    let sector = (relative / SECTOR_DEGREES).round() as i64;
    RelativeBearing::from_sector(sector.rem_euclid(16) as usize)
}

/// Whether the vertical beacon is shown: only within `radius` horizontally.
#[must_use]
pub fn beacon_active(position: &Position, target: &Position, radius: f64) -> bool {
    position.horizontal_distance(target) <= radius
}

/// Whether the beacon is in the lit half of its pulse at `now`.
#[must_use]
pub fn beacon_lit(now: DateTime<Utc>, period: TimeDelta) -> bool {
    let period_ms = period.num_milliseconds();
    if period_ms <= 0 {
        return true;
    }
    now.timestamp_millis().rem_euclid(period_ms) < period_ms / 2
}

/// Cue derived for one player in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationHint {
    /// The target the cue points at.
    pub target: Position,
    /// Relative bearing of the target.
    pub bearing: RelativeBearing,
    /// Horizontal distance to the target.
    pub distance: f64,
    /// Whether the beacon is shown.
    pub beacon_active: bool,
    /// Whether the beacon is lit this cycle.
    pub beacon_lit: bool,
}

/// Derives the full cue for `pose` toward `target`.
#[must_use]
pub fn derive_hint(
    pose: &PlayerPose,
    target: Position,
    beacon_radius: f64,
    beacon_period: TimeDelta,
    now: DateTime<Utc>,
) -> NavigationHint {
    let active = beacon_active(&pose.position, &target, beacon_radius);
    NavigationHint {
        target,
        bearing: bearing(&pose.position, pose.yaw, &target),
        distance: pose.position.horizontal_distance(&target),
        beacon_active: active,
        beacon_lit: active && beacon_lit(now, beacon_period),
    }
}
