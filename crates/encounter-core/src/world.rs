//! The world surface consumed by the encounter runtime.
//!
//! Every call is best-effort: the live object set changes outside this
//! system's control, so handles may be stale and queries may come back empty.
//! Implementations must treat "object no longer exists" as a normal outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{BlockPos, Position};
use crate::ids::{DimensionId, ObjectId, PlayerId};

/// Block categories the terrain check distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Empty space.
    Air,
    /// Solid ground a body can stand on.
    Solid,
    /// Water, lava or any other fluid.
    Liquid,
    /// Leaves, logs and other canopy blocks.
    Foliage,
    /// Blocks that damage whatever stands on them (magma, cactus, fire).
    Hazard,
}

/// Standing effects applied to spawned objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingEffect {
    /// Immunity to fire and sunlight burning.
    FireImmunity,
}

/// Damage classes reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    /// Standing in fire.
    Fire,
    /// Lingering burn after leaving fire.
    FireTick,
    /// Sunlight ignition of undead units.
    Sunburn,
    /// Falling.
    Fall,
    /// Drowning.
    Drowning,
    /// Lava contact.
    Lava,
    /// Attacks by players or other creatures.
    Attack,
    /// Anything else.
    Other,
}

impl DamageCause {
    /// Whether this cause belongs to the incidental burn class.
    #[must_use]
    pub const fn is_burn(self) -> bool {
        matches!(
            self,
            DamageCause::Fire | DamageCause::FireTick | DamageCause::Sunburn
        )
    }
}

/// Where a player is and which way they are looking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Dimension the player is in.
    pub dimension: DimensionId,
    /// Current position.
    pub position: Position,
    /// Facing yaw in degrees: 0 looks toward +z, 90 toward -x.
    pub yaw: f64,
}

/// Snapshot of a live world object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object handle.
    pub id: ObjectId,
    /// Host unit type.
    pub unit_type: String,
    /// Dimension the object lives in.
    pub dimension: DimensionId,
    /// Current position.
    pub position: Position,
    /// String tags attached to the object.
    pub tags: Vec<String>,
}

/// Failures of object creation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The target region is not loaded yet.
    #[error("region at {0:?} is not resident")]
    RegionNotResident(BlockPos),

    /// The host refused the request.
    #[error("world rejected request: {0}")]
    Rejected(String),
}

/// Spatial and object operations offered by the host world.
pub trait WorldSurface: Send + Sync {
    /// Y of the highest non-air block in the column, if the column is known.
    fn surface_height(&self, dimension: &DimensionId, x: i32, z: i32) -> Option<i32>;

    /// Category of the block at `pos`, if the position is known.
    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> Option<BlockKind>;

    /// Creates a unit at `position`, applying `name` as its display name.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::RegionNotResident` if the target region is not
    /// loaded, `WorldError::Rejected` for any other refusal.
    fn create_object(
        &self,
        dimension: &DimensionId,
        unit_type: &str,
        position: Position,
        name: Option<&str>,
    ) -> Result<ObjectId, WorldError>;

    /// Adds a tag. Returns `false` if the object no longer exists.
    fn add_tag(&self, object: ObjectId, tag: &str) -> bool;

    /// Tags of the object, or `None` if it no longer exists.
    fn tags(&self, object: ObjectId) -> Option<Vec<String>>;

    /// Applies a standing effect. Returns `false` if the object no longer
    /// exists.
    fn apply_effect(&self, object: ObjectId, effect: StandingEffect) -> bool;

    /// Removes the object. Returns `false` if it was already gone.
    fn remove_object(&self, object: ObjectId) -> bool;

    /// Snapshot of the object, or `None` if it no longer exists.
    fn object(&self, object: ObjectId) -> Option<ObjectInfo>;

    /// Every live object carrying `tag`, across all dimensions.
    fn objects_with_tag(&self, tag: &str) -> Vec<ObjectInfo>;

    /// Current pose of a connected player.
    fn player_pose(&self, player: PlayerId) -> Option<PlayerPose>;

    /// Players currently connected.
    fn connected_players(&self) -> Vec<PlayerId>;
}
