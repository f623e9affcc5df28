//! In-memory world used for standalone runs and tests.
//!
//! Terrain is an infinite flat plain at a configurable ground height. Columns
//! can be overridden with a different surface height or block category, and
//! single blocks can be placed to obstruct the space above a surface. Regions
//! are resident unless explicitly unloaded.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use encounter_core::geometry::{BlockPos, Position, RegionCoord};
use encounter_core::ids::{DimensionId, ObjectId, PlayerId};
use encounter_core::world::{
    BlockKind, ObjectInfo, PlayerPose, StandingEffect, WorldError, WorldSurface,
};

#[derive(Debug, Clone, Copy)]
struct Column {
    surface_y: i32,
    surface: BlockKind,
}

#[derive(Debug, Default)]
struct GridState {
    columns: HashMap<(DimensionId, i32, i32), Column>,
    blocks: HashMap<(DimensionId, BlockPos), BlockKind>,
    unloaded: HashSet<(DimensionId, RegionCoord)>,
    players: HashMap<PlayerId, PlayerPose>,
    objects: BTreeMap<ObjectId, ObjectInfo>,
    effects: HashMap<ObjectId, HashSet<StandingEffect>>,
    rejecting: bool,
}

/// A simulated world backed by in-memory tables.
#[derive(Debug)]
pub struct GridWorld {
    ground_y: i32,
    state: Mutex<GridState>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::flat(63)
    }
}

impl GridWorld {
    /// A flat solid plain whose surface block is at `ground_y`.
    #[must_use]
    pub fn flat(ground_y: i32) -> Self {
        Self {
            ground_y,
            state: Mutex::new(GridState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn column(&self, state: &GridState, dimension: &DimensionId, x: i32, z: i32) -> Column {
        state
            .columns
            .get(&(dimension.clone(), x, z))
            .copied()
            .unwrap_or(Column {
                surface_y: self.ground_y,
                surface: BlockKind::Solid,
            })
    }

    /// Overrides a single column's surface.
    pub fn set_column(
        &self,
        dimension: &DimensionId,
        x: i32,
        z: i32,
        surface_y: i32,
        surface: BlockKind,
    ) {
        self.state()
            .columns
            .insert((dimension.clone(), x, z), Column { surface_y, surface });
    }

    /// Overrides every column in the inclusive rectangle.
    pub fn fill_area(
        &self,
        dimension: &DimensionId,
        (x0, z0): (i32, i32),
        (x1, z1): (i32, i32),
        surface_y: i32,
        surface: BlockKind,
    ) {
        let mut state = self.state();
        for x in x0.min(x1)..=x0.max(x1) {
            for z in z0.min(z1)..=z0.max(z1) {
                state
                    .columns
                    .insert((dimension.clone(), x, z), Column { surface_y, surface });
            }
        }
    }

    /// Places a single block, leaving the column's surface height unchanged.
    pub fn set_block(&self, dimension: &DimensionId, pos: BlockPos, kind: BlockKind) {
        self.state().blocks.insert((dimension.clone(), pos), kind);
    }

    /// Marks a region as resident or not.
    pub fn set_resident(&self, dimension: &DimensionId, region: RegionCoord, resident: bool) {
        let mut state = self.state();
        if resident {
            state.unloaded.remove(&(dimension.clone(), region));
        } else {
            state.unloaded.insert((dimension.clone(), region));
        }
    }

    /// Makes every creation request fail with `WorldError::Rejected`.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.state().rejecting = rejecting;
    }

    /// Connects a player (or updates an existing one).
    pub fn join(&self, player: PlayerId, pose: PlayerPose) {
        self.state().players.insert(player, pose);
    }

    /// Disconnects a player.
    pub fn leave(&self, player: PlayerId) {
        self.state().players.remove(&player);
    }

    /// Moves a connected player. Returns `false` if the player is offline.
    pub fn move_player(&self, player: PlayerId, position: Position, yaw: f64) -> bool {
        match self.state().players.get_mut(&player) {
            Some(pose) => {
                pose.position = position;
                pose.yaw = yaw;
                true
            }
            None => false,
        }
    }

    /// Inserts a pre-existing object, as if left over from an earlier run.
    pub fn insert_object(&self, info: ObjectInfo) {
        self.state().objects.insert(info.id, info);
    }

    /// Removes an object the way a death would, returning its last snapshot.
    pub fn kill(&self, object: ObjectId) -> Option<ObjectInfo> {
        let mut state = self.state();
        state.effects.remove(&object);
        state.objects.remove(&object)
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    /// Every live object.
    #[must_use]
    pub fn objects(&self) -> Vec<ObjectInfo> {
        self.state().objects.values().cloned().collect()
    }

    /// Standing effects applied to an object.
    #[must_use]
    pub fn effects(&self, object: ObjectId) -> Vec<StandingEffect> {
        self.state()
            .effects
            .get(&object)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl WorldSurface for GridWorld {
    fn surface_height(&self, dimension: &DimensionId, x: i32, z: i32) -> Option<i32> {
        let state = self.state();
        Some(self.column(&state, dimension, x, z).surface_y)
    }

    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> Option<BlockKind> {
        let state = self.state();
        if let Some(kind) = state.blocks.get(&(dimension.clone(), pos)) {
            return Some(*kind);
        }
        let column = self.column(&state, dimension, pos.x, pos.z);
        Some(match pos.y.cmp(&column.surface_y) {
            std::cmp::Ordering::Less => BlockKind::Solid,
            std::cmp::Ordering::Equal => column.surface,
            std::cmp::Ordering::Greater => BlockKind::Air,
        })
    }

    fn create_object(
        &self,
        dimension: &DimensionId,
        unit_type: &str,
        position: Position,
        name: Option<&str>,
    ) -> Result<ObjectId, WorldError> {
        let mut state = self.state();
        let block = position.block();
        let region = (dimension.clone(), block.region());
        if state.unloaded.contains(&region) {
            return Err(WorldError::RegionNotResident(block));
        }
        if state.rejecting {
            return Err(WorldError::Rejected(format!("cannot create {unit_type}")));
        }
        let id = ObjectId::new();
        let mut tags = Vec::new();
        if let Some(name) = name {
            tags.push(format!("name:{name}"));
        }
        state.objects.insert(
            id,
            ObjectInfo {
                id,
                unit_type: unit_type.to_owned(),
                dimension: dimension.clone(),
                position,
                tags,
            },
        );
        Ok(id)
    }

    fn add_tag(&self, object: ObjectId, tag: &str) -> bool {
        match self.state().objects.get_mut(&object) {
            Some(info) => {
                if !info.tags.iter().any(|t| t == tag) {
                    info.tags.push(tag.to_owned());
                }
                true
            }
            None => false,
        }
    }

    fn tags(&self, object: ObjectId) -> Option<Vec<String>> {
        let state = self.state();
        state.objects.get(&object).map(|info| info.tags.clone())
    }

    fn apply_effect(&self, object: ObjectId, effect: StandingEffect) -> bool {
        let mut state = self.state();
        if !state.objects.contains_key(&object) {
            return false;
        }
        state.effects.entry(object).or_default().insert(effect);
        true
    }

    fn remove_object(&self, object: ObjectId) -> bool {
        let mut state = self.state();
        state.effects.remove(&object);
        state.objects.remove(&object).is_some()
    }

    fn object(&self, object: ObjectId) -> Option<ObjectInfo> {
        self.state().objects.get(&object).cloned()
    }

    fn objects_with_tag(&self, tag: &str) -> Vec<ObjectInfo> {
        self.state()
            .objects
            .values()
            .filter(|info| info.tags.iter().any(|t| t == tag))
            .cloned()
            .collect()
    }

    fn player_pose(&self, player: PlayerId) -> Option<PlayerPose> {
        self.state().players.get(&player).cloned()
    }

    fn connected_players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.state().players.keys().copied().collect();
        players.sort();
        players
    }
}
