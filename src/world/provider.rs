//! World providers
//!
//! `GeneratedWorldProvider` is the runtime's terrain source: hilly, seeded
//! from the config or at random. `SimpleWorldProvider` is the flat,
//! in-memory world tests run against; equal settings always yield equal
//! worlds.

use bevy::math::IVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::BlockId;

/// Block-level world access
pub trait WorldProvider: Send + Sync {
    fn seed(&self) -> u64;

    fn get_block(&self, position: IVec3) -> BlockId;

    /// Place a block, returning the one it replaced
    fn set_block(&self, position: IVec3, block: BlockId) -> BlockId;

    /// Number of positions changed since generation
    fn modified_count(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

/// Edits layered over generated terrain
#[derive(Default)]
struct Edits {
    blocks: RwLock<HashMap<IVec3, BlockId>>,
}

impl Edits {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<IVec3, BlockId>> {
        self.blocks.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<IVec3, BlockId>> {
        self.blocks.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, position: IVec3) -> Option<BlockId> {
        self.read().get(&position).copied()
    }

    fn set(&self, position: IVec3, block: BlockId) {
        self.write().insert(position, block);
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

/// Heightmap terrain, one seeded column height per (x, z)
pub struct GeneratedWorldProvider {
    seed: u64,
    surface: BlockId,
    filler: BlockId,
    max_height: i32,
    edits: Edits,
}

impl GeneratedWorldProvider {
    pub fn new(seed: u64, surface: BlockId, filler: BlockId) -> Self {
        Self {
            seed,
            surface,
            filler,
            max_height: 8,
            edits: Edits::default(),
        }
    }

    /// Provider seeded from the thread rng
    pub fn random(surface: BlockId, filler: BlockId) -> Self {
        Self::new(rand::random(), surface, filler)
    }

    fn column_height(&self, x: i32, z: i32) -> i32 {
        let column = ((x as u32 as u64) << 32) | (z as u32 as u64);
        let mut rng = StdRng::seed_from_u64(self.seed ^ column.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        rng.gen_range(0..self.max_height)
    }
}

impl WorldProvider for GeneratedWorldProvider {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn get_block(&self, position: IVec3) -> BlockId {
        if let Some(block) = self.edits.get(position) {
            return block;
        }
        let height = self.column_height(position.x, position.z);
        if position.y > height {
            BlockId::AIR
        } else if position.y == height {
            self.surface
        } else {
            self.filler
        }
    }

    fn set_block(&self, position: IVec3, block: BlockId) -> BlockId {
        let previous = self.get_block(position);
        self.edits.set(position, block);
        previous
    }

    fn modified_count(&self) -> usize {
        self.edits.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Flat deterministic world: `ground` at and below `ground_level`, air above
pub struct SimpleWorldProvider {
    seed: u64,
    ground: BlockId,
    ground_level: i32,
    edits: Edits,
}

impl SimpleWorldProvider {
    pub fn new(seed: u64, ground: BlockId, ground_level: i32) -> Self {
        Self {
            seed,
            ground,
            ground_level,
            edits: Edits::default(),
        }
    }

    pub fn ground_level(&self) -> i32 {
        self.ground_level
    }
}

impl WorldProvider for SimpleWorldProvider {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn get_block(&self, position: IVec3) -> BlockId {
        if let Some(block) = self.edits.get(position) {
            return block;
        }
        if position.y <= self.ground_level {
            self.ground
        } else {
            BlockId::AIR
        }
    }

    fn set_block(&self, position: IVec3, block: BlockId) -> BlockId {
        let previous = self.get_block(position);
        self.edits.set(position, block);
        previous
    }

    fn modified_count(&self) -> usize {
        self.edits.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STONE: BlockId = BlockId(3);
    const DIRT: BlockId = BlockId(4);

    #[test]
    fn test_simple_world_is_flat() {
        let world = SimpleWorldProvider::new(1, STONE, 0);
        assert_eq!(world.get_block(IVec3::new(10, 0, -4)), STONE);
        assert_eq!(world.get_block(IVec3::new(10, -30, -4)), STONE);
        assert_eq!(world.get_block(IVec3::new(10, 1, -4)), BlockId::AIR);
    }

    #[test]
    fn test_simple_world_edits() {
        let world = SimpleWorldProvider::new(1, STONE, 0);
        let position = IVec3::new(0, 5, 0);
        assert_eq!(world.set_block(position, DIRT), BlockId::AIR);
        assert_eq!(world.get_block(position), DIRT);
        assert_eq!(world.modified_count(), 1);
    }

    #[test]
    fn test_edits_survive_poisoned_lock() {
        let world = SimpleWorldProvider::new(1, STONE, 0);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = world.edits.write();
            panic!("edit interrupted");
        }));
        assert!(world.edits.blocks.is_poisoned());

        let position = IVec3::new(1, 3, 1);
        assert_eq!(world.set_block(position, DIRT), BlockId::AIR);
        assert_eq!(world.get_block(position), DIRT);
        assert_eq!(world.modified_count(), 1);
    }

    #[test]
    fn test_simple_worlds_with_same_settings_match() {
        let a = SimpleWorldProvider::new(7, STONE, 2);
        let b = SimpleWorldProvider::new(7, STONE, 2);
        for y in -3..6 {
            let position = IVec3::new(3, y, 3);
            assert_eq!(a.get_block(position), b.get_block(position));
        }
    }

    #[test]
    fn test_generated_world_is_seeded() {
        let a = GeneratedWorldProvider::new(42, DIRT, STONE);
        let b = GeneratedWorldProvider::new(42, DIRT, STONE);
        for x in -8..8 {
            assert_eq!(a.column_height(x, x * 3), b.column_height(x, x * 3));
        }
        assert_eq!(a.get_block(IVec3::new(0, 64, 0)), BlockId::AIR);
        assert_eq!(a.get_block(IVec3::new(0, -1, 0)), STONE);
    }
}
