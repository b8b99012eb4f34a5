//! Fixed names and defaults shared across the harness

// =============================================================================
// MODULES
// =============================================================================

/// Module that every environment loads
pub const BASE_MODULE: &str = "engine";

/// Version the built-in base module reports
pub const BASE_MODULE_VERSION: &str = "5.0.0";

/// Manifest file expected at the root of a data module directory
pub const MODULE_MANIFEST_FILE: &str = "module.toml";

/// Data module subdirectories and the extensions scanned inside them
pub const PREFAB_DIR: &str = "prefabs";
pub const PREFAB_EXTENSION: &str = "prefab";
pub const BLOCK_DIR: &str = "blocks";
pub const BLOCK_EXTENSION: &str = "block";

// =============================================================================
// SANDBOX LAYOUT
// =============================================================================

/// Prefix of sandboxed home directories
pub const SANDBOX_PREFIX: &str = "module-testing-env-";

/// Saves live under `<home>/saves/<name>`
pub const SAVES_DIR: &str = "saves";

/// Engine config file inside the home directory
pub const ENGINE_CONFIG_FILE: &str = "config.toml";

/// Sqlite database inside each save directory
pub const WORLD_DATABASE_FILE: &str = "world.db";

/// Game manifest written next to the database
pub const GAME_MANIFEST_FILE: &str = "manifest.json";

// =============================================================================
// DEFAULTS
// =============================================================================

/// Save slot used by the storage manager
pub const DEFAULT_SAVE_NAME: &str = "world1";

/// Prefabs processed by one loader step
pub const DEFAULT_PREFABS_PER_STEP: usize = 1;

/// Seed handed to the deterministic world provider
pub const DEFAULT_WORLD_SEED: u64 = 0x5eed;

/// Block placed at and below the ground level
pub const DEFAULT_GROUND_BLOCK: &str = "engine:stone";

/// Highest solid y coordinate of the flat test world
pub const DEFAULT_GROUND_LEVEL: i32 = 0;

/// Log filter used when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// BLOCKS & PHYSICS
// =============================================================================

/// Block every world is filled with where nothing else is placed
pub const AIR_BLOCK: &str = "engine:air";

/// Collision groups available before any module adds its own
pub const BUILT_IN_COLLISION_GROUPS: [&str; 8] = [
    "engine:default",
    "engine:static",
    "engine:kinematic",
    "engine:debris",
    "engine:sensor",
    "engine:character",
    "engine:world",
    "engine:liquid",
];

/// Collision groups are 16-bit flags
pub const MAX_COLLISION_GROUPS: usize = 16;
