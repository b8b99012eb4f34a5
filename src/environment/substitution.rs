//! Headless substitutions
//!
//! Replaces the baseline subsystems a test must control (or that make no
//! sense without a window or a network) with deterministic stand-ins. Each
//! replacement is a plain `put`; anything that cached the baseline instance
//! keeps the stale one.

use bevy::log::{debug, warn};
use std::sync::Arc;

use crate::context::Context;
use crate::display::{DisplayDevice, HeadlessDisplayDevice};
use crate::entity::{add_entity_management_related_classes, add_reflection_based_libraries};
use crate::error::Result;
use crate::game::Game;
use crate::module::ModuleEnvironment;
use crate::network::{NetworkMode, NetworkSystem, NetworkSystemImpl};
use crate::paths::PathManager;
use crate::persistence::{ReadWriteStorageManager, StorageManager};
use crate::settings::HarnessSettings;
use crate::time::{MockTime, Time};
use crate::world::{BiomeManager, BlockId, BlockManager, SimpleWorldProvider, WorldProvider};

/// Install every headless replacement, in dependency order
pub fn substitute_headless_subsystems(
    context: &mut Context,
    environment: &Arc<ModuleEnvironment>,
    mock_time: &Arc<MockTime>,
    settings: &HarnessSettings,
) -> Result<()> {
    let time: Arc<dyn Time> = mock_time.clone();
    context.put(time.clone());

    let network = NetworkSystemImpl::new(time, context);
    network.set_mode(NetworkMode::None);
    context.put::<dyn NetworkSystem>(Arc::new(network));

    context.put_value(Game::new());

    add_reflection_based_libraries(context, environment);
    let entities = add_entity_management_related_classes(context)?;

    let blocks = context.get::<BlockManager>()?;
    let biomes = context.get::<BiomeManager>()?;
    let ground = match blocks.block_id(&settings.ground_block) {
        Some(id) => id,
        None => {
            warn!(
                "Ground block {} is not registered, world will be empty",
                settings.ground_block
            );
            BlockId::AIR
        }
    };
    context.put::<dyn WorldProvider>(Arc::new(SimpleWorldProvider::new(
        settings.world_seed,
        ground,
        settings.ground_level,
    )));

    let paths = context.get::<PathManager>()?;
    let storage = ReadWriteStorageManager::new(
        &paths.save_path(&settings.save_name),
        environment.clone(),
        entities,
        blocks,
        biomes,
    )?;
    context.put::<dyn StorageManager>(Arc::new(storage));

    context.put::<dyn DisplayDevice>(Arc::new(HeadlessDisplayDevice::new()));

    debug!("Headless substitutions installed");
    Ok(())
}
