//! The built-in `engine` module every environment loads

use super::Module;
use crate::constants::{BASE_MODULE, BASE_MODULE_VERSION};
use crate::entity::{DamageEvent, DisplayName, Health, Location};
use crate::error::EnvError;
use crate::systems::RegisterMode;
use crate::systems::engine::{CameraSystem, HealthSystem, WorldInfoSystem};

const CHARACTER_PREFAB: &str = r#"
persisted = true

[components.location]

[components.health]
max = 100

[components.display_name]
name = "Character"
"#;

const PLAYER_PREFAB: &str = r#"
parent = "character"

[components.display_name]
name = "Player"
"#;

pub fn engine_module() -> Result<Module, EnvError> {
    Module::builder(BASE_MODULE, BASE_MODULE_VERSION)
        .display_name("Engine")
        .description("Core components, blocks and systems")
        .with_component::<Location>("location")
        .with_component::<DisplayName>("display_name")
        .with_component::<Health>("health")
        .with_event::<DamageEvent>("damage")
        .with_prefab("character", CHARACTER_PREFAB)
        .with_prefab("player", PLAYER_PREFAB)
        .with_block("stone", "display_name = \"Stone\"\nhardness = 6\n")
        .with_block("dirt", "display_name = \"Dirt\"\nhardness = 2\n")
        .with_block("grass", "display_name = \"Grass\"\nhardness = 2\n")
        .with_block("water", "display_name = \"Water\"\nhardness = 0\npenetrable = true\nliquid = true\n")
        .with_biome("plains")
        .with_biome("forest")
        .with_system("health", RegisterMode::Authority, HealthSystem::new)
        .with_system("world_info", RegisterMode::Always, WorldInfoSystem::new)
        .with_system("camera", RegisterMode::Client, CameraSystem::new)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetType;

    #[test]
    fn test_engine_module_contents() {
        let module = engine_module().unwrap();
        assert_eq!(module.id().as_str(), BASE_MODULE);
        assert_eq!(module.components().len(), 3);
        assert_eq!(module.events().len(), 1);
        assert_eq!(
            module
                .assets()
                .iter()
                .filter(|asset| asset.asset_type == AssetType::Prefab)
                .count(),
            2
        );
        assert_eq!(module.systems().len(), 3);
        assert!(module.dependencies().is_empty());
    }
}
