//! Component systems of the base module

use anyhow::{Context as _, anyhow, bail};
use bevy::log::debug;
use bevy::math::IVec3;
use std::any::Any;
use std::sync::Arc;

use super::ComponentSystem;
use crate::console::ConsoleCommand;
use crate::context::Context;
use crate::display::DisplayDevice;
use crate::entity::{DamageEvent, EntityManager, Health, PrefabManager};
use crate::world::{BlockManager, WorldProvider};

/// Prefab every character-like entity derives from
pub const CHARACTER_PREFAB: &str = "engine:character";

/// Applies damage to entities with [`Health`]. Authority only.
pub struct HealthSystem {
    entities: Arc<EntityManager>,
}

impl HealthSystem {
    pub fn new(context: &Context) -> anyhow::Result<Self> {
        let prefabs = context.get::<PrefabManager>()?;
        if prefabs.get(CHARACTER_PREFAB).is_none() {
            bail!("prefab {} is not loaded", CHARACTER_PREFAB);
        }
        Ok(Self {
            entities: context.get::<EntityManager>()?,
        })
    }

    /// Apply `event`, returning the target's remaining health
    pub fn apply_damage(&self, event: DamageEvent) -> anyhow::Result<u32> {
        let mut health = self
            .entities
            .get_component::<Health>(event.target)
            .ok_or_else(|| anyhow!("entity {} has no health", event.target))?;
        let remaining = health.current().saturating_sub(event.amount);
        health.current = Some(remaining);
        self.entities.add_component(event.target, health)?;
        debug!("{} took {} damage, {} left", event.target, event.amount, remaining);
        Ok(remaining)
    }
}

impl ComponentSystem for HealthSystem {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Answers world queries from the console
#[derive(Default)]
pub struct WorldInfoSystem {
    world: Option<(Arc<dyn WorldProvider>, Arc<BlockManager>)>,
}

impl WorldInfoSystem {
    pub fn new(_context: &Context) -> anyhow::Result<Self> {
        Ok(Self::default())
    }
}

fn parse_position(args: &[&str]) -> anyhow::Result<IVec3> {
    let [x, y, z] = args else {
        bail!("usage: blockat <x> <y> <z>");
    };
    let coordinate = |text: &str| {
        text.parse::<i32>()
            .with_context(|| format!("`{}` is not a coordinate", text))
    };
    Ok(IVec3::new(coordinate(*x)?, coordinate(*y)?, coordinate(*z)?))
}

impl ComponentSystem for WorldInfoSystem {
    fn initialise(&mut self, context: &Context) -> anyhow::Result<()> {
        // Fetched here, not at construction: the world provider is only
        // final once substitution has run.
        self.world = Some((context.get::<dyn WorldProvider>()?, context.get::<BlockManager>()?));
        Ok(())
    }

    fn commands(&self) -> Vec<ConsoleCommand> {
        let Some((world, blocks)) = self.world.clone() else {
            return Vec::new();
        };
        vec![ConsoleCommand::new(
            "blockat",
            "Name the block at a position",
            move |args| {
                let position = parse_position(args)?;
                let id = world.get_block(position);
                let block = blocks
                    .block(id)
                    .ok_or_else(|| anyhow!("unknown block id {}", id.0))?;
                Ok(block.urn.to_string())
            },
        )]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Follows the local player. Needs a display, so never loads headless.
pub struct CameraSystem {
    display: Arc<dyn DisplayDevice>,
}

impl CameraSystem {
    pub fn new(context: &Context) -> anyhow::Result<Self> {
        Ok(Self {
            display: context.get::<dyn DisplayDevice>()?,
        })
    }
}

impl ComponentSystem for CameraSystem {
    fn initialise(&mut self, _context: &Context) -> anyhow::Result<()> {
        if self.display.is_headless() {
            bail!("camera requires a display");
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
