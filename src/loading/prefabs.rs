//! Prefab load process

use bevy::log::{debug, info};
use std::collections::VecDeque;
use std::sync::Arc;

use super::{LoadProcess, LoadStage};
use crate::assets::{AssetManager, AssetType, ResourceUrn};
use crate::context::Context;
use crate::entity::{ComponentLibrary, Prefab, PrefabManager, PrefabSource};
use crate::error::{EnvError, Result};

fn prefab_error(urn: &ResourceUrn, reason: impl Into<String>) -> EnvError {
    EnvError::PrefabLoad {
        urn: urn.to_string(),
        reason: reason.into(),
    }
}

/// Loads every prefab asset into the [`PrefabManager`], a few per step.
///
/// Parents are loaded on demand before their children, so step order never
/// affects the result.
pub struct LoadPrefabs {
    assets: Arc<AssetManager>,
    components: Arc<ComponentLibrary>,
    prefabs: Arc<PrefabManager>,
    per_step: usize,
    stage: LoadStage,
    pending: VecDeque<ResourceUrn>,
    total: usize,
    processed: usize,
}

impl LoadPrefabs {
    /// Bind to the registered asset manager, component library and prefab
    /// manager
    pub fn new(context: &Context, per_step: usize) -> Result<Self> {
        Ok(Self {
            assets: context.get::<AssetManager>()?,
            components: context.get::<ComponentLibrary>()?,
            prefabs: context.get::<PrefabManager>()?,
            per_step: per_step.max(1),
            stage: LoadStage::NotStarted,
            pending: VecDeque::new(),
            total: 0,
            processed: 0,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn invalid(&self, operation: &'static str) -> EnvError {
        EnvError::InvalidLoaderState {
            operation,
            actual: self.stage,
        }
    }

    fn load(&self, urn: &ResourceUrn, chain: &mut Vec<ResourceUrn>) -> Result<Arc<Prefab>> {
        if chain.contains(urn) {
            let cycle: Vec<String> = chain.iter().map(|urn| urn.to_string()).collect();
            return Err(prefab_error(
                urn,
                format!("inheritance cycle through {}", cycle.join(" -> ")),
            ));
        }
        if self.prefabs.contains(urn)
            && let Some(prefab) = self.prefabs.get(&urn.to_string())
        {
            return Ok(prefab);
        }

        let entry = self
            .assets
            .get(AssetType::Prefab, urn)
            .ok_or_else(|| prefab_error(urn, "no such prefab asset"))?;
        let source = PrefabSource::parse(&entry.source).map_err(|e| prefab_error(urn, e.to_string()))?;

        let parent = match &source.parent {
            Some(name) => {
                let parent_urn = self
                    .assets
                    .resolve(AssetType::Prefab, name, Some(&entry.module))
                    .ok_or_else(|| prefab_error(urn, format!("parent `{}` not found", name)))?;
                if self.assets.get(AssetType::Prefab, &parent_urn).is_none() {
                    return Err(prefab_error(urn, format!("parent `{}` not found", name)));
                }
                chain.push(urn.clone());
                let parent = self.load(&parent_urn, chain);
                chain.pop();
                Some(parent?)
            }
            None => None,
        };

        let prefab = Prefab::build(urn.clone(), source, parent.as_deref(), &self.components)
            .map_err(|reason| prefab_error(urn, reason))?;
        debug!("Loaded prefab {}", urn);
        Ok(self.prefabs.register(prefab))
    }
}

impl LoadProcess for LoadPrefabs {
    fn message(&self) -> String {
        match self.stage {
            LoadStage::NotStarted => "Waiting to load prefabs".to_string(),
            LoadStage::InProgress => format!("Loading prefabs ({}/{})", self.processed, self.total),
            LoadStage::Complete => "Prefabs loaded".to_string(),
        }
    }

    fn begin(&mut self) -> Result<()> {
        if self.stage != LoadStage::NotStarted {
            return Err(self.invalid("begin"));
        }
        let urns = self
            .assets
            .available_assets(AssetType::Prefab)
            .map_err(|e| EnvError::LoadSetup(e.to_string()))?;
        self.total = urns.len();
        self.pending = urns.into();
        self.stage = LoadStage::InProgress;
        self.prefabs.set_stage(LoadStage::InProgress);
        info!("Loading {} prefabs", self.total);
        Ok(())
    }

    fn step(&mut self) -> Result<bool> {
        if self.stage != LoadStage::InProgress {
            return Err(self.invalid("step"));
        }
        for _ in 0..self.per_step {
            let Some(urn) = self.pending.pop_front() else {
                break;
            };
            self.load(&urn, &mut Vec::new())?;
            self.processed += 1;
        }
        if self.pending.is_empty() {
            self.stage = LoadStage::Complete;
            self.prefabs.set_stage(LoadStage::Complete);
            info!("Loaded {} prefabs", self.prefabs.len());
            return Ok(true);
        }
        Ok(false)
    }

    fn stage(&self) -> LoadStage {
        self.stage
    }

    fn progress(&self) -> f32 {
        match (self.stage, self.total) {
            (LoadStage::Complete, _) => 1.0,
            (_, 0) => 0.0,
            _ => self.processed as f32 / self.total as f32,
        }
    }

    fn expected_cost(&self) -> u32 {
        self.total.max(1) as u32
    }
}
