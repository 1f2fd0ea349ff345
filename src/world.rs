//! The bundled engine module: entity storage, simulation clock and rendering.

use crate::bridge::{Bridge, LoadFuture, ModuleLoader, RenderSurface};
use crate::config::{Backend, DEFAULT_ENTITY_SIZE, DEFAULT_LIGHT_COLOR, EngineConfig};
use crate::debug_world;
use crate::error::EngineError;
use crate::lighting::DynamicLighting;
use crate::render::{Frame, FrameStats, GraphicsBackend, MacroquadBackend, Renderer, SoftwareBackend};
use crate::types::{Color, Entity, EntityId};
use log::{info, warn};

const ENTITY_LIGHT_RADIUS: u32 = 24;

/// Owns every entity and hands out sequential ids ("e1", "e2", ...)
#[derive(Debug, Default)]
pub struct EntityManager {
    entities: Vec<Entity>,
    next_id: u64,
    elapsed: f64,
}

impl EntityManager {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_entity(&mut self, x: i32, y: i32, color: Color) -> &Entity {
        self.next_id += 1;
        let entity = Entity::new(EntityId::new(format!("e{}", self.next_id)), x, y, color);
        debug_world!("Added entity {} at ({}, {})", entity.id, x, y);
        self.entities.push(entity);
        &self.entities[self.entities.len() - 1]
    }

    /// Advances simulation time. Entities carry no behaviour of their own.
    pub fn update_all(&mut self, dt: f32) {
        self.elapsed += dt as f64;
        for entity in &self.entities {
            log::trace!(target: "world", "Updated entity {}", entity.id);
        }
    }

    pub fn get_all(&self) -> &[Entity] {
        &self.entities
    }

    /// Removes every entity, returning their ids in creation order
    pub fn clear(&mut self) -> Vec<EntityId> {
        self.entities.drain(..).map(|e| e.id).collect()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// `Bridge` implementation backed by an in-process entity manager
pub struct World {
    entities: EntityManager,
    renderer: Renderer,
    lighting: Option<DynamicLighting>,
    last_dt: f32,
}

impl World {
    pub fn new(config: &EngineConfig, lighting: bool) -> Result<Self, EngineError> {
        let renderer = Renderer::new(
            create_backend(config.backend),
            config.internal_resolution,
            config.screen_resolution,
        )?;
        Ok(World {
            entities: EntityManager::new(),
            renderer,
            lighting: lighting.then(|| DynamicLighting::new(config.internal_resolution)),
            last_dt: 0.0,
        })
    }

    fn stats(&self) -> FrameStats {
        let fps = if self.last_dt > 0.0 {
            (1.0 / self.last_dt).round() as u32
        } else {
            0
        };
        FrameStats {
            fps,
            entities: self.entities.get_all().len(),
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.entities.elapsed()
    }
}

fn create_backend(backend: Backend) -> Box<dyn GraphicsBackend> {
    match backend {
        Backend::Software => Box::new(SoftwareBackend::new()),
        Backend::OpenGl => Box::new(MacroquadBackend::new()),
        Backend::Vulkan => {
            warn!("Vulkan backend is not implemented. Using opengl fallback.");
            Box::new(MacroquadBackend::new())
        }
    }
}

impl Bridge for World {
    fn create_entity(&mut self, x: i32, y: i32, color: Color) -> Entity {
        self.entities.add_entity(x, y, color).clone()
    }

    fn entities(&self) -> Vec<Entity> {
        self.entities.get_all().to_vec()
    }

    fn update(&mut self, dt: f32) {
        self.last_dt = dt;
        self.entities.update_all(dt);
    }

    fn render(&mut self) -> u64 {
        let stats = self.stats();
        if let Some(lighting) = self.lighting.as_mut() {
            lighting.clear();
            let half = DEFAULT_ENTITY_SIZE as i32 / 2;
            for e in self.entities.get_all() {
                lighting.add_light(
                    e.x.saturating_add(half),
                    e.y.saturating_add(half),
                    ENTITY_LIGHT_RADIUS,
                    DEFAULT_LIGHT_COLOR,
                );
            }
        }
        self.renderer
            .render(self.entities.get_all(), self.lighting.as_ref(), Some(stats))
    }

    fn frame(&self) -> Option<&Frame> {
        self.renderer.backend().frame()
    }

    fn shutdown(&mut self) -> Vec<EntityId> {
        self.renderer.shutdown();
        let ids = self.entities.clear();
        info!("World shut down, released {} entities.", ids.len());
        ids
    }
}

/// Loads the bundled `World`. Resolves on first poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldLoader {
    lighting: bool,
}

impl WorldLoader {
    pub fn new() -> Self {
        Default::default()
    }

    /// Light every entity with a small point light
    pub fn with_lighting(mut self, enabled: bool) -> Self {
        self.lighting = enabled;
        self
    }
}

impl ModuleLoader for WorldLoader {
    fn load(&self, surface: &RenderSurface, config: &EngineConfig) -> LoadFuture {
        info!(
            "Loading world module for surface '{}' ({}) with {} backend",
            surface.label, surface.size, config.backend
        );
        let config = *config;
        let lighting = self.lighting;
        Box::pin(async move {
            let world = World::new(&config, lighting)?;
            Ok(Box::new(world) as Box<dyn Bridge>)
        })
    }
}
