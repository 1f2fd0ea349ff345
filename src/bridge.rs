// Bridge contract between the engine handle and a loaded engine module

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::render::Frame;
use crate::types::{Color, Entity, EntityId, Resolution};
use std::future::Future;
use std::pin::Pin;

/// The rendering target an engine module is instantiated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSurface {
    /// Host-side name of the target (window title, canvas element id)
    pub label: String,
    pub size: Resolution,
}

impl RenderSurface {
    pub fn new(label: impl Into<String>, size: Resolution) -> Self {
        RenderSurface {
            label: label.into(),
            size,
        }
    }
}

/// The in-process object an engine module exposes once it has loaded.
/// All entity state lives behind this trait.
pub trait Bridge {
    fn create_entity(&mut self, x: i32, y: i32, color: Color) -> Entity;

    fn entities(&self) -> Vec<Entity>;

    /// Advance the simulation by `dt` seconds
    fn update(&mut self, dt: f32);

    /// Draw one frame; must not change entity state. Returns the frame number.
    fn render(&mut self) -> u64;

    /// The last presented frame, if the active backend keeps one in memory
    fn frame(&self) -> Option<&Frame> {
        None
    }

    /// Release the module. Returns the ids of the entities that were dropped.
    fn shutdown(&mut self) -> Vec<EntityId>;
}

/// Outcome of loading an engine module
pub type LoadResult = Result<Box<dyn Bridge>, EngineError>;

/// A pending module load
pub type LoadFuture = Pin<Box<dyn Future<Output = LoadResult>>>;

/// Something that can asynchronously instantiate an engine module
pub trait ModuleLoader {
    fn load(&self, surface: &RenderSurface, config: &EngineConfig) -> LoadFuture;
}
