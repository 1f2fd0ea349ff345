pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod lighting;
pub mod logging;
pub mod plugin;
pub mod render;
pub mod types;
pub mod utils;
pub mod world;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use bridge::{Bridge, ModuleLoader, RenderSurface};
pub use config::{Backend, EngineConfig, EngineConfigPatch};
pub use engine::{Engine, Readiness};
pub use error::EngineError;
pub use events::{EngineEvent, EventKind, HandlerId};
pub use types::{Color, Entity, EntityId, Resolution};
pub use world::WorldLoader;
