//! Configuration constants and the engine configuration surface.

use crate::error::ParseError;
use crate::types::{Color, Resolution};
use std::fmt;
use std::str::FromStr;

// Entities
pub const DEFAULT_ENTITY_SIZE: u32 = 16; // Width and height of a freshly created entity
pub const DEFAULT_ENTITY_COLOR: Color = Color::new(0, 255, 0);

// Resolutions
pub const DEFAULT_INTERNAL_RESOLUTION: Resolution = Resolution::new(480, 270); // Logical simulation space
pub const DEFAULT_SCREEN_RESOLUTION: Resolution = Resolution::new(1280, 720); // Physical display
pub const MAX_SURFACE_DIMENSION: u32 = u16::MAX as u32; // Largest texture side macroquad accepts

// Rendering configuration
pub const CLEAR_COLOR: Color = Color::new(20, 20, 25);
pub const AMBIENT_LIGHT: Color = Color::new(30, 30, 50);
pub const DEFAULT_LIGHT_COLOR: Color = Color::new(255, 200, 100);
pub const LIGHT_MAX_ALPHA: f32 = 150.0; // Alpha at the center of a light
pub const LIGHT_RING_STEP: usize = 2; // Radius step between falloff rings
pub const WINDOW_TITLE: &str = "Pixel Bridge";

// Status overlay
pub const HUD_TEXT_COLOR: Color = Color::new(255, 255, 255);
pub const HUD_ORIGIN: (i32, i32) = (10, 10);
pub const HUD_LINE_SPACING: i32 = 25;
pub const HUD_FONT_SIZE: u16 = 18;

/// Named rendering strategy chosen at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// CPU framebuffer, scaled to the screen resolution on present
    Software,
    /// Window-backed GL drawing through macroquad
    #[default]
    OpenGl,
    /// Declared but not implemented; loaders fall back to `OpenGl`
    Vulkan,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Software, Backend::OpenGl, Backend::Vulkan];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Software => "software",
            Backend::OpenGl => "opengl",
            Backend::Vulkan => "vulkan",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "software" => Ok(Backend::Software),
            "opengl" => Ok(Backend::OpenGl),
            "vulkan" => Ok(Backend::Vulkan),
            _ => Err(ParseError::UnknownBackend(s.to_string())),
        }
    }
}

/// Engine configuration. Purely descriptive: backends validate what they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub backend: Backend,
    pub internal_resolution: Resolution,
    pub screen_resolution: Resolution,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            backend: Backend::default(),
            internal_resolution: DEFAULT_INTERNAL_RESOLUTION,
            screen_resolution: DEFAULT_SCREEN_RESOLUTION,
        }
    }
}

impl EngineConfig {
    /// Overlays every field present in `patch` onto this config
    pub fn with_patch(mut self, patch: &EngineConfigPatch) -> Self {
        if let Some(backend) = patch.backend {
            self.backend = backend;
        }
        if let Some(res) = patch.internal_resolution {
            self.internal_resolution = res;
        }
        if let Some(res) = patch.screen_resolution {
            self.screen_resolution = res;
        }
        self
    }
}

/// Partial configuration supplied at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfigPatch {
    pub backend: Option<Backend>,
    pub internal_resolution: Option<Resolution>,
    pub screen_resolution: Option<Resolution>,
}

impl EngineConfigPatch {
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn internal_resolution(mut self, res: Resolution) -> Self {
        self.internal_resolution = Some(res);
        self
    }

    pub fn screen_resolution(mut self, res: Resolution) -> Self {
        self.screen_resolution = Some(res);
        self
    }
}
