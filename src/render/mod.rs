// Rendering: backend abstraction, frame pipeline and the status overlay

pub mod software;
pub mod window;

use crate::config::{HUD_LINE_SPACING, HUD_ORIGIN, HUD_TEXT_COLOR, MAX_SURFACE_DIMENSION};
use crate::debug_render;
use crate::error::EngineError;
use crate::lighting::{DynamicLighting, LightMask};
use crate::types::{Color, Entity, Resolution};

pub use software::SoftwareBackend;
pub use window::MacroquadBackend;

/// A text run recorded by backends that cannot rasterize fonts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// A presented frame: RGBA pixels at screen resolution plus its text runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub text: Vec<TextRun>,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Drawing primitives every rendering backend provides.
/// Coordinates are in logical (internal) pixels; backends scale to the screen.
pub trait GraphicsBackend {
    fn name(&self) -> &'static str;

    /// Set up surfaces for the given logical and physical resolutions
    fn initialize(&mut self, internal: Resolution, screen: Resolution) -> Result<(), EngineError>;

    /// Clear the logical surface for a new frame
    fn begin_frame(&mut self);

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color);

    /// Multiply the frame by a light mask
    fn apply_lighting(&mut self, mask: &LightMask);

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color);

    /// Present the frame at screen resolution
    fn end_frame(&mut self);

    /// The last presented frame, for backends that keep one in memory
    fn frame(&self) -> Option<&Frame> {
        None
    }

    /// Release resources
    fn cleanup(&mut self);
}

/// Rejects resolutions no backend can allocate a surface for
pub fn validate_resolutions(internal: Resolution, screen: Resolution) -> Result<(), EngineError> {
    if internal.is_empty() || screen.is_empty() {
        return Err(EngineError::InvalidConfig(format!(
            "resolutions must be non-zero (internal {}, screen {})",
            internal, screen
        )));
    }
    for res in [internal, screen] {
        if res.width > MAX_SURFACE_DIMENSION || res.height > MAX_SURFACE_DIMENSION {
            return Err(EngineError::InvalidConfig(format!(
                "resolution {} exceeds {} pixels per side",
                res, MAX_SURFACE_DIMENSION
            )));
        }
    }
    Ok(())
}

/// Values shown by the status overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub fps: u32,
    pub entities: usize,
}

impl FrameStats {
    pub fn lines(&self) -> [String; 2] {
        [
            format!("FPS: {}", self.fps),
            format!("Entities: {}", self.entities),
        ]
    }
}

pub struct Renderer {
    backend: Box<dyn GraphicsBackend>,
    internal: Resolution,
    screen: Resolution,
    frames_drawn: u64,
}

impl Renderer {
    pub fn new(
        mut backend: Box<dyn GraphicsBackend>,
        internal: Resolution,
        screen: Resolution,
    ) -> Result<Self, EngineError> {
        backend.initialize(internal, screen)?;
        log::info!(
            "Renderer initialized with {} backend ({} -> {}).",
            backend.name(),
            internal,
            screen
        );
        Ok(Renderer {
            backend,
            internal,
            screen,
            frames_drawn: 0,
        })
    }

    /// Draws entities, then lighting, then the overlay. Returns the frame number.
    pub fn render(
        &mut self,
        entities: &[Entity],
        lighting: Option<&DynamicLighting>,
        stats: Option<FrameStats>,
    ) -> u64 {
        self.backend.begin_frame();

        for entity in entities {
            self.backend
                .draw_rect(entity.x, entity.y, entity.width, entity.height, entity.color);
        }

        if let Some(lighting) = lighting {
            self.backend.apply_lighting(lighting.mask());
        }

        if let Some(stats) = stats {
            let (x, mut y) = HUD_ORIGIN;
            for line in stats.lines() {
                self.backend.draw_text(&line, x, y, HUD_TEXT_COLOR);
                y += HUD_LINE_SPACING;
            }
        }

        self.backend.end_frame();
        self.frames_drawn += 1;
        debug_render!(
            "Frame {} drawn with {} entities",
            self.frames_drawn,
            entities.len()
        );
        self.frames_drawn
    }

    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn internal_resolution(&self) -> Resolution {
        self.internal
    }

    pub fn screen_resolution(&self) -> Resolution {
        self.screen
    }

    pub fn shutdown(&mut self) {
        self.backend.cleanup();
    }
}
