//! Window-backed GL backend drawing through macroquad.
//!
//! Requires a live macroquad context, so it is only constructed from the
//! binary's `#[macroquad::main]` entry point.

use super::GraphicsBackend;
use crate::config::{CLEAR_COLOR, HUD_FONT_SIZE};
use crate::error::EngineError;
use crate::lighting::LightMask;
use crate::types::{Color, Resolution};
use log::warn;
use macroquad::miniquad::{BlendFactor, BlendState, BlendValue, Equation, PipelineParams};
use macroquad::prelude as mq;

const LIGHT_VERTEX_SHADER: &str = "#version 100
attribute vec3 position;
attribute vec2 texcoord;
varying lowp vec2 uv;
uniform mat4 Model;
uniform mat4 Projection;
void main() {
    gl_Position = Projection * Model * vec4(position, 1.0);
    uv = texcoord;
}";

const LIGHT_FRAGMENT_SHADER: &str = "#version 100
precision mediump float;
varying lowp vec2 uv;
uniform sampler2D Texture;
void main() {
    gl_FragColor = texture2D(Texture, uv);
}";

fn to_mq(color: Color) -> mq::Color {
    mq::Color::from_rgba(color.r, color.g, color.b, 255)
}

#[derive(Default)]
pub struct MacroquadBackend {
    internal: Resolution,
    light_material: Option<mq::Material>,
    light_texture: Option<mq::Texture2D>,
}

impl MacroquadBackend {
    pub fn new() -> Self {
        Default::default()
    }

    // Logical-to-window scale, recomputed per call so window resizes are honoured
    fn scale(&self) -> (f32, f32) {
        (
            mq::screen_width() / self.internal.width.max(1) as f32,
            mq::screen_height() / self.internal.height.max(1) as f32,
        )
    }
}

impl GraphicsBackend for MacroquadBackend {
    fn name(&self) -> &'static str {
        "opengl"
    }

    fn initialize(&mut self, internal: Resolution, screen: Resolution) -> Result<(), EngineError> {
        super::validate_resolutions(internal, screen)?;
        self.internal = internal;

        // Multiply blend: dst = src * dst
        let multiply_blend = BlendState::new(
            Equation::Add,
            BlendFactor::Value(BlendValue::DestinationColor),
            BlendFactor::Zero,
        );
        let material = mq::load_material(
            mq::ShaderSource::Glsl {
                vertex: LIGHT_VERTEX_SHADER,
                fragment: LIGHT_FRAGMENT_SHADER,
            },
            mq::MaterialParams {
                pipeline_params: PipelineParams {
                    color_blend: Some(multiply_blend),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .map_err(|e| EngineError::InitFailed(format!("light material: {}", e)))?;
        self.light_material = Some(material);
        Ok(())
    }

    fn begin_frame(&mut self) {
        mq::clear_background(to_mq(CLEAR_COLOR));
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let (sx, sy) = self.scale();
        mq::draw_rectangle(
            x as f32 * sx,
            y as f32 * sy,
            width as f32 * sx,
            height as f32 * sy,
            to_mq(color),
        );
    }

    fn apply_lighting(&mut self, mask: &LightMask) {
        if mask.width == 0 || mask.height == 0 {
            return;
        }

        let (Ok(width), Ok(height)) = (u16::try_from(mask.width), u16::try_from(mask.height)) else {
            warn!("Light mask {}x{} is too large for a texture.", mask.width, mask.height);
            return;
        };

        let reusable = self.light_texture.as_ref().is_some_and(|tex| {
            tex.width() as u32 == mask.width && tex.height() as u32 == mask.height
        });
        if let Some(tex) = self.light_texture.as_ref().filter(|_| reusable) {
            tex.update_from_bytes(mask.width, mask.height, &mask.pixels);
        } else {
            let tex = mq::Texture2D::from_rgba8(width, height, &mask.pixels);
            tex.set_filter(mq::FilterMode::Linear);
            self.light_texture = Some(tex);
        }

        let (Some(material), Some(texture)) = (&self.light_material, &self.light_texture) else {
            return;
        };
        mq::gl_use_material(material);
        mq::draw_texture_ex(
            texture,
            0.0,
            0.0,
            mq::WHITE,
            mq::DrawTextureParams {
                dest_size: Some(mq::vec2(mq::screen_width(), mq::screen_height())),
                ..Default::default()
            },
        );
        mq::gl_use_default_material();
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        // HUD text is placed in window pixels, baseline offset by the font size
        mq::draw_text(
            text,
            x as f32,
            (y + HUD_FONT_SIZE as i32) as f32,
            HUD_FONT_SIZE as f32,
            to_mq(color),
        );
    }

    fn end_frame(&mut self) {
        // Presentation happens in the host loop's `next_frame().await`
    }

    fn cleanup(&mut self) {
        self.light_texture = None;
        self.light_material = None;
    }
}
