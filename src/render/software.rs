//! CPU framebuffer backend. Draws at logical resolution and presents a
//! nearest-neighbour scaled copy at screen resolution.

use super::{Frame, GraphicsBackend, TextRun};
use crate::config::CLEAR_COLOR;
use crate::error::EngineError;
use crate::lighting::LightMask;
use crate::types::{Color, Resolution};
use crate::utils;

#[derive(Debug, Default)]
pub struct SoftwareBackend {
    internal: Resolution,
    screen: Resolution,
    surface: Vec<u8>,
    text: Vec<TextRun>,
    presented: Frame,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Default::default()
    }

    fn fill(&mut self, color: Color) {
        for px in self.surface.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn initialize(&mut self, internal: Resolution, screen: Resolution) -> Result<(), EngineError> {
        super::validate_resolutions(internal, screen)?;
        self.internal = internal;
        self.screen = screen;
        self.surface = vec![0; internal.pixel_count() * 4];
        self.presented = Frame {
            width: screen.width,
            height: screen.height,
            pixels: vec![0; screen.pixel_count() * 4],
            text: Vec::new(),
        };
        self.fill(CLEAR_COLOR);
        Ok(())
    }

    fn begin_frame(&mut self) {
        self.fill(CLEAR_COLOR);
        self.text.clear();
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let (w, h) = (self.internal.width as i64, self.internal.height as i64);
        let x0 = utils::clamp(x as i64, 0, w);
        let y0 = utils::clamp(y as i64, 0, h);
        let x1 = utils::clamp(x as i64 + width as i64, 0, w);
        let y1 = utils::clamp(y as i64 + height as i64, 0, h);

        for py in y0..y1 {
            let row = py as usize * self.internal.width as usize;
            for px in x0..x1 {
                let i = (row + px as usize) * 4;
                self.surface[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
            }
        }
    }

    fn apply_lighting(&mut self, mask: &LightMask) {
        if mask.width == 0 || mask.height == 0 {
            return;
        }
        for py in 0..self.internal.height {
            let my = utils::nearest_source_index(py, mask.height, self.internal.height);
            for px in 0..self.internal.width {
                let mx = utils::nearest_source_index(px, mask.width, self.internal.width);
                let Some(light) = mask.get(mx, my) else {
                    continue;
                };
                let i = (py as usize * self.internal.width as usize + px as usize) * 4;
                for c in 0..3 {
                    self.surface[i + c] = utils::multiply_channel(self.surface[i + c], light[c]);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        self.text.push(TextRun {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn end_frame(&mut self) {
        let (iw, ih) = (self.internal.width, self.internal.height);
        let (sw, sh) = (self.screen.width, self.screen.height);
        if iw == 0 || ih == 0 || sw == 0 || sh == 0 {
            return;
        }
        for sy in 0..sh {
            let src_row = utils::nearest_source_index(sy, ih, sh) as usize * iw as usize;
            for sx in 0..sw {
                let src = (src_row + utils::nearest_source_index(sx, iw, sw) as usize) * 4;
                let dst = (sy as usize * sw as usize + sx as usize) * 4;
                self.presented.pixels[dst..dst + 4].copy_from_slice(&self.surface[src..src + 4]);
            }
        }
        self.presented.text = self.text.clone();
    }

    fn frame(&self) -> Option<&Frame> {
        Some(&self.presented)
    }

    fn cleanup(&mut self) {
        self.internal = Resolution::default();
        self.screen = Resolution::default();
        self.surface = Vec::new();
        self.text.clear();
        self.presented = Frame::default();
    }
}
