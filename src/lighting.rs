//! Dynamic 2D lighting: an RGBA mask that backends multiply over the frame.

use crate::config::{AMBIENT_LIGHT, LIGHT_MAX_ALPHA, LIGHT_RING_STEP};
use crate::types::{Color, Resolution};
use crate::utils;

/// RGBA light mask at logical resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightMask {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LightMask {
    fn new(res: Resolution) -> Self {
        LightMask {
            width: res.width,
            height: res.height,
            pixels: vec![0; res.pixel_count() * 4],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub x: i32,
    pub y: i32,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct DynamicLighting {
    mask: LightMask,
    lights: Vec<PointLight>,
}

impl DynamicLighting {
    pub fn new(res: Resolution) -> Self {
        let mut lighting = DynamicLighting {
            mask: LightMask::new(res),
            lights: Vec::new(),
        };
        lighting.clear();
        lighting
    }

    /// Resets the mask to opaque ambient light and forgets all lights
    pub fn clear(&mut self) {
        for px in self.mask.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[AMBIENT_LIGHT.r, AMBIENT_LIGHT.g, AMBIENT_LIGHT.b, 255]);
        }
        self.lights.clear();
    }

    /// Adds a light with a stepped radial falloff, brightest at the center
    pub fn add_light(&mut self, x: i32, y: i32, radius: u32, color: Color) {
        self.lights.push(PointLight {
            x,
            y,
            radius,
            color,
        });
        if radius == 0 {
            return;
        }

        // Entity positions span the whole i32 range, so bounds are computed in i64
        let (cx, cy, r) = (x as i64, y as i64, radius as i64);
        let (w, h) = (self.mask.width as i64, self.mask.height as i64);
        for py in (cy - r).max(0)..(cy + r + 1).min(h) {
            for px in (cx - r).max(0)..(cx + r + 1).min(w) {
                let (dx, dy) = ((px - cx) as f64, (py - cy) as f64);
                let dist = (dx * dx + dy * dy).sqrt() as f32;
                if dist > radius as f32 {
                    continue;
                }
                let alpha = ring_alpha(dist, radius);
                let i = (py as usize * self.mask.width as usize + px as usize) * 4;
                let pixels = &mut self.mask.pixels;
                pixels[i] = utils::add_channel(pixels[i], color.r, alpha);
                pixels[i + 1] = utils::add_channel(pixels[i + 1], color.g, alpha);
                pixels[i + 2] = utils::add_channel(pixels[i + 2], color.b, alpha);
            }
        }
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn mask(&self) -> &LightMask {
        &self.mask
    }
}

/// Alpha of the innermost falloff ring that still covers `dist`
fn ring_alpha(dist: f32, radius: u32) -> u8 {
    let step = LIGHT_RING_STEP as u32;
    let covering = ((radius as f32 - dist) / step as f32).floor() as u32;
    let k = covering.min((radius - 1) / step);
    let ring = radius - k * step;
    let t = ring as f32 / radius as f32;
    utils::clamp(utils::lerp(LIGHT_MAX_ALPHA, 0.0, t), 0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_fills_ambient() {
        let lighting = DynamicLighting::new(Resolution::new(4, 3));
        assert_eq!(lighting.mask().pixels.len(), 4 * 3 * 4);
        assert_eq!(
            lighting.mask().get(3, 2),
            Some([AMBIENT_LIGHT.r, AMBIENT_LIGHT.g, AMBIENT_LIGHT.b, 255])
        );
        assert_eq!(lighting.mask().get(4, 0), None);
    }

    #[test]
    fn test_ring_alpha_falls_off() {
        // Outermost ring is fully transparent, inner rings get brighter
        assert_eq!(ring_alpha(10.0, 10), 0);
        assert!(ring_alpha(5.0, 10) > ring_alpha(9.0, 10));
        assert!(ring_alpha(0.0, 10) > ring_alpha(5.0, 10));
        assert!(ring_alpha(0.0, 10) <= LIGHT_MAX_ALPHA as u8);
    }

    #[test]
    fn test_add_light_brightens_center_only() {
        let mut lighting = DynamicLighting::new(Resolution::new(32, 32));
        lighting.add_light(8, 8, 6, Color::new(255, 200, 100));

        let center = lighting.mask().get(8, 8).unwrap();
        let far = lighting.mask().get(30, 30).unwrap();
        assert!(center[0] > AMBIENT_LIGHT.r);
        assert_eq!(far, [AMBIENT_LIGHT.r, AMBIENT_LIGHT.g, AMBIENT_LIGHT.b, 255]);
        assert_eq!(lighting.lights().len(), 1);
    }

    #[test]
    fn test_light_partially_off_mask_is_clipped() {
        let mut lighting = DynamicLighting::new(Resolution::new(8, 8));
        lighting.add_light(-2, -2, 5, Color::new(255, 255, 255));
        assert!(lighting.mask().get(0, 0).unwrap()[0] > AMBIENT_LIGHT.r);

        lighting.clear();
        assert!(lighting.lights().is_empty());
        assert_eq!(lighting.mask().get(0, 0).unwrap()[0], AMBIENT_LIGHT.r);
    }

    #[test]
    fn test_light_at_extreme_coordinates_is_skipped() {
        let mut lighting = DynamicLighting::new(Resolution::new(8, 8));
        lighting.add_light(i32::MAX, i32::MAX, 24, Color::new(255, 255, 255));
        lighting.add_light(i32::MIN, 0, 24, Color::new(255, 255, 255));
        assert_eq!(
            lighting.mask().get(7, 7),
            Some([AMBIENT_LIGHT.r, AMBIENT_LIGHT.g, AMBIENT_LIGHT.b, 255])
        );

        // A radius wide enough to reach the mask from far away still clips cleanly
        lighting.add_light(i32::MIN, i32::MIN, u32::MAX, Color::new(255, 255, 255));
        assert_eq!(lighting.lights().len(), 3);
    }
}
