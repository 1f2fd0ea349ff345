// Browser-facing wrapper around `Engine`, exported through wasm-bindgen.
// The browser build always draws with the software backend; callers blit
// `frame_pixels()` into their canvas.

use crate::bridge::RenderSurface;
use crate::config::{Backend, EngineConfigPatch};
use crate::engine::{Engine, Readiness};
use crate::types::{Color, Resolution, entities_to_json};
use crate::world::WorldLoader;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEngine {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: String,
        internal_width: u32,
        internal_height: u32,
        screen_width: u32,
        screen_height: u32,
    ) -> WasmEngine {
        let screen = Resolution::new(screen_width, screen_height);
        let patch = EngineConfigPatch::default()
            .backend(Backend::Software)
            .internal_resolution(Resolution::new(internal_width, internal_height))
            .screen_resolution(screen);
        let surface = RenderSurface::new(canvas_id, screen);
        WasmEngine {
            engine: Engine::new(surface, &WorldLoader::new(), patch),
        }
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&mut self) -> bool {
        self.engine.poll_ready() == Readiness::Ready
    }

    /// Returns the new entity's id, or `undefined` while loading
    #[wasm_bindgen(js_name = createEntity)]
    pub fn create_entity(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) -> Option<String> {
        self.engine
            .create_entity(x, y, Color::new(r, g, b))
            .map(|e| e.id.to_string())
    }

    /// JSON array of entity snapshots; `[]` while loading
    #[wasm_bindgen(js_name = getEntities)]
    pub fn get_entities(&mut self) -> Result<String, JsError> {
        entities_to_json(&self.engine.entities()).map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn update(&mut self, delta_time: f32) {
        self.engine.update(delta_time);
    }

    pub fn render(&mut self) {
        self.engine.render();
    }

    /// RGBA bytes of the last rendered frame at screen resolution
    #[wasm_bindgen(js_name = framePixels)]
    pub fn frame_pixels(&mut self) -> Vec<u8> {
        self.engine.frame().map(|f| f.pixels.clone()).unwrap_or_default()
    }

    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn tick(&mut self, delta_time: f32) {
        self.engine.tick(delta_time);
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
    }
}
