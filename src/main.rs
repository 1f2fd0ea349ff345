use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;
use pixelbridge::config::{self, DEFAULT_INTERNAL_RESOLUTION, DEFAULT_SCREEN_RESOLUTION};
use pixelbridge::logging;
use pixelbridge::plugin::{PhysicsPlugin, Plugin, ScriptingPlugin};
use pixelbridge::{
    Backend, Color as EntityColor, Engine, EngineConfigPatch, EngineEvent, EventKind,
    RenderSurface, Resolution, WorldLoader,
};
use ::rand::Rng;
use std::process;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rendering backend (software, opengl, vulkan)
    #[arg(long, default_value_t = Backend::OpenGl)]
    backend: Backend,

    /// Logical simulation resolution, e.g. 480x270
    #[arg(long, default_value_t = DEFAULT_INTERNAL_RESOLUTION)]
    internal: Resolution,

    /// Physical window resolution, e.g. 1280x720
    #[arg(long, default_value_t = DEFAULT_SCREEN_RESOLUTION)]
    screen: Resolution,

    /// Number of entities spawned at random positions on startup
    #[arg(long, default_value_t = 8)]
    entities: u32,

    /// Light every entity with a point light
    #[arg(long)]
    lighting: bool,

    /// Run the plugin stubs on every entity each frame
    #[arg(long)]
    trace_plugins: bool,

    /// Debug filter to specify log topics (e.g., "bridge,world,render,events")
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: config::WINDOW_TITLE.to_owned(),
        window_width: args.screen.width as i32,
        window_height: args.screen.height as i32,
        window_resizable: true,
        ..Default::default()
    }
}

fn random_color(rng: &mut impl Rng) -> EntityColor {
    EntityColor::new(rng.r#gen(), rng.r#gen(), rng.r#gen())
}

// The software backend renders off-screen; show its frame in the window.
// The texture is kept across frames and only recreated when the size changes.
fn present_software_frame(engine: &mut Engine, texture: &mut Option<Texture2D>) {
    let Some(frame) = engine.frame() else {
        return;
    };
    let (Ok(width), Ok(height)) = (u16::try_from(frame.width), u16::try_from(frame.height)) else {
        return;
    };
    if width == 0 || height == 0 {
        return;
    }

    let reusable = texture
        .as_ref()
        .is_some_and(|tex| tex.width() as u32 == frame.width && tex.height() as u32 == frame.height);
    if let Some(tex) = texture.as_ref().filter(|_| reusable) {
        tex.update_from_bytes(frame.width, frame.height, &frame.pixels);
    } else {
        let tex = Texture2D::from_rgba8(width, height, &frame.pixels);
        tex.set_filter(FilterMode::Nearest);
        *texture = Some(tex);
    }
    let Some(tex) = texture.as_ref() else {
        return;
    };

    draw_texture_ex(
        tex,
        0.0,
        0.0,
        WHITE,
        DrawTextureParams {
            dest_size: Some(vec2(screen_width(), screen_height())),
            ..Default::default()
        },
    );
    for run in &frame.text {
        let c = run.color;
        draw_text(
            &run.text,
            run.x as f32,
            (run.y + config::HUD_FONT_SIZE as i32) as f32,
            config::HUD_FONT_SIZE as f32,
            Color::from_rgba(c.r, c.g, c.b, 255),
        );
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init_logger(logging::parse_level(&args.log_level), args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    info!("Initializing Pixel Bridge...");

    let patch = EngineConfigPatch::default()
        .backend(args.backend)
        .internal_resolution(args.internal)
        .screen_resolution(args.screen);
    let surface = RenderSurface::new(config::WINDOW_TITLE, args.screen);
    let loader = WorldLoader::new().with_lighting(args.lighting);

    let mut engine = match Engine::init(surface, &loader, patch).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start engine: {}", e);
            process::exit(1);
        }
    };

    engine.on(EventKind::EntityCreated, |event| {
        if let EngineEvent::EntityCreated(entity) = event {
            info!("Spawned entity {} at ({}, {})", entity.id, entity.x, entity.y);
        }
    });
    engine.on(EventKind::EntityDestroyed, |event| {
        if let EngineEvent::EntityDestroyed(id) = event {
            info!("Released entity {}", id);
        }
    });

    let mut rng = ::rand::thread_rng();
    let internal = engine.config().internal_resolution;
    let max_x = internal.width.saturating_sub(config::DEFAULT_ENTITY_SIZE).max(1) as i32;
    let max_y = internal.height.saturating_sub(config::DEFAULT_ENTITY_SIZE).max(1) as i32;
    for _ in 0..args.entities {
        let color = random_color(&mut rng);
        engine.create_entity(rng.gen_range(0..max_x), rng.gen_range(0..max_y), color);
    }

    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(PhysicsPlugin), Box::new(ScriptingPlugin)];
    let software = engine.config().backend == Backend::Software;
    let mut frame_texture: Option<Texture2D> = None;

    info!("Starting main loop...");
    engine.start();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        if is_key_pressed(KeyCode::Space) {
            if engine.is_running() {
                engine.stop();
                info!("Simulation paused.");
            } else {
                engine.start();
                info!("Simulation resumed.");
            }
        }
        if is_mouse_button_pressed(MouseButton::Left) {
            let (mx, my) = mouse_position();
            let x = (mx / screen_width() * internal.width as f32) as i32;
            let y = (my / screen_height() * internal.height as f32) as i32;
            let color = random_color(&mut rng);
            engine.create_entity(x, y, color);
        }

        engine.tick(get_frame_time());

        if args.trace_plugins && engine.is_running() {
            for entity in engine.entities() {
                for plugin in &plugins {
                    plugin.on_entity_update(&entity.id);
                }
            }
        }

        if software {
            clear_background(BLACK);
            present_software_frame(&mut engine, &mut frame_texture);
        }

        next_frame().await;
    }

    engine.destroy();
    info!("Exiting Pixel Bridge.");
}
