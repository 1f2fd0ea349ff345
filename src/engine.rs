//! Engine handle: starts the module load and forwards calls to its bridge.
//!
//! Readiness policy: the plain methods (`create_entity`, `entities`, `update`,
//! `render`) degrade silently while the module is not ready, returning `None`
//! or an empty list. The `try_*` variants fail fast with an `EngineError`.
//! Nothing is queued, retried or replayed once the module becomes ready.

use crate::bridge::{Bridge, LoadFuture, ModuleLoader, RenderSurface};
use crate::config::{EngineConfig, EngineConfigPatch};
use crate::debug_bridge;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus, EventKind, HandlerId};
use crate::render::Frame;
use crate::types::{Color, Entity};
use log::{error, info, warn};
use std::future::{self, Future};
use std::task::{Context, Poll, Waker};

/// Observable load state of the engine module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed,
    Destroyed,
}

enum State {
    Pending(LoadFuture),
    Ready(Box<dyn Bridge>),
    Failed(EngineError),
    Destroyed,
}

pub struct Engine {
    surface: RenderSurface,
    config: EngineConfig,
    state: State,
    events: EventBus,
    running: bool,
}

impl Engine {
    /// Starts loading the module and returns immediately
    pub fn new(surface: RenderSurface, loader: &dyn ModuleLoader, patch: EngineConfigPatch) -> Self {
        let config = EngineConfig::default().with_patch(&patch);
        info!(
            "Creating engine on '{}': backend {}, internal {}, screen {}",
            surface.label, config.backend, config.internal_resolution, config.screen_resolution
        );
        let load = loader.load(&surface, &config);
        Engine {
            surface,
            config,
            state: State::Pending(load),
            events: EventBus::new(),
            running: false,
        }
    }

    /// Creates an engine and resolves once its module has loaded or failed
    pub async fn init(
        surface: RenderSurface,
        loader: &dyn ModuleLoader,
        patch: EngineConfigPatch,
    ) -> Result<Self, EngineError> {
        let mut engine = Engine::new(surface, loader, patch);
        future::poll_fn(|cx| engine.poll_load(cx)).await?;
        Ok(engine)
    }

    fn poll_load(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), EngineError>> {
        let polled = match &mut self.state {
            State::Pending(load) => load.as_mut().poll(cx),
            State::Ready(_) => return Poll::Ready(Ok(())),
            State::Failed(err) => return Poll::Ready(Err(err.clone())),
            State::Destroyed => return Poll::Ready(Err(EngineError::Destroyed)),
        };

        match polled {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(bridge)) => {
                info!("Engine module ready on '{}'.", self.surface.label);
                self.state = State::Ready(bridge);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                error!("Engine module failed to load: {}", err);
                self.state = State::Failed(err.clone());
                self.events.emit(&EngineEvent::Error(err.clone()));
                Poll::Ready(Err(err))
            }
        }
    }

    /// Drives a pending load one step without blocking
    pub fn poll_ready(&mut self) -> Readiness {
        let mut cx = Context::from_waker(Waker::noop());
        let _ = self.poll_load(&mut cx);
        self.status()
    }

    pub fn status(&self) -> Readiness {
        match self.state {
            State::Pending(_) => Readiness::Pending,
            State::Ready(_) => Readiness::Ready,
            State::Failed(_) => Readiness::Failed,
            State::Destroyed => Readiness::Destroyed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == Readiness::Ready
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    fn bridge(&mut self) -> Result<&mut dyn Bridge, EngineError> {
        self.poll_ready();
        match &mut self.state {
            State::Ready(bridge) => Ok(bridge.as_mut()),
            State::Pending(_) => Err(EngineError::NotReady),
            State::Failed(err @ EngineError::InitFailed(_)) => Err(err.clone()),
            State::Failed(err) => Err(EngineError::InitFailed(err.to_string())),
            State::Destroyed => Err(EngineError::Destroyed),
        }
    }

    pub fn try_create_entity(&mut self, x: i32, y: i32, color: Color) -> Result<Entity, EngineError> {
        let entity = self.bridge()?.create_entity(x, y, color);
        debug_bridge!("Created entity {} at ({}, {})", entity.id, x, y);
        self.events.emit(&EngineEvent::EntityCreated(entity.clone()));
        Ok(entity)
    }

    /// `None` while the module is not ready
    pub fn create_entity(&mut self, x: i32, y: i32, color: Color) -> Option<Entity> {
        self.try_create_entity(x, y, color)
            .map_err(|e| debug_bridge!("create_entity dropped: {}", e))
            .ok()
    }

    pub fn try_entities(&mut self) -> Result<Vec<Entity>, EngineError> {
        Ok(self.bridge()?.entities())
    }

    /// Empty while the module is not ready
    pub fn entities(&mut self) -> Vec<Entity> {
        self.try_entities().unwrap_or_default()
    }

    pub fn try_update(&mut self, delta_time: f32) -> Result<(), EngineError> {
        self.bridge()?.update(delta_time);
        self.events.emit(&EngineEvent::Update { delta_time });
        Ok(())
    }

    pub fn update(&mut self, delta_time: f32) {
        if let Err(e) = self.try_update(delta_time) {
            debug_bridge!("update dropped: {}", e);
        }
    }

    /// Draws one frame. Never changes entity state.
    pub fn try_render(&mut self) -> Result<u64, EngineError> {
        let frame = self.bridge()?.render();
        self.events.emit(&EngineEvent::Render { frame });
        Ok(frame)
    }

    pub fn render(&mut self) {
        if let Err(e) = self.try_render() {
            debug_bridge!("render dropped: {}", e);
        }
    }

    /// The last presented frame, when the backend keeps one in memory
    pub fn frame(&mut self) -> Option<&Frame> {
        self.bridge().ok()?.frame()
    }

    /// Shuts the module down and reports every released entity. Idempotent.
    pub fn destroy(&mut self) {
        self.running = false;
        match std::mem::replace(&mut self.state, State::Destroyed) {
            State::Ready(mut bridge) => {
                for id in bridge.shutdown() {
                    self.events.emit(&EngineEvent::EntityDestroyed(id));
                }
                info!("Engine on '{}' destroyed.", self.surface.label);
            }
            State::Pending(_) => info!("Engine destroyed before its module finished loading."),
            State::Failed(_) | State::Destroyed => {}
        }
    }

    pub fn start(&mut self) {
        if self.status() == Readiness::Destroyed {
            warn!("Ignoring start on a destroyed engine.");
            return;
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One host frame: advance the load, then update and render while running
    pub fn tick(&mut self, delta_time: f32) {
        self.poll_ready();
        if !self.running {
            return;
        }
        self.update(delta_time);
        self.render();
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.events.on(kind, handler)
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        self.events.off(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::LoadResult;
    use crate::config::Backend;
    use crate::types::{EntityId, Resolution};
    use crate::world::{World, WorldLoader};
    use std::cell::{Cell, RefCell};
    use std::pin::pin;
    use std::rc::Rc;

    /// Loader whose module stays pending until the gate opens
    struct GatedLoader {
        open: Rc<Cell<bool>>,
    }

    impl ModuleLoader for GatedLoader {
        fn load(&self, _surface: &RenderSurface, config: &EngineConfig) -> LoadFuture {
            let open = self.open.clone();
            let config = *config;
            Box::pin(future::poll_fn(move |_| {
                if open.get() {
                    Poll::Ready(World::new(&config, false).map(|w| Box::new(w) as Box<dyn Bridge>))
                } else {
                    Poll::Pending
                }
            }))
        }
    }

    struct FailingLoader;

    impl ModuleLoader for FailingLoader {
        fn load(&self, _surface: &RenderSurface, _config: &EngineConfig) -> LoadFuture {
            Box::pin(async { LoadResult::Err(EngineError::InitFailed("no module".to_string())) })
        }
    }

    fn surface() -> RenderSurface {
        RenderSurface::new("test-canvas", Resolution::new(128, 72))
    }

    fn software() -> EngineConfigPatch {
        EngineConfigPatch::default()
            .backend(Backend::Software)
            .internal_resolution(Resolution::new(64, 36))
            .screen_resolution(Resolution::new(128, 72))
    }

    fn gated_engine() -> (Engine, Rc<Cell<bool>>) {
        let open = Rc::new(Cell::new(false));
        let loader = GatedLoader { open: open.clone() };
        (Engine::new(surface(), &loader, software()), open)
    }

    fn count_events(engine: &mut Engine, kind: EventKind) -> Rc<RefCell<Vec<EngineEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.on(kind, move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        for _ in 0..1000 {
            if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
                return out;
            }
        }
        panic!("future did not resolve");
    }

    #[test]
    fn test_calls_before_ready_degrade() {
        let (mut engine, _open) = gated_engine();
        let created = count_events(&mut engine, EventKind::EntityCreated);

        assert_eq!(engine.status(), Readiness::Pending);
        assert_eq!(engine.create_entity(1, 2, Color::default()), None);
        assert!(engine.entities().is_empty());
        engine.update(0.016);
        engine.render();
        assert!(engine.frame().is_none());
        assert!(created.borrow().is_empty());

        assert_eq!(engine.try_entities(), Err(EngineError::NotReady));
        assert_eq!(engine.try_render(), Err(EngineError::NotReady));
    }

    #[test]
    fn test_calls_before_ready_are_not_replayed() {
        let (mut engine, open) = gated_engine();
        engine.create_entity(1, 2, Color::default());

        open.set(true);
        assert_eq!(engine.poll_ready(), Readiness::Ready);
        assert!(engine.entities().is_empty());

        let entity = engine.create_entity(3, 4, Color::new(9, 9, 9)).unwrap();
        assert_eq!(entity.id.as_str(), "e1");
        assert_eq!(engine.entities(), vec![entity]);
    }

    #[test]
    fn test_entity_created_event_carries_entity() {
        let (mut engine, open) = gated_engine();
        open.set(true);
        let created = count_events(&mut engine, EventKind::EntityCreated);

        let entity = engine.create_entity(5, 6, Color::new(1, 2, 3)).unwrap();
        assert_eq!(*created.borrow(), vec![EngineEvent::EntityCreated(entity)]);
    }

    #[test]
    fn test_render_does_not_mutate_entities() {
        let (mut engine, open) = gated_engine();
        engine.render();

        open.set(true);
        engine.create_entity(10, 10, Color::new(255, 0, 0));
        let before = engine.entities();
        assert_eq!(engine.try_render(), Ok(1));
        assert_eq!(engine.try_render(), Ok(2));
        assert_eq!(engine.entities(), before);
        assert!(engine.frame().is_some());
    }

    #[test]
    fn test_error_callback_not_invoked_in_normal_operation() {
        let (mut engine, open) = gated_engine();
        let errors = count_events(&mut engine, EventKind::Error);

        engine.create_entity(0, 0, Color::default());
        open.set(true);
        engine.start();
        engine.create_entity(1, 1, Color::default());
        engine.tick(0.016);
        engine.entities();
        engine.destroy();

        assert!(errors.borrow().is_empty());
    }

    #[test]
    fn test_failed_load_emits_error_once() {
        let mut engine = Engine::new(surface(), &FailingLoader, software());
        let errors = count_events(&mut engine, EventKind::Error);

        assert_eq!(engine.poll_ready(), Readiness::Failed);
        assert_eq!(engine.poll_ready(), Readiness::Failed);
        assert_eq!(errors.borrow().len(), 1);

        assert_eq!(engine.create_entity(0, 0, Color::default()), None);
        assert!(matches!(engine.try_entities(), Err(EngineError::InitFailed(_))));
        assert_eq!(errors.borrow().len(), 1);
    }

    #[test]
    fn test_failed_load_message_is_not_wrapped_twice() {
        let mut engine = Engine::new(surface(), &FailingLoader, software());
        let err = engine.try_entities().unwrap_err();
        assert_eq!(err, EngineError::InitFailed("no module".to_string()));
        assert_eq!(err.to_string(), "Engine module failed to initialize: no module");
    }

    #[test]
    fn test_load_error_of_other_kind_is_reported_as_init_failure() {
        let loader = WorldLoader::new();
        let patch = software().internal_resolution(Resolution::new(0, 0));
        let mut engine = Engine::new(surface(), &loader, patch);
        assert_eq!(engine.poll_ready(), Readiness::Failed);
        let err = engine.try_render().unwrap_err();
        assert!(matches!(&err, EngineError::InitFailed(msg) if msg.starts_with("Invalid engine configuration")));
    }

    #[test]
    fn test_destroy_reports_each_entity_once() {
        let (mut engine, open) = gated_engine();
        open.set(true);
        engine.create_entity(0, 0, Color::default());
        engine.create_entity(8, 8, Color::default());
        let destroyed = count_events(&mut engine, EventKind::EntityDestroyed);

        engine.destroy();
        engine.destroy();

        assert_eq!(
            *destroyed.borrow(),
            vec![
                EngineEvent::EntityDestroyed(EntityId::new("e1")),
                EngineEvent::EntityDestroyed(EntityId::new("e2")),
            ]
        );
        assert_eq!(engine.status(), Readiness::Destroyed);
        assert_eq!(engine.try_create_entity(0, 0, Color::default()), Err(EngineError::Destroyed));
    }

    #[test]
    fn test_destroy_while_pending_cancels_load() {
        let (mut engine, open) = gated_engine();
        engine.destroy();
        open.set(true);
        assert_eq!(engine.poll_ready(), Readiness::Destroyed);
    }

    #[test]
    fn test_tick_only_runs_while_started() {
        let (mut engine, open) = gated_engine();
        open.set(true);
        let updates = count_events(&mut engine, EventKind::Update);
        let renders = count_events(&mut engine, EventKind::Render);

        engine.tick(0.5);
        assert!(!engine.is_running());
        assert!(updates.borrow().is_empty());

        engine.start();
        engine.tick(0.5);
        assert!(engine.is_running());
        assert_eq!(*updates.borrow(), vec![EngineEvent::Update { delta_time: 0.5 }]);
        assert_eq!(*renders.borrow(), vec![EngineEvent::Render { frame: 1 }]);

        engine.stop();
        engine.tick(0.5);
        assert_eq!(updates.borrow().len(), 1);
    }

    #[test]
    fn test_start_after_destroy_is_ignored() {
        let (mut engine, _open) = gated_engine();
        engine.destroy();
        engine.start();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_off_stops_delivery() {
        let (mut engine, open) = gated_engine();
        open.set(true);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = engine.on(EventKind::Update, move |_| h.set(h.get() + 1));

        engine.update(0.1);
        assert!(engine.off(id));
        engine.update(0.1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_init_factory_resolves_ready_engine() {
        let loader = WorldLoader::new();
        let mut engine = block_on(Engine::init(surface(), &loader, software())).unwrap();
        assert!(engine.is_ready());
        assert_eq!(engine.config().backend, Backend::Software);
        assert!(engine.create_entity(1, 1, Color::default()).is_some());
    }

    #[test]
    fn test_init_factory_reports_load_failure() {
        let loader = WorldLoader::new();
        let patch = software().internal_resolution(Resolution::new(0, 0));
        let result = block_on(Engine::init(surface(), &loader, patch));
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_config_merges_with_defaults() {
        let patch = EngineConfigPatch::default().backend(Backend::Software);
        let loader = GatedLoader {
            open: Rc::new(Cell::new(false)),
        };
        let engine = Engine::new(surface(), &loader, patch);
        assert_eq!(engine.config().backend, Backend::Software);
        assert_eq!(engine.config().internal_resolution, Resolution::new(480, 270));
        assert_eq!(engine.config().screen_resolution, Resolution::new(1280, 720));
    }
}
