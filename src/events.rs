//! The engine's event map: five named callbacks and a synchronous dispatcher.
//!
//! Handlers only ever see the event payload, never the engine, so a handler
//! cannot call back into the engine while it is being dispatched.

use crate::debug_events;
use crate::error::EngineError;
use crate::types::{Entity, EntityId};

/// The fixed set of subscribable events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EntityCreated,
    EntityDestroyed,
    Render,
    Update,
    Error,
}

/// An emitted event together with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    EntityCreated(Entity),
    EntityDestroyed(EntityId),
    Render { frame: u64 },
    Update { delta_time: f32 },
    Error(EngineError),
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::EntityCreated(_) => EventKind::EntityCreated,
            EngineEvent::EntityDestroyed(_) => EventKind::EntityDestroyed,
            EngineEvent::Render { .. } => EventKind::Render,
            EngineEvent::Update { .. } => EventKind::Update,
            EngineEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Token returned by `EventBus::on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&EngineEvent)>;

struct Subscription {
    id: HandlerId,
    kind: EventKind,
    handler: Handler,
}

/// Handlers are invoked in subscription order, once per matching `emit`.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        debug_events!("Subscribed handler {} to {:?}", id.0, kind);
        id
    }

    /// Removes a handler; returns false if it was not subscribed
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&mut self, event: &EngineEvent) {
        let kind = event.kind();
        for sub in self.subscriptions.iter_mut().filter(|s| s.kind == kind) {
            (sub.handler)(event);
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_only_matching_handlers() {
        let mut bus = EventBus::new();
        let updates = Rc::new(RefCell::new(Vec::new()));
        let renders = Rc::new(RefCell::new(0));

        let u = updates.clone();
        bus.on(EventKind::Update, move |e| {
            if let EngineEvent::Update { delta_time } = e {
                u.borrow_mut().push(*delta_time);
            }
        });
        let r = renders.clone();
        bus.on(EventKind::Render, move |_| *r.borrow_mut() += 1);

        bus.emit(&EngineEvent::Update { delta_time: 0.5 });
        bus.emit(&EngineEvent::Update { delta_time: 0.25 });

        assert_eq!(*updates.borrow(), vec![0.5, 0.25]);
        assert_eq!(*renders.borrow(), 0);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 1..=3 {
            let o = order.clone();
            bus.on(EventKind::Render, move |_| o.borrow_mut().push(n));
        }
        bus.emit(&EngineEvent::Render { frame: 1 });
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_off_unsubscribes() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = bus.on(EventKind::EntityDestroyed, move |_| *h.borrow_mut() += 1);
        assert_eq!(bus.handler_count(EventKind::EntityDestroyed), 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&EngineEvent::EntityDestroyed(EntityId::new("e1")));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.handler_count(EventKind::EntityDestroyed), 0);
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(EngineEvent::Error(EngineError::NotReady).kind(), EventKind::Error);
        assert_eq!(
            EngineEvent::EntityDestroyed(EntityId::new("e2")).kind(),
            EventKind::EntityDestroyed
        );
    }
}
