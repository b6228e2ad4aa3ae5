pub mod types;

use std::any::{Any, TypeId};
use std::rc::Rc;

use log::{debug, error};

use crate::error::{guard, AddonError};

pub use types::*;

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub trait Event: AsAny {
    fn name(&self) -> &'static str;

    /// The more general event this one extends, if any.
    fn parent(&self) -> Option<&dyn Event> {
        None
    }
}

type ErasedHandler = Box<dyn Fn(&dyn Any) -> anyhow::Result<()>>;

struct Binding {
    owner: String,
    event_type: TypeId,
    event_name: &'static str,
    handler: ErasedHandler,
}

#[derive(Default)]
pub struct HandlerList {
    entries: Vec<(TypeId, &'static str, ErasedHandler)>,
}

impl HandlerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<E, F>(&mut self, handler: F) -> &mut Self
    where
        E: Event,
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        let erased: ErasedHandler = Box::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => handler(event),
            None => Ok(()),
        });
        self.entries.push((TypeId::of::<E>(), short_name::<E>(), erased));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn short_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

pub trait Listener {
    fn subscribe(self: Rc<Self>, handlers: &mut HandlerList);
}

#[derive(Default)]
pub struct EventRegistry {
    bindings: Vec<Binding>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_all(&mut self, owner: &str, listeners: Vec<Rc<dyn Listener>>) -> usize {
        let mut handlers = HandlerList::new();
        for listener in listeners {
            listener.subscribe(&mut handlers);
        }
        self.bind(owner, handlers)
    }

    pub fn register<E, F>(&mut self, owner: &str, handler: F)
    where
        E: Event,
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        let mut handlers = HandlerList::new();
        handlers.on(handler);
        self.bind(owner, handlers);
    }

    fn bind(&mut self, owner: &str, handlers: HandlerList) -> usize {
        let count = handlers.entries.len();
        for (event_type, event_name, handler) in handlers.entries {
            debug!("[{}] Listening for {}.", owner, event_name);
            self.bindings.push(Binding {
                owner: owner.to_owned(),
                event_type,
                event_name,
                handler,
            });
        }
        count
    }

    pub fn unregister_all(&mut self, owner: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.owner != owner);
        before - self.bindings.len()
    }

    /// Delivers `event` synchronously, in registration order. A failing
    /// handler is logged and skipped. Returns how many handlers succeeded.
    pub fn dispatch(&self, event: &dyn Event) -> usize {
        let mut views: Vec<(TypeId, &dyn Any)> = Vec::new();
        let mut current = Some(event);
        while let Some(view) = current {
            let any = view.as_any();
            views.push((any.type_id(), any));
            current = view.parent();
        }

        let mut delivered = 0;
        for binding in &self.bindings {
            let view = match views.iter().find(|(ty, _)| *ty == binding.event_type) {
                Some((_, view)) => *view,
                None => continue,
            };

            match guard(|| (binding.handler)(view)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    let context = if binding.event_name == event.name() {
                        format!("handler for {}", event.name())
                    } else {
                        format!("handler for {} (as {})", event.name(), binding.event_name)
                    };
                    error!("{}", AddonError::handler(&binding.owner, context, e));
                }
            }
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn owned_by(&self, owner: &str) -> usize {
        self.bindings.iter().filter(|binding| binding.owner == owner).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl Listener for Recorder {
        fn subscribe(self: Rc<Self>, handlers: &mut HandlerList) {
            let join = self.clone();
            handlers.on(move |event: &PlayerJoinEvent| {
                join.seen.borrow_mut().push(format!("join {}", event.player().get_name()));
                Ok(())
            });
            handlers.on(move |event: &PlayerEvent| {
                self.seen.borrow_mut().push(format!("player {}", event.player().get_name()));
                Ok(())
            });
        }
    }

    use crate::command::CommandSender;

    #[test]
    fn supertype_handlers_see_subtype_events() {
        let recorder = Rc::new(Recorder::default());
        let mut registry = EventRegistry::new();
        assert_eq!(registry.register_all("demo", vec![recorder.clone() as Rc<dyn Listener>]), 2);

        let delivered = registry.dispatch(&PlayerJoinEvent::new(Player::new("Steve")));
        assert_eq!(delivered, 2);
        assert_eq!(recorder.seen.borrow().as_slice(), ["join Steve", "player Steve"]);

        recorder.seen.borrow_mut().clear();
        registry.dispatch(&PlayerQuitEvent::new(Player::new("Alex")));
        assert_eq!(recorder.seen.borrow().as_slice(), ["player Alex"]);
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();

        let first = order.clone();
        registry.register("a", move |_: &PlayerJoinEvent| {
            first.borrow_mut().push("a");
            anyhow::bail!("broken")
        });
        registry.register("b", |_: &PlayerJoinEvent| -> anyhow::Result<()> { panic!("worse") });
        let last = order.clone();
        registry.register("c", move |_: &PlayerJoinEvent| {
            last.borrow_mut().push("c");
            Ok(())
        });

        assert_eq!(registry.dispatch(&PlayerJoinEvent::new(Player::new("Steve"))), 1);
        assert_eq!(order.borrow().as_slice(), ["a", "c"]);
    }

    #[test]
    fn unregister_all_removes_only_the_owner() {
        let mut registry = EventRegistry::new();
        registry.register("a", |_: &PlayerJoinEvent| Ok(()));
        registry.register("a", |_: &PlayerQuitEvent| Ok(()));
        registry.register("b", |_: &PlayerJoinEvent| Ok(()));

        assert_eq!(registry.unregister_all("a"), 2);
        assert_eq!(registry.owned_by("a"), 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.unregister_all("a"), 0);
    }

    #[test]
    fn handler_names_are_short() {
        assert_eq!(short_name::<PlayerJoinEvent>(), "PlayerJoinEvent");
    }
}
