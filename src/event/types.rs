use crate::addon::AddonMeta;
use crate::event::Event;
use crate::player::Player;

#[derive(Debug, Clone)]
pub struct PlayerEvent {
    player: Player,
}

impl PlayerEvent {
    pub fn new(player: Player) -> Self {
        PlayerEvent { player }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }
}

impl Event for PlayerEvent {
    fn name(&self) -> &'static str {
        "PlayerEvent"
    }
}

#[derive(Debug, Clone)]
pub struct PlayerJoinEvent {
    base: PlayerEvent,
}

impl PlayerJoinEvent {
    pub fn new(player: Player) -> Self {
        PlayerJoinEvent { base: PlayerEvent::new(player) }
    }

    pub fn player(&self) -> &Player {
        self.base.player()
    }
}

impl Event for PlayerJoinEvent {
    fn name(&self) -> &'static str {
        "PlayerJoinEvent"
    }

    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.base)
    }
}

#[derive(Debug, Clone)]
pub struct PlayerQuitEvent {
    base: PlayerEvent,
}

impl PlayerQuitEvent {
    pub fn new(player: Player) -> Self {
        PlayerQuitEvent { base: PlayerEvent::new(player) }
    }

    pub fn player(&self) -> &Player {
        self.base.player()
    }
}

impl Event for PlayerQuitEvent {
    fn name(&self) -> &'static str {
        "PlayerQuitEvent"
    }

    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.base)
    }
}

#[derive(Debug, Clone)]
pub struct AddonEvent {
    pub id: String,
    pub name: String,
    pub version: String,
}

impl AddonEvent {
    fn from_meta(meta: &AddonMeta) -> Self {
        AddonEvent {
            id: meta.id.clone(),
            name: meta.name.clone(),
            version: meta.version.clone(),
        }
    }
}

impl Event for AddonEvent {
    fn name(&self) -> &'static str {
        "AddonEvent"
    }
}

#[derive(Debug, Clone)]
pub struct AddonEnableEvent {
    pub addon: AddonEvent,
}

impl AddonEnableEvent {
    pub fn new(meta: &AddonMeta) -> Self {
        AddonEnableEvent { addon: AddonEvent::from_meta(meta) }
    }
}

impl Event for AddonEnableEvent {
    fn name(&self) -> &'static str {
        "AddonEnableEvent"
    }

    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.addon)
    }
}

/// Fired right before an addon is disabled, while its handlers are still bound.
#[derive(Debug, Clone)]
pub struct AddonDisableEvent {
    pub addon: AddonEvent,
}

impl AddonDisableEvent {
    pub fn new(meta: &AddonMeta) -> Self {
        AddonDisableEvent { addon: AddonEvent::from_meta(meta) }
    }
}

impl Event for AddonDisableEvent {
    fn name(&self) -> &'static str {
        "AddonDisableEvent"
    }

    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.addon)
    }
}
