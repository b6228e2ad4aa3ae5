use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::command::{CommandHandle, CommandRegistry, CommandSpec};
use crate::error::AddonError;
use crate::event::{Event, EventRegistry, Listener};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddonMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl AddonMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        AddonMeta {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            authors: Vec::new(),
            description: String::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Parses an `addon.toml` descriptor.
    pub fn from_toml(raw: &str) -> Result<AddonMeta, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonState {
    Unloaded,
    Loaded,
    Enabled,
    Disabled,
}

impl fmt::Display for AddonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddonState::Unloaded => "unloaded",
            AddonState::Loaded => "loaded",
            AddonState::Enabled => "enabled",
            AddonState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct AddonLogger {
    id: Rc<str>,
}

impl AddonLogger {
    pub fn new(id: &str) -> Self {
        AddonLogger { id: Rc::from(id) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn info(&self, message: impl fmt::Display) {
        info!("[{}] {}", self.id, message)
    }

    pub fn warn(&self, message: impl fmt::Display) {
        warn!("[{}] {}", self.id, message)
    }

    pub fn error(&self, message: impl fmt::Display) {
        error!("[{}] {}", self.id, message)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        debug!("[{}] {}", self.id, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Enabling,
    Reloading,
    Disabling,
}

pub struct AddonContext<'a> {
    meta: &'a AddonMeta,
    phase: Phase,
    logger: AddonLogger,
    data_dir: PathBuf,
    commands: &'a mut CommandRegistry,
    events: &'a mut EventRegistry,
}

impl<'a> AddonContext<'a> {
    pub fn new(
        meta: &'a AddonMeta,
        phase: Phase,
        addons_dir: &Path,
        commands: &'a mut CommandRegistry,
        events: &'a mut EventRegistry,
    ) -> Self {
        AddonContext {
            meta,
            phase,
            logger: AddonLogger::new(&meta.id),
            data_dir: addons_dir.join(&meta.id),
            commands,
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn meta(&self) -> &AddonMeta {
        self.meta
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn logger(&self) -> &AddonLogger {
        &self.logger
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ensure_enabling(&self) -> Result<(), AddonError> {
        if self.phase == Phase::Enabling {
            Ok(())
        } else {
            Err(AddonError::RegistrationClosed(self.meta.id.clone()))
        }
    }

    pub fn register_command(&mut self, spec: CommandSpec) -> Result<CommandHandle, AddonError> {
        self.ensure_enabling()?;
        self.commands.register(&self.meta.id, spec)
    }

    pub fn register_listeners(&mut self, listeners: Vec<Rc<dyn Listener>>) -> Result<usize, AddonError> {
        self.ensure_enabling()?;
        Ok(self.events.register_all(&self.meta.id, listeners))
    }

    pub fn register_handler<E, F>(&mut self, handler: F) -> Result<(), AddonError>
    where
        E: Event,
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        self.ensure_enabling()?;
        self.events.register(&self.meta.id, handler);
        Ok(())
    }
}

pub trait Addon {
    fn meta(&self) -> &AddonMeta;

    fn on_load(&mut self, _ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut AddonContext<'_>) -> anyhow::Result<()>;

    fn on_disable(&mut self, _ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_reload(&mut self, _ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(
        meta: &'a AddonMeta,
        phase: Phase,
        commands: &'a mut CommandRegistry,
        events: &'a mut EventRegistry,
    ) -> AddonContext<'a> {
        AddonContext::new(meta, phase, Path::new("addons"), commands, events)
    }

    #[test]
    fn descriptor_fills_optional_fields() {
        let meta = AddonMeta::from_toml(
            r#"
            id = "economy"
            name = "Economy"
            version = "2.1.0"
            dependencies = ["storage"]
            "#,
        )
        .unwrap();

        assert_eq!(meta, AddonMeta::new("economy", "Economy", "2.1.0").depends_on("storage"));
    }

    #[test]
    fn descriptor_requires_an_id() {
        assert!(AddonMeta::from_toml("name = \"x\"\nversion = \"1\"").is_err());
    }

    #[test]
    fn registration_is_only_open_while_enabling() {
        let meta = AddonMeta::new("demo", "Demo", "1.0.0");
        let mut commands = CommandRegistry::new();
        let mut events = EventRegistry::new();

        for phase in [Phase::Loading, Phase::Reloading, Phase::Disabling] {
            let mut ctx = context(&meta, phase, &mut commands, &mut events);
            assert_eq!(ctx.phase(), phase);
            let result = ctx.register_command(CommandSpec::from_fn("demo", |_, _| Ok(true)));
            assert!(matches!(result, Err(AddonError::RegistrationClosed(id)) if id == "demo"));
            assert!(ctx.register_listeners(Vec::new()).is_err());
        }
        assert!(commands.is_empty());

        let mut ctx = context(&meta, Phase::Enabling, &mut commands, &mut events);
        ctx.register_command(CommandSpec::from_fn("demo", |_, _| Ok(true))).unwrap();
        assert_eq!(ctx.data_dir(), Path::new("addons").join("demo"));
        assert_eq!(commands.owner_of("demo"), Some("demo"));
    }

    #[test]
    fn states_print_lowercase() {
        assert_eq!(AddonState::Enabled.to_string(), "enabled");
    }
}
