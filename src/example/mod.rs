pub mod commands;
pub mod listeners;

use std::cell::{Cell, Ref, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::addon::{Addon, AddonContext, AddonLogger, AddonMeta};
use crate::command::{CommandSender, CommandSpec};
use crate::config;
use crate::error::ConfigError;
use crate::event::Listener;
use crate::util::color::Color;

use self::commands::{InfoCommand, MainCommand};
use self::listeners::{JoinListener, QuitListener};

pub const ID: &str = "example-addon";
const VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExampleConfig {
    /// `{player}` is replaced with the joining player's name.
    pub welcome_message: String,
    pub announce_quits: bool,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        ExampleConfig {
            welcome_message: String::from("&aWelcome {player}! This message is from Example Addon."),
            announce_quits: true,
        }
    }
}

pub struct ExampleState {
    meta: AddonMeta,
    logger: AddonLogger,
    config_path: PathBuf,
    config: RefCell<ExampleConfig>,
    enabled: Cell<bool>,
}

impl ExampleState {
    pub fn meta(&self) -> &AddonMeta {
        &self.meta
    }

    pub fn logger(&self) -> &AddonLogger {
        &self.logger
    }

    pub fn config(&self) -> Ref<'_, ExampleConfig> {
        self.config.borrow()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Re-reads the config from disk, then writes the normalized result back.
    pub fn reload_config(&self) -> Result<(), ConfigError> {
        let fresh: ExampleConfig = config::load_or_create(&self.config_path)?;
        config::save(&self.config_path, &fresh)?;
        *self.config.borrow_mut() = fresh;
        Ok(())
    }

    pub fn reload(&self) -> Result<(), ConfigError> {
        self.reload_config()?;
        self.logger.info("Example addon has been reloaded!");
        Ok(())
    }
}

pub(crate) fn tell(sender: &dyn CommandSender, message: &str) {
    sender.send_message(&message.colored());
}

pub struct ExampleAddon {
    meta: AddonMeta,
    state: Option<Rc<ExampleState>>,
}

impl ExampleAddon {
    pub fn new() -> Self {
        ExampleAddon {
            meta: AddonMeta::new(ID, "Example Addon", VERSION)
                .author("YourName")
                .description("An example addon that demonstrates the API"),
            state: None,
        }
    }

    fn state(&self) -> anyhow::Result<&Rc<ExampleState>> {
        self.state.as_ref().context("example addon used before it was loaded")
    }
}

impl Default for ExampleAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl Addon for ExampleAddon {
    fn meta(&self) -> &AddonMeta {
        &self.meta
    }

    fn on_load(&mut self, ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        ctx.logger().info("Example addon is loading...");

        let config_path = ctx.data_dir().join("config.toml");
        let loaded: ExampleConfig = config::load_or_create(&config_path)?;

        self.state = Some(Rc::new(ExampleState {
            meta: self.meta.clone(),
            logger: ctx.logger().clone(),
            config_path,
            config: RefCell::new(loaded),
            enabled: Cell::new(false),
        }));
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        let state = self.state()?.clone();

        ctx.register_listeners(vec![
            Rc::new(JoinListener::new(state.clone())) as Rc<dyn Listener>,
            Rc::new(QuitListener::new(state.clone())),
        ])?;

        ctx.register_command(
            CommandSpec::from_fn("examplecommand", |sender, args| {
                tell(sender, "&aHello from Example Addon!");
                tell(sender, &format!("&7You passed {} arguments", args.len()));
                if let Some(first) = args.first() {
                    tell(sender, &format!("&7First argument: {}", first));
                }
                Ok(true)
            })
            .description("An example command from the addon")
            .usage("/examplecommand [arg]"),
        )?;

        let info = Rc::new(InfoCommand::new(state.clone()));
        ctx.register_command(
            CommandSpec::new("exampleinfo", info.clone())
                .description("Shows addon information")
                .usage("/exampleinfo [version|author|status]")
                .aliases(["einfo", "exinfo"])
                .completer(info),
        )?;

        let main = Rc::new(MainCommand::new(state.clone()));
        ctx.register_command(
            CommandSpec::new("example", main.clone())
                .description("Example addon commands")
                .usage("/example help")
                .alias("ex")
                .completer(main),
        )?;

        state.enabled.set(true);
        ctx.logger().info("Example addon has been enabled!");
        Ok(())
    }

    fn on_disable(&mut self, ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        if let Some(state) = &self.state {
            state.enabled.set(false);
        }
        ctx.logger().info("Example addon has been disabled!");
        Ok(())
    }

    fn on_reload(&mut self, _ctx: &mut AddonContext<'_>) -> anyhow::Result<()> {
        self.state()?.reload()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state_in(dir: &std::path::Path) -> Rc<ExampleState> {
        Rc::new(ExampleState {
            meta: ExampleAddon::new().meta,
            logger: AddonLogger::new(ID),
            config_path: dir.join("config.toml"),
            config: RefCell::new(ExampleConfig::default()),
            enabled: Cell::new(true),
        })
    }

    #[test]
    fn reload_reads_then_normalizes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::write(dir.path().join("config.toml"), "welcome_message = \"hi {player}\"\n").unwrap();

        state.reload_config().unwrap();
        assert_eq!(state.config().welcome_message, "hi {player}");
        assert!(state.config().announce_quits);

        let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
        assert!(written.contains("announce_quits = true"));
    }

    #[test]
    fn broken_config_keeps_the_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::write(dir.path().join("config.toml"), "announce_quits = \"maybe\"").unwrap();

        assert!(state.reload_config().is_err());
        assert_eq!(*state.config(), ExampleConfig::default());
    }
}
