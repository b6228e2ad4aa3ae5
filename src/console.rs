use std::collections::HashMap;

use log::{info, warn};

use crate::addon::AddonState;
use crate::command::CommandSender;
use crate::config::HostConfig;
use crate::error::AddonError;
use crate::event::{PlayerJoinEvent, PlayerQuitEvent};
use crate::lifecycle::LifecycleController;
use crate::player::{ConsoleSender, Player};
use crate::util::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

const HOST_HELP: &[&str] = &[
    "  addons - List addons and their state",
    "  as <player> <command> [args] - Run a command as an online player",
    "  complete <command> [args] - Show tab completions",
    "  disable <addon> - Disable an addon and its dependents",
    "  enable <addon> - Enable an addon",
    "  join <player> [op] - Simulate a player joining",
    "  leave <player> - Simulate a player leaving",
    "  reload <addon> - Reload an addon",
    "  stop - Shut down",
];

pub struct Console {
    controller: LifecycleController,
    config: HostConfig,
    players: HashMap<String, Player>,
}

impl Console {
    pub fn new(controller: LifecycleController, config: HostConfig) -> Self {
        Console {
            controller,
            config,
            players: HashMap::new(),
        }
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(&name.to_lowercase())
    }

    pub fn handle_line(&mut self, line: &str) -> Control {
        let mut words = line.split_ascii_whitespace();
        let label = match words.next() {
            Some(label) => label.trim_start_matches('/'),
            None => return Control::Continue,
        };
        let mut args: Vec<String> = words.map(String::from).collect();
        let sender = ConsoleSender;

        match label.to_lowercase().as_str() {
            "stop" => {
                sender.send_message("Stopping..");
                return Control::Stop;
            }
            "help" => {
                sender.send_message("Host commands:");
                for line in HOST_HELP {
                    sender.send_message(line);
                }
                sender.send_message("Addon commands:");
                for line in self.controller.commands().help_lines() {
                    sender.send_message(&line);
                }
            }
            "addons" => {
                for (meta, state) in self.controller.addons() {
                    sender.send_message(&format!("{} ({}) v{} - {}", meta.name, meta.id, meta.version, state));
                }
            }
            "reload" => self.with_addon(&sender, &args, |controller, id| controller.reload(id)),
            "enable" => self.with_addon(&sender, &args, |controller, id| controller.enable(id)),
            "disable" => self.with_addon(&sender, &args, |controller, id| controller.disable(id)),
            "join" => self.join(&sender, &args),
            "leave" => self.leave(&sender, &args),
            "complete" => {
                if line.ends_with(char::is_whitespace) {
                    args.push(String::new());
                }
                if args.is_empty() {
                    sender.send_message("Usage: complete <command> [args]");
                } else {
                    let candidates = self.controller.complete(&args[0], &sender, &args[1..]);
                    sender.send_message(&candidates.join(", "));
                }
            }
            "as" => match args.split_first() {
                Some((name, rest)) if !rest.is_empty() => match self.player(name) {
                    Some(player) => self.dispatch(player, &rest[0], &rest[1..]),
                    None => sender.send_message(&format!("{} is not online.", name)),
                },
                _ => sender.send_message("Usage: as <player> <command> [args]"),
            },
            _ => self.dispatch(&sender, label, &args),
        }

        Control::Continue
    }

    fn dispatch(&self, sender: &dyn CommandSender, label: &str, args: &[String]) {
        let label = label.trim_start_matches('/');
        match self.controller.dispatch_command(label, sender, args) {
            Ok(_) => {}
            Err(AddonError::UnknownCommand(_)) => sender.send_message(&self.config.unknown_command_message.colored()),
            Err(e) => warn!("{}", e),
        }
    }

    fn with_addon<F>(&mut self, sender: &dyn CommandSender, args: &[String], action: F)
    where
        F: FnOnce(&mut LifecycleController, &str) -> Result<(), AddonError>,
    {
        let id = match args.first() {
            Some(id) => id.as_str(),
            None => {
                sender.send_message("Usage: <enable|disable|reload> <addon>");
                return;
            }
        };

        match action(&mut self.controller, id) {
            Ok(()) => {
                let state = self.controller.state(id).unwrap_or(AddonState::Unloaded);
                sender.send_message(&format!("{} is {}.", id, state));
            }
            Err(e) => sender.send_message(&e.to_string()),
        }
    }

    fn join(&mut self, sender: &dyn CommandSender, args: &[String]) {
        let name = match args.first() {
            Some(name) => name,
            None => return sender.send_message("Usage: join <player> [op]"),
        };
        let key = name.to_lowercase();
        if self.players.contains_key(&key) {
            return sender.send_message(&format!("{} is already online.", name));
        }

        let operator = args.get(1).map_or(false, |flag| flag.eq_ignore_ascii_case("op"));
        let player = Player::new(name.as_str()).operator(operator);
        if player.is_operator() {
            info!("{} ({}) joined the game as an operator.", player.get_name(), player.uuid());
        } else {
            info!("{} ({}) joined the game.", player.get_name(), player.uuid());
        }

        self.controller.fire(&PlayerJoinEvent::new(player.clone()));
        self.players.insert(key, player);
    }

    fn leave(&mut self, sender: &dyn CommandSender, args: &[String]) {
        let name = match args.first() {
            Some(name) => name,
            None => return sender.send_message("Usage: leave <player>"),
        };

        match self.players.remove(&name.to_lowercase()) {
            Some(player) => {
                info!("{} left the game.", player.get_name());
                self.controller.fire(&PlayerQuitEvent::new(player));
            }
            None => sender.send_message(&format!("{} is not online.", name)),
        }
    }

    pub fn shutdown(&mut self) {
        let errors = self.controller.unload_all();
        if !errors.is_empty() {
            warn!("{} addon(s) did not shut down cleanly.", errors.len());
        }
    }
}
