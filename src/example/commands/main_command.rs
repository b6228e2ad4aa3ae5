use std::rc::Rc;

use crate::command::{CommandExecutor, CommandSender, TabCompleter};
use crate::example::{tell, ExampleState};

use super::matching;

const SUBCOMMANDS: &[&str] = &["help", "info", "version", "reload"];
const RELOAD_PERMISSION: &str = "exampleaddon.reload";

pub struct MainCommand {
    state: Rc<ExampleState>,
}

impl MainCommand {
    pub fn new(state: Rc<ExampleState>) -> Self {
        MainCommand { state }
    }

    fn show_help(&self, sender: &dyn CommandSender) {
        tell(sender, "&e=== Example Addon Help ===");
        tell(sender, "&7/example help &f- Show this help");
        tell(sender, "&7/example info &f- Show addon info");
        tell(sender, "&7/example version &f- Show version");
        tell(sender, "&7/example reload &f- Reload addon");
    }

    fn show_info(&self, sender: &dyn CommandSender) {
        let meta = self.state.meta();
        tell(sender, &format!("&e=== {} ===", meta.name));
        tell(sender, &format!("&7{}", meta.description));
        tell(sender, &format!("&7By: {}", meta.authors.join(", ")));
    }

    fn show_version(&self, sender: &dyn CommandSender) {
        let meta = self.state.meta();
        tell(sender, &format!("&e{} &7v{}", meta.name, meta.version));
    }

    fn reload(&self, sender: &dyn CommandSender) -> anyhow::Result<()> {
        if !sender.has_permission(RELOAD_PERMISSION) {
            tell(sender, "&cYou don't have permission!");
            return Ok(());
        }

        self.state.reload()?;
        self.state.logger().debug(format!("Reload requested by {}.", sender.get_name()));
        tell(sender, "&aAddon reloaded!");
        Ok(())
    }
}

impl CommandExecutor for MainCommand {
    fn execute(&self, sender: &dyn CommandSender, label: &str, args: &[String]) -> anyhow::Result<bool> {
        let sub = match args.first() {
            Some(sub) => sub.to_lowercase(),
            None => {
                self.show_help(sender);
                return Ok(true);
            }
        };

        match sub.as_ref() {
            "help" => self.show_help(sender),
            "info" => self.show_info(sender),
            "version" => self.show_version(sender),
            "reload" => self.reload(sender)?,
            _ => {
                tell(sender, &format!("&cUnknown subcommand: {}", args[0]));
                tell(sender, &format!("&7Use &e/{} help", label.to_lowercase()));
            }
        }

        Ok(true)
    }
}

impl TabCompleter for MainCommand {
    fn complete(&self, _sender: &dyn CommandSender, args: &[String]) -> anyhow::Result<Vec<String>> {
        match args {
            [partial] => Ok(matching(SUBCOMMANDS, partial)),
            _ => Ok(Vec::new()),
        }
    }
}
