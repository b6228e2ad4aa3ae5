use std::rc::Rc;

use crate::command::{CommandExecutor, CommandSender, TabCompleter};
use crate::example::{tell, ExampleState};

use super::matching;

const TOPICS: &[&str] = &["version", "author", "status"];

pub struct InfoCommand {
    state: Rc<ExampleState>,
}

impl InfoCommand {
    pub fn new(state: Rc<ExampleState>) -> Self {
        InfoCommand { state }
    }
}

impl CommandExecutor for InfoCommand {
    fn execute(&self, sender: &dyn CommandSender, _label: &str, args: &[String]) -> anyhow::Result<bool> {
        let meta = self.state.meta();

        match args.first().map(|arg| arg.to_lowercase()).as_deref() {
            Some("version") => tell(sender, &format!("&aVersion: {}", meta.version)),
            Some("author") => tell(sender, &format!("&aAuthors: {}", meta.authors.join(", "))),
            Some("status") => {
                let status = if self.state.is_enabled() { "&2Enabled" } else { "&cDisabled" };
                tell(sender, &format!("&aStatus: {}", status));
            }
            _ => {
                tell(sender, &format!("&e=== {} ===", meta.name));
                tell(sender, &format!("&7Version: &f{}", meta.version));
                tell(sender, &format!("&7Authors: &f{}", meta.authors.join(", ")));
                tell(sender, &format!("&7Description: &f{}", meta.description));
            }
        }

        Ok(true)
    }
}

impl TabCompleter for InfoCommand {
    fn complete(&self, _sender: &dyn CommandSender, args: &[String]) -> anyhow::Result<Vec<String>> {
        match args {
            [partial] => Ok(matching(TOPICS, partial)),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::tests::state_in;
    use crate::player::Player;

    #[test]
    fn topics() {
        let dir = tempfile::tempdir().unwrap();
        let command = InfoCommand::new(state_in(dir.path()));
        let player = Player::new("Steve");

        command.execute(&player, "einfo", &["author".to_string()]).unwrap();
        command.execute(&player, "einfo", &["Status".to_string()]).unwrap();
        assert_eq!(player.take_messages(), vec!["Authors: YourName", "Status: Enabled"]);

        command.execute(&player, "einfo", &[]).unwrap();
        let summary = player.take_messages();
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[3], "Description: An example addon that demonstrates the API");
    }

    #[test]
    fn completes_topics() {
        let dir = tempfile::tempdir().unwrap();
        let command = InfoCommand::new(state_in(dir.path()));
        let player = Player::new("Steve");

        assert_eq!(command.complete(&player, &["s".to_string()]).unwrap(), vec!["status"]);
    }
}
