use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, error, warn};
use uuid::Uuid;

use crate::error::{guard, AddonError};

pub trait CommandSender {
    fn get_name(&self) -> &str;
    fn send_message(&self, message: &str);
    fn has_permission(&self, node: &str) -> bool;
}

pub trait CommandExecutor {
    /// Runs the command. `Ok(false)` means the arguments were not understood.
    fn execute(&self, sender: &dyn CommandSender, label: &str, args: &[String]) -> anyhow::Result<bool>;
}

pub trait TabCompleter {
    fn complete(&self, sender: &dyn CommandSender, args: &[String]) -> anyhow::Result<Vec<String>>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for Rc<T> {
    fn execute(&self, sender: &dyn CommandSender, label: &str, args: &[String]) -> anyhow::Result<bool> {
        (**self).execute(sender, label, args)
    }
}

impl<T: TabCompleter + ?Sized> TabCompleter for Rc<T> {
    fn complete(&self, sender: &dyn CommandSender, args: &[String]) -> anyhow::Result<Vec<String>> {
        (**self).complete(sender, args)
    }
}

struct FnExecutor<F>(F);

impl<F> CommandExecutor for FnExecutor<F>
where
    F: Fn(&dyn CommandSender, &[String]) -> anyhow::Result<bool>,
{
    fn execute(&self, sender: &dyn CommandSender, _label: &str, args: &[String]) -> anyhow::Result<bool> {
        (self.0)(sender, args)
    }
}

struct FnCompleter<F>(F);

impl<F> TabCompleter for FnCompleter<F>
where
    F: Fn(&dyn CommandSender, &[String]) -> anyhow::Result<Vec<String>>,
{
    fn complete(&self, sender: &dyn CommandSender, args: &[String]) -> anyhow::Result<Vec<String>> {
        (self.0)(sender, args)
    }
}

pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: String,
    executor: Box<dyn CommandExecutor>,
    completer: Option<Box<dyn TabCompleter>>,
}

impl CommandSpec {
    pub fn new<E: CommandExecutor + 'static>(name: impl Into<String>, executor: E) -> Self {
        CommandSpec {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            usage: String::new(),
            executor: Box::new(executor),
            completer: None,
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, executor: F) -> Self
    where
        F: Fn(&dyn CommandSender, &[String]) -> anyhow::Result<bool> + 'static,
    {
        Self::new(name, FnExecutor(executor))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn completer<C: TabCompleter + 'static>(mut self, completer: C) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    pub fn completer_fn<F>(self, completer: F) -> Self
    where
        F: Fn(&dyn CommandSender, &[String]) -> anyhow::Result<Vec<String>> + 'static,
    {
        self.completer(FnCompleter(completer))
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_usage(&self) -> &str {
        &self.usage
    }

    fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.aliases.len() + 1);
        for label in std::iter::once(&self.name).chain(&self.aliases) {
            let label = label.to_lowercase();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandHandle(Uuid);

struct Registration {
    owner: String,
    labels: Vec<String>,
    spec: CommandSpec,
}

const INTERNAL_ERROR: &str = "&cAn internal error occurred while attempting to perform this command.";

#[derive(Default)]
pub struct CommandRegistry {
    registrations: HashMap<CommandHandle, Registration>,
    labels: HashMap<String, CommandHandle>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command for `owner`. Nothing is stored when the name or
    /// any alias is already taken.
    pub fn register(&mut self, owner: &str, spec: CommandSpec) -> Result<CommandHandle, AddonError> {
        let labels = spec.labels();

        for label in &labels {
            if let Some(existing) = self.labels.get(label) {
                return Err(AddonError::DuplicateCommand {
                    name: label.clone(),
                    owner: self
                        .registrations
                        .get(existing)
                        .map(|registration| registration.owner.clone())
                        .unwrap_or_default(),
                });
            }
        }

        let handle = CommandHandle(Uuid::new_v4());
        for label in &labels {
            self.labels.insert(label.clone(), handle);
        }

        debug!("[{}] Registered command /{} {:?}.", owner, spec.name, spec.aliases);
        self.registrations.insert(handle, Registration {
            owner: owner.to_owned(),
            labels,
            spec,
        });

        Ok(handle)
    }

    pub fn unregister(&mut self, handle: CommandHandle) -> bool {
        match self.registrations.remove(&handle) {
            Some(registration) => {
                for label in &registration.labels {
                    self.labels.remove(label);
                }
                debug!("[{}] Unregistered command /{}.", registration.owner, registration.spec.name);
                true
            }
            None => false,
        }
    }

    pub fn unregister_all(&mut self, owner: &str) -> usize {
        let handles: Vec<CommandHandle> = self
            .registrations
            .iter()
            .filter(|(_, registration)| registration.owner == owner)
            .map(|(handle, _)| *handle)
            .collect();

        handles.into_iter().filter(|handle| self.unregister(*handle)).count()
    }

    fn resolve(&self, label: &str) -> Option<&Registration> {
        self.labels
            .get(&label.to_lowercase())
            .and_then(|handle| self.registrations.get(handle))
    }

    /// Runs the command known as `label`, by name or alias.
    ///
    /// Failures inside the executor are logged against the owning addon and
    /// reported as not handled; they never escape this call.
    pub fn dispatch(&self, label: &str, sender: &dyn CommandSender, args: &[String]) -> Result<bool, AddonError> {
        let registration = self
            .resolve(label)
            .ok_or_else(|| AddonError::UnknownCommand(label.to_owned()))?;

        let executor = &registration.spec.executor;
        let outcome = guard(|| executor.execute(sender, label, args));

        match outcome {
            Ok(true) => Ok(true),
            Ok(false) => {
                let usage = registration.spec.get_usage();
                if !usage.is_empty() {
                    sender.send_message(usage);
                }
                Ok(false)
            }
            Err(e) => {
                let err = AddonError::handler(&registration.owner, format!("command /{}", label), e);
                error!("{} (issued by {})", err, sender.get_name());
                sender.send_message(INTERNAL_ERROR);
                Ok(false)
            }
        }
    }

    /// Tab-completion candidates for `label`. Never fails: a missing
    /// command, a missing completer or a failing completer all yield nothing.
    pub fn complete(&self, label: &str, sender: &dyn CommandSender, args: &[String]) -> Vec<String> {
        let registration = match self.resolve(label) {
            Some(registration) => registration,
            None => return Vec::new(),
        };
        let completer = match &registration.spec.completer {
            Some(completer) => completer,
            None => return Vec::new(),
        };

        guard(|| completer.complete(sender, args)).unwrap_or_else(|e| {
            warn!("{}", AddonError::handler(&registration.owner, format!("completion of /{}", label), e));
            Vec::new()
        })
    }

    pub fn get(&self, label: &str) -> Option<&CommandSpec> {
        self.resolve(label).map(|registration| &registration.spec)
    }

    pub fn owner_of(&self, label: &str) -> Option<&str> {
        self.resolve(label).map(|registration| registration.owner.as_str())
    }

    pub fn commands(&self) -> Vec<&CommandSpec> {
        let mut commands: Vec<&CommandSpec> = self.registrations.values().map(|r| &r.spec).collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    pub fn help_lines(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .map(|command| {
                let aliases = match command.get_aliases() {
                    [] => String::new(),
                    aliases => format!(" ({})", aliases.join(", ")),
                };
                format!("  {}{} - {}", command.get_name(), aliases, command.get_description())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::cell::Cell;

    fn counting(counter: &Rc<Cell<u32>>) -> CommandSpec {
        let counter = counter.clone();
        CommandSpec::from_fn("example", move |_sender, _args| {
            counter.set(counter.get() + 1);
            Ok(true)
        })
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alias_and_name_reach_the_same_executor() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = CommandRegistry::new();
        registry.register("demo", counting(&calls).alias("ex")).unwrap();

        let sender = Player::new("tester");
        assert!(registry.dispatch("EX", &sender, &[]).unwrap());
        assert_eq!(calls.get(), 1);
        assert!(registry.dispatch("example", &sender, &[]).unwrap());
        assert_eq!(calls.get(), 2);
        assert!(registry.dispatch("Example", &sender, &[]).unwrap());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn duplicates_keep_the_first_registration() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let mut registry = CommandRegistry::new();
        registry.register("one", counting(&first).alias("ex")).unwrap();

        match registry.register("two", counting(&second)) {
            Err(AddonError::DuplicateCommand { name, owner }) => {
                assert_eq!(name, "example");
                assert_eq!(owner, "one");
            }
            _ => panic!("expected a duplicate command error"),
        }

        let clash = CommandSpec::from_fn("other", |_, _| Ok(true)).alias("EX");
        assert!(matches!(registry.register("two", clash), Err(AddonError::DuplicateCommand { .. })));
        assert!(registry.get("other").is_none());

        registry.dispatch("ex", &Player::new("tester"), &[]).unwrap();
        assert_eq!((first.get(), second.get()), (1, 0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_commands_are_reported() {
        let registry = CommandRegistry::new();
        let err = registry.dispatch("nope", &Player::new("tester"), &[]).unwrap_err();
        assert!(matches!(err, AddonError::UnknownCommand(name) if name == "nope"));
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = CommandRegistry::new();
        let handle = registry
            .register("demo", CommandSpec::from_fn("example", |_, _| Ok(true)).alias("ex"))
            .unwrap();

        assert!(registry.unregister(handle));
        assert!(!registry.unregister(handle));
        assert!(registry.get("ex").is_none());
        assert!(registry.is_empty());

        registry.register("demo", CommandSpec::from_fn("ex", |_, _| Ok(true))).unwrap();
    }

    #[test]
    fn unregister_all_only_touches_the_owner() {
        let mut registry = CommandRegistry::new();
        registry.register("a", CommandSpec::from_fn("one", |_, _| Ok(true))).unwrap();
        registry.register("a", CommandSpec::from_fn("two", |_, _| Ok(true))).unwrap();
        registry.register("b", CommandSpec::from_fn("three", |_, _| Ok(true))).unwrap();

        assert_eq!(registry.unregister_all("a"), 2);
        assert_eq!(registry.owner_of("three"), Some("b"));
        assert!(registry.get("one").is_none());
    }

    #[test]
    fn failing_executors_stay_inside_the_registry() {
        let mut registry = CommandRegistry::new();
        registry.register("demo", CommandSpec::from_fn("boom", |_, _| anyhow::bail!("kaput"))).unwrap();
        registry.register("demo", CommandSpec::from_fn("panic", |_, _| panic!("kaput"))).unwrap();

        let sender = Player::new("tester");
        assert!(!registry.dispatch("boom", &sender, &[]).unwrap());
        assert!(!registry.dispatch("panic", &sender, &[]).unwrap());
        assert_eq!(sender.take_messages().len(), 2);
    }

    #[test]
    fn unhandled_commands_print_usage() {
        let mut registry = CommandRegistry::new();
        registry
            .register("demo", CommandSpec::from_fn("strict", |_, args| Ok(!args.is_empty())).usage("/strict <arg>"))
            .unwrap();

        let sender = Player::new("tester");
        assert!(!registry.dispatch("strict", &sender, &[]).unwrap());
        assert_eq!(sender.take_messages(), vec!["/strict <arg>".to_string()]);
        assert!(registry.dispatch("strict", &sender, &args(&["x"])).unwrap());
        assert!(sender.take_messages().is_empty());
    }

    #[test]
    fn completion_never_fails() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                "demo",
                CommandSpec::from_fn("good", |_, _| Ok(true)).completer_fn(|_, args| {
                    Ok(["help", "info"]
                        .iter()
                        .filter(|s| s.starts_with(args[0].as_str()))
                        .map(|s| s.to_string())
                        .collect())
                }),
            )
            .unwrap();
        registry
            .register("demo", CommandSpec::from_fn("bad", |_, _| Ok(true)).completer_fn(|_, _| anyhow::bail!("no")))
            .unwrap();
        registry
            .register("demo", CommandSpec::from_fn("worse", |_, _| Ok(true)).completer_fn(|_, args| {
                Ok(vec![args[5].clone()])
            }))
            .unwrap();
        registry.register("demo", CommandSpec::from_fn("plain", |_, _| Ok(true))).unwrap();

        let sender = Player::new("tester");
        assert_eq!(registry.complete("GOOD", &sender, &args(&["he"])), vec!["help".to_string()]);
        assert!(registry.complete("bad", &sender, &args(&[""])).is_empty());
        assert!(registry.complete("worse", &sender, &args(&[""])).is_empty());
        assert!(registry.complete("plain", &sender, &args(&[""])).is_empty());
        assert!(registry.complete("missing", &sender, &args(&[""])).is_empty());
    }

    #[test]
    fn help_lists_commands_by_name() {
        let mut registry = CommandRegistry::new();
        registry
            .register("demo", CommandSpec::from_fn("zeta", |_, _| Ok(true)).description("Last"))
            .unwrap();
        registry
            .register(
                "demo",
                CommandSpec::from_fn("alpha", |_, _| Ok(true)).aliases(["a", "al"]).description("First"),
            )
            .unwrap();

        assert_eq!(registry.help_lines(), vec!["  alpha (a, al) - First".to_string(), "  zeta - Last".to_string()]);
    }
}
