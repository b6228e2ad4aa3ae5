use std::fs;

use swcaddon::config::HostConfig;
use swcaddon::console::Console;
use swcaddon::example::{ExampleAddon, ID};
use swcaddon::player::Player;
use swcaddon::{Addon, AddonState, CommandSender, LifecycleController};

fn controller(dir: &std::path::Path) -> LifecycleController {
    let mut controller = LifecycleController::new(dir);
    let addons: Vec<Box<dyn Addon>> = vec![Box::new(ExampleAddon::new())];
    assert!(controller.load_all(addons).is_empty());
    assert!(controller.enable_all().is_empty());
    controller
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn registers_its_commands_and_writes_a_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller(dir.path());

    assert!(dir.path().join(ID).join("config.toml").exists());
    assert_eq!(controller.commands().owner_of("einfo"), Some(ID));
    assert_eq!(controller.commands().owner_of("EXINFO"), Some(ID));
    assert_eq!(controller.commands().owner_of("ex"), Some(ID));
    assert_eq!(controller.commands().owner_of("examplecommand"), Some(ID));
    assert_eq!(controller.events().owned_by(ID), 2);
}

#[test]
fn examplecommand_echoes_its_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller(dir.path());
    let player = Player::new("Steve");

    assert!(controller.dispatch_command("examplecommand", &player, &args(&["one", "two"])).unwrap());
    assert_eq!(
        player.take_messages(),
        vec!["Hello from Example Addon!", "You passed 2 arguments", "First argument: one"]
    );
}

#[test]
fn completion_through_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller(dir.path());
    let player = Player::new("Steve");

    assert_eq!(controller.complete("ex", &player, &args(&["v"])), vec!["version"]);
    assert_eq!(controller.complete("exinfo", &player, &args(&["a"])), vec!["author"]);
    assert!(controller.complete("examplecommand", &player, &args(&[""])).is_empty());
}

#[test]
fn reload_picks_up_config_changes() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());
    let path = dir.path().join(ID).join("config.toml");

    fs::write(&path, "welcome_message = \"&bHey {player}\"\nannounce_quits = false\n").unwrap();
    controller.reload(ID).unwrap();

    let player = Player::new("Alex");
    controller.fire(&swcaddon::event::PlayerJoinEvent::new(player.clone()));
    assert_eq!(player.take_messages(), vec!["Hey Alex"]);
}

#[test]
fn status_follows_the_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());
    let player = Player::new("Steve");

    controller.dispatch_command("einfo", &player, &args(&["status"])).unwrap();
    assert_eq!(player.take_messages(), vec!["Status: Enabled"]);

    controller.disable(ID).unwrap();
    assert_eq!(controller.state(ID), Some(AddonState::Disabled));
    assert!(controller.dispatch_command("einfo", &player, &[]).is_err());
}

#[test]
fn console_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostConfig {
        addons_dir: dir.path().to_path_buf(),
        ..HostConfig::default()
    };
    let mut console = Console::new(controller(dir.path()), config);

    console.handle_line("join Admin op");
    let admin = console.player("admin").unwrap().clone();
    admin.take_messages();

    console.handle_line("as Admin example reload");
    assert_eq!(admin.take_messages(), vec!["Addon reloaded!"]);
    assert_eq!(admin.get_name(), "Admin");

    console.shutdown();
    assert_eq!(console.controller().state(ID), None);
}
