use std::path::Path;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use swcaddon::config::HostConfig;
use swcaddon::console::{Console, Control};
use swcaddon::example::ExampleAddon;
use swcaddon::{Addon, LifecycleController};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = HostConfig::load(Path::new("./config.toml"))?;

    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    pretty_env_logger::formatted_timed_builder().parse_filters(&filters).init();

    info!("You're running swcaddon v{}.", VERSION);

    let mut controller = LifecycleController::from_config(&config);
    let addons: Vec<Box<dyn Addon>> = vec![Box::new(ExampleAddon::new())];

    let mut errors = controller.load_all(addons);
    errors.extend(controller.enable_all());
    if !errors.is_empty() {
        warn!("{} addon(s) failed to start, see above.", errors.len());
    }

    let mut console = Console::new(controller, config);
    info!("Ready. Type \"help\" for a list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if console.handle_line(&line) == Control::Stop {
            break;
        }
    }

    console.shutdown();
    Ok(())
}
