pub mod addon;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod event;
pub mod example;
pub mod lifecycle;
pub mod player;
pub mod util;

pub use crate::addon::{Addon, AddonContext, AddonLogger, AddonMeta, AddonState, Phase};
pub use crate::command::{CommandExecutor, CommandHandle, CommandRegistry, CommandSender, CommandSpec, TabCompleter};
pub use crate::error::{AddonError, ConfigError};
pub use crate::event::{Event, EventRegistry, HandlerList, Listener};
pub use crate::lifecycle::LifecycleController;
