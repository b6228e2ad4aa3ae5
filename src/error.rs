use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::addon::AddonState;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum AddonError {
    #[error("command \"{name}\" is already registered by {owner}")]
    DuplicateCommand { name: String, owner: String },

    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("{addon} requires {dependency}, which is not enabled")]
    MissingDependency { addon: String, dependency: String },

    #[error("[{addon}] {context} failed: {source}")]
    HandlerExecution {
        addon: String,
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("[{0}] registrations are only accepted while the addon is enabling")]
    RegistrationClosed(String),

    #[error("an addon with id \"{0}\" is already loaded")]
    DuplicateAddon(String),

    #[error("no addon with id \"{0}\"")]
    UnknownAddon(String),

    #[error("{addon} is {state}, expected {expected}")]
    InvalidState {
        addon: String,
        state: AddonState,
        expected: AddonState,
    },
}

impl AddonError {
    pub(crate) fn handler(addon: &str, context: impl fmt::Display, source: anyhow::Error) -> Self {
        AddonError::HandlerExecution {
            addon: addon.to_owned(),
            context: context.to_string(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Runs addon-supplied code, turning a panic into an ordinary error.
pub(crate) fn guard<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(panic_error(payload)))
}

fn panic_error(payload: Box<dyn std::any::Any + Send>) -> anyhow::Error {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    };

    anyhow::anyhow!("panicked: {}", message)
}
