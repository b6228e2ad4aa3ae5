mod info_command;
mod main_command;

pub use info_command::InfoCommand;
pub use main_command::MainCommand;

fn matching(options: &[&str], partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    options
        .iter()
        .filter(|option| option.starts_with(partial.as_str()))
        .map(|option| option.to_string())
        .collect()
}
