/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Models,
    Model(String),
    Refresh,
    History,
    Help,
    Quit,
    /// Anything that is not a slash command goes to the narrator.
    Action(String),
    Unknown(String),
    Empty,
}

pub const HELP: &str = "\
Commands:
  /models        list available models
  /model <id>    switch to another model
  /refresh       reload the model list from the API
  /history       print the story so far
  /help          show this help
  /quit          leave the story
Anything else is your next action.";

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Action(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name.to_ascii_lowercase().as_str(), arg) {
        ("models", "") => Command::Models,
        ("model", "") => Command::Models,
        ("model", id) => Command::Model(id.to_string()),
        ("refresh", "") => Command::Refresh,
        ("history", "") => Command::History,
        ("help", "") | ("?", "") => Command::Help,
        ("quit", "") | ("exit", "") | ("q", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}
