//! Line commands understood by the `main-core` console host.
//!
//! Each line is split on whitespace and parsed as a clap multicall command,
//! so the first word names the command. Arguments that may hold JSON are
//! collected word by word and joined back with single spaces.

use clap::{CommandFactory, Parser, Subcommand};
use mapflow_adapters::UserAction;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(multicall = true, disable_help_subcommand = true, help_template = "{subcommands}")]
struct ConsoleLine {
    #[command(subcommand)]
    command: LineCommand,
}

#[derive(Debug, Subcommand)]
enum LineCommand {
    /// List services in the catalog.
    Services,
    /// Launch a service by index or name.
    Start {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        service: Vec<String>,
    },
    /// Render the current step.
    Show,
    /// Go to the next step.
    Next,
    /// Go back one step.
    #[command(alias = "previous")]
    Back,
    /// Pick a choice option.
    Choose { option: usize },
    /// Submit the current form as k=v pairs (values parsed as JSON when possible).
    Set {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        pairs: Vec<String>,
    },
    /// Submit a json-form.
    Json {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Select query item(s) by value; a JSON array selects several.
    Select {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Run the step's function call.
    Call,
    /// Run the step's POST.
    Post,
    /// Fetch the step's file.
    Download,
    /// Upload a file.
    Upload { path: String },
    /// Persist the current workflow.
    Save,
    /// List persisted workflows.
    List,
    /// Reactivate a persisted workflow.
    Resume { uuid: Uuid },
    /// Remove a persisted workflow.
    Delete { uuid: Uuid },
    /// Start the current workflow over.
    Restart,
    /// Close the current workflow.
    Close,
    /// Print the journal of the current workflow.
    Events,
    /// Show this list.
    #[command(alias = "?")]
    Help,
    /// Leave the console.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Services,
    Start(String),
    Show,
    Action(UserAction),
    /// Upload needs the host to read the file first.
    Upload(String),
    Save,
    List,
    Resume(Uuid),
    Delete(Uuid),
    Restart,
    Close,
    Events,
    Help,
    Quit,
}

/// Command list printed by `help`.
pub fn help() -> String {
    ConsoleLine::command().render_help().to_string()
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    if line.trim().is_empty() {
        return Ok(ConsoleCommand::Show);
    }
    let parsed = ConsoleLine::try_parse_from(line.split_whitespace()).map_err(|e| e.render().to_string())?;
    Ok(match parsed.command {
        LineCommand::Services => ConsoleCommand::Services,
        LineCommand::Start { service } => ConsoleCommand::Start(service.join(" ")),
        LineCommand::Show => ConsoleCommand::Show,
        LineCommand::Next => ConsoleCommand::Action(UserAction::Next),
        LineCommand::Back => ConsoleCommand::Action(UserAction::Previous),
        LineCommand::Choose { option } => ConsoleCommand::Action(UserAction::Choose(option)),
        LineCommand::Set { pairs } => ConsoleCommand::Action(UserAction::SubmitForm(parse_pairs(&pairs)?)),
        LineCommand::Json { value } => ConsoleCommand::Action(UserAction::SubmitJson(loose_value(&value.join(" ")))),
        LineCommand::Select { values } => {
            let values = match loose_value(&values.join(" ")) {
                Value::Array(items) => items,
                one => vec![one],
            };
            ConsoleCommand::Action(UserAction::Select(values))
        }
        LineCommand::Call => ConsoleCommand::Action(UserAction::Call),
        LineCommand::Post => ConsoleCommand::Action(UserAction::Post),
        LineCommand::Download => ConsoleCommand::Action(UserAction::Download),
        LineCommand::Upload { path } => ConsoleCommand::Upload(path),
        LineCommand::Save => ConsoleCommand::Save,
        LineCommand::List => ConsoleCommand::List,
        LineCommand::Resume { uuid } => ConsoleCommand::Resume(uuid),
        LineCommand::Delete { uuid } => ConsoleCommand::Delete(uuid),
        LineCommand::Restart => ConsoleCommand::Restart,
        LineCommand::Close => ConsoleCommand::Close,
        LineCommand::Events => ConsoleCommand::Events,
        LineCommand::Help => ConsoleCommand::Help,
        LineCommand::Quit => ConsoleCommand::Quit,
    })
}

/// `k=v` pairs; a repeated key is kept repeated.
fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, Value)>, String> {
    pairs.iter()
         .map(|pair| match pair.split_once('=') {
             Some((k, v)) if !k.is_empty() => Ok((k.to_string(), loose_value(v))),
             _ => Err(format!("expected key=value, got '{pair}'")),
         })
         .collect()
}

/// JSON when it parses, a plain string otherwise.
fn loose_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_pairs_keep_repeats_and_types() {
        let cmd = parse_command("set carrier=gas carrier=heat year=2030 note=\"x\"").unwrap();
        assert_eq!(cmd,
                   ConsoleCommand::Action(UserAction::SubmitForm(vec![("carrier".into(), json!("gas")),
                                                                      ("carrier".into(), json!("heat")),
                                                                      ("year".into(), json!(2030)),
                                                                      ("note".into(), json!("x"))])));
        assert!(parse_command("set =1").is_err());
        assert_eq!(parse_command("set").unwrap(), ConsoleCommand::Action(UserAction::SubmitForm(vec![])));
    }

    #[test]
    fn select_accepts_one_or_many() {
        assert_eq!(parse_command("select 3").unwrap(), ConsoleCommand::Action(UserAction::Select(vec![json!(3)])));
        assert_eq!(parse_command("select -3").unwrap(), ConsoleCommand::Action(UserAction::Select(vec![json!(-3)])));
        assert_eq!(parse_command("select [\"a\", \"b\"]").unwrap(),
                   ConsoleCommand::Action(UserAction::Select(vec![json!("a"), json!("b")])));
    }

    #[test]
    fn arguments_are_checked() {
        assert!(parse_command("start").is_err());
        assert!(parse_command("choose x").is_err());
        assert!(parse_command("resume nope").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert_eq!(parse_command("  ").unwrap(), ConsoleCommand::Show);
        assert_eq!(parse_command("start District heating").unwrap(),
                   ConsoleCommand::Start("District heating".into()));
    }

    #[test]
    fn aliases_map_to_the_same_command() {
        assert_eq!(parse_command("previous").unwrap(), parse_command("back").unwrap());
        assert_eq!(parse_command("exit").unwrap(), ConsoleCommand::Quit);
        assert_eq!(parse_command("?").unwrap(), ConsoleCommand::Help);
        assert!(help().contains("resume"));
    }
}
