//! Subcommand parsing for the `ai` binary.
//!
//! Flags are handled by [`AiArgs`](super::AiArgs); this module interprets the free
//! arguments left over once flags are removed.

use crate::error::{Error, Result};
use crate::fanout::parse_model_list;

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the default (or `--model`) model, with session history.
    Ask { question: String },

    /// Ask about the contents of a file.
    File { path: String, question: String },

    /// Ask several models at once.
    Multi {
        models: Vec<String>,
        question: String,
    },

    /// Start a new session.
    NewSession,

    /// List stored sessions.
    SessionList,

    /// Switch to a session by number or id.
    SessionSwitch(String),

    /// Delete a session by number or id.
    SessionDelete(String),

    /// List configured models.
    ModelList,

    /// Add a model.
    ModelAdd {
        name: String,
        url: String,
        api_key: String,
    },

    /// Remove a model.
    ModelRemove(String),

    /// Make a model the default.
    ModelSet(String),

    /// Change a model's saved chat options.
    ModelOptions(String),

    /// Display usage.
    Help,
}

fn usage_error(usage: &str) -> Error {
    Error::validation(format!("usage: {usage}"), None)
}

fn exactly<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    if args.len() != N {
        return Err(usage_error(usage));
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

/// Interpret the free arguments of an invocation.
///
/// Anything that does not start with a known subcommand is a question; multiple words are
/// joined with spaces.
///
/// ```
/// # use termai::cli::{parse_command, Command};
/// let args = vec!["session".to_string(), "switch".to_string(), "2".to_string()];
/// assert_eq!(parse_command(&args).unwrap(), Command::SessionSwitch("2".to_string()));
/// ```
pub fn parse_command(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];
    match first.as_str() {
        "help" if rest.is_empty() => Ok(Command::Help),
        "file" => {
            let [path, question] = exactly::<2>(rest, "ai file <file_path> <question>")?;
            Ok(Command::File {
                path: path.to_string(),
                question: question.to_string(),
            })
        }
        "multi" => {
            let [models, question] = exactly::<2>(rest, "ai multi <model1,model2,...> <question>")?;
            Ok(Command::Multi {
                models: parse_model_list(models)?,
                question: question.to_string(),
            })
        }
        "new" if rest.is_empty() => Ok(Command::NewSession),
        "session" => parse_session_command(rest),
        "model" => parse_model_command(rest),
        _ => {
            let question = args.join(" ");
            if question.trim().is_empty() {
                return Err(usage_error("ai <question>"));
            }
            Ok(Command::Ask { question })
        }
    }
}

fn parse_session_command(args: &[String]) -> Result<Command> {
    let Some(action) = args.first() else {
        return Ok(Command::SessionList);
    };
    let rest = &args[1..];
    match action.as_str() {
        "list" => {
            let [] = exactly::<0>(rest, "ai session list")?;
            Ok(Command::SessionList)
        }
        "switch" => {
            let [id] = exactly::<1>(rest, "ai session switch <session_id or number>")?;
            Ok(Command::SessionSwitch(id.to_string()))
        }
        "delete" => {
            let [id] = exactly::<1>(rest, "ai session delete <session_id or number>")?;
            Ok(Command::SessionDelete(id.to_string()))
        }
        other => Err(Error::validation(
            format!("unknown session command: {other} (use list, switch, or delete)"),
            None,
        )),
    }
}

fn parse_model_command(args: &[String]) -> Result<Command> {
    let Some(action) = args.first() else {
        return Ok(Command::ModelList);
    };
    let rest = &args[1..];
    match action.as_str() {
        "list" => {
            let [] = exactly::<0>(rest, "ai model list")?;
            Ok(Command::ModelList)
        }
        "add" => {
            let [name, url, api_key] = exactly::<3>(rest, "ai model add <name> <url> <apikey>")?;
            Ok(Command::ModelAdd {
                name: name.to_string(),
                url: url.to_string(),
                api_key: api_key.to_string(),
            })
        }
        "remove" => {
            let [name] = exactly::<1>(rest, "ai model remove <name>")?;
            Ok(Command::ModelRemove(name.to_string()))
        }
        "set" => {
            let [name] = exactly::<1>(rest, "ai model set <name>")?;
            Ok(Command::ModelSet(name.to_string()))
        }
        "options" => {
            let [name] = exactly::<1>(rest, "ai model options <name>")?;
            Ok(Command::ModelOptions(name.to_string()))
        }
        other => Err(Error::validation(
            format!("unknown model command: {other} (use list, add, remove, set, or options)"),
            None,
        )),
    }
}

/// Returns usage text for the `ai` binary.
pub fn help_text() -> &'static str {
    "\
ai [OPTIONS] <question>                 Ask the default model (with session history)
ai file <file_path> <question>          Ask about the contents of a text file
ai multi <model1,model2,...> <question> Ask several models at once
ai new                                  Start a new session
ai session [list]                       List stored sessions
ai session switch <number or id>        Switch to a stored session
ai session delete <number or id>        Delete a stored session
ai model [list]                         List configured models
ai model add <name> <url> <apikey>      Add a model (--default --temperature --max-tokens --stream/--no-stream)
ai model remove <name>                  Remove a model
ai model set <name>                     Make a model the default
ai model options <name>                 Change a model's saved options

Options:
  --model MODEL       Ask MODEL instead of the default
  --home DIR          Configuration directory (default: $AI_HOME or ~/.ai)
  --temperature TEMP  Sampling temperature
  --max-tokens N      Max tokens per response
  --stream            Stream the response
  --no-stream         Wait for the complete response
  --no-history        Don't send conversation history
  --no-color          Disable ANSI colors/styles
  --verbose           Log debug information to stderr"
}
