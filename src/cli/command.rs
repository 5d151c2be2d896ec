//! Command types for the interactive shell.
//!
//! Parses one line of user input into a [`Command`].

use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a value; the value is the rest of the line.
    Set { key: String, value: String },
    Get { key: String },
    Del { key: String },
    Expire { key: String, seconds: i64 },
    /// Start appending every mutation to a log file.
    EnableLog { path: Option<PathBuf> },
    DisableLog,
    /// Append the current contents to a log file.
    Save { path: Option<PathBuf> },
    /// Replay a log file.
    Load { path: Option<PathBuf> },
    /// Write a snapshot file.
    Snapshot { path: Option<PathBuf> },
    /// Load a snapshot file.
    Restore { path: Option<PathBuf> },
    Stats,
    Help,
    Exit,
}

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  SET <key> <value>       Store a value
  GET <key>               Read a value
  DEL <key>               Delete a key
  EXPIRE <key> <seconds>  Expire a key after the given seconds
  ENABLELOG [file]        Log every mutation to a file
  DISABLELOG              Stop logging mutations
  SAVE [file]             Append the current contents to a log file
  LOAD [file]             Replay a log file
  SNAPSHOT [file]         Write a snapshot file
  RESTORE [file]          Load a snapshot file
  STATS                   Show cache statistics
  HELP                    Show this help
  EXIT                    Quit";

impl Command {
    /// Parses a line of input.
    ///
    /// Returns `Ok(None)` for a blank line. Verbs are case-insensitive.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        let Some((verb, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match verb.to_ascii_uppercase().as_str() {
            "SET" => {
                let (key, value) = split_word(rest).ok_or(CacheError::Usage("SET <key> <value>"))?;
                if value.is_empty() {
                    return Err(CacheError::Usage("SET <key> <value>"));
                }
                Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            "GET" => Command::Get {
                key: single_key(rest, "GET <key>")?,
            },
            "DEL" | "DELETE" => Command::Del {
                key: single_key(rest, "DEL <key>")?,
            },
            "EXPIRE" => {
                let mut args = rest.split_whitespace();
                let (Some(key), Some(seconds), None) = (args.next(), args.next(), args.next())
                else {
                    return Err(CacheError::Usage("EXPIRE <key> <seconds>"));
                };
                let seconds = seconds.parse().map_err(|_| {
                    CacheError::InvalidArgument(format!("seconds must be an integer, got '{seconds}'"))
                })?;
                Command::Expire {
                    key: key.to_string(),
                    seconds,
                }
            }
            "ENABLELOG" => Command::EnableLog {
                path: optional_path(rest, "ENABLELOG [file]")?,
            },
            "DISABLELOG" => no_args(rest, "DISABLELOG", Command::DisableLog)?,
            "SAVE" => Command::Save {
                path: optional_path(rest, "SAVE [file]")?,
            },
            "LOAD" => Command::Load {
                path: optional_path(rest, "LOAD [file]")?,
            },
            "SNAPSHOT" => Command::Snapshot {
                path: optional_path(rest, "SNAPSHOT [file]")?,
            },
            "RESTORE" => Command::Restore {
                path: optional_path(rest, "RESTORE [file]")?,
            },
            "STATS" => no_args(rest, "STATS", Command::Stats)?,
            "HELP" => Command::Help,
            "EXIT" | "QUIT" => Command::Exit,
            _ => return Err(CacheError::UnknownCommand(verb.to_string())),
        };

        Ok(Some(command))
    }
}

/// Splits off the first whitespace-delimited word.
fn split_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(idx) => Some((&s[..idx], s[idx..].trim())),
        None => Some((s, "")),
    }
}

fn single_key(rest: &str, usage: &'static str) -> Result<String> {
    match split_word(rest) {
        Some((key, "")) => Ok(key.to_string()),
        _ => Err(CacheError::Usage(usage)),
    }
}

fn optional_path(rest: &str, usage: &'static str) -> Result<Option<PathBuf>> {
    match split_word(rest) {
        None => Ok(None),
        Some((path, "")) => Ok(Some(PathBuf::from(path))),
        Some(_) => Err(CacheError::Usage(usage)),
    }
}

fn no_args(rest: &str, usage: &'static str, command: Command) -> Result<Command> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CacheError::Usage(usage))
    }
}
