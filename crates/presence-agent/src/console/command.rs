//! Console commands
//!
//! One command per input line: a keyword, optionally followed by a subject id.

use std::str::FromStr;

use presence_core::SubjectId;
use thiserror::Error;

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record local activity for the actor (debounced)
    Active,
    /// Write the actor's status immediately
    SetStatus(bool),
    /// Set the actor
    Login(SubjectId),
    /// Clear the actor
    Logout,
    /// Fresh fetch and evaluation for a subject
    Check(SubjectId),
    /// Last cached evaluation for a subject
    Cached(SubjectId),
    /// Start keeping the cache in sync for a subject
    Watch(SubjectId),
    /// Stop keeping the cache in sync for a subject
    Unwatch(SubjectId),
    /// Show watched subjects and their cached status
    List,
    Help,
    Quit,
}

/// Command parse error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("`{0}` requires a subject id")]
    MissingArgument(&'static str),

    #[error("`{0}` takes no arguments")]
    UnexpectedArgument(&'static str),

    #[error("{0}")]
    InvalidSubject(String),
}

impl Command {
    /// Usage text printed by `help`
    pub const HELP: &'static str = "\
commands:
  login <id>     set the actor
  logout         clear the actor
  active         record activity for the actor (debounced)
  online         mark the actor online now
  offline        mark the actor offline now
  check <id>     fetch and evaluate a subject's status
  cached <id>    show the cached status of a subject
  watch <id>     keep a subject's cached status in sync
  unwatch <id>   stop watching a subject
  list           show watched subjects
  help           show this text
  quit           exit";

    /// Keyword the command is invoked by
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::SetStatus(true) => "online",
            Self::SetStatus(false) => "offline",
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::Check(_) => "check",
            Self::Cached(_) => "cached",
            Self::Watch(_) => "watch",
            Self::Unwatch(_) => "unwatch",
            Self::List => "list",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

fn subject(name: &'static str, arg: Option<&str>) -> Result<SubjectId, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(name))?;
    SubjectId::new(arg).map_err(|e| ParseError::InvalidSubject(e.to_string()))
}

fn bare(command: Command, arg: Option<&str>) -> Result<Command, ParseError> {
    match arg {
        Some(_) => Err(ParseError::UnexpectedArgument(command.name())),
        None => Ok(command),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let arg = parts.next();
        if let Some(extra) = parts.next() {
            return Err(ParseError::Unknown(format!("{keyword} ... {extra}")));
        }

        match keyword.as_str() {
            "active" => bare(Self::Active, arg),
            "online" => bare(Self::SetStatus(true), arg),
            "offline" => bare(Self::SetStatus(false), arg),
            "logout" => bare(Self::Logout, arg),
            "list" | "ls" => bare(Self::List, arg),
            "help" | "?" => bare(Self::Help, arg),
            "quit" | "exit" => bare(Self::Quit, arg),
            "login" => Ok(Self::Login(subject("login", arg)?)),
            "check" => Ok(Self::Check(subject("check", arg)?)),
            "cached" => Ok(Self::Cached(subject("cached", arg)?)),
            "watch" => Ok(Self::Watch(subject("watch", arg)?)),
            "unwatch" => Ok(Self::Unwatch(subject("unwatch", arg)?)),
            _ => Err(ParseError::Unknown(keyword)),
        }
    }
}
