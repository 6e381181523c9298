//! Request grammar of the control socket

use std::num::ParseIntError;
use thiserror::Error;

const LIST: &str = "list";
const KILL_PREFIX: &str = "kill ";

/// A request read from a client connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Kill(i32),
    Unrecognized(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid pod identifier {raw:?} in kill command: {source}")]
    InvalidPodId {
        raw: String,
        #[source]
        source: ParseIntError,
    },
}

impl Command {
    /// Interpret one request line.
    ///
    /// Surrounding whitespace is ignored. `kill ` takes the second
    /// single-space separated token as a base-10 `i32`; a token that does not
    /// parse is an error rather than an unrecognized command.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();

        if line == LIST {
            return Ok(Command::List);
        }

        if line.starts_with(KILL_PREFIX) {
            let raw = line.split(' ').nth(1).unwrap_or_default();
            let id = raw.parse::<i32>().map_err(|source| ParseError::InvalidPodId {
                raw: raw.to_string(),
                source,
            })?;
            return Ok(Command::Kill(id));
        }

        Ok(Command::Unrecognized(line.to_string()))
    }

    /// Wire form of the command, as a client sends it
    pub fn to_request(&self) -> String {
        match self {
            Command::List => LIST.to_string(),
            Command::Kill(id) => format!("{}{}", KILL_PREFIX, id),
            Command::Unrecognized(raw) => raw.clone(),
        }
    }
}
