//! Module `commands`
//!
//! Defines the control-channel commands the client issues, their wire
//! formatting and argument validation.

use std::fmt;

use crate::error::ProtocolError;

/// A command sent over the control channel.
///
/// Commands that take an argument store it as a `String`; `Raw` carries
/// arbitrary command text passed through `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    User(String),
    Pass(String),
    Feat,
    Pasv,
    Pret(Box<Command>),
    List(String),
    Mlsd(String),
    Mlst(String),
    Stor(String),
    Mkd(String),
    Cwd(String),
    Pwd,
    Quit,
    Raw(String),
}

impl Command {
    /// The command verb as sent on the wire.
    pub fn verb(&self) -> &str {
        match self {
            Command::User(_) => "USER",
            Command::Pass(_) => "PASS",
            Command::Feat => "FEAT",
            Command::Pasv => "PASV",
            Command::Pret(_) => "PRET",
            Command::List(_) => "LIST",
            Command::Mlsd(_) => "MLSD",
            Command::Mlst(_) => "MLST",
            Command::Stor(_) => "STOR",
            Command::Mkd(_) => "MKD",
            Command::Cwd(_) => "CWD",
            Command::Pwd => "PWD",
            Command::Quit => "QUIT",
            Command::Raw(text) => text.split_whitespace().next().unwrap_or(""),
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            Command::User(arg)
            | Command::Pass(arg)
            | Command::List(arg)
            | Command::Mlsd(arg)
            | Command::Mlst(arg)
            | Command::Stor(arg)
            | Command::Mkd(arg)
            | Command::Cwd(arg) => Some(arg),
            _ => None,
        }
    }

    /// Rejects text that would smuggle a second command onto the wire.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let text = match self {
            Command::Pret(inner) => return inner.validate(),
            Command::Raw(text) => text.as_str(),
            other => other.argument().unwrap_or(""),
        };

        if text.contains(['\r', '\n', '\0']) {
            return Err(ProtocolError::InvalidArgument(text.to_string()));
        }
        Ok(())
    }

    /// The full line including the CRLF terminator.
    pub fn to_line(&self) -> String {
        format!("{}\r\n", self)
    }

    /// Command text safe to write to logs.
    pub fn redacted(&self) -> String {
        match self {
            Command::Pass(_) => "PASS ****".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Raw(text) => f.write_str(text),
            Command::Pret(inner) => write!(f, "PRET {}", inner),
            other => match other.argument() {
                Some(arg) if !arg.is_empty() => write!(f, "{} {}", other.verb(), arg),
                _ => f.write_str(other.verb()),
            },
        }
    }
}

/// Parses free command text into a `Command`.
///
/// Known verbs with their required argument map to typed variants; anything
/// else is passed through unchanged as `Raw`.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "USER" if !arg.is_empty() => Command::User(arg.to_string()),
        "PASS" => Command::Pass(arg.to_string()),
        "FEAT" if arg.is_empty() => Command::Feat,
        "PASV" if arg.is_empty() => Command::Pasv,
        "PRET" if !arg.is_empty() => Command::Pret(Box::new(parse_command(arg))),
        "LIST" => Command::List(arg.to_string()),
        "MLSD" => Command::Mlsd(arg.to_string()),
        "MLST" => Command::Mlst(arg.to_string()),
        "STOR" if !arg.is_empty() => Command::Stor(arg.to_string()),
        "MKD" if !arg.is_empty() => Command::Mkd(arg.to_string()),
        "CWD" if !arg.is_empty() => Command::Cwd(arg.to_string()),
        "PWD" if arg.is_empty() => Command::Pwd,
        "QUIT" if arg.is_empty() => Command::Quit,
        _ => Command::Raw(trimmed.to_string()),
    }
}
