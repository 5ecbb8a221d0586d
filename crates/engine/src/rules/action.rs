use std::fmt;

use thiserror::Error;

use super::globals::{parse_leading_integer, parse_leading_number};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadScene(String),
    Alert(String),
    Log(String),
    AddVar { name: String, delta: f64 },
    SetVar { name: String, value: String },
    MovePlayer { x: i32, y: i32 },
    AddItem { item: String, quantity: i64 },
    RemoveItem { item: String, quantity: i64 },
    UseItem(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("action string is empty")]
    Empty,
    #[error("unknown action command '{0}'")]
    UnknownCommand(String),
    #[error("action '{command}' is missing argument {index}")]
    MissingArgument { command: &'static str, index: usize },
    #[error("action '{command}' argument {index} is not numeric: '{value}'")]
    NotNumeric {
        command: &'static str,
        index: usize,
        value: String,
    },
}

impl Action {
    /// Parses `command:arg:arg`. Extra arguments are ignored.
    pub fn parse(raw: &str) -> Result<Self, ActionParseError> {
        if raw.is_empty() {
            return Err(ActionParseError::Empty);
        }
        let parts: Vec<&str> = raw.split(':').collect();
        let args = ActionArgs { parts: &parts };
        let action = match parts[0] {
            "loadScene" => Self::LoadScene(args.text("loadScene", 1)?),
            "alert" => Self::Alert(args.optional_text(1)),
            "log" => Self::Log(args.optional_text(1)),
            "addVar" => Self::AddVar {
                name: args.text("addVar", 1)?,
                delta: args.number("addVar", 2)?,
            },
            "setVar" => Self::SetVar {
                name: args.text("setVar", 1)?,
                value: args.optional_text(2),
            },
            "movePlayer" => Self::MovePlayer {
                x: args.coordinate("movePlayer", 1)?,
                y: args.coordinate("movePlayer", 2)?,
            },
            "addItem" => Self::AddItem {
                item: args.text("addItem", 1)?,
                quantity: args.quantity("addItem", 2)?,
            },
            "removeItem" => Self::RemoveItem {
                item: args.text("removeItem", 1)?,
                quantity: args.quantity("removeItem", 2)?,
            },
            "useItem" => Self::UseItem(args.text("useItem", 1)?),
            other => return Err(ActionParseError::UnknownCommand(other.to_string())),
        };
        Ok(action)
    }

    pub fn command(&self) -> &'static str {
        match self {
            Self::LoadScene(_) => "loadScene",
            Self::Alert(_) => "alert",
            Self::Log(_) => "log",
            Self::AddVar { .. } => "addVar",
            Self::SetVar { .. } => "setVar",
            Self::MovePlayer { .. } => "movePlayer",
            Self::AddItem { .. } => "addItem",
            Self::RemoveItem { .. } => "removeItem",
            Self::UseItem(_) => "useItem",
        }
    }

    /// Whether a targeted execution needs the player next to the target.
    pub fn requires_proximity(&self) -> bool {
        !matches!(self, Self::LoadScene(_) | Self::MovePlayer { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadScene(scene) => write!(f, "loadScene:{scene}"),
            Self::Alert(text) => write!(f, "alert:{text}"),
            Self::Log(text) => write!(f, "log:{text}"),
            Self::AddVar { name, delta } => write!(f, "addVar:{name}:{delta}"),
            Self::SetVar { name, value } => write!(f, "setVar:{name}:{value}"),
            Self::MovePlayer { x, y } => write!(f, "movePlayer:{x}:{y}"),
            Self::AddItem { item, quantity } => write!(f, "addItem:{item}:{quantity}"),
            Self::RemoveItem { item, quantity } => write!(f, "removeItem:{item}:{quantity}"),
            Self::UseItem(item) => write!(f, "useItem:{item}"),
        }
    }
}

struct ActionArgs<'a> {
    parts: &'a [&'a str],
}

impl ActionArgs<'_> {
    fn raw(&self, index: usize) -> Option<&str> {
        self.parts.get(index).copied()
    }

    fn optional_text(&self, index: usize) -> String {
        self.raw(index).unwrap_or_default().to_string()
    }

    fn text(&self, command: &'static str, index: usize) -> Result<String, ActionParseError> {
        match self.raw(index) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ActionParseError::MissingArgument { command, index }),
        }
    }

    fn number(&self, command: &'static str, index: usize) -> Result<f64, ActionParseError> {
        let value = self.text(command, index)?;
        parse_leading_number(&value).ok_or(ActionParseError::NotNumeric {
            command,
            index,
            value,
        })
    }

    fn integer(&self, command: &'static str, index: usize) -> Result<i64, ActionParseError> {
        let value = self.text(command, index)?;
        parse_leading_integer(&value).ok_or(ActionParseError::NotNumeric {
            command,
            index,
            value,
        })
    }

    /// Grid coordinates must fit an `i32`; larger values are rejected, not wrapped.
    fn coordinate(&self, command: &'static str, index: usize) -> Result<i32, ActionParseError> {
        let value = self.integer(command, index)?;
        i32::try_from(value).map_err(|_| ActionParseError::NotNumeric {
            command,
            index,
            value: value.to_string(),
        })
    }

    /// Item quantities default to 1 when omitted.
    fn quantity(&self, command: &'static str, index: usize) -> Result<i64, ActionParseError> {
        match self.raw(index) {
            None | Some("") => Ok(1),
            Some(_) => self.integer(command, index),
        }
    }
}
