use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BlogError;

/// The four operations a field definition can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Find,
    Update,
    Remove,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Find, Action::Update, Action::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Find => "find",
            Action::Update => "update",
            Action::Remove => "remove",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "find" => Ok(Action::Find),
            "update" => Ok(Action::Update),
            "remove" => Ok(Action::Remove),
            other => Err(BlogError::bad_field(format!("unknown action {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| serde::de::Error::custom("unknown action"))
    }
}
