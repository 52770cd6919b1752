use std::fmt::Display;

use serde::{Serialize, Serializer};

use crate::sync::TaskAlias;

/// A task to create on Habitica.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub alias: TaskAlias,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub text: String,
    pub notes: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Todo,
}

/// Task difficulty. Habitica names it priority and stores it as a number.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Trivial,
    Easy,
    Medium,
    Hard,
}

impl Priority {
    fn as_f64(self) -> f64 {
        match self {
            Priority::Trivial => 0.1,
            Priority::Easy => 1.0,
            Priority::Medium => 1.5,
            Priority::Hard => 2.0,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}
