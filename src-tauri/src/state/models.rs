// Data models for component tracking
use serde::{Deserialize, Serialize};

/// Local-time format used for movement timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub serial_number: String,
    pub current_machine: String,
}

/// One relocation of a component. Names are copied at the time of the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub component: String,
    pub serial_number: Option<String>,
    pub from_machine: String,
    pub to_machine: String,
    pub timestamp: String,
}

/// Result of an insert-if-absent write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

impl InsertOutcome {
    pub fn from_changes(changes: usize) -> Self {
        if changes == 0 {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Created
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created)
    }
}

/// Optional filters for movement queries; unset fields match everything.
/// `machine` matches either side of a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub component: Option<String>,
    pub serial_number: Option<String>,
    pub machine: Option<String>,
}

impl MovementFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_serial(serial: impl Into<String>) -> Self {
        Self {
            serial_number: Some(serial.into()),
            ..Self::default()
        }
    }

    pub fn for_component(name: impl Into<String>) -> Self {
        Self {
            component: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn for_machine(machine: impl Into<String>) -> Self {
        Self {
            machine: Some(machine.into()),
            ..Self::default()
        }
    }
}

/// Which movement rows a history deletion removes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "serial_number", rename_all = "snake_case")]
pub enum DeleteScope {
    Serial(String),
    All,
}
