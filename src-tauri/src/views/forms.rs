// Form submissions
// Each form maps to one write and always produces a user-facing notice

use serde::{Deserialize, Serialize};

use crate::state::{self, DbConnection, DbResult, DeleteScope, InsertOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Turn rejected input into an error notice; store failures still propagate
fn notice_or_fail(result: DbResult<Notice>) -> DbResult<Notice> {
    match result {
        Err(e) if e.is_user_error() => {
            log::warn!("Rejected submission: {}", e);
            Ok(Notice::error(e.to_string()))
        }
        other => other,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveForm {
    pub serial_number: String,
    pub to_machine: String,
}

impl MoveForm {
    pub fn submit(&self, db: &DbConnection) -> DbResult<Notice> {
        notice_or_fail(
            state::move_component(db, &self.serial_number, &self.to_machine).map(|movement| {
                log::info!(
                    "Moved {} ({:?}) from {} to {}",
                    movement.component,
                    movement.serial_number,
                    movement.from_machine,
                    movement.to_machine
                );
                Notice::success(format!(
                    "{} moved from {} to {}",
                    movement.component, movement.from_machine, movement.to_machine
                ))
            }),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMachineForm {
    pub name: String,
}

impl AddMachineForm {
    pub fn submit(&self, db: &DbConnection) -> DbResult<Notice> {
        let name = self.name.trim();
        notice_or_fail(state::add_machine(db, name).map(|outcome| match outcome {
            InsertOutcome::Created => {
                log::info!("Added machine {}", name);
                Notice::success(format!("Machine '{}' added", name))
            }
            InsertOutcome::AlreadyExists => {
                Notice::info(format!("Machine '{}' already exists", name))
            }
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddComponentForm {
    pub name: String,
    pub serial_number: String,
    pub machine: String,
}

impl AddComponentForm {
    pub fn submit(&self, db: &DbConnection) -> DbResult<Notice> {
        let (name, serial) = (self.name.trim(), self.serial_number.trim());
        let outcome = match state::add_component(db, name, serial, &self.machine) {
            Ok(outcome) => outcome,
            Err(e) => return notice_or_fail(Err(e)),
        };

        let notice = match outcome {
            InsertOutcome::Created => {
                log::info!("Added component {} ({}) at {}", name, serial, self.machine.trim());
                Notice::success(format!(
                    "Component '{}' ({}) added to {}",
                    name,
                    serial,
                    self.machine.trim()
                ))
            }
            // Upgraded databases still enforce unique component names
            InsertOutcome::AlreadyExists if state::get_component(db, serial)?.is_none() => {
                Notice::info(format!("A component named '{}' already exists", name))
            }
            InsertOutcome::AlreadyExists => {
                Notice::info(format!("A component with serial {} already exists", serial))
            }
        };
        Ok(notice)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteHistoryForm {
    pub scope: DeleteScope,
}

impl DeleteHistoryForm {
    pub fn submit(&self, db: &DbConnection) -> DbResult<Notice> {
        notice_or_fail(state::delete_movements(db, &self.scope).map(|removed| {
            log::info!("Deleted {} movement records ({:?})", removed, self.scope);
            match &self.scope {
                DeleteScope::Serial(serial) => Notice::success(format!(
                    "Deleted {} movement records for serial {}",
                    removed,
                    serial.trim()
                )),
                DeleteScope::All => Notice::success(format!(
                    "Deleted ALL movement history ({} records)",
                    removed
                )),
            }
        }))
    }
}
