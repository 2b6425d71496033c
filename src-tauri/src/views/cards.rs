// Card view models for the component and machine pages
use serde::Serialize;

use crate::state::{self, Component, DbConnection, DbResult, Movement, MovementFilter};

/// One movement rendered for display, newest first in every list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementLine {
    pub movement: Movement,
    pub text: String,
}

/// Line shown inside a component card: "`ts`: from ➝ to"
pub fn component_history_line(movement: &Movement) -> String {
    format!(
        "`{}`: {} ➝ {}",
        movement.timestamp, movement.from_machine, movement.to_machine
    )
}

/// Line shown inside a machine card: "`ts`: component ➝ to (from origin)"
pub fn machine_log_line(movement: &Movement) -> String {
    format!(
        "`{}`: {} ➝ {} (from {})",
        movement.timestamp, movement.component, movement.to_machine, movement.from_machine
    )
}

/// Line shown in the full history log
pub fn history_log_line(movement: &Movement) -> String {
    let serial = movement
        .serial_number
        .as_deref()
        .map(|s| format!(" [{}]", s))
        .unwrap_or_default();
    format!(
        "`{}`: **{}**{} moved from **{}** to **{}**",
        movement.timestamp, movement.component, serial, movement.from_machine, movement.to_machine
    )
}

pub fn lines(movements: Vec<Movement>, format: fn(&Movement) -> String) -> Vec<MovementLine> {
    movements
        .into_iter()
        .map(|movement| MovementLine {
            text: format(&movement),
            movement,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentCard {
    pub title: String,
    pub component: Component,
    pub history: Vec<MovementLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineCard {
    pub title: String,
    pub machine: String,
    pub components: Vec<Component>,
    pub movements: Vec<MovementLine>,
}

pub fn component_cards(db: &DbConnection) -> DbResult<Vec<ComponentCard>> {
    state::list_components(db)?
        .into_iter()
        .map(|component| {
            let history = state::list_movements(
                db,
                &MovementFilter::for_serial(component.serial_number.clone()),
            )?;
            Ok(ComponentCard {
                title: format!("🔧 {} ({})", component.name, component.serial_number),
                history: lines(history, component_history_line),
                component,
            })
        })
        .collect()
}

pub fn machine_cards(db: &DbConnection) -> DbResult<Vec<MachineCard>> {
    state::list_machines(db)?
        .into_iter()
        .map(|machine| {
            let components = state::components_at(db, &machine.name)?;
            let movements =
                state::list_movements(db, &MovementFilter::for_machine(machine.name.clone()))?;
            Ok(MachineCard {
                title: format!("🏭 {}", machine.name),
                machine: machine.name,
                components,
                movements: lines(movements, machine_log_line),
            })
        })
        .collect()
}
