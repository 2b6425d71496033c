// Database CRUD operations
use chrono::Local;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::db::{DbConnection, DbError, DbResult};
use super::models::{
    Component, DeleteScope, InsertOutcome, Machine, Movement, MovementFilter, TIMESTAMP_FORMAT,
};

/// Trim a form value and reject it when nothing is left
fn required<'a>(value: &'a str, field: &'static str) -> DbResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DbError::InvalidInput(field))
    } else {
        Ok(trimmed)
    }
}

fn machine_from_row(row: &Row<'_>) -> rusqlite::Result<Machine> {
    Ok(Machine {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn component_from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        id: row.get(0)?,
        name: row.get(1)?,
        serial_number: row.get(2)?,
        current_machine: row.get(3)?,
    })
}

fn movement_from_row(row: &Row<'_>) -> rusqlite::Result<Movement> {
    Ok(Movement {
        id: row.get(0)?,
        component: row.get(1)?,
        serial_number: row.get(2)?,
        from_machine: row.get(3)?,
        to_machine: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

// ==================== MACHINE QUERIES ====================

/// List all machines in insertion order
pub fn list_machines(db: &DbConnection) -> DbResult<Vec<Machine>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT id, name FROM machines ORDER BY id")?;

    let machines = stmt
        .query_map([], machine_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(machines)
}

fn machine_exists_in(conn: &Connection, name: &str) -> DbResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM machines WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Check whether a machine with this exact name exists
pub fn machine_exists(db: &DbConnection, name: &str) -> DbResult<bool> {
    let conn = db.lock();
    machine_exists_in(&conn, name)
}

/// Add a machine unless one with the same name already exists
pub fn add_machine(db: &DbConnection, name: &str) -> DbResult<InsertOutcome> {
    let name = required(name, "Machine name")?;

    let conn = db.lock();
    let changes = conn.execute(
        "INSERT OR IGNORE INTO machines (name) VALUES (?1)",
        params![name],
    )?;

    Ok(InsertOutcome::from_changes(changes))
}

// ==================== COMPONENT QUERIES ====================

/// List all components in insertion order
pub fn list_components(db: &DbConnection) -> DbResult<Vec<Component>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT id, name, serial_number, current_machine
         FROM components ORDER BY id",
    )?;

    let components = stmt
        .query_map([], component_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(components)
}

fn get_component_in(conn: &Connection, serial_number: &str) -> DbResult<Option<Component>> {
    let component = conn
        .query_row(
            "SELECT id, name, serial_number, current_machine
             FROM components WHERE serial_number = ?1",
            [serial_number],
            component_from_row,
        )
        .optional()?;
    Ok(component)
}

/// Get a component by serial number
pub fn get_component(db: &DbConnection, serial_number: &str) -> DbResult<Option<Component>> {
    let conn = db.lock();
    get_component_in(&conn, serial_number)
}

/// Machine a component currently sits on
pub fn current_machine(db: &DbConnection, serial_number: &str) -> DbResult<Option<String>> {
    Ok(get_component(db, serial_number)?.map(|c| c.current_machine))
}

/// Components currently assigned to a machine
pub fn components_at(db: &DbConnection, machine: &str) -> DbResult<Vec<Component>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT id, name, serial_number, current_machine
         FROM components WHERE current_machine = ?1 ORDER BY id",
    )?;

    let components = stmt
        .query_map([machine], component_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(components)
}

/// Add a component to an existing machine unless its serial is already registered
pub fn add_component(
    db: &DbConnection,
    name: &str,
    serial_number: &str,
    machine: &str,
) -> DbResult<InsertOutcome> {
    let name = required(name, "Component name")?;
    let serial_number = required(serial_number, "Serial number")?;
    let machine = required(machine, "Machine")?;

    let conn = db.lock();
    if !machine_exists_in(&conn, machine)? {
        return Err(DbError::UnknownMachine(machine.to_string()));
    }

    let changes = conn.execute(
        "INSERT OR IGNORE INTO components (name, serial_number, current_machine)
         VALUES (?1, ?2, ?3)",
        params![name, serial_number, machine],
    )?;

    Ok(InsertOutcome::from_changes(changes))
}

// ==================== MOVEMENT QUERIES ====================

/// Move a component and log the movement in a single transaction
pub fn move_component(
    db: &DbConnection,
    serial_number: &str,
    to_machine: &str,
) -> DbResult<Movement> {
    let serial_number = required(serial_number, "Component")?;
    let to_machine = required(to_machine, "Destination machine")?;

    let mut conn = db.lock();
    let tx = conn.transaction()?;

    if !machine_exists_in(&tx, to_machine)? {
        return Err(DbError::UnknownMachine(to_machine.to_string()));
    }

    let component = get_component_in(&tx, serial_number)?
        .ok_or_else(|| DbError::UnknownComponent(serial_number.to_string()))?;

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    tx.execute(
        "INSERT INTO movements (component, serial_number, from_machine, to_machine, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            component.name,
            component.serial_number,
            component.current_machine,
            to_machine,
            timestamp,
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "UPDATE components SET current_machine = ?1 WHERE id = ?2",
        params![to_machine, component.id],
    )?;

    tx.commit()?;

    Ok(Movement {
        id,
        component: component.name,
        serial_number: Some(component.serial_number),
        from_machine: component.current_machine,
        to_machine: to_machine.to_string(),
        timestamp,
    })
}

/// List movements matching the filter, most recent first
pub fn list_movements(db: &DbConnection, filter: &MovementFilter) -> DbResult<Vec<Movement>> {
    let mut sql = String::from(
        "SELECT id, component, serial_number, from_machine, to_machine, timestamp
         FROM movements WHERE 1 = 1",
    );
    let mut values: Vec<&str> = Vec::new();

    if let Some(component) = &filter.component {
        values.push(component);
        sql.push_str(&format!(" AND component = ?{}", values.len()));
    }
    if let Some(serial_number) = &filter.serial_number {
        values.push(serial_number);
        sql.push_str(&format!(" AND serial_number = ?{}", values.len()));
    }
    if let Some(machine) = &filter.machine {
        values.push(machine);
        let n = values.len();
        sql.push_str(&format!(" AND (from_machine = ?{n} OR to_machine = ?{n})"));
    }
    sql.push_str(" ORDER BY id DESC");

    let conn = db.lock();
    let mut stmt = conn.prepare(&sql)?;

    let movements = stmt
        .query_map(params_from_iter(values), movement_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(movements)
}

/// Distinct serial numbers that have logged movements
pub fn list_logged_serials(db: &DbConnection) -> DbResult<Vec<String>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT DISTINCT serial_number FROM movements
         WHERE serial_number IS NOT NULL ORDER BY serial_number",
    )?;

    let serials = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(serials)
}

/// Delete movement history; returns the number of removed rows
pub fn delete_movements(db: &DbConnection, scope: &DeleteScope) -> DbResult<usize> {
    let conn = db.lock();
    let removed = match scope {
        DeleteScope::Serial(serial_number) => {
            let serial_number = required(serial_number, "Serial number")?;
            conn.execute(
                "DELETE FROM movements WHERE serial_number = ?1",
                params![serial_number],
            )?
        }
        DeleteScope::All => conn.execute("DELETE FROM movements", [])?,
    };

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::db::init_in_memory;

    fn tracker_with_pump() -> DbConnection {
        let db = init_in_memory(false).unwrap();
        add_component(&db, "Pump", "S1", "Machine A").unwrap();
        db
    }

    #[test]
    fn test_add_machine_once() {
        let db = init_in_memory(false).unwrap();

        assert_eq!(add_machine(&db, "Machine F").unwrap(), InsertOutcome::Created);
        assert_eq!(
            add_machine(&db, "Machine F").unwrap(),
            InsertOutcome::AlreadyExists
        );

        let machines = list_machines(&db).unwrap();
        assert_eq!(machines.len(), 6);
        assert_eq!(
            machines.iter().filter(|m| m.name == "Machine F").count(),
            1
        );
        assert_eq!(machines.last().unwrap().name, "Machine F");
    }

    #[test]
    fn test_add_machine_rejects_empty_name() {
        let db = init_in_memory(false).unwrap();

        assert!(matches!(
            add_machine(&db, "").unwrap_err(),
            DbError::InvalidInput(_)
        ));
        assert!(matches!(
            add_machine(&db, "   ").unwrap_err(),
            DbError::InvalidInput(_)
        ));
        assert_eq!(list_machines(&db).unwrap().len(), 5);
    }

    #[test]
    fn test_add_machine_trims_name() {
        let db = init_in_memory(false).unwrap();
        add_machine(&db, "  Lathe  ").unwrap();
        assert!(machine_exists(&db, "Lathe").unwrap());
    }

    #[test]
    fn test_add_component() {
        let db = tracker_with_pump();

        let components = list_components(&db).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "Pump");
        assert_eq!(components[0].serial_number, "S1");
        assert_eq!(components[0].current_machine, "Machine A");
    }

    #[test]
    fn test_add_component_duplicate_serial_is_noop() {
        let db = tracker_with_pump();

        let outcome = add_component(&db, "Other Pump", "S1", "Machine B").unwrap();
        assert_eq!(outcome, InsertOutcome::AlreadyExists);

        let pump = get_component(&db, "S1").unwrap().unwrap();
        assert_eq!(pump.name, "Pump");
        assert_eq!(pump.current_machine, "Machine A");
    }

    #[test]
    fn test_add_component_validation() {
        let db = init_in_memory(false).unwrap();

        assert!(matches!(
            add_component(&db, "Pump", "", "Machine A").unwrap_err(),
            DbError::InvalidInput("Serial number")
        ));
        assert!(matches!(
            add_component(&db, "", "S1", "Machine A").unwrap_err(),
            DbError::InvalidInput("Component name")
        ));
        assert!(matches!(
            add_component(&db, "Pump", "S1", "Nowhere").unwrap_err(),
            DbError::UnknownMachine(_)
        ));
        assert!(list_components(&db).unwrap().is_empty());
    }

    #[test]
    fn test_move_component_scenario() {
        let db = tracker_with_pump();

        let first = move_component(&db, "S1", "Machine C").unwrap();
        assert_eq!(first.from_machine, "Machine A");
        assert_eq!(first.to_machine, "Machine C");
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine C")
        );
        assert_eq!(list_movements(&db, &MovementFilter::all()).unwrap().len(), 1);

        move_component(&db, "S1", "Machine B").unwrap();
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine B")
        );

        let history = list_movements(&db, &MovementFilter::for_serial("S1")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].serial_number.as_deref(), Some("S1"));
        assert_eq!(history[0].from_machine, "Machine C");
        assert_eq!(history[0].to_machine, "Machine B");
        assert_eq!(history[1].id, first.id);
        assert!(history[0].id > history[1].id);
    }

    #[test]
    fn test_move_timestamp_format() {
        let db = tracker_with_pump();
        let movement = move_component(&db, "S1", "Machine D").unwrap();

        assert!(
            chrono::NaiveDateTime::parse_from_str(&movement.timestamp, TIMESTAMP_FORMAT).is_ok()
        );
    }

    #[test]
    fn test_move_rejections_leave_state_untouched() {
        let db = tracker_with_pump();

        assert!(matches!(
            move_component(&db, "S1", "Nowhere").unwrap_err(),
            DbError::UnknownMachine(_)
        ));
        assert!(matches!(
            move_component(&db, "S9", "Machine B").unwrap_err(),
            DbError::UnknownComponent(_)
        ));
        assert!(matches!(
            move_component(&db, "", "Machine B").unwrap_err(),
            DbError::InvalidInput(_)
        ));

        assert!(list_movements(&db, &MovementFilter::all()).unwrap().is_empty());
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine A")
        );
    }

    #[test]
    fn test_move_to_current_machine_is_logged() {
        let db = tracker_with_pump();

        let movement = move_component(&db, "S1", "Machine A").unwrap();
        assert_eq!(movement.from_machine, "Machine A");
        assert_eq!(movement.to_machine, "Machine A");

        let history = list_movements(&db, &MovementFilter::for_serial("S1")).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].to_machine, "Machine A");
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine A")
        );
    }

    #[test]
    fn test_failed_update_rolls_back_movement_log() {
        let db = tracker_with_pump();
        db.lock()
            .execute_batch(
                "CREATE TRIGGER block_relocation BEFORE UPDATE ON components
                 BEGIN SELECT RAISE(ABORT, 'relocation blocked'); END;",
            )
            .unwrap();

        let err = move_component(&db, "S1", "Machine C").unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));

        assert!(list_movements(&db, &MovementFilter::all()).unwrap().is_empty());
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine A")
        );
    }

    #[test]
    fn test_list_movements_filters() {
        let db = tracker_with_pump();
        add_component(&db, "Filter", "F1", "Machine B").unwrap();
        move_component(&db, "S1", "Machine C").unwrap();
        move_component(&db, "F1", "Machine D").unwrap();
        move_component(&db, "S1", "Machine E").unwrap();

        let for_c = list_movements(&db, &MovementFilter::for_machine("Machine C")).unwrap();
        assert_eq!(for_c.len(), 2);
        assert!(for_c.iter().all(|m| m.component == "Pump"));

        let by_name = list_movements(&db, &MovementFilter::for_component("Filter")).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].to_machine, "Machine D");

        let combined = MovementFilter {
            serial_number: Some("S1".to_string()),
            machine: Some("Machine E".to_string()),
            ..MovementFilter::default()
        };
        let rows = list_movements(&db, &combined).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].from_machine, "Machine C");
    }

    #[test]
    fn test_components_at() {
        let db = tracker_with_pump();
        add_component(&db, "Filter", "F1", "Machine A").unwrap();
        move_component(&db, "F1", "Machine B").unwrap();

        let at_a = components_at(&db, "Machine A").unwrap();
        assert_eq!(at_a.len(), 1);
        assert_eq!(at_a[0].serial_number, "S1");
        assert!(components_at(&db, "Machine C").unwrap().is_empty());
    }

    #[test]
    fn test_delete_movements_by_serial() {
        let db = tracker_with_pump();
        add_component(&db, "Filter", "F1", "Machine A").unwrap();
        move_component(&db, "S1", "Machine B").unwrap();
        move_component(&db, "S1", "Machine C").unwrap();
        move_component(&db, "F1", "Machine D").unwrap();

        let removed = delete_movements(&db, &DeleteScope::Serial("S1".to_string())).unwrap();
        assert_eq!(removed, 2);

        let remaining = list_movements(&db, &MovementFilter::all()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].serial_number.as_deref(), Some("F1"));
        assert_eq!(list_logged_serials(&db).unwrap(), vec!["F1".to_string()]);

        // Current location is not part of the log
        assert_eq!(
            current_machine(&db, "S1").unwrap().as_deref(),
            Some("Machine C")
        );
    }

    #[test]
    fn test_delete_all_movements() {
        let db = tracker_with_pump();
        move_component(&db, "S1", "Machine B").unwrap();
        move_component(&db, "S1", "Machine C").unwrap();

        assert_eq!(delete_movements(&db, &DeleteScope::All).unwrap(), 2);
        assert!(list_movements(&db, &MovementFilter::all()).unwrap().is_empty());
        assert_eq!(list_machines(&db).unwrap().len(), 5);
        assert_eq!(list_components(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_requires_serial() {
        let db = tracker_with_pump();
        assert!(matches!(
            delete_movements(&db, &DeleteScope::Serial(" ".to_string())).unwrap_err(),
            DbError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_seeded_components_can_move() {
        let db = init_in_memory(true).unwrap();
        let serial = crate::state::db::seed_serial("Compressor");

        move_component(&db, &serial, "Machine B").unwrap();

        let history = list_movements(&db, &MovementFilter::for_component("Compressor")).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_machine, "Machine A");
    }
}
